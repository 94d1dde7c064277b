//! Order Lifecycle Manager
//!
//! The single writer of order status and payment status. Every entry point
//! that mutates an order — checkout, status updates, deletion, buyer proof,
//! QR verification — funnels through here so the state machine invariants
//! hold no matter where a request came from.
//!
//! Ordering guarantee: inventory reservation for all lines commits before
//! any payment attempt, and no inventory lock is ever held across a
//! gateway call.

use crate::auth::Requester;
use crate::core::AppState;
use crate::db::models::{
    CreateGuestOrderRequest, CreateOrderRequest, Order, OrderLine, OrderStatus, OrderWithItems,
    PaymentStatus, UpdateStatusRequest,
};
use crate::db::repository::{RepoError, order as order_repo, payment as payment_repo, product as product_repo};
use crate::orders::guest_code;
use crate::orders::query::{OrderFilter, Page};
use crate::payments::service as payment_service;
use crate::pricing;
use crate::utils::money::{round_money, to_decimal, to_f64};
use rust_decimal::Decimal;
use shared::{AppError, AppResult, ErrorCode};

/// Snapshot of one checkout line after pricing
struct PricedLine {
    product_id: i64,
    quantity: i64,
    unit_price: f64,
}

async fn require_order(state: &AppState, order_id: i64) -> AppResult<Order> {
    order_repo::find_by_id(&state.db.pool, order_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id))
}

async fn with_items(state: &AppState, order: Order) -> AppResult<OrderWithItems> {
    let items = order_repo::find_items(&state.db.pool, order.id).await?;
    Ok(OrderWithItems { order, items })
}

/// Price every line at `now`: live product price with the active discount
/// applied, captured into the order and never re-read afterwards.
///
/// Lines are keyed by product (one row per product in order_item), so a
/// submission repeating a product is malformed rather than a storage
/// conflict.
async fn price_lines(state: &AppState, lines: &[OrderLine], now: i64) -> AppResult<Vec<PricedLine>> {
    let mut seen = std::collections::HashSet::new();
    for line in lines {
        if !seen.insert(line.product_id) {
            return Err(
                AppError::validation("Order lines must not repeat a product")
                    .with_detail("product_id", line.product_id),
            );
        }
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = product_repo::find_by_id(&state.db.pool, line.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", line.product_id)
            })?;
        let unit_price =
            pricing::effective_unit_price(&state.db.pool, product.id, product.price, now).await?;
        priced.push(PricedLine {
            product_id: product.id,
            quantity: line.quantity,
            unit_price,
        });
    }
    Ok(priced)
}

fn total_amount(lines: &[PricedLine]) -> f64 {
    let total = lines.iter().fold(Decimal::ZERO, |acc, l| {
        acc + to_decimal(l.unit_price) * Decimal::from(l.quantity)
    });
    to_f64(round_money(total))
}

/// Persist the order: reserve every line and insert the aggregate in one
/// transaction. Any reservation failure rolls the whole thing back —
/// partial orders are never persisted.
async fn persist_order(state: &AppState, order: &Order, lines: &[PricedLine]) -> AppResult<()> {
    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    for line in lines {
        if let Err(e) = product_repo::reserve_stock(tx.as_mut(), line.product_id, line.quantity).await
        {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(e.to_string()))?;
            return Err(match e {
                RepoError::InsufficientStock(pid) => AppError::insufficient_stock(pid),
                other => AppError::from(other),
            });
        }
    }

    order_repo::insert(tx.as_mut(), order).await?;
    for line in lines {
        order_repo::insert_item(tx.as_mut(), order.id, line.product_id, line.quantity, line.unit_price)
            .await?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_order(
    id: i64,
    user_id: Option<i64>,
    order_code: String,
    is_guest: bool,
    req_email: String,
    req_name: String,
    contact: ContactSnapshot,
    total: f64,
    now: i64,
) -> Order {
    Order {
        id,
        user_id,
        order_code,
        is_guest,
        buyer_email: req_email,
        buyer_name: req_name,
        buyer_phone: contact.phone,
        street: contact.street,
        city: contact.city,
        region: contact.region,
        postal_code: contact.postal_code,
        country: contact.country,
        order_status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        total_amount: total,
        has_user_proven: false,
        notes: contact.notes,
        created_at: now,
        updated_at: now,
    }
}

struct ContactSnapshot {
    phone: Option<String>,
    street: Option<String>,
    city: Option<String>,
    region: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    notes: Option<String>,
}

/// Checkout for authenticated buyers.
///
/// On gateway failure the order and its reservation persist with payment
/// status FAILED; the error carries the order id so the caller can retry
/// through the payment surface (each retry is a new Payment attempt).
pub async fn create_order(
    state: &AppState,
    requester: &Requester,
    req: CreateOrderRequest,
) -> AppResult<OrderWithItems> {
    let (user_id, _) = requester.require_user()?;
    if req.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    let now = shared::util::now_millis();
    let priced = price_lines(state, &req.items, now).await?;
    let total = total_amount(&priced);

    let id = shared::util::snowflake_id();
    let order_code = format!("ORD-{id}");
    let order = build_order(
        id,
        Some(user_id),
        order_code,
        false,
        req.buyer_email,
        req.buyer_name,
        ContactSnapshot {
            phone: req.buyer_phone,
            street: req.street,
            city: req.city,
            region: req.region,
            postal_code: req.postal_code,
            country: req.country,
            notes: req.notes,
        },
        total,
        now,
    );

    persist_order(state, &order, &priced).await?;
    tracing::info!(order_id = id, user_id, total, "Order created");

    // Reservation is committed; charge without holding any lock
    if let Some(details) = req.payment {
        payment_service::process_payment(state, id, details).await?;
    }

    let order = require_order(state, id).await?;
    state.notifier.order_confirmed(&order).await;
    with_items(state, order).await
}

/// Checkout for guests: no payment details, buyer-chosen order code.
pub async fn create_guest_order(
    state: &AppState,
    req: CreateGuestOrderRequest,
) -> AppResult<OrderWithItems> {
    if req.payment.is_some() {
        return Err(AppError::invalid_request(
            "Guest checkout does not accept payment details",
        ));
    }
    if req.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    // Collision check happens pre-hash; the stored form is salted and
    // could never be compared across orders
    if guest_code::code_taken(&state.db.pool, &req.order_code).await? {
        return Err(AppError::new(ErrorCode::DuplicateOrderCode));
    }
    let hashed = guest_code::hash_code(&req.order_code)?;

    let now = shared::util::now_millis();
    let priced = price_lines(state, &req.items, now).await?;
    let total = total_amount(&priced);

    let id = shared::util::snowflake_id();
    let order = build_order(
        id,
        None,
        hashed,
        true,
        req.buyer_email,
        req.buyer_name,
        ContactSnapshot {
            phone: req.buyer_phone,
            street: req.street,
            city: req.city,
            region: req.region,
            postal_code: req.postal_code,
            country: req.country,
            notes: req.notes,
        },
        total,
        now,
    );

    persist_order(state, &order, &priced).await?;
    tracing::info!(order_id = id, total, "Guest order created");

    let order = require_order(state, id).await?;
    state.notifier.order_confirmed(&order).await;
    with_items(state, order).await
}

/// Fetch an order by id: owner or staff only.
pub async fn get_order(
    state: &AppState,
    requester: &Requester,
    order_id: i64,
) -> AppResult<OrderWithItems> {
    requester.require_user()?;
    let order = require_order(state, order_id).await?;
    if !requester.is_staff() && !requester.owns(order.user_id) {
        return Err(AppError::permission_denied("Not your order"));
    }
    with_items(state, order).await
}

/// Guest/buyer tracking by order code.
///
/// Tries plaintext equality (account orders) then the guest hash scan. Any
/// miss is a plain NotFound — the response never reveals whether a code
/// was well-formed or close.
pub async fn get_order_by_code(state: &AppState, code: &str) -> AppResult<OrderWithItems> {
    if let Some(order) = order_repo::find_by_code_plain(&state.db.pool, code).await? {
        return with_items(state, order).await;
    }
    if let Some(order_id) = guest_code::find_guest_order(&state.db.pool, code).await? {
        let order = require_order(state, order_id).await?;
        return with_items(state, order).await;
    }
    Err(AppError::new(ErrorCode::OrderNotFound))
}

/// Filtered, paginated listing. Visibility scoping happens in the filter;
/// page and count always reflect the same predicates.
pub async fn list_orders(
    state: &AppState,
    requester: &Requester,
    filter: OrderFilter,
) -> AppResult<Page<Order>> {
    let filter = filter.scoped_for(requester)?;
    let items = order_repo::list(&state.db.pool, &filter).await?;
    let total = order_repo::count(&state.db.pool, &filter).await?;
    Ok(Page {
        items,
        total,
        page: filter.page(),
        per_page: filter.per_page(),
    })
}

/// Validate `current -> target` including the payment-dependent rule.
///
/// `effective_payment` is the payment status the order will carry after
/// this update, so one call may set DELIVERED and PAID together.
fn check_transition(
    order: &Order,
    target: OrderStatus,
    effective_payment: PaymentStatus,
) -> AppResult<()> {
    if order.order_status == OrderStatus::ProvenDelivered {
        return Err(AppError::new(ErrorCode::OrderAlreadyProven));
    }
    if target == OrderStatus::ProvenDelivered {
        // Buyer-asserted only; staff go through QR verification instead
        return Err(AppError::invalid_transition(
            "Proven delivery is asserted by the buyer, not set directly",
        ));
    }
    if !order.order_status.can_transition(target) {
        return Err(AppError::invalid_transition(format!(
            "Cannot move order from {:?} to {:?}",
            order.order_status, target
        ))
        .with_detail("from", format!("{:?}", order.order_status))
        .with_detail("to", format!("{:?}", target)));
    }
    if target == OrderStatus::Delivered && effective_payment == PaymentStatus::Pending {
        return Err(AppError::invalid_transition(
            "Cannot mark delivered while payment is pending",
        ));
    }
    Ok(())
}

/// Apply a transition: statuses (and stock restore on cancellation) change
/// in one transaction.
async fn apply_transition(
    state: &AppState,
    order: &Order,
    target: OrderStatus,
    payment_status: PaymentStatus,
) -> AppResult<()> {
    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    if target == OrderStatus::Cancelled {
        let items = order_repo::find_items_tx(tx.as_mut(), order.id).await?;
        for item in &items {
            product_repo::restore_stock(tx.as_mut(), item.product_id, item.quantity).await?;
        }
    }

    order_repo::update_statuses(tx.as_mut(), order.id, target, payment_status).await?;
    if payment_status != order.payment_status {
        // Keep the transaction record in sync within the same unit of work
        payment_repo::set_transaction_status_if_exists(tx.as_mut(), order.id, payment_status)
            .await?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(())
}

/// Staff-driven status update.
pub async fn update_status(
    state: &AppState,
    requester: &Requester,
    order_id: i64,
    req: UpdateStatusRequest,
) -> AppResult<Order> {
    requester.require_staff()?;
    let order = require_order(state, order_id).await?;

    let target = req.order_status;
    let payment_status = req.payment_status.unwrap_or(order.payment_status);
    check_transition(&order, target, payment_status)?;

    apply_transition(state, &order, target, payment_status).await?;

    tracing::info!(
        order_id,
        from = ?order.order_status,
        to = ?target,
        requester = requester.kind(),
        "Order status transition"
    );
    require_order(state, order_id).await
}

/// Delete an order, restoring every line's stock first. Owner or staff.
/// A cancelled order already gave its stock back, so only live orders
/// restore on deletion.
pub async fn delete_order(state: &AppState, requester: &Requester, order_id: i64) -> AppResult<()> {
    requester.require_user()?;
    let order = require_order(state, order_id).await?;
    if !requester.is_staff() && !requester.owns(order.user_id) {
        return Err(AppError::permission_denied("Not your order"));
    }

    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let items = order_repo::find_items_tx(tx.as_mut(), order_id).await?;
    if order.order_status != OrderStatus::Cancelled {
        for item in &items {
            product_repo::restore_stock(tx.as_mut(), item.product_id, item.quantity).await?;
        }
    }
    order_repo::delete(tx.as_mut(), order_id).await?;
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    tracing::info!(
        order_id,
        requester = requester.kind(),
        lines = items.len(),
        "Order deleted, stock restored"
    );
    Ok(())
}

fn check_provable(order: &Order) -> AppResult<()> {
    match order.order_status {
        OrderStatus::Delivered => Ok(()),
        OrderStatus::ProvenDelivered => Err(AppError::new(ErrorCode::OrderAlreadyProven)),
        other => Err(AppError::invalid_transition(format!(
            "Only delivered orders can be proven (current: {other:?})"
        ))),
    }
}

async fn record_proof(state: &AppState, order: &Order) -> AppResult<Order> {
    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    order_repo::set_proven(tx.as_mut(), order.id).await?;
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let updated = require_order(state, order.id).await?;
    state.notifier.delivery_proven(&updated).await;
    tracing::info!(order_id = order.id, "Delivery proven by buyer");
    Ok(updated)
}

/// Buyer-asserted delivery proof by order id. Owner only — staff cannot
/// prove on a buyer's behalf.
pub async fn prove_delivery(
    state: &AppState,
    requester: &Requester,
    order_id: i64,
) -> AppResult<Order> {
    requester.require_user()?;
    let order = require_order(state, order_id).await?;
    if !requester.owns(order.user_id) {
        return Err(AppError::permission_denied(
            "Only the buyer can prove delivery",
        ));
    }
    check_provable(&order)?;
    record_proof(state, &order).await
}

/// Guest variant: the plaintext code is the credential. Lookup is the
/// hash scan; any miss is NotFound, indistinguishable from a bad code.
pub async fn prove_delivery_by_code(state: &AppState, code: &str) -> AppResult<Order> {
    let Some(order_id) = guest_code::find_guest_order(&state.db.pool, code).await? else {
        return Err(AppError::new(ErrorCode::OrderNotFound));
    };
    let order = require_order(state, order_id).await?;
    check_provable(&order)?;
    record_proof(state, &order).await
}

/// QR-scan verification at handoff: staff-asserted "delivered", distinct
/// from buyer-asserted proof. Enters the same transition contract.
pub async fn verify_qr_and_deliver(
    state: &AppState,
    requester: &Requester,
    code: &str,
) -> AppResult<Order> {
    requester.require_staff()?;

    let order = match order_repo::find_by_code_plain(&state.db.pool, code).await? {
        Some(order) => order,
        None => {
            let Some(order_id) = guest_code::find_guest_order(&state.db.pool, code).await? else {
                return Err(AppError::new(ErrorCode::OrderNotFound));
            };
            require_order(state, order_id).await?
        }
    };

    check_transition(&order, OrderStatus::Delivered, order.payment_status)?;
    apply_transition(state, &order, OrderStatus::Delivered, order.payment_status).await?;

    tracing::info!(
        order_id = order.id,
        from = ?order.order_status,
        requester = requester.kind(),
        "QR verification: order delivered"
    );
    require_order(state, order.id).await
}
