//! Payment Application Service
//!
//! Glues gateway outcomes to durable state: every gateway call attempt
//! becomes a Payment row, settlement is recorded once in the
//! OrderTransaction, and the order's payment status is updated in the same
//! unit of work as the transaction so the two can never diverge.

use crate::auth::Requester;
use crate::core::AppState;
use crate::db::models::{
    MethodDetails, Order, Payment, PaymentProvider, PaymentState, PaymentStatus,
};
use crate::db::repository::{order as order_repo, payment as payment_repo};
use crate::payments::gateway::{ChargeOutcome, ChargeRequest};
use shared::{AppError, AppResult, ErrorCode};

/// Map a gateway attempt state onto the order-level payment status.
fn order_payment_status(state: PaymentState) -> PaymentStatus {
    match state {
        PaymentState::Completed => PaymentStatus::Paid,
        PaymentState::Pending => PaymentStatus::Pending,
        PaymentState::Refunded => PaymentStatus::Refunded,
        PaymentState::Failed | PaymentState::Cancelled => PaymentStatus::Failed,
    }
}

fn metadata_string(outcome: &ChargeOutcome) -> Option<String> {
    outcome
        .metadata
        .as_ref()
        .and_then(|m| serde_json::to_string(m).ok())
}

async fn require_order(state: &AppState, order_id: i64) -> AppResult<Order> {
    order_repo::find_by_id(&state.db.pool, order_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id))
}

/// Record settlement: upsert the 1:1 OrderTransaction and sync the order's
/// payment status in one transaction.
async fn settle(
    state: &AppState,
    order_id: i64,
    amount: f64,
    external_ref: Option<&str>,
    method: PaymentProvider,
    payment_state: PaymentState,
) -> AppResult<()> {
    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    payment_repo::upsert_transaction(tx.as_mut(), order_id, amount, external_ref, method, payment_state)
        .await?;
    order_repo::set_payment_status(tx.as_mut(), order_id, order_payment_status(payment_state))
        .await?;
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(())
}

/// Mark the order's payment as failed (no transaction row; failed attempts
/// are not settlements).
async fn mark_order_failed(state: &AppState, order_id: i64) -> AppResult<()> {
    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    order_repo::set_payment_status(tx.as_mut(), order_id, PaymentStatus::Failed).await?;
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(())
}

/// Process a payment for an order.
///
/// Idempotency boundary: an order with a COMPLETED transaction is settled
/// and will never be charged again. A failed or pending earlier attempt
/// does not block a new one; each gateway call gets its own Payment row.
pub async fn process_payment(
    state: &AppState,
    order_id: i64,
    details: MethodDetails,
) -> AppResult<Payment> {
    let order = require_order(state, order_id).await?;

    if let Some(tx) = payment_repo::find_transaction_by_order(&state.db.pool, order_id).await?
        && tx.status == PaymentState::Completed
    {
        return Err(AppError::new(ErrorCode::OrderAlreadySettled).with_detail("order_id", order_id));
    }

    let provider = details.provider();
    let gateway = state.gateways.for_provider(provider);
    let req = ChargeRequest {
        order_id,
        amount: order.total_amount,
        currency: state.config.currency.clone(),
        details,
    };

    match gateway.charge(&req).await {
        Ok(outcome) => {
            let payment = payment_repo::insert(
                &state.db.pool,
                payment_repo::PaymentInsert {
                    order_id,
                    provider,
                    external_ref: outcome.external_ref.clone(),
                    amount: order.total_amount,
                    currency: req.currency.clone(),
                    status: outcome.status,
                    error_message: None,
                    metadata: metadata_string(&outcome),
                },
            )
            .await?;

            match outcome.status {
                PaymentState::Completed => {
                    settle(
                        state,
                        order_id,
                        order.total_amount,
                        outcome.external_ref.as_deref(),
                        provider,
                        PaymentState::Completed,
                    )
                    .await?;
                }
                PaymentState::Pending => {
                    // Mobile money: stays pending until a status poll
                }
                _ => {
                    mark_order_failed(state, order_id).await?;
                }
            }

            tracing::info!(
                order_id,
                payment_id = payment.id,
                provider = provider.as_str(),
                status = ?outcome.status,
                "Payment attempt recorded"
            );
            Ok(payment)
        }
        Err(gateway_err) => {
            // Never silently dropped: the failed attempt is captured as a
            // FAILED row before the error is surfaced
            payment_repo::insert(
                &state.db.pool,
                payment_repo::PaymentInsert {
                    order_id,
                    provider,
                    external_ref: None,
                    amount: order.total_amount,
                    currency: req.currency,
                    status: PaymentState::Failed,
                    error_message: Some(gateway_err.to_string()),
                    metadata: None,
                },
            )
            .await?;
            mark_order_failed(state, order_id).await?;

            tracing::warn!(order_id, error = %gateway_err, "Payment attempt failed");
            Err(AppError::from(gateway_err).with_detail("order_id", order_id))
        }
    }
}

/// Fetch a payment, refreshing pending mobile-money attempts first.
///
/// A refresh that finds a terminal status records it and settles the order
/// if completed; refreshing an already-terminal payment is a no-op. A
/// failed poll logs and returns the stored row rather than failing a read.
pub async fn get_payment(state: &AppState, payment_id: i64) -> AppResult<Payment> {
    let payment = payment_repo::find_by_id(&state.db.pool, payment_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::PaymentNotFound).with_detail("payment_id", payment_id)
        })?;

    if payment.status != PaymentState::Pending || payment.provider != PaymentProvider::Momo {
        return Ok(payment);
    }
    let Some(ref external_ref) = payment.external_ref else {
        return Ok(payment);
    };

    let gateway = state.gateways.for_provider(PaymentProvider::Momo);
    match gateway.check_status(external_ref).await {
        Ok(outcome) if outcome.status != PaymentState::Pending => {
            payment_repo::update_status(
                &state.db.pool,
                payment.id,
                outcome.status,
                None,
                metadata_string(&outcome).as_deref(),
            )
            .await?;
            if outcome.status == PaymentState::Completed {
                settle(
                    state,
                    payment.order_id,
                    payment.amount,
                    Some(external_ref),
                    PaymentProvider::Momo,
                    PaymentState::Completed,
                )
                .await?;
            } else {
                mark_order_failed(state, payment.order_id).await?;
            }
            payment_repo::find_by_id(&state.db.pool, payment.id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))
        }
        Ok(_) => Ok(payment),
        Err(e) => {
            tracing::warn!(payment_id = payment.id, error = %e, "Status refresh failed");
            Ok(payment)
        }
    }
}

pub async fn get_payments_by_order(state: &AppState, order_id: i64) -> AppResult<Vec<Payment>> {
    require_order(state, order_id).await?;
    Ok(payment_repo::find_by_order(&state.db.pool, order_id).await?)
}

/// Refund a completed card payment. Staff only.
pub async fn refund_payment(
    state: &AppState,
    requester: &Requester,
    payment_id: i64,
) -> AppResult<Payment> {
    requester.require_staff()?;

    let payment = payment_repo::find_by_id(&state.db.pool, payment_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::PaymentNotFound).with_detail("payment_id", payment_id)
        })?;

    if payment.status == PaymentState::Refunded {
        return Err(AppError::new(ErrorCode::PaymentAlreadyRefunded));
    }
    if payment.provider != PaymentProvider::Card || payment.status != PaymentState::Completed {
        return Err(AppError::new(ErrorCode::RefundNotAllowed));
    }
    let Some(ref external_ref) = payment.external_ref else {
        return Err(AppError::new(ErrorCode::RefundNotAllowed));
    };

    let gateway = state.gateways.for_provider(PaymentProvider::Card);
    let outcome = gateway.refund(external_ref).await.map_err(AppError::from)?;

    payment_repo::update_status(
        &state.db.pool,
        payment.id,
        PaymentState::Refunded,
        None,
        metadata_string(&outcome).as_deref(),
    )
    .await?;
    settle(
        state,
        payment.order_id,
        payment.amount,
        Some(external_ref),
        PaymentProvider::Card,
        PaymentState::Refunded,
    )
    .await?;

    tracing::info!(
        payment_id = payment.id,
        order_id = payment.order_id,
        requester = requester.kind(),
        "Payment refunded"
    );

    payment_repo::find_by_id(&state.db.pool, payment.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))
}

/// Reconcile the order's payment status against its transaction record and
/// return the authoritative value.
pub async fn validate_payment_status(state: &AppState, order_id: i64) -> AppResult<PaymentStatus> {
    let order = require_order(state, order_id).await?;
    let Some(tx_row) = payment_repo::find_transaction_by_order(&state.db.pool, order_id).await?
    else {
        return Ok(order.payment_status);
    };

    let expected = order_payment_status(tx_row.status);
    if expected != order.payment_status {
        tracing::warn!(
            order_id,
            order_status = ?order.payment_status,
            transaction_status = ?tx_row.status,
            "Payment status drift repaired"
        );
        let mut tx = state
            .db
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        order_repo::set_payment_status(tx.as_mut(), order_id, expected).await?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
    }
    Ok(expected)
}
