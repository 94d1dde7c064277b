//! Payment endpoints: charge, status refresh, refund, reconciliation

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;

use super::ApiResult;
use crate::auth::Requester;
use crate::core::AppState;
use crate::db::models::{MethodDetails, Payment, PaymentStatus};
use crate::db::repository::{order as order_repo, payment as payment_repo};
use crate::payments::service;
use shared::{AppError, ErrorCode};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/card", post(process_card))
        .route("/momo", post(process_momo))
        .route("/{id}", get(get_payment))
        .route("/{id}/refund", post(refund))
        .route("/order/{order_id}", get(payments_by_order))
        .route("/order/{order_id}/validate", post(validate_status))
}

/// Staff pass; buyers must own the order. Guest orders have no owner and
/// are only payable through staff channels.
async fn authorize_for_order(
    state: &AppState,
    requester: &Requester,
    order_id: i64,
) -> Result<(), AppError> {
    requester.require_user()?;
    if requester.is_staff() {
        return Ok(());
    }
    let order = order_repo::find_by_id(&state.db.pool, order_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id))?;
    if !requester.owns(order.user_id) {
        return Err(AppError::permission_denied("Not your order"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CardPaymentBody {
    order_id: i64,
    token: String,
}

/// POST /api/payments/card
async fn process_card(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<CardPaymentBody>,
) -> ApiResult<Payment> {
    authorize_for_order(&state, &requester, body.order_id).await?;
    let payment = service::process_payment(
        &state,
        body.order_id,
        MethodDetails::Card { token: body.token },
    )
    .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
struct MomoPaymentBody {
    order_id: i64,
    phone: String,
}

/// POST /api/payments/momo
async fn process_momo(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<MomoPaymentBody>,
) -> ApiResult<Payment> {
    authorize_for_order(&state, &requester, body.order_id).await?;
    let payment = service::process_payment(
        &state,
        body.order_id,
        MethodDetails::Momo { phone: body.phone },
    )
    .await?;
    Ok(Json(payment))
}

/// GET /api/payments/{id}
///
/// Pending mobile-money payments are refreshed against the provider
/// before being returned.
async fn get_payment(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<i64>,
) -> ApiResult<Payment> {
    // Authorize against the stored row before the refresh side effects
    let stored = payment_repo::find_by_id(&state.db.pool, id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound).with_detail("payment_id", id))?;
    authorize_for_order(&state, &requester, stored.order_id).await?;

    let payment = service::get_payment(&state, id).await?;
    Ok(Json(payment))
}

/// GET /api/payments/order/{order_id}
async fn payments_by_order(
    State(state): State<AppState>,
    requester: Requester,
    Path(order_id): Path<i64>,
) -> ApiResult<Vec<Payment>> {
    authorize_for_order(&state, &requester, order_id).await?;
    let payments = service::get_payments_by_order(&state, order_id).await?;
    Ok(Json(payments))
}

/// POST /api/payments/{id}/refund
async fn refund(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<i64>,
) -> ApiResult<Payment> {
    let payment = service::refund_payment(&state, &requester, id).await?;
    Ok(Json(payment))
}

/// POST /api/payments/order/{order_id}/validate
///
/// Reconciles the order's payment status with its transaction record.
async fn validate_status(
    State(state): State<AppState>,
    requester: Requester,
    Path(order_id): Path<i64>,
) -> ApiResult<PaymentStatus> {
    requester.require_staff()?;
    let status = service::validate_payment_status(&state, order_id).await?;
    Ok(Json(status))
}
