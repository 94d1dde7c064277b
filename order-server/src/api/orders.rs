//! Order endpoints: checkout, tracking, listing, status administration,
//! delivery proof and QR verification

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use serde::Deserialize;

use super::{ApiResult, check_valid};
use crate::auth::Requester;
use crate::core::AppState;
use crate::db::models::{
    CreateGuestOrderRequest, CreateOrderRequest, Order, OrderWithItems, UpdateStatusRequest,
};
use crate::orders::lifecycle;
use crate::orders::query::{OrderFilter, Page};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/guest", post(create_guest_order))
        .route("/mine", get(my_orders))
        .route("/code/{code}", get(get_order_by_code))
        .route("/prove", post(prove_delivery_by_code))
        .route("/qr-verify", post(verify_qr))
        .route("/{id}", get(get_order).delete(delete_order))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/prove", post(prove_delivery))
}

/// POST /api/orders
async fn create_order(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<CreateOrderRequest>,
) -> ApiResult<OrderWithItems> {
    check_valid(&body)?;
    let order = lifecycle::create_order(&state, &requester, body).await?;
    Ok(Json(order))
}

/// POST /api/orders/guest
async fn create_guest_order(
    State(state): State<AppState>,
    Json(body): Json<CreateGuestOrderRequest>,
) -> ApiResult<OrderWithItems> {
    check_valid(&body)?;
    let order = lifecycle::create_guest_order(&state, body).await?;
    Ok(Json(order))
}

/// GET /api/orders
///
/// Staff see everything they filter for; buyers only ever their own.
async fn list_orders(
    State(state): State<AppState>,
    requester: Requester,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Page<Order>> {
    let page = lifecycle::list_orders(&state, &requester, filter).await?;
    Ok(Json(page))
}

/// GET /api/orders/mine
///
/// The caller's own orders, regardless of role.
async fn my_orders(
    State(state): State<AppState>,
    requester: Requester,
    Query(mut filter): Query<OrderFilter>,
) -> ApiResult<Page<Order>> {
    let (user_id, _) = requester.require_user()?;
    filter.user_id = Some(user_id);
    let page = lifecycle::list_orders(&state, &requester, filter).await?;
    Ok(Json(page))
}

/// GET /api/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<i64>,
) -> ApiResult<OrderWithItems> {
    let order = lifecycle::get_order(&state, &requester, id).await?;
    Ok(Json(order))
}

/// GET /api/orders/code/{code}
///
/// Guest tracking; no authentication, the code is the credential.
async fn get_order_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<OrderWithItems> {
    let order = lifecycle::get_order_by_code(&state, &code).await?;
    Ok(Json(order))
}

/// PATCH /api/orders/{id}/status
async fn update_status(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> ApiResult<Order> {
    let order = lifecycle::update_status(&state, &requester, id, body).await?;
    Ok(Json(order))
}

/// DELETE /api/orders/{id}
async fn delete_order(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    lifecycle::delete_order(&state, &requester, id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// POST /api/orders/{id}/prove
async fn prove_delivery(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = lifecycle::prove_delivery(&state, &requester, id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct CodeBody {
    order_code: String,
}

/// POST /api/orders/prove
///
/// Guest delivery proof; body carries the plaintext order code.
async fn prove_delivery_by_code(
    State(state): State<AppState>,
    Json(body): Json<CodeBody>,
) -> ApiResult<Order> {
    let order = lifecycle::prove_delivery_by_code(&state, &body.order_code).await?;
    Ok(Json(order))
}

/// POST /api/orders/qr-verify
///
/// Staff scans the order QR at handoff; asserts "delivered".
async fn verify_qr(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<CodeBody>,
) -> ApiResult<Order> {
    let order = lifecycle::verify_qr_and_deliver(&state, &requester, &body.order_code).await?;
    Ok(Json(order))
}
