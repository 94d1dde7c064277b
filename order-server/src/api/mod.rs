//! API routes for order-server

pub mod health;
pub mod orders;
pub mod payments;

use axum::{Json, Router, routing::get};
use shared::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::core::AppState;

/// Handler result: JSON body or an [`AppError`] rendered by its
/// IntoResponse impl
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Run `validator` checks on a request body, flattening field errors into
/// the error details map.
pub fn check_valid<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(|errors| {
        let mut err = AppError::validation("Request validation failed");
        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            err = err.with_detail(field.to_string(), messages.join(", "));
        }
        err
    })
}

/// Create the combined router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/orders", orders::router())
        .nest("/api/payments", payments::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CreateOrderRequest;

    #[test]
    fn test_check_valid_reports_fields() {
        let body: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "buyer_email": "not-an-email",
            "buyer_name": "",
            "items": []
        }))
        .unwrap();
        let err = check_valid(&body).unwrap_err();
        let details = err.details.unwrap();
        assert!(details.contains_key("buyer_email"));
        assert!(details.contains_key("buyer_name"));
        assert!(details.contains_key("items"));
    }
}
