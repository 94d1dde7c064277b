//! Health check endpoint

use axum::{Json, extract::State};

use crate::core::AppState;

/// GET /api/health
///
/// Reports database reachability; degraded rather than erroring so load
/// balancers always get a well-formed body.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db.pool)
        .await
        .is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "order-server",
        "version": env!("CARGO_PKG_VERSION"),
        "database": if db_ok { "reachable" } else { "unreachable" },
    }))
}
