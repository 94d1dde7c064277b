//! Payment Repository
//!
//! Payment attempt rows plus the 1:1 order transaction.

use super::{RepoError, RepoResult};
use crate::db::models::{OrderTransaction, Payment, PaymentProvider, PaymentState, PaymentStatus};
use sqlx::{SqliteConnection, SqlitePool};

const PAYMENT_SELECT: &str = "SELECT id, order_id, provider, external_ref, amount, currency, status, error_message, metadata, created_at, updated_at FROM payment";

const TX_SELECT: &str = "SELECT id, order_id, amount, external_ref, method, status, created_at, updated_at FROM order_transaction";

/// New payment attempt row
#[derive(Debug, Clone)]
pub struct PaymentInsert {
    pub order_id: i64,
    pub provider: PaymentProvider,
    pub external_ref: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentState,
    pub error_message: Option<String>,
    pub metadata: Option<String>,
}

pub async fn insert(pool: &SqlitePool, data: PaymentInsert) -> RepoResult<Payment> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payment (id, order_id, provider, external_ref, amount, currency, status, error_message, metadata, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
    )
    .bind(id)
    .bind(data.order_id)
    .bind(data.provider)
    .bind(&data.external_ref)
    .bind(data.amount)
    .bind(&data.currency)
    .bind(data.status)
    .bind(&data.error_message)
    .bind(&data.metadata)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create payment".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Update a payment attempt after a status poll or refund.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: PaymentState,
    error_message: Option<&str>,
    metadata: Option<&str>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE payment SET status = ?1, error_message = COALESCE(?2, error_message), metadata = COALESCE(?3, metadata), updated_at = ?4 WHERE id = ?5",
    )
    .bind(status)
    .bind(error_message)
    .bind(metadata)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_transaction_by_order(
    pool: &SqlitePool,
    order_id: i64,
) -> RepoResult<Option<OrderTransaction>> {
    let sql = format!("{TX_SELECT} WHERE order_id = ?");
    let row = sqlx::query_as::<_, OrderTransaction>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Align an existing transaction record with a manual order-level payment
/// status change. No-op when the order was never settled.
pub async fn set_transaction_status_if_exists(
    conn: &mut SqliteConnection,
    order_id: i64,
    payment_status: PaymentStatus,
) -> RepoResult<()> {
    let status = match payment_status {
        PaymentStatus::Pending => PaymentState::Pending,
        PaymentStatus::Paid => PaymentState::Completed,
        PaymentStatus::Failed => PaymentState::Failed,
        PaymentStatus::Refunded => PaymentState::Refunded,
    };
    let now = shared::util::now_millis();
    sqlx::query("UPDATE order_transaction SET status = ?1, updated_at = ?2 WHERE order_id = ?3")
        .bind(status)
        .bind(now)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Create or update the canonical settled record for an order.
///
/// The UNIQUE(order_id) constraint plus this upsert keep the transaction
/// 1:1 with its order no matter how many payment attempts happen.
pub async fn upsert_transaction(
    conn: &mut SqliteConnection,
    order_id: i64,
    amount: f64,
    external_ref: Option<&str>,
    method: PaymentProvider,
    status: PaymentState,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO order_transaction (id, order_id, amount, external_ref, method, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) \
         ON CONFLICT(order_id) DO UPDATE SET amount = excluded.amount, external_ref = excluded.external_ref, method = excluded.method, status = excluded.status, updated_at = excluded.updated_at",
    )
    .bind(id)
    .bind(order_id)
    .bind(amount)
    .bind(external_ref)
    .bind(method)
    .bind(status)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
