//! Discount Repository

use super::{RepoError, RepoResult};
use crate::db::models::{Discount, DiscountCreate};
use sqlx::SqlitePool;

const DISCOUNT_SELECT: &str = "SELECT id, name, percentage, start_date, end_date, is_active, created_at, updated_at FROM discount";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Discount>> {
    let sql = format!("{DISCOUNT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Discount>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Discounts linked to a product, ordered by the resolver's tie-break rule:
/// largest percentage first, then lowest id.
pub async fn find_for_product(pool: &SqlitePool, product_id: i64) -> RepoResult<Vec<Discount>> {
    let rows = sqlx::query_as::<_, Discount>(
        "SELECT d.id, d.name, d.percentage, d.start_date, d.end_date, d.is_active, d.created_at, d.updated_at \
         FROM discount d JOIN discount_product dp ON dp.discount_id = d.id \
         WHERE dp.product_id = ? ORDER BY d.percentage DESC, d.id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: DiscountCreate) -> RepoResult<Discount> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO discount (id, name, percentage, start_date, end_date, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.percentage)
    .bind(data.start_date)
    .bind(data.end_date)
    .bind(now)
    .execute(tx.as_mut())
    .await?;

    for product_id in &data.product_ids {
        sqlx::query("INSERT INTO discount_product (discount_id, product_id) VALUES (?1, ?2)")
            .bind(id)
            .bind(product_id)
            .execute(tx.as_mut())
            .await?;
    }
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create discount".into()))
}

/// Deactivate every active discount whose window has fully passed.
///
/// Must agree with [`Discount::is_current`]: a discount is expired exactly
/// when `end_date <= now`, independent of `start_date`.
pub async fn deactivate_expired(pool: &SqlitePool, now: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE discount SET is_active = 0, updated_at = ?1 WHERE is_active = 1 AND end_date <= ?1",
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}
