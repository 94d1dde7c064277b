//! Product Repository
//!
//! Lookup plus the inventory ledger primitives. Stock is mutated only
//! through [`reserve_stock`] / [`restore_stock`]; the conditional UPDATE in
//! `reserve_stock` is what makes check-then-decrement safe under
//! concurrency (a plain read-modify-write would race).

use super::{RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate};
use sqlx::{SqliteConnection, SqlitePool};

const PRODUCT_SELECT: &str =
    "SELECT id, name, price, stock, is_active, created_at, updated_at FROM product";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE is_active = 1 ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO product (id, name, price, stock, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.price)
    .bind(data.stock)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Atomically reserve `qty` units of stock inside the caller's transaction.
///
/// The `stock >= qty` guard is part of the UPDATE itself, so two concurrent
/// reservations can never both succeed past the last unit. Zero rows
/// affected means either the product does not exist or stock is short; the
/// caller's transaction must roll back in both cases.
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    qty: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND stock >= ?1",
    )
    .bind(qty)
    .bind(now)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product WHERE id = ?")
            .bind(product_id)
            .fetch_one(&mut *conn)
            .await?;
        if exists == 0 {
            return Err(RepoError::NotFound(format!("Product {product_id} not found")));
        }
        return Err(RepoError::InsufficientStock(product_id));
    }
    Ok(())
}

/// Unconditionally return `qty` units of stock (order cancellation/deletion).
pub async fn restore_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    qty: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE product SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3")
        .bind(qty)
        .bind(now)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn setup() -> (DbService, Product) {
        let db = DbService::new_in_memory().await.unwrap();
        let product = create(
            &db.pool,
            ProductCreate {
                name: "Widget".into(),
                price: 10.0,
                stock: 5,
            },
        )
        .await
        .unwrap();
        (db, product)
    }

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let (db, product) = setup().await;
        let mut tx = db.pool.begin().await.unwrap();
        reserve_stock(tx.as_mut(), product.id, 3).await.unwrap();
        tx.commit().await.unwrap();

        let after = find_by_id(&db.pool, product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 2);
    }

    #[tokio::test]
    async fn test_reserve_fails_on_short_stock_without_mutation() {
        let (db, product) = setup().await;
        let mut tx = db.pool.begin().await.unwrap();
        let err = reserve_stock(tx.as_mut(), product.id, 6).await.unwrap_err();
        assert!(matches!(err, RepoError::InsufficientStock(_)));
        tx.rollback().await.unwrap();

        let after = find_by_id(&db.pool, product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 5);
    }

    #[tokio::test]
    async fn test_reserve_unknown_product_is_not_found() {
        let (db, _) = setup().await;
        let mut tx = db.pool.begin().await.unwrap();
        let err = reserve_stock(tx.as_mut(), 999, 1).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_restore_increments_stock() {
        let (db, product) = setup().await;
        let mut tx = db.pool.begin().await.unwrap();
        restore_stock(tx.as_mut(), product.id, 4).await.unwrap();
        tx.commit().await.unwrap();

        let after = find_by_id(&db.pool, product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 9);
    }
}
