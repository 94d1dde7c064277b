//! Order Repository
//!
//! Persistence for the Order aggregate. Status columns are only ever
//! written through the lifecycle manager, which calls the update functions
//! here inside its own transactions.

use super::RepoResult;
use crate::db::models::{Order, OrderItem, OrderStatus, PaymentStatus};
use crate::orders::query::OrderFilter;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "id, user_id, order_code, is_guest, buyer_email, buyer_name, buyer_phone, street, city, region, postal_code, country, order_status, payment_status, total_amount, has_user_proven, notes, created_at, updated_at";

fn order_select() -> String {
    format!("SELECT {ORDER_COLUMNS} FROM orders")
}

/// Insert the order row inside the caller's transaction.
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, user_id, order_code, is_guest, buyer_email, buyer_name, buyer_phone, street, city, region, postal_code, country, order_status, payment_status, total_amount, has_user_proven, notes, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(&order.order_code)
    .bind(order.is_guest)
    .bind(&order.buyer_email)
    .bind(&order.buyer_name)
    .bind(&order.buyer_phone)
    .bind(&order.street)
    .bind(&order.city)
    .bind(&order.region)
    .bind(&order.postal_code)
    .bind(&order.country)
    .bind(order.order_status)
    .bind(order.payment_status)
    .bind(order.total_amount)
    .bind(order.has_user_proven)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert one order line inside the caller's transaction.
pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    price: f64,
) -> RepoResult<()> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO order_item (id, order_id, product_id, quantity, price) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(id)
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{} WHERE id = ?", order_select());
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Account orders store the code in plaintext; direct equality works.
pub async fn find_by_code_plain(pool: &SqlitePool, code: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{} WHERE is_guest = 0 AND order_code = ?", order_select());
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// (order id, stored code hash) for every guest order.
///
/// Guest codes are salted hashes, so lookup is a scan-and-verify over this
/// set rather than an indexed equality query.
pub async fn guest_code_rows(pool: &SqlitePool) -> RepoResult<Vec<(i64, String)>> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, order_code FROM orders WHERE is_guest = 1 ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, price FROM order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Items of an order, readable inside a transaction (stock restore paths).
pub async fn find_items_tx(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, price FROM order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Write both status columns in one statement so no observer can see a
/// half-applied pair (e.g. DELIVERED with PENDING payment).
pub async fn update_statuses(
    conn: &mut SqliteConnection,
    id: i64,
    order_status: OrderStatus,
    payment_status: PaymentStatus,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET order_status = ?1, payment_status = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(order_status)
    .bind(payment_status)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn set_payment_status(
    conn: &mut SqliteConnection,
    id: i64,
    payment_status: PaymentStatus,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE orders SET payment_status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(payment_status)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Buyer-asserted delivery proof: terminal status + proven flag together.
pub async fn set_proven(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET order_status = ?1, has_user_proven = 1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(OrderStatus::ProvenDelivered)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete the order row; items, transaction and payments cascade.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected())
}

/// Filtered page of orders.
pub async fn list(pool: &SqlitePool, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
    let mut qb = QueryBuilder::<Sqlite>::new(order_select());
    filter.push_predicates(&mut qb);
    filter.push_order_and_page(&mut qb);
    let rows = qb.build_query_as::<Order>().fetch_all(pool).await?;
    Ok(rows)
}

/// Total matching count for the same predicate set as [`list`].
pub async fn count(pool: &SqlitePool, filter: &OrderFilter) -> RepoResult<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
    filter.push_predicates(&mut qb);
    let total = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(total)
}
