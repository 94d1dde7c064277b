//! Discount Pricing Resolver
//!
//! Determines the single active discount for a product at a point in time
//! and computes the discounted unit price. A daily sweep additionally
//! deactivates discounts whose window has passed; both mechanisms share
//! [`Discount::is_current`] so they can never disagree on "current".

use std::time::Duration;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::db::models::Discount;
use crate::db::repository::discount;
use crate::utils::money::{round_money, to_decimal, to_f64};
use rust_decimal::Decimal;

/// How often the expiry sweep runs
const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolve the active discount for a product at `at`.
///
/// Candidates arrive from the repository ordered by the documented
/// tie-break rule (largest percentage first, then lowest id); the first
/// one whose window contains `at` wins.
pub async fn resolve(
    pool: &SqlitePool,
    product_id: i64,
    at: i64,
) -> Result<Option<Discount>, crate::db::repository::RepoError> {
    let candidates = discount::find_for_product(pool, product_id).await?;
    Ok(candidates.into_iter().find(|d| d.is_current(at)))
}

/// Discounted unit price: `price * (1 - percentage/100)`, rounded to cents.
pub fn discounted_price(price: f64, percentage: f64) -> f64 {
    let price = to_decimal(price);
    let pct = to_decimal(percentage) / Decimal::ONE_HUNDRED;
    to_f64(round_money(price * (Decimal::ONE - pct)))
}

/// Unit price for a product at `at`, applying the active discount if any.
pub async fn effective_unit_price(
    pool: &SqlitePool,
    product_id: i64,
    base_price: f64,
    at: i64,
) -> Result<f64, crate::db::repository::RepoError> {
    match resolve(pool, product_id, at).await? {
        Some(d) => Ok(discounted_price(base_price, d.percentage)),
        None => Ok(base_price),
    }
}

/// Daily background sweep deactivating expired discounts.
///
/// Runs until the shutdown token fires. Never concurrent with itself: one
/// iteration finishes before the next tick is awaited.
pub async fn run_expiry_sweep(pool: SqlitePool, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = shared::util::now_millis();
                match discount::deactivate_expired(&pool, now).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(deactivated = n, "Discount expiry sweep"),
                    Err(e) => tracing::error!(error = %e, "Discount expiry sweep failed"),
                }
            }
            _ = shutdown.cancelled() => {
                tracing::debug!("Discount expiry sweep stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{DiscountCreate, ProductCreate};
    use crate::db::repository::product;
    use crate::utils::money::money_eq;

    #[test]
    fn test_discounted_price_rounding() {
        // 19.99 * 0.85 = 16.9915 -> 16.99
        assert!(money_eq(discounted_price(19.99, 15.0), 16.99));
        // 10.00 * 0.75 = 7.50
        assert!(money_eq(discounted_price(10.0, 25.0), 7.5));
        // 0.10 * 0.95 = 0.095 -> rounds half-up to 0.10
        assert!(money_eq(discounted_price(0.10, 5.0), 0.10));
        assert!(money_eq(discounted_price(100.0, 0.0), 100.0));
        assert!(money_eq(discounted_price(100.0, 100.0), 0.0));
    }

    #[tokio::test]
    async fn test_resolve_window_edges() {
        let db = DbService::new_in_memory().await.unwrap();
        let p = product::create(
            &db.pool,
            ProductCreate {
                name: "Widget".into(),
                price: 50.0,
                stock: 1,
            },
        )
        .await
        .unwrap();
        let d = discount::create(
            &db.pool,
            DiscountCreate {
                name: "window".into(),
                percentage: 10.0,
                start_date: 1_000,
                end_date: 2_000,
                product_ids: vec![p.id],
            },
        )
        .await
        .unwrap();

        assert!(resolve(&db.pool, p.id, 999).await.unwrap().is_none());
        assert_eq!(resolve(&db.pool, p.id, 1_000).await.unwrap().unwrap().id, d.id);
        assert_eq!(resolve(&db.pool, p.id, 1_999).await.unwrap().unwrap().id, d.id);
        assert!(resolve(&db.pool, p.id, 2_000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tie_break_largest_percentage_then_lowest_id() {
        let db = DbService::new_in_memory().await.unwrap();
        let p = product::create(
            &db.pool,
            ProductCreate {
                name: "Widget".into(),
                price: 50.0,
                stock: 1,
            },
        )
        .await
        .unwrap();
        for (name, pct) in [("five", 5.0), ("twenty", 20.0), ("ten", 10.0)] {
            discount::create(
                &db.pool,
                DiscountCreate {
                    name: name.into(),
                    percentage: pct,
                    start_date: 0,
                    end_date: i64::MAX,
                    product_ids: vec![p.id],
                },
            )
            .await
            .unwrap();
        }

        let now = shared::util::now_millis();
        let winner = resolve(&db.pool, p.id, now).await.unwrap().unwrap();
        assert_eq!(winner.name, "twenty");
    }
}
