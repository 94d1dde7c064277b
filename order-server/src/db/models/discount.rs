//! Discount Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Percentage discount with a validity window and product associations
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    /// Percentage off, 0..=100
    pub percentage: f64,
    /// Window start (inclusive), epoch millis
    pub start_date: i64,
    /// Window end (exclusive), epoch millis
    pub end_date: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Discount {
    /// Whether this discount applies at the given instant.
    ///
    /// Single source of truth for "currently active": the on-demand price
    /// resolver and the daily expiry sweep must agree on this predicate.
    pub fn is_current(&self, at: i64) -> bool {
        self.is_active && self.start_date <= at && at < self.end_date
    }
}

/// Create discount payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DiscountCreate {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.0, max = 100.0))]
    pub percentage: f64,
    pub start_date: i64,
    pub end_date: i64,
    /// Product ids this discount applies to
    pub product_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_discount(start: i64, end: i64, active: bool) -> Discount {
        Discount {
            id: 1,
            name: "summer".into(),
            percentage: 10.0,
            start_date: start,
            end_date: end,
            is_active: active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_is_current_window_boundaries() {
        let d = make_discount(1000, 2000, true);
        assert!(!d.is_current(999));
        assert!(d.is_current(1000)); // start inclusive
        assert!(d.is_current(1999));
        assert!(!d.is_current(2000)); // end exclusive
    }

    #[test]
    fn test_inactive_discount_is_never_current() {
        let d = make_discount(1000, 2000, false);
        assert!(!d.is_current(1500));
    }
}
