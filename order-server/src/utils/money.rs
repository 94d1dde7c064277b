//! Money helpers
//!
//! All money arithmetic goes through `rust_decimal`; f64 appears only at
//! the storage and JSON boundary. Rounding is 2 decimal places, midpoint
//! away from zero.

use rust_decimal::prelude::*;

/// Tolerance for comparing stored f64 amounts
pub const MONEY_TOLERANCE: f64 = 1e-6;

pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round to cents, half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn money_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec("10.005")), dec("10.01"));
        assert_eq!(round_money(dec("10.004")), dec("10.00"));
        assert_eq!(round_money(dec("10.995")), dec("11.00"));
    }

    #[test]
    fn test_f64_roundtrip() {
        let d = to_decimal(19.99);
        assert!(money_eq(to_f64(d), 19.99));
    }
}
