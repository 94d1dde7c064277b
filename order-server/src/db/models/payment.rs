//! Payment Models
//!
//! Two records with different cardinality:
//!
//! - [`Payment`]: one row per gateway call attempt (retries, refunds);
//!   the audit trail of everything a provider ever told us.
//! - [`OrderTransaction`]: at most one per order, the canonical settled
//!   record the order flow reads. `Order.payment_status` is always kept
//!   consistent with it in the same unit of work.

use serde::{Deserialize, Serialize};

/// Payment provider behind a gateway adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProvider {
    Card,
    Momo,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Card => "CARD",
            PaymentProvider::Momo => "MOMO",
        }
    }
}

/// Status of a single payment attempt, as reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    /// Initiated, terminal status not yet known (mobile money)
    Pending,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentState {
    /// Terminal states need no further status polling.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentState::Pending)
    }
}

/// Method-specific charge details supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MethodDetails {
    /// Tokenized card reference from the card processor's client SDK
    Card { token: String },
    /// Payer's mobile money account number
    Momo { phone: String },
}

impl MethodDetails {
    pub fn provider(&self) -> PaymentProvider {
        match self {
            MethodDetails::Card { .. } => PaymentProvider::Card,
            MethodDetails::Momo { .. } => PaymentProvider::Momo,
        }
    }
}

/// One gateway call attempt
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub provider: PaymentProvider,
    /// Provider-assigned reference, used for status polling and refunds
    pub external_ref: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentState,
    /// Captured provider error when the attempt failed
    pub error_message: Option<String>,
    /// Free-form provider metadata (JSON text)
    pub metadata: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Canonical settled-payment record, 1:1 with an order
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderTransaction {
    pub id: i64,
    pub order_id: i64,
    pub amount: f64,
    pub external_ref: Option<String>,
    pub method: PaymentProvider,
    pub status: PaymentState,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_details_tagged_json() {
        let details: MethodDetails =
            serde_json::from_str(r#"{"method":"card","token":"tok_123"}"#).unwrap();
        assert_eq!(details.provider(), PaymentProvider::Card);

        let details: MethodDetails =
            serde_json::from_str(r#"{"method":"momo","phone":"0788123456"}"#).unwrap();
        assert_eq!(details.provider(), PaymentProvider::Momo);
    }

    #[test]
    fn test_payment_state_terminal() {
        assert!(!PaymentState::Pending.is_terminal());
        assert!(PaymentState::Completed.is_terminal());
        assert!(PaymentState::Failed.is_terminal());
        assert!(PaymentState::Refunded.is_terminal());
    }

    #[test]
    fn test_provider_serialization() {
        assert_eq!(
            serde_json::to_string(&PaymentProvider::Momo).unwrap(),
            "\"MOMO\""
        );
    }
}
