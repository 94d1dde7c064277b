//! Order Model
//!
//! The Order aggregate: order row, order items, and the status state
//! machine. All status writes go through the lifecycle manager in
//! `crate::orders`; nothing else touches `order_status`/`payment_status`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::payment::MethodDetails;

/// Order status state machine
///
/// ```text
/// PENDING -> PROCESSING | SHIPPED -> DELIVERED -> PROVEN_DELIVERED
///    \___________\___________/
///                 v
///             CANCELLED        (reachable from any pre-delivery status)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    ProvenDelivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the state machine allows `self -> to`.
    ///
    /// Payment-dependent rules (no DELIVERED while payment is pending) are
    /// enforced by the lifecycle manager on top of this table.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Processing | Shipped | Cancelled)
                | (Processing, Shipped | Delivered | Cancelled)
                | (Shipped, Delivered | Cancelled)
                | (Delivered, ProvenDelivered)
        )
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::ProvenDelivered | OrderStatus::Cancelled)
    }

    /// Statuses from which cancellation (with stock restore) is allowed.
    pub fn is_pre_delivery(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Shipped
        )
    }
}

/// Order-level payment status, kept consistent with the OrderTransaction row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Order row (aggregate root)
///
/// Buyer contact/address fields are a snapshot captured at order time and
/// never re-read from a user profile. `order_code` is plaintext for account
/// orders and an argon2 hash for guest orders.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    /// Owning user; None marks a guest order
    pub user_id: Option<i64>,
    pub order_code: String,
    pub is_guest: bool,
    pub buyer_email: String,
    pub buyer_name: String,
    pub buyer_phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: f64,
    pub has_user_proven: bool,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item with the unit price captured at order time
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

/// Order plus its items, the shape returned by the read surface
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One requested line of a checkout submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLine {
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// Checkout payload for authenticated buyers
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(email)]
    pub buyer_email: String,
    #[validate(length(min = 1))]
    pub buyer_name: String,
    pub buyer_phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1), nested)]
    pub items: Vec<OrderLine>,
    /// Optional immediate payment; omitted means pay later via the
    /// payment surface
    pub payment: Option<MethodDetails>,
}

/// Checkout payload for guests
///
/// Guests choose a human-readable order code used later for tracking and
/// delivery proof. The guest endpoint never takes payment details.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGuestOrderRequest {
    #[validate(length(min = 6, max = 64))]
    pub order_code: String,
    #[validate(email)]
    pub buyer_email: String,
    #[validate(length(min = 1))]
    pub buyer_name: String,
    pub buyer_phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1), nested)]
    pub items: Vec<OrderLine>,
    /// Rejected if present; kept so the legacy no-payment guest flow
    /// fails loudly instead of silently dropping the field
    pub payment: Option<MethodDetails>,
}

/// Status update payload
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Pending.can_transition(Processing));
        assert!(Processing.can_transition(Shipped));
        assert!(Shipped.can_transition(Delivered));
        assert!(Delivered.can_transition(ProvenDelivered));
    }

    #[test]
    fn test_pending_can_skip_to_shipped() {
        assert!(Pending.can_transition(Shipped));
        assert!(!Pending.can_transition(Delivered));
    }

    #[test]
    fn test_cancel_only_pre_delivery() {
        assert!(Pending.can_transition(Cancelled));
        assert!(Processing.can_transition(Cancelled));
        assert!(Shipped.can_transition(Cancelled));
        assert!(!Delivered.can_transition(Cancelled));
        assert!(!ProvenDelivered.can_transition(Cancelled));
    }

    #[test]
    fn test_terminal_statuses_admit_nothing() {
        for target in [Pending, Processing, Shipped, Delivered, ProvenDelivered, Cancelled] {
            assert!(!ProvenDelivered.can_transition(target));
            assert!(!Cancelled.can_transition(target));
        }
        assert!(ProvenDelivered.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!Delivered.can_transition(Shipped));
        assert!(!Shipped.can_transition(Pending));
        assert!(!Processing.can_transition(Pending));
    }

    #[test]
    fn test_order_line_validates_and_serializes() {
        let line: OrderLine = serde_json::from_str(r#"{"product_id":1,"quantity":0}"#).unwrap();
        assert!(line.validate().is_err());

        let line = OrderLine {
            product_id: 1,
            quantity: 2,
        };
        assert!(line.validate().is_ok());
        let json = serde_json::to_string(&line).unwrap();
        assert!(json.contains("\"product_id\":1"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ProvenDelivered).unwrap(),
            "\"PROVEN_DELIVERED\""
        );
        assert_eq!(serde_json::to_string(&Pending).unwrap(), "\"PENDING\"");
        let s: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(s, Cancelled);
    }
}
