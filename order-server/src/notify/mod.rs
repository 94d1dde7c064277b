//! Notification Collaborator
//!
//! Notification delivery (email etc.) is an external service; the order
//! core only emits fire-and-forget events through this interface.
//! Implementations must swallow their own failures — a broken notifier
//! never blocks or fails order creation or delivery proof.

use async_trait::async_trait;

use crate::db::models::Order;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Order successfully created and persisted.
    async fn order_confirmed(&self, order: &Order);

    /// Buyer recorded delivery proof.
    async fn delivery_proven(&self, order: &Order);
}

/// Default notifier: structured log lines only
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_confirmed(&self, order: &Order) {
        tracing::info!(
            order_id = order.id,
            buyer_email = %order.buyer_email,
            total = order.total_amount,
            "Order confirmed"
        );
    }

    async fn delivery_proven(&self, order: &Order) {
        tracing::info!(order_id = order.id, "Delivery proof recorded");
    }
}
