//! Payment Gateway Interface
//!
//! One trait hides both provider protocols. The card processor returns a
//! terminal-ish status synchronously from `charge`; mobile money returns
//! `PENDING` from `charge` and only reaches a terminal state through later
//! `check_status` calls. The lifecycle manager, not the adapters, enforces
//! charge idempotency (one OrderTransaction per order).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{MethodDetails, PaymentProvider, PaymentState};
use shared::AppError;

/// Charge request passed to a gateway
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: i64,
    pub amount: f64,
    pub currency: String,
    pub details: MethodDetails,
}

/// What a provider reported for a charge, poll or refund
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub status: PaymentState,
    /// Provider-assigned reference for later polling/refunds
    pub external_ref: Option<String>,
    /// Raw provider payload worth keeping for audit/polling
    pub metadata: Option<serde_json::Value>,
}

/// Gateway failure modes
///
/// Every variant is captured into a FAILED Payment row by the service
/// layer; a gateway error never leaves the flow in limbo.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Provider authentication failed: {0}")]
    Auth(String),

    #[error("Provider call failed: {0}")]
    Network(String),

    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    #[error("Operation not supported by this provider: {0}")]
    Unsupported(&'static str),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Network("request timed out".into())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::gateway(err.to_string())
    }
}

/// Uniform payment provider interface
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    /// Initiate a charge. Synchronous providers return a terminal state;
    /// asynchronous ones return `Pending` plus a reference to poll.
    async fn charge(&self, req: &ChargeRequest) -> Result<ChargeOutcome, GatewayError>;

    /// Query the current status by provider reference. Must be safe to
    /// call repeatedly, including after a terminal status was recorded.
    async fn check_status(&self, external_ref: &str) -> Result<ChargeOutcome, GatewayError>;

    /// Refund a completed charge. Card only; others return `Unsupported`.
    async fn refund(&self, external_ref: &str) -> Result<ChargeOutcome, GatewayError>;
}

/// Provider registry, selected by payment method
#[derive(Clone)]
pub struct Gateways {
    card: Arc<dyn PaymentGateway>,
    momo: Arc<dyn PaymentGateway>,
}

impl Gateways {
    pub fn new(card: Arc<dyn PaymentGateway>, momo: Arc<dyn PaymentGateway>) -> Self {
        Self { card, momo }
    }

    pub fn for_provider(&self, provider: PaymentProvider) -> Arc<dyn PaymentGateway> {
        match provider {
            PaymentProvider::Card => self.card.clone(),
            PaymentProvider::Momo => self.momo.clone(),
        }
    }
}
