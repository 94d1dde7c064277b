//! Card Processor Gateway
//!
//! Synchronous provider: `charge` blocks on one remote call and comes back
//! with a terminal-ish status. Refunds are a separate call, valid only for
//! completed charges (enforced by the service layer).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::gateway::{ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway};
use crate::db::models::{MethodDetails, PaymentProvider, PaymentState};
use shared::{AppError, ErrorCode};

pub struct CardGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CardChargeResponse {
    id: String,
    status: String,
    #[serde(default)]
    failure_message: Option<String>,
}

impl CardGateway {
    pub fn new(base_url: String, api_key: String, timeout_ms: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| {
                AppError::with_message(
                    ErrorCode::ConfigError,
                    format!("Failed to build card client: {e}"),
                )
            })?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn map_status(status: &str) -> PaymentState {
        match status {
            "succeeded" => PaymentState::Completed,
            "processing" => PaymentState::Pending,
            "cancelled" => PaymentState::Cancelled,
            "refunded" => PaymentState::Refunded,
            _ => PaymentState::Failed,
        }
    }

    fn outcome(resp: CardChargeResponse) -> ChargeOutcome {
        let status = Self::map_status(&resp.status);
        let metadata = json!({
            "provider_status": resp.status,
            "failure_message": resp.failure_message,
        });
        ChargeOutcome {
            status,
            external_ref: Some(resp.id),
            metadata: Some(metadata),
        }
    }

    async fn parse(&self, resp: reqwest::Response) -> Result<CardChargeResponse, GatewayError> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!(
                "card provider returned {status}: {body}"
            )));
        }
        resp.json::<CardChargeResponse>()
            .await
            .map_err(|e| GatewayError::Network(format!("invalid card provider response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for CardGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Card
    }

    async fn charge(&self, req: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let MethodDetails::Card { token } = &req.details else {
            return Err(GatewayError::Rejected(
                "card gateway requires card details".into(),
            ));
        };

        let resp = self
            .client
            .post(format!("{}/charges", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "amount": req.amount,
                "currency": req.currency,
                "source": token,
                "reference": req.order_id.to_string(),
            }))
            .send()
            .await?;

        Ok(Self::outcome(self.parse(resp).await?))
    }

    async fn check_status(&self, external_ref: &str) -> Result<ChargeOutcome, GatewayError> {
        let resp = self
            .client
            .get(format!("{}/charges/{external_ref}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Ok(Self::outcome(self.parse(resp).await?))
    }

    async fn refund(&self, external_ref: &str) -> Result<ChargeOutcome, GatewayError> {
        let resp = self
            .client
            .post(format!("{}/charges/{external_ref}/refund", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Ok(Self::outcome(self.parse(resp).await?))
    }
}
