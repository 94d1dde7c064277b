//! Mobile Money Gateway
//!
//! Asynchronous provider. A charge is only a "request to pay": the call
//! returns 202 with our own reference id, and the terminal status arrives
//! through later `check_status` polls. Three independent failure points
//! exist (token fetch, request-to-pay, status query); any one of them
//! failing surfaces as a `GatewayError` which the service layer captures
//! into a FAILED Payment row.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use super::gateway::{ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway};
use crate::db::models::{MethodDetails, PaymentProvider, PaymentState};
use shared::{AppError, ErrorCode};

/// Refresh the token this long before its actual expiry
const TOKEN_EXPIRY_MARGIN_MS: i64 = 60_000;

pub struct MomoGateway {
    client: reqwest::Client,
    base_url: String,
    api_user: String,
    api_key: String,
    target_env: String,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

impl MomoGateway {
    pub fn new(
        base_url: String,
        api_user: String,
        api_key: String,
        target_env: String,
        timeout_ms: u64,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| {
                AppError::with_message(
                    ErrorCode::ConfigError,
                    format!("Failed to build momo client: {e}"),
                )
            })?;
        Ok(Self {
            client,
            base_url,
            api_user,
            api_key,
            target_env,
            token: RwLock::new(None),
        })
    }

    /// Failure point 1: token fetch. Cached until shortly before expiry.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let now = shared::util::now_millis();
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref()
                && token.expires_at > now + TOKEN_EXPIRY_MARGIN_MS
            {
                return Ok(token.access_token.clone());
            }
        }

        let resp = self
            .client
            .post(format!("{}/token", self.base_url))
            .basic_auth(&self.api_user, Some(&self.api_key))
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("token fetch failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(GatewayError::Auth(format!(
                "token fetch returned {}",
                resp.status()
            )));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Auth(format!("invalid token response: {e}")))?;

        let token = CachedToken {
            access_token: body.access_token.clone(),
            expires_at: now + body.expires_in * 1000,
        };
        *self.token.write().await = Some(token);
        Ok(body.access_token)
    }

    fn map_status(status: &str) -> PaymentState {
        match status {
            "SUCCESSFUL" => PaymentState::Completed,
            "PENDING" => PaymentState::Pending,
            _ => PaymentState::Failed,
        }
    }
}

#[async_trait]
impl PaymentGateway for MomoGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Momo
    }

    /// Failure point 2: the request-to-pay call itself.
    async fn charge(&self, req: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let MethodDetails::Momo { phone } = &req.details else {
            return Err(GatewayError::Rejected(
                "momo gateway requires mobile money details".into(),
            ));
        };

        let token = self.access_token().await?;
        let reference_id = uuid::Uuid::new_v4().to_string();

        let resp = self
            .client
            .post(format!("{}/requesttopay", self.base_url))
            .bearer_auth(&token)
            .header("X-Reference-Id", &reference_id)
            .header("X-Target-Environment", &self.target_env)
            .json(&json!({
                "amount": format!("{:.2}", req.amount),
                "currency": req.currency,
                "externalId": req.order_id.to_string(),
                "payer": {
                    "partyIdType": "MSISDN",
                    "partyId": phone,
                },
                "payerMessage": format!("Order {}", req.order_id),
                "payeeNote": format!("Order {}", req.order_id),
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!(
                "request to pay returned {status}: {body}"
            )));
        }

        // Accepted only means "initiated"; the terminal status comes from
        // a later check_status poll
        Ok(ChargeOutcome {
            status: PaymentState::Pending,
            external_ref: Some(reference_id.clone()),
            metadata: Some(json!({ "reference_id": reference_id })),
        })
    }

    /// Failure point 3: the status query (re-authenticates first).
    async fn check_status(&self, external_ref: &str) -> Result<ChargeOutcome, GatewayError> {
        let token = self.access_token().await?;

        let resp = self
            .client
            .get(format!("{}/requesttopay/{external_ref}", self.base_url))
            .bearer_auth(&token)
            .header("X-Target-Environment", &self.target_env)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GatewayError::Network(format!(
                "status query returned {}",
                resp.status()
            )));
        }

        let body: StatusResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Network(format!("invalid status response: {e}")))?;

        Ok(ChargeOutcome {
            status: Self::map_status(&body.status),
            external_ref: Some(external_ref.to_string()),
            metadata: Some(json!({
                "provider_status": body.status,
                "reason": body.reason,
            })),
        })
    }

    async fn refund(&self, _external_ref: &str) -> Result<ChargeOutcome, GatewayError> {
        Err(GatewayError::Unsupported("refund"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(MomoGateway::map_status("SUCCESSFUL"), PaymentState::Completed);
        assert_eq!(MomoGateway::map_status("PENDING"), PaymentState::Pending);
        assert_eq!(MomoGateway::map_status("FAILED"), PaymentState::Failed);
        assert_eq!(MomoGateway::map_status("REJECTED"), PaymentState::Failed);
    }
}
