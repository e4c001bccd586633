//! Payment provider client.
//!
//! The provider is reached through the [`PaymentGateway`] trait so the
//! HTTP client can be swapped for a fake in tests. The production
//! implementation talks to the Stripe HTTP API: form-encoded requests,
//! secret-key Bearer auth, and an `Idempotency-Key` header on charge
//! creation so a retried request can never charge twice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use sugarloaf_core::CurrencyCode;

use crate::config::StripeConfig;

/// Request timeout for provider calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the payment provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (timeout, connection refused).
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The card was declined.
    #[error("charge declined: {message}")]
    Declined { message: String },

    /// Any other provider-side rejection.
    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered with a body we could not interpret.
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// A charge to be created with the provider.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Amount in minor units (cents).
    pub amount_minor: i64,
    pub currency: CurrencyCode,
    /// Opaque payment source token from the client SDK.
    pub source_token: String,
    /// Caller-derived idempotency key; identical keys never charge twice.
    pub idempotency_key: String,
    pub description: String,
}

/// Provider-side identifier of a successful charge.
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub transaction_id: String,
}

/// Provider-side identifier of a successful refund.
#[derive(Debug, Clone)]
pub struct RefundReceipt {
    pub refund_id: String,
}

/// Abstraction over the payment provider. Injected into `AppState` at
/// construction; tests substitute a fake.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the provider rejects or cannot be
    /// reached; no money has moved unless `Ok` is returned.
    async fn create_charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, GatewayError>;

    /// Refund a previously created charge, fully or partially.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the provider rejects or cannot be
    /// reached.
    async fn create_refund(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError>;
}

/// Successful charge or refund body; both carry the object id.
#[derive(Debug, Deserialize)]
struct ObjectResponse {
    id: String,
}

/// Error envelope returned by the provider.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Production gateway against the Stripe HTTP API.
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

// Manual Debug to keep the secret key out of logs.
impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl StripeGateway {
    /// Build a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &StripeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(&str, String)],
        idempotency_key: Option<&str>,
    ) -> Result<ObjectResponse, GatewayError> {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(params);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| GatewayError::InvalidResponse(e.to_string()));
        }

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map_or_else(|_| body.clone(), |e| e.error.message);

        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(GatewayError::Declined { message });
        }
        Err(GatewayError::Api { status: status.as_u16(), message })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, GatewayError> {
        let params = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.as_provider_str().to_string()),
            ("source", request.source_token.clone()),
            ("description", request.description.clone()),
        ];

        let response = self
            .post_form("/v1/charges", &params, Some(&request.idempotency_key))
            .await?;

        Ok(ChargeReceipt { transaction_id: response.id })
    }

    async fn create_refund(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError> {
        let params = [
            ("charge", transaction_id.to_string()),
            ("amount", amount_minor.to_string()),
        ];

        let response = self.post_form("/v1/refunds", &params, None).await?;

        Ok(RefundReceipt { refund_id: response.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_the_secret_key() {
        let gateway = StripeGateway {
            client: reqwest::Client::new(),
            base_url: "https://api.stripe.com".to_string(),
            secret_key: SecretString::from("sk_test_abc123"),
        };
        let debug = format!("{gateway:?}");
        assert!(!debug.contains("sk_test_abc123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn success_body_parses_object_id() {
        let body = r#"{"id": "ch_3abc", "object": "charge", "status": "succeeded"}"#;
        let parsed: ObjectResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.id, "ch_3abc");
    }

    #[test]
    fn error_body_parses_message() {
        let body = r#"{"error": {"type": "card_error", "message": "Your card was declined."}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Your card was declined.");
    }
}
