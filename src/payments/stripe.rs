//! Stripe REST client for payment intents.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::{CURRENCY, PaymentError, PaymentGateway, PaymentIntent};
use crate::config::StripeConfig;

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeGateway {
    /// Build a client from processor config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PaymentError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, secret_key: config.secret_key.clone(), api_base: config.api_base.clone() })
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
        idempotency_key: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut request = self
            .http
            .post(format!("{}/{path}", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(form);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(PaymentError::Rejected { status: status.as_u16(), message: error_message(&body) });
        }

        serde_json::from_str(&body).map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Pull the human-readable message out of a processor error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

pub(crate) fn create_intent_form(booking_id: Uuid, amount: i64) -> Vec<(&'static str, String)> {
    vec![
        ("amount", amount.to_string()),
        ("currency", CURRENCY.to_owned()),
        ("metadata[booking_id]", booking_id.to_string()),
        ("automatic_payment_methods[enabled]", "true".to_owned()),
        // confirmation happens server-side with a card token, so no redirect flows
        ("automatic_payment_methods[allow_redirects]", "never".to_owned()),
    ]
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, booking_id: Uuid, amount: i64) -> Result<PaymentIntent, PaymentError> {
        let form = create_intent_form(booking_id, amount);
        let key = format!("booking-{booking_id}-{amount}");
        self.post_form("payment_intents", &form, Some(&key)).await
    }

    async fn confirm_intent(&self, intent_id: &str, payment_method: &str) -> Result<PaymentIntent, PaymentError> {
        let form = [("payment_method", payment_method.to_owned())];
        self.post_form(&format!("payment_intents/{intent_id}/confirm"), &form, None)
            .await
    }
}

#[cfg(test)]
#[path = "stripe_test.rs"]
mod tests;
