//! Payment processor seam.
//!
//! DESIGN
//! ======
//! The booking flow only needs two processor calls: create an intent for a
//! booking total, and confirm it with a card token the browser collected.
//! Both sit behind [`PaymentGateway`] so routes and tests never depend on the
//! processor's HTTP API. [`stripe::StripeGateway`] is the production client;
//! [`webhook`] verifies the processor's signed callbacks.

pub mod stripe;
pub mod webhook;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// BIF is a zero-decimal currency, so amounts are whole francs.
pub const CURRENCY: &str = "bif";

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment request failed: {0}")]
    Request(String),
    #[error("payment processor rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("payment response parse failed: {0}")]
    Parse(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    #[must_use]
    pub fn is_paid(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// The subset of a processor payment intent the app reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: IntentStatus,
    pub amount: i64,
    pub currency: String,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount` whole francs tagged with the booking id.
    async fn create_intent(&self, booking_id: Uuid, amount: i64) -> Result<PaymentIntent, PaymentError>;

    /// Confirm an existing intent with a client-collected payment method token.
    async fn confirm_intent(&self, intent_id: &str, payment_method: &str) -> Result<PaymentIntent, PaymentError>;
}
