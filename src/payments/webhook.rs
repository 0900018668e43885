//! Signed processor callbacks.
//!
//! The `Stripe-Signature` header carries `t=<unix seconds>` and one or more
//! `v1=<hex hmac>` entries. The MAC is HMAC-SHA256 over `"{t}.{raw body}"`
//! keyed by the endpoint's signing secret.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("malformed signature header")]
    MalformedHeader,
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,
    #[error("signature mismatch")]
    Mismatch,
    #[error("malformed event payload: {0}")]
    Payload(String),
}

#[derive(Debug, PartialEq, Eq)]
struct ParsedHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<ParsedHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }
    Ok(ParsedHeader { timestamp, signatures })
}

/// Compute the hex `v1` signature for a payload.
#[cfg(test)]
#[must_use]
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature header against the raw request body.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), WebhookError> {
    let parsed = parse_header(header)?;
    if now_unix.abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(WebhookError::StaleTimestamp);
    }

    let matched = parsed.signatures.iter().any(|sig| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(parsed.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(sig).is_ok()
    });

    if matched { Ok(()) } else { Err(WebhookError::Mismatch) }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Debug, Deserialize)]
struct EventObject {
    id: String,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

/// Events the booking flow reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    Succeeded { intent_id: String, booking_id: Option<Uuid> },
    Refunded { intent_id: String },
    Ignored(String),
}

/// Decode a verified event body.
pub fn parse_event(payload: &[u8]) -> Result<PaymentEvent, WebhookError> {
    let event: EventEnvelope =
        serde_json::from_slice(payload).map_err(|e| WebhookError::Payload(e.to_string()))?;
    let object = event.data.object;
    Ok(match event.kind.as_str() {
        "payment_intent.succeeded" => PaymentEvent::Succeeded {
            booking_id: object
                .metadata
                .get("booking_id")
                .and_then(|id| Uuid::parse_str(id).ok()),
            intent_id: object.id,
        },
        // refund events carry a charge; bookings are keyed by its intent
        "charge.refunded" => PaymentEvent::Refunded { intent_id: object.payment_intent.unwrap_or(object.id) },
        other => PaymentEvent::Ignored(other.to_owned()),
    })
}

#[cfg(test)]
#[path = "webhook_test.rs"]
mod tests;
