//! Payment routes — intent creation, confirmation and processor webhooks.
//!
//! The booking's payment status only moves to `paid` after the processor
//! reports a succeeded intent, either from the confirm call or from a
//! signed webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use super::extract::{Json, Path};
use crate::payments::webhook::{self, PaymentEvent};
use crate::payments::{CURRENCY, IntentStatus, PaymentGateway};
use crate::services::booking::{self, PaymentStatus};
use crate::state::AppState;

fn gateway(state: &AppState) -> ApiResult<&dyn PaymentGateway> {
    state
        .payments
        .as_deref()
        .ok_or_else(|| ApiError::unavailable("payments"))
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub intent_id: String,
    pub client_secret: Option<String>,
    pub amount_bif: i64,
    pub currency: &'static str,
}

/// `POST /api/bookings/{id}/payment-intent` — start paying for a booking.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<IntentResponse>> {
    let gateway = gateway(&state)?;
    let (found, _) = booking::get_booking_for(&state.pool, &auth.user, id).await?;
    found.ensure_payable_by(&auth.user)?;

    let intent = gateway.create_intent(found.id, found.total_bif).await?;
    booking::attach_payment_intent(&state.pool, found.id, &intent.id).await?;
    tracing::info!(booking_id = %found.id, intent_id = %intent.id, amount_bif = found.total_bif, "payment intent created");

    Ok(Json(IntentResponse {
        intent_id: intent.id,
        client_secret: intent.client_secret,
        amount_bif: found.total_bif,
        currency: CURRENCY,
    }))
}

#[derive(Deserialize)]
pub struct ConfirmBody {
    pub booking_id: Uuid,
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub booking_id: Uuid,
    pub intent_status: IntentStatus,
    pub payment_status: PaymentStatus,
}

/// `POST /api/payments/confirm` — confirm the booking's intent with a card token.
pub async fn confirm_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ConfirmBody>,
) -> ApiResult<Json<ConfirmResponse>> {
    let gateway = gateway(&state)?;
    let payment_method = body.payment_method.trim();
    if payment_method.is_empty() {
        return Err(ApiError::bad_request("payment_method is required"));
    }

    let (found, _) = booking::get_booking_for(&state.pool, &auth.user, body.booking_id).await?;
    found.ensure_payable_by(&auth.user)?;
    let intent_id = found
        .payment_intent_id
        .as_deref()
        .ok_or_else(|| ApiError::new(StatusCode::CONFLICT, "no payment intent for this booking"))?;

    let intent = gateway.confirm_intent(intent_id, payment_method).await?;
    let payment_status = if intent.status.is_paid() {
        booking::mark_paid(&state.pool, &intent.id).await?;
        PaymentStatus::Paid
    } else {
        found.payment_status
    };

    Ok(Json(ConfirmResponse { booking_id: found.id, intent_status: intent.status, payment_status }))
}

/// `POST /api/payments/webhook` — signed processor callback.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Json<serde_json::Value>> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Err(ApiError::unavailable("payment webhooks"));
    };
    let signature = headers
        .get(webhook::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("missing signature header"))?;

    let now = OffsetDateTime::now_utc().unix_timestamp();
    if let Err(e) = webhook::verify_signature(secret, signature, &body, now, webhook::DEFAULT_TOLERANCE_SECS) {
        tracing::warn!(error = %e, "webhook signature rejected");
        return Err(ApiError::bad_request(e.to_string()));
    }

    let event = webhook::parse_event(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    match event {
        PaymentEvent::Succeeded { intent_id, booking_id } => {
            let mut paid = booking::mark_paid(&state.pool, &intent_id).await?;
            if paid.is_none() {
                if let Some(booking_id) = booking_id {
                    booking::attach_payment_intent(&state.pool, booking_id, &intent_id).await?;
                    paid = booking::mark_paid(&state.pool, &intent_id).await?;
                }
            }
            if paid.is_none() {
                tracing::debug!(%intent_id, "succeeded intent matched no unpaid booking");
            }
        }
        PaymentEvent::Refunded { intent_id } => {
            booking::mark_refunded(&state.pool, &intent_id).await?;
        }
        PaymentEvent::Ignored(kind) => {
            tracing::debug!(%kind, "ignoring webhook event");
        }
    }
    Ok(Json(json!({ "received": true })))
}

#[cfg(test)]
#[path = "payments_test.rs"]
mod tests;
