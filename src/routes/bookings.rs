//! Booking routes.

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use super::extract::{Json, Path};
use crate::mail;
use crate::services::booking::{self, Booking, BookingStatus, NewBooking};
use crate::state::AppState;

/// `POST /api/bookings` — traveler books an approved guide.
pub async fn create_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewBooking>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let today = OffsetDateTime::now_utc().date();
    let created = booking::create_booking(&state.pool, &auth.user, body, today).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/bookings` — the caller's bookings as traveler or guide.
pub async fn list_bookings(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<Booking>>> {
    Ok(Json(booking::list_bookings(&state.pool, &auth.user).await?))
}

/// `GET /api/bookings/{id}`
pub async fn get_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Booking>> {
    let (found, _) = booking::get_booking_for(&state.pool, &auth.user, id).await?;
    Ok(Json(found))
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// `PATCH /api/bookings/{id}/status` — lifecycle toggle.
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Booking>> {
    let to = BookingStatus::parse(body.status.trim())
        .ok_or_else(|| ApiError::bad_request(format!("unknown status: {}", body.status)))?;
    let updated = booking::update_status(&state.pool, &auth.user, id, to).await?;

    if updated.status == BookingStatus::Confirmed {
        notify_confirmed(&state, &updated).await;
    }
    Ok(Json(updated))
}

/// Email the traveler that their tour is confirmed. Delivery failures are
/// logged and never fail the status change.
async fn notify_confirmed(state: &AppState, confirmed: &Booking) {
    let Some(mailer) = state.mailer.as_ref() else {
        tracing::debug!(booking_id = %confirmed.id, "mailer not configured; skipping confirmation email");
        return;
    };
    let email = mail::booking_confirmed_email(
        &confirmed.traveler_email,
        &confirmed.traveler_name,
        &confirmed.guide_name,
        &confirmed.tour_date.to_string(),
        confirmed.total_bif,
    );
    if let Err(e) = mailer.send(email).await {
        tracing::warn!(error = %e, booking_id = %confirmed.id, "confirmation email failed");
    }
}

#[cfg(test)]
#[path = "bookings_test.rs"]
mod tests;
