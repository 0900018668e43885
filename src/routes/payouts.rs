//! Revenue dashboard and payout routes.

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use super::extract::{Json, Path};
use crate::services::payout::{self, Payout, PayoutInput, PayoutStatus, RevenueReport};
use crate::state::AppState;

/// `GET /api/revenue` — guide share for guides, platform totals for admins.
pub async fn revenue(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<RevenueReport>> {
    Ok(Json(payout::revenue_report(&state.pool, &auth.user, state.commission_percent).await?))
}

/// `POST /api/payouts` — guide requests a withdrawal.
pub async fn request_payout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<PayoutInput>,
) -> ApiResult<(StatusCode, Json<Payout>)> {
    let created = payout::request_payout(&state.pool, &auth.user, body, state.commission_percent).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/payouts`
pub async fn list_payouts(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<Payout>>> {
    Ok(Json(payout::list_payouts(&state.pool, &auth.user).await?))
}

#[derive(Deserialize)]
pub struct DecisionBody {
    pub status: String,
}

/// `PATCH /api/payouts/{id}` — admin moves a payout through its lifecycle.
pub async fn decide_payout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<Json<Payout>> {
    auth.require_admin()?;
    let to = PayoutStatus::parse(body.status.trim())
        .ok_or_else(|| ApiError::bad_request(format!("unknown status: {}", body.status)))?;
    Ok(Json(payout::decide_payout(&state.pool, id, to).await?))
}
