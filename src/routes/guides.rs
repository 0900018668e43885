//! Guide directory routes.

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::ApiResult;
use super::extract::{Json, Path, Query};
use crate::services::guide::{self, GuideFilter, GuideInput, GuideProfile};
use crate::state::AppState;

/// `GET /api/guides` — approved guides only.
pub async fn list_guides(
    State(state): State<AppState>,
    Query(filter): Query<GuideFilter>,
) -> ApiResult<Json<Vec<GuideProfile>>> {
    Ok(Json(guide::list_guides(&state.pool, &filter).await?))
}

/// `GET /api/guides/{id}`
pub async fn get_guide(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<GuideProfile>> {
    Ok(Json(guide::get_guide(&state.pool, id).await?))
}

/// `PUT /api/guides/me` — the caller publishes or edits their guide profile.
pub async fn upsert_my_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<GuideInput>,
) -> ApiResult<Json<GuideProfile>> {
    Ok(Json(guide::upsert_profile(&state.pool, &auth.user, body).await?))
}

#[derive(Deserialize)]
pub struct ApprovalBody {
    pub approved: bool,
}

/// `PATCH /api/guides/{id}/approval` — admin approves or suspends a guide.
pub async fn set_approval(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ApprovalBody>,
) -> ApiResult<Json<GuideProfile>> {
    auth.require_admin()?;
    Ok(Json(guide::set_approval(&state.pool, id, body.approved).await?))
}
