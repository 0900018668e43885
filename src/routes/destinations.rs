//! Destination routes. Reads are public; writes are admin-only.

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::ApiResult;
use super::extract::{Json, Path, Query};
use crate::services::destination::{self, Destination, DestinationFilter, DestinationPatch, NewDestination};
use crate::state::AppState;

/// `GET /api/destinations` — filtered, sorted listing.
pub async fn list_destinations(
    State(state): State<AppState>,
    Query(filter): Query<DestinationFilter>,
) -> ApiResult<Json<Vec<Destination>>> {
    Ok(Json(destination::list_destinations(&state.pool, &filter).await?))
}

/// `GET /api/destinations/{id}`
pub async fn get_destination(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Destination>> {
    Ok(Json(destination::get_destination(&state.pool, id).await?))
}

/// `POST /api/destinations` — admin creates a listing.
pub async fn create_destination(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewDestination>,
) -> ApiResult<(StatusCode, Json<Destination>)> {
    auth.require_admin()?;
    let created = destination::create_destination(&state.pool, body, auth.user.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /api/destinations/{id}`
pub async fn update_destination(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DestinationPatch>,
) -> ApiResult<Json<Destination>> {
    auth.require_admin()?;
    Ok(Json(destination::update_destination(&state.pool, id, body).await?))
}

/// `DELETE /api/destinations/{id}`
pub async fn delete_destination(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    destination::delete_destination(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
