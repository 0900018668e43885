//! Review routes for destinations and guides.

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::ApiResult;
use super::extract::{Json, Path};
use crate::services::review::{self, NewReview, Review, ReviewTarget};
use crate::state::AppState;

/// `GET /api/destinations/{id}/reviews`
pub async fn list_destination_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(review::list_reviews(&state.pool, ReviewTarget::Destination, id).await?))
}

/// `POST /api/destinations/{id}/reviews`
pub async fn create_destination_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NewReview>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let created = review::create_review(&state.pool, &auth.user, ReviewTarget::Destination, id, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/guides/{id}/reviews`
pub async fn list_guide_reviews(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(review::list_reviews(&state.pool, ReviewTarget::Guide, id).await?))
}

/// `POST /api/guides/{id}/reviews` — requires a completed tour with the guide.
pub async fn create_guide_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NewReview>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let created = review::create_review(&state.pool, &auth.user, ReviewTarget::Guide, id, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
