//! Admin user management.

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use super::extract::{Json, Path};
use crate::services::account::{self, UserSummary};
use crate::state::AppState;

/// `GET /api/admin/users`
pub async fn list_users(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<UserSummary>>> {
    auth.require_admin()?;
    Ok(Json(account::list_users(&state.pool).await?))
}

/// `DELETE /api/admin/users/{id}` — admins cannot delete themselves.
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require_admin()?;
    if id == auth.user.id {
        return Err(ApiError::bad_request("cannot delete your own account"));
    }
    account::delete_user(&state.pool, id).await?;
    tracing::info!(admin_id = %auth.user.id, user_id = %id, "user deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
