//! Chat routes. Only the traveler and guide of a session can use it.

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::ApiResult;
use super::extract::{Json, Path};
use crate::services::chat::{self, ChatMessage, ChatSession, NewMessage};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OpenChatBody {
    pub guide_id: Uuid,
}

/// `POST /api/chats` — get or create the caller's chat with a guide.
pub async fn open_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<OpenChatBody>,
) -> ApiResult<Json<ChatSession>> {
    Ok(Json(chat::open_session(&state.pool, &auth.user, body.guide_id).await?))
}

/// `GET /api/chats` — newest activity first.
pub async fn list_chats(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<ChatSession>>> {
    Ok(Json(chat::list_sessions(&state.pool, &auth.user).await?))
}

/// `GET /api/chats/{id}/messages`
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    Ok(Json(chat::list_messages(&state.pool, &auth.user, id).await?))
}

/// `POST /api/chats/{id}/messages`
pub async fn post_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NewMessage>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let message = chat::post_message(&state.pool, &auth.user, id, body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
