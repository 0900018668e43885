//! Traveler ↔ guide chat.
//!
//! One session per (traveler, guide) pair. Only the two participants read
//! or write its messages.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::account::Role;
use super::session::SessionUser;
use super::validation::{self, MAX_MESSAGE_LEN, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat not found: {0}")]
    NotFound(Uuid),
    #[error("guide not found: {0}")]
    GuideNotFound(Uuid),
    #[error("only travelers can start a chat")]
    NotATraveler,
    #[error("not a participant in this chat")]
    Forbidden,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChatSession {
    pub id: Uuid,
    pub traveler_id: Uuid,
    pub traveler_name: String,
    pub guide_id: Uuid,
    pub guide_name: String,
    pub last_message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity: OffsetDateTime,
}

impl ChatSession {
    #[must_use]
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.traveler_id == user_id || self.guide_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub body: String,
}

const SELECT_SESSIONS: &str = r"SELECT s.id, s.traveler_id, t.name AS traveler_name, s.guide_id, g.name AS guide_name,
           m.body AS last_message,
           COALESCE(m.created_at, s.created_at) AS last_activity
    FROM chat_sessions s
    JOIN users t ON t.id = s.traveler_id
    JOIN users g ON g.id = s.guide_id
    LEFT JOIN LATERAL (
        SELECT body, created_at FROM chat_messages
        WHERE session_id = s.id
        ORDER BY created_at DESC
        LIMIT 1
    ) m ON true";

/// Trimmed message body, 1 to `MAX_MESSAGE_LEN` characters.
pub fn validate_body(body: &str) -> Result<String, ValidationError> {
    let body = validation::required("body", body)?;
    validation::max_len("body", &body, MAX_MESSAGE_LEN)?;
    Ok(body)
}

/// Get or create the caller's session with `guide_id`.
pub async fn open_session(pool: &PgPool, user: &SessionUser, guide_id: Uuid) -> Result<ChatSession, ChatError> {
    if user.role != Role::Traveler || user.id == guide_id {
        return Err(ChatError::NotATraveler);
    }
    let is_guide: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND role = 'guide')")
        .bind(guide_id)
        .fetch_one(pool)
        .await?;
    if !is_guide {
        return Err(ChatError::GuideNotFound(guide_id));
    }

    // DO UPDATE so RETURNING yields the existing row on conflict.
    let id: Uuid = sqlx::query_scalar(
        r"INSERT INTO chat_sessions (traveler_id, guide_id) VALUES ($1, $2)
          ON CONFLICT (traveler_id, guide_id) DO UPDATE SET traveler_id = EXCLUDED.traveler_id
          RETURNING id",
    )
    .bind(user.id)
    .bind(guide_id)
    .fetch_one(pool)
    .await?;

    get_session(pool, id).await
}

async fn get_session(pool: &PgPool, id: Uuid) -> Result<ChatSession, ChatError> {
    sqlx::query_as::<_, ChatSession>(&format!("{SELECT_SESSIONS} WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ChatError::NotFound(id))
}

async fn participant_session(pool: &PgPool, user: &SessionUser, id: Uuid) -> Result<ChatSession, ChatError> {
    let session = get_session(pool, id).await?;
    if !session.is_participant(user.id) {
        return Err(ChatError::Forbidden);
    }
    Ok(session)
}

pub async fn list_sessions(pool: &PgPool, user: &SessionUser) -> Result<Vec<ChatSession>, ChatError> {
    let sessions = sqlx::query_as::<_, ChatSession>(&format!(
        "{SELECT_SESSIONS} WHERE s.traveler_id = $1 OR s.guide_id = $1 ORDER BY last_activity DESC"
    ))
    .bind(user.id)
    .fetch_all(pool)
    .await?;
    Ok(sessions)
}

pub async fn list_messages(pool: &PgPool, user: &SessionUser, session_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
    participant_session(pool, user, session_id).await?;
    let messages = sqlx::query_as::<_, ChatMessage>(
        r"SELECT id, session_id, sender_id, body, created_at
          FROM chat_messages
          WHERE session_id = $1
          ORDER BY created_at ASC",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

pub async fn post_message(
    pool: &PgPool,
    user: &SessionUser,
    session_id: Uuid,
    input: NewMessage,
) -> Result<ChatMessage, ChatError> {
    let body = validate_body(&input.body)?;
    participant_session(pool, user, session_id).await?;

    let message = sqlx::query_as::<_, ChatMessage>(
        r"INSERT INTO chat_messages (session_id, sender_id, body)
          VALUES ($1, $2, $3)
          RETURNING id, session_id, sender_id, body, created_at",
    )
    .bind(session_id)
    .bind(user.id)
    .bind(body)
    .fetch_one(pool)
    .await?;

    tracing::debug!(%session_id, sender_id = %user.id, "chat message posted");
    Ok(message)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
