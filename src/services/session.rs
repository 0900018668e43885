//! Session token management.
//!
//! ARCHITECTURE
//! ============
//! Login and signup issue long-lived opaque tokens stored in `sessions`.
//! Clients present them as `Authorization: Bearer` or via the
//! `session_token` cookie; validation joins back to `users` so a deleted
//! account invalidates its sessions through the cascade.

use rand::Rng;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::account::Role;

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Cheap shape check before touching the database.
#[must_use]
pub fn looks_like_token(token: &str) -> bool {
    token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// User row returned from session validation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl SessionUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn is_guide(&self) -> bool {
        self.role == Role::Guide
    }
}

/// Create a session for the given user, returning the token.
pub async fn create_session(pool: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
    let token = generate_token();
    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Validate a session token and return the associated user.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<SessionUser>, sqlx::Error> {
    if !looks_like_token(token) {
        return Ok(None);
    }

    let row = sqlx::query(
        r"SELECT u.id, u.email, u.name, u.role, u.phone, u.avatar_url
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| {
        let role: String = r.get("role");
        SessionUser {
            id: r.get("id"),
            email: r.get("email"),
            name: r.get("name"),
            role: Role::parse(&role).unwrap_or(Role::Traveler),
            phone: r.get("phone"),
            avatar_url: r.get("avatar_url"),
        }
    }))
}

/// Delete a session by token.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revoke every session belonging to a user.
pub async fn delete_user_sessions(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
