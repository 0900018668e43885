//! Password reset via emailed one-time codes.
//!
//! Creates and verifies short-lived six-character codes linked to an email.
//! Only the SHA-256 of a code is stored. A code is burned after
//! [`MAX_FAILED_ATTEMPTS`] wrong guesses.

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::account::{self, AccountError};
use super::session;
use super::validation::{self, ValidationError};

const CODE_LEN: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_FAILED_ATTEMPTS: i32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("invalid code")]
    InvalidCode,
    #[error("expired or incorrect code")]
    VerificationFailed,
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let normalized = code.trim().to_ascii_uppercase();
    if normalized.len() != CODE_LEN || !normalized.bytes().all(|c| CODE_ALPHABET.contains(&c)) {
        return None;
    }
    Some(normalized)
}

#[must_use]
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET[idx])
        })
        .collect()
}

#[must_use]
pub fn hash_code(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    hex::encode(digest)
}

/// Issue a fresh code for `email`. Returns `None` when no account exists so
/// the caller can answer identically either way.
pub async fn request_code(pool: &PgPool, email: &str) -> Result<Option<(String, String)>, ResetError> {
    let normalized = validation::normalize_email(email).ok_or(ValidationError::InvalidEmail)?;
    if !account::email_exists(pool, &normalized).await? {
        return Ok(None);
    }

    sqlx::query("DELETE FROM password_reset_codes WHERE email = $1 AND consumed_at IS NULL")
        .bind(&normalized)
        .execute(pool)
        .await?;

    let code = generate_code();
    sqlx::query("INSERT INTO password_reset_codes (email, code_hash) VALUES ($1, $2)")
        .bind(&normalized)
        .bind(hash_code(&code))
        .execute(pool)
        .await?;

    Ok(Some((normalized, code)))
}

/// Consume a code and set the new password. All existing sessions are revoked.
pub async fn confirm_reset(
    pool: &PgPool,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<Uuid, ResetError> {
    let normalized_email = validation::normalize_email(email).ok_or(ValidationError::InvalidEmail)?;
    let normalized_code = normalize_code(code).ok_or(ResetError::InvalidCode)?;
    validation::validate_new_password(new_password, new_password)?;

    let consumed = sqlx::query(
        r"UPDATE password_reset_codes
          SET consumed_at = now()
          WHERE id = (
              SELECT id
              FROM password_reset_codes
              WHERE email = $1
                AND consumed_at IS NULL
                AND expires_at > now()
              ORDER BY created_at DESC
              LIMIT 1
          )
          AND code_hash = $2
          RETURNING id",
    )
    .bind(&normalized_email)
    .bind(hash_code(&normalized_code))
    .fetch_optional(pool)
    .await?;

    if consumed.is_none() {
        sqlx::query(
            r"UPDATE password_reset_codes
              SET attempts = attempts + 1,
                  consumed_at = CASE WHEN attempts + 1 >= $2 THEN now() ELSE consumed_at END
              WHERE id = (
                  SELECT id
                  FROM password_reset_codes
                  WHERE email = $1
                    AND consumed_at IS NULL
                    AND expires_at > now()
                  ORDER BY created_at DESC
                  LIMIT 1
              )",
        )
        .bind(&normalized_email)
        .bind(MAX_FAILED_ATTEMPTS)
        .execute(pool)
        .await?;
        return Err(ResetError::VerificationFailed);
    }

    let user_id = account::set_password(pool, &normalized_email, new_password)
        .await?
        .ok_or(ResetError::VerificationFailed)?;
    let revoked = session::delete_user_sessions(pool, user_id).await?;
    tracing::info!(%user_id, revoked, "password reset completed");

    Ok(user_id)
}

#[cfg(test)]
#[path = "password_reset_test.rs"]
mod tests;
