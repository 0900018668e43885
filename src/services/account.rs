//! Account service — signup, password login, profile documents.
//!
//! DESIGN
//! ======
//! Passwords are stored as Argon2id PHC strings. Signup and login both end by
//! issuing a session token so the client can go straight to authenticated
//! calls. Roles are self-selected between traveler and guide; `admin` is only
//! ever granted out of band.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::session::{self, SessionUser};
use super::validation::{self, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Traveler,
    Guide,
    Admin,
}

impl Role {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "traveler" => Some(Self::Traveler),
            "guide" => Some(Self::Guide),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Traveler => "traveler",
            Self::Guide => "guide",
            Self::Admin => "admin",
        }
    }

    /// Roles a user may pick for themselves.
    #[must_use]
    pub fn self_assignable(self) -> bool {
        !matches!(self, Self::Admin)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("role cannot be self-assigned")]
    RoleNotAllowed,
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<String>,
}

/// Result of a successful signup or login.
#[derive(Debug, Serialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: SessionUser,
}

/// Admin listing row.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AccountError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Argon2 is CPU bound; keep it off the async workers.
async fn hash_password_blocking(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::Hash(e.to_string()))?
}

async fn verify_password_blocking(password: String, stored: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .unwrap_or(false)
}

fn parse_signup_role(raw: Option<&str>) -> Result<Role, AccountError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Role::Traveler);
    };
    match Role::parse(raw) {
        Some(role) if role.self_assignable() => Ok(role),
        _ => Err(AccountError::RoleNotAllowed),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Create an account and open its first session.
pub async fn signup(pool: &PgPool, input: SignupInput) -> Result<AuthGrant, AccountError> {
    let email = validation::normalize_email(&input.email).ok_or(ValidationError::InvalidEmail)?;
    let name = validation::required("name", &input.name)?;
    validation::validate_new_password(&input.password, &input.confirm_password)?;
    let role = parse_signup_role(input.role.as_deref())?;
    let password_hash = hash_password_blocking(input.password).await?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, name, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&email)
    .bind(&name)
    .bind(&password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| if is_unique_violation(&e) { AccountError::EmailTaken } else { AccountError::Database(e) })?;

    let token = session::create_session(pool, id).await?;
    info!(user_id = %id, role = role.as_str(), "account created");

    Ok(AuthGrant {
        token,
        user: SessionUser { id, email, name, role, phone: None, avatar_url: None },
    })
}

/// Verify credentials and open a session.
pub async fn login(pool: &PgPool, email: &str, password: &str) -> Result<AuthGrant, AccountError> {
    let email = validation::normalize_email(email).ok_or(AccountError::InvalidCredentials)?;

    let row = sqlx::query("SELECT id, name, role, phone, avatar_url, password_hash FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    let stored: String = row.get("password_hash");
    if !verify_password_blocking(password.to_owned(), stored).await {
        return Err(AccountError::InvalidCredentials);
    }

    let id: Uuid = row.get("id");
    let role: String = row.get("role");
    let token = session::create_session(pool, id).await?;

    Ok(AuthGrant {
        token,
        user: SessionUser {
            id,
            email,
            name: row.get("name"),
            role: Role::parse(&role).unwrap_or(Role::Traveler),
            phone: row.get("phone"),
            avatar_url: row.get("avatar_url"),
        },
    })
}

/// Write the caller's profile document. Absent fields are left untouched.
pub async fn update_profile(
    pool: &PgPool,
    current: &SessionUser,
    input: ProfileInput,
) -> Result<SessionUser, AccountError> {
    let name = match input.name.as_deref() {
        Some(raw) => Some(validation::required("name", raw)?),
        None => None,
    };
    let role = match input.role.as_deref() {
        None => None,
        Some(raw) => {
            let role = Role::parse(raw).ok_or(AccountError::RoleNotAllowed)?;
            if !role.self_assignable() || current.is_admin() {
                return Err(AccountError::RoleNotAllowed);
            }
            Some(role)
        }
    };

    let row = sqlx::query(
        r"UPDATE users
          SET name = COALESCE($2, name),
              phone = COALESCE($3, phone),
              avatar_url = COALESCE($4, avatar_url),
              role = COALESCE($5, role)
          WHERE id = $1
          RETURNING id, email, name, role, phone, avatar_url",
    )
    .bind(current.id)
    .bind(name)
    .bind(validation::optional(input.phone.as_deref()))
    .bind(validation::optional(input.avatar_url.as_deref()))
    .bind(role.map(Role::as_str))
    .fetch_optional(pool)
    .await?
    .ok_or(AccountError::NotFound(current.id))?;

    let role: String = row.get("role");
    Ok(SessionUser {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        role: Role::parse(&role).unwrap_or(Role::Traveler),
        phone: row.get("phone"),
        avatar_url: row.get("avatar_url"),
    })
}

/// Replace a user's password hash. Returns `None` when no account has this email.
pub async fn set_password(pool: &PgPool, email: &str, password: &str) -> Result<Option<Uuid>, AccountError> {
    let password_hash = hash_password_blocking(password.to_owned()).await?;
    let id: Option<Uuid> = sqlx::query_scalar("UPDATE users SET password_hash = $2 WHERE email = $1 RETURNING id")
        .bind(email)
        .bind(password_hash)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<UserSummary>, AccountError> {
    let rows = sqlx::query("SELECT id, email, name, role, created_at FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let role: String = r.get("role");
            UserSummary {
                id: r.get("id"),
                email: r.get("email"),
                name: r.get("name"),
                role: Role::parse(&role).unwrap_or(Role::Traveler),
                created_at: r.get("created_at"),
            }
        })
        .collect())
}

/// Delete an account. Owned documents go with it via foreign-key cascades;
/// reviews about the user as a guide have no foreign key and are removed here.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<(), AccountError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM reviews WHERE target_kind = 'guide' AND target_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AccountError::NotFound(user_id));
    }
    tx.commit().await?;
    info!(%user_id, "account deleted");
    Ok(())
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
