//! Auth routes — signup, login, token verification, profile, password reset.

use axum::body::Bytes;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use super::error::{ApiError, ApiResult};
use super::extract::Json;
use crate::mail;
use crate::services::account::{self, ProfileInput, SignupInput};
use crate::services::{password_reset, session, validation};
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";
const SESSION_MAX_AGE: Duration = Duration::days(30);

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(SESSION_MAX_AGE)
        .build()
}

fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub(crate) fn request_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }
    let jar = CookieJar::from_headers(headers);
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user resolved from the request's session token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl AuthUser {
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.user.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("admin access required"))
        }
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await?
            .ok_or_else(ApiError::unauthorized)?;
        Ok(Self { user, token })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /signup` — create an account and sign in.
pub async fn signup(State(state): State<AppState>, Json(body): Json<SignupInput>) -> ApiResult<Response> {
    let grant = account::signup(&state.pool, body).await?;
    let jar = CookieJar::new().add(session_cookie(grant.token.clone(), state.cookie_secure));
    Ok((StatusCode::CREATED, jar, Json(grant)).into_response())
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// `POST /api/login` — verify credentials, rate limited per email.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> ApiResult<Response> {
    let key = body.email.trim().to_ascii_lowercase();
    if let Err(e) = state.login_limiter.check_and_record(&key) {
        tracing::warn!(error = %e, "login rate limited");
        return Err(e.into());
    }

    let grant = account::login(&state.pool, &body.email, &body.password).await?;
    state.login_limiter.reset(&key);
    tracing::info!(user_id = %grant.user.id, "login succeeded");

    let jar = CookieJar::new().add(session_cookie(grant.token.clone(), state.cookie_secure));
    Ok((jar, Json(grant)).into_response())
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

/// `POST /verifyToken` — validate a token from the header, cookie or body.
pub async fn verify_token(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let token = request_token(&headers)
        .or_else(|| {
            serde_json::from_slice::<TokenBody>(&body)
                .ok()
                .map(|b| b.token)
        })
        .ok_or_else(ApiError::unauthorized)?;

    let user = session::validate_session(&state.pool, &token)
        .await?
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Json(json!({ "valid": true, "user": user })))
}

/// `POST /register` — write the caller's profile document.
pub async fn register(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileInput>,
) -> ApiResult<Json<session::SessionUser>> {
    let user = account::update_profile(&state.pool, &auth.user, body).await?;
    Ok(Json(user))
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout` — delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }
    let jar = CookieJar::new().add(clear_session_cookie(state.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ResetRequestBody {
    pub email: String,
}

/// `POST /api/auth/password-reset/request` — email a reset code if the account exists.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetRequestBody>,
) -> ApiResult<StatusCode> {
    let Some(mailer) = state.mailer.clone() else {
        return Err(ApiError::unavailable("email delivery"));
    };
    let key = format!("reset:{}", body.email.trim().to_ascii_lowercase());
    state.login_limiter.check_and_record(&key)?;

    if let Some((email, code)) = password_reset::request_code(&state.pool, &body.email).await? {
        // Same answer either way; a delivery error must not reveal the account.
        if let Err(e) = mailer.send(mail::password_reset_email(&email, &code)).await {
            tracing::error!(error = %e, "password reset email failed");
        }
    }
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
pub struct ResetConfirmBody {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// `POST /api/auth/password-reset/confirm` — consume the code and set a new password.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetConfirmBody>,
) -> ApiResult<StatusCode> {
    let user_id = password_reset::confirm_reset(&state.pool, &body.email, &body.code, &body.new_password).await?;
    state
        .login_limiter
        .reset(&validation::normalize_email(&body.email).unwrap_or_default());
    tracing::info!(%user_id, "password reset");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
