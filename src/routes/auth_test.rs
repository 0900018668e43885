use super::*;
use axum::http::{HeaderMap, HeaderValue, header};

use crate::state::test_helpers::test_app_state;

fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
    }
    map
}

#[test]
fn bearer_token_is_preferred() {
    let map = headers(&[
        (header::AUTHORIZATION, "Bearer abc123"),
        (header::COOKIE, "session_token=from-cookie"),
    ]);
    assert_eq!(request_token(&map).as_deref(), Some("abc123"));
}

#[test]
fn cookie_token_is_fallback() {
    let map = headers(&[(header::COOKIE, "theme=dark; session_token=from-cookie")]);
    assert_eq!(request_token(&map).as_deref(), Some("from-cookie"));
}

#[test]
fn missing_or_blank_tokens_are_none() {
    assert_eq!(request_token(&HeaderMap::new()), None);
    assert_eq!(request_token(&headers(&[(header::AUTHORIZATION, "Bearer   ")])), None);
    assert_eq!(request_token(&headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")])), None);
    assert_eq!(request_token(&headers(&[(header::COOKIE, "session_token=")])), None);
}

#[test]
fn session_cookie_attributes() {
    let cookie = session_cookie("tok".into(), true);
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.max_age(), Some(SESSION_MAX_AGE));

    let cleared = clear_session_cookie(false);
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.max_age(), Some(Duration::ZERO));
}

#[tokio::test]
async fn login_is_rate_limited_before_db() {
    let state = crate::state::test_helpers::test_app_state_with_limit(0);
    let body = LoginBody { email: "Amani@Example.com".into(), password: "secret1".into() };
    let err = login(State(state), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(err.retry_after.is_some());
}

#[tokio::test]
async fn password_reset_needs_a_mailer() {
    let body = ResetRequestBody { email: "amani@example.com".into() };
    let err = request_password_reset(State(test_app_state()), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn admin_guard() {
    use crate::services::account::Role;
    let mut auth = AuthUser {
        user: session::SessionUser {
            id: uuid::Uuid::new_v4(),
            email: "a@example.com".into(),
            name: "A".into(),
            role: Role::Traveler,
            phone: None,
            avatar_url: None,
        },
        token: String::new(),
    };
    assert_eq!(auth.require_admin().unwrap_err().status, StatusCode::FORBIDDEN);
    auth.user.role = Role::Admin;
    assert!(auth.require_admin().is_ok());
}

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use std::sync::Arc;

    use crate::rate_limit::{RateLimitConfig, RateLimiter};
    use crate::state::test_helpers::live::{FailingMailer, pool, seed_user};

    #[tokio::test]
    async fn reset_request_answers_the_same_when_delivery_fails() {
        let pool = pool().await;
        let state = AppState::new(pool.clone(), RateLimiter::new(RateLimitConfig::default()))
            .with_mailer(Arc::new(FailingMailer));
        let grant = seed_user(&pool, "traveler").await;

        let unknown = format!("nobody-{}@example.com", uuid::Uuid::new_v4());
        for email in [grant.user.email.clone(), unknown] {
            let body = ResetRequestBody { email };
            let status = request_password_reset(State(state.clone()), Json(body)).await.unwrap();
            assert_eq!(status, StatusCode::ACCEPTED);
        }

        account::delete_user(&pool, grant.user.id).await.unwrap();
    }
}
