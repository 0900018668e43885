//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool, the login rate limiter and the optional
//! outbound collaborators (payment processor, mailer). A missing
//! collaborator disables the routes that need it instead of failing startup.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::DEFAULT_COMMISSION_PERCENT;
use crate::mail::Mailer;
use crate::payments::PaymentGateway;
use crate::rate_limit::RateLimiter;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Payment processor. `None` if `STRIPE_SECRET_KEY` is not configured.
    pub payments: Option<Arc<dyn PaymentGateway>>,
    /// Webhook signing secret; webhooks are refused without it.
    pub webhook_secret: Option<String>,
    /// Outbound email. `None` if `RESEND_API_KEY` is not configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    /// Sliding-window limiter for login attempts.
    pub login_limiter: RateLimiter,
    pub commission_percent: u8,
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, login_limiter: RateLimiter) -> Self {
        Self {
            pool,
            payments: None,
            webhook_secret: None,
            mailer: None,
            login_limiter,
            commission_percent: DEFAULT_COMMISSION_PERCENT,
            cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_payments(mut self, gateway: Arc<dyn PaymentGateway>, webhook_secret: Option<String>) -> Self {
        self.payments = Some(gateway);
        self.webhook_secret = webhook_secret;
        self
    }

    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    #[must_use]
    pub fn with_commission(mut self, percent: u8) -> Self {
        self.commission_percent = percent;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
