mod config;
mod db;
mod mail;
mod payments;
mod rate_limit;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::mail::ResendMailer;
use crate::payments::stripe::StripeGateway;
use crate::rate_limit::{RateLimitConfig, RateLimiter};

#[tokio::main]
async fn main() {
    // Missing .env is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let pool = db::init_pool(&config.database_url)
        .await
        .expect("database init failed");

    let mut state = state::AppState::new(pool, RateLimiter::new(RateLimitConfig::from_env()))
        .with_commission(config.commission_percent)
        .with_cookie_secure(config.cookie_secure);

    match &config.stripe {
        Some(stripe) => {
            let gateway = StripeGateway::new(stripe).expect("payment client init failed");
            if stripe.webhook_secret.is_none() {
                tracing::warn!("STRIPE_WEBHOOK_SECRET not set; payment webhooks disabled");
            }
            state = state.with_payments(Arc::new(gateway), stripe.webhook_secret.clone());
            tracing::info!(api_base = %stripe.api_base, "payments enabled");
        }
        None => tracing::warn!("STRIPE_SECRET_KEY not set; payment routes disabled"),
    }

    match &config.mail {
        Some(mail) => {
            state = state.with_mailer(Arc::new(ResendMailer::new(mail)));
            tracing::info!(from = %mail.from, "email delivery enabled");
        }
        None => tracing::warn!("RESEND_API_KEY/RESEND_FROM not set; email delivery disabled"),
    }

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, commission_percent = config.commission_percent, "wanderlust listening");
    axum::serve(listener, app).await.expect("server failed");
}
