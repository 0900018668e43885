//! Typed configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` (if present) and then builds an [`AppConfig`]. Optional
//! collaborators (payment processor, email delivery) are `None` when their
//! credentials are absent; the routes that need them answer 503.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
pub const DEFAULT_COMMISSION_PERCENT: u8 = 20;
pub const DEFAULT_STRIPE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Payment processor credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl StripeConfig {
    /// Load from `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`, `STRIPE_API_BASE`.
    /// Returns `None` when no secret key is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let secret_key = non_empty_var("STRIPE_SECRET_KEY")?;
        let webhook_secret = non_empty_var("STRIPE_WEBHOOK_SECRET");
        let api_base = non_empty_var("STRIPE_API_BASE")
            .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let timeout = Duration::from_secs(env_parse("STRIPE_TIMEOUT_SECS", DEFAULT_STRIPE_TIMEOUT_SECS));
        Some(Self { secret_key, webhook_secret, api_base, timeout })
    }
}

/// Email delivery credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub api_key: String,
    pub from: String,
}

impl MailConfig {
    /// Load from `RESEND_API_KEY` and `RESEND_FROM`. Both are required.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_var("RESEND_API_KEY")?;
        let from = non_empty_var("RESEND_FROM")?;
        Some(Self { api_key, from })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub cookie_secure: bool,
    /// Share of paid booking revenue kept by the platform, in percent.
    pub commission_percent: u8,
    pub stripe: Option<StripeConfig>,
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    /// Build the application config from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing, or `PORT` /
    /// `PLATFORM_COMMISSION_PERCENT` do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = non_empty_var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse_var("PORT", DEFAULT_PORT)?;
        let commission_percent = parse_var("PLATFORM_COMMISSION_PERCENT", DEFAULT_COMMISSION_PERCENT)?;
        if commission_percent > 100 {
            return Err(ConfigError::Invalid {
                key: "PLATFORM_COMMISSION_PERCENT",
                value: commission_percent.to_string(),
            });
        }

        Ok(Self {
            database_url,
            port,
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
            commission_percent,
            stripe: StripeConfig::from_env(),
            mail: MailConfig::from_env(),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
