//! In-memory rate limiting for credential endpoints.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`.
//! Two limits are enforced on login and password-reset attempts:
//! - Per-key (normalized email): 5 attempts / 5 min
//! - Global: 100 attempts / min
//!
//! TRADE-OFFS
//! ==========
//! State lives in process memory, so limits reset on restart and are not
//! shared between replicas. Keys are pruned lazily when touched.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::env_parse;

const DEFAULT_PER_KEY_LIMIT: usize = 5;
const DEFAULT_PER_KEY_WINDOW_SECS: u64 = 300;

const DEFAULT_GLOBAL_LIMIT: usize = 100;
const DEFAULT_GLOBAL_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_key_limit: usize,
    pub per_key_window: Duration,
    pub global_limit: usize,
    pub global_window: Duration,
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            per_key_limit: env_parse("LOGIN_RATE_LIMIT", DEFAULT_PER_KEY_LIMIT),
            per_key_window: Duration::from_secs(env_parse("LOGIN_RATE_WINDOW_SECS", DEFAULT_PER_KEY_WINDOW_SECS)),
            global_limit: env_parse("LOGIN_GLOBAL_RATE_LIMIT", DEFAULT_GLOBAL_LIMIT),
            global_window: Duration::from_secs(env_parse(
                "LOGIN_GLOBAL_RATE_WINDOW_SECS",
                DEFAULT_GLOBAL_WINDOW_SECS,
            )),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_key_limit: DEFAULT_PER_KEY_LIMIT,
            per_key_window: Duration::from_secs(DEFAULT_PER_KEY_WINDOW_SECS),
            global_limit: DEFAULT_GLOBAL_LIMIT,
            global_window: Duration::from_secs(DEFAULT_GLOBAL_WINDOW_SECS),
        }
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("too many attempts (max {limit} per {window_secs}s)")]
    PerKeyExceeded { limit: usize, window_secs: u64 },
    #[error("service is busy (max {limit} attempts per {window_secs}s)")]
    GlobalExceeded { limit: usize, window_secs: u64 },
}

impl RateLimitError {
    /// Seconds a client should wait before retrying.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            Self::PerKeyExceeded { window_secs, .. } | Self::GlobalExceeded { window_secs, .. } => *window_secs,
        }
    }
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
    config: RateLimitConfig,
}

#[derive(Default)]
struct RateLimiterInner {
    per_key: HashMap<String, VecDeque<Instant>>,
    global: VecDeque<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self { inner: Arc::new(Mutex::new(RateLimiterInner::default())), config }
    }

    /// Check both per-key and global limits, then record the attempt.
    pub fn check_and_record(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;

        prune_window(&mut inner.global, now, cfg.global_window);
        if inner.global.len() >= cfg.global_limit {
            return Err(RateLimitError::GlobalExceeded {
                limit: cfg.global_limit,
                window_secs: cfg.global_window.as_secs(),
            });
        }

        let key_deque = inner.per_key.entry(key.to_owned()).or_default();
        prune_window(key_deque, now, cfg.per_key_window);
        if key_deque.len() >= cfg.per_key_limit {
            return Err(RateLimitError::PerKeyExceeded {
                limit: cfg.per_key_limit,
                window_secs: cfg.per_key_window.as_secs(),
            });
        }

        key_deque.push_back(now);
        inner.global.push_back(now);
        Ok(())
    }

    /// Forget a key's history, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.per_key.remove(key);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
