//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failed call is retryable (method and error class)
//! - Compute the delay before the next attempt
//! - Enforce the retry budget (max retries per call)
//!
//! # Design Decisions
//! - Never retry POST/PATCH unless explicitly allowed
//! - Timeouts and connect failures are always retryable; so are 408/500/502/503/504
//! - Unauthorized, cancelled and client errors are terminal

use std::time::Duration;

use reqwest::Method;

use crate::config::{BackoffStrategy, RetryConfig};
use crate::http::error::HttpError;
use crate::resilience::backoff::delay_for;

/// HTTP statuses worth another attempt.
pub const TRANSIENT_STATUSES: [u16; 5] = [408, 500, 502, 503, 504];

pub fn is_transient_status(status: u16) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// Per-client retry policy derived from [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    strategy: BackoffStrategy,
    retry_non_idempotent: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.delay_ms,
            max_delay_ms: config.max_delay_ms,
            strategy: config.backoff,
            retry_non_idempotent: config.retry_non_idempotent,
        }
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self::from_config(&RetryConfig::default())
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether `method` may be sent more than once.
    pub fn allows_method(&self, method: &Method) -> bool {
        self.retry_non_idempotent || method.is_idempotent()
    }

    /// Decide whether to retry after `retries_done` retries have already run.
    pub fn should_retry(&self, method: &Method, error: &HttpError, retries_done: u32) -> bool {
        retries_done < self.max_retries && self.allows_method(method) && error.is_transient()
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        delay_for(self.strategy, retry, self.base_delay_ms, self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}
