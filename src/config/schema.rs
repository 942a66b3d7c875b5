//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the console HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend endpoint settings.
    pub endpoint: EndpointConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Response envelope conventions.
    pub envelope: EnvelopeConfig,

    /// Session-expiry handling.
    pub unauthorized: UnauthorizedConfig,

    /// Multi-tenant header settings.
    pub tenant: TenantConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base URL every relative request path is joined onto.
    pub base_url: String,

    /// Send cookies along with requests.
    pub with_credentials: bool,

    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            with_credentials: false,
            user_agent: concat!("console-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Whole-request timeout in milliseconds.
    pub request_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            request_ms: 15_000,
        }
    }
}

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// The same delay before every attempt.
    #[default]
    Fixed,
    /// Doubling delay, capped, with jitter.
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (0 disables retries).
    pub max_retries: u32,

    /// Delay between attempts in milliseconds (base delay for exponential).
    pub delay_ms: u64,

    /// Upper bound for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Backoff strategy.
    pub backoff: BackoffStrategy,

    /// Also retry POST/PATCH requests.
    pub retry_non_idempotent: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff: BackoffStrategy::Fixed,
            retry_non_idempotent: false,
        }
    }
}

/// Response envelope conventions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Business code that marks success.
    pub success_code: String,

    /// Business code that marks an expired or missing session.
    /// Empty disables envelope-level unauthorized detection.
    pub unauthorized_code: String,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            success_code: "0".to_string(),
            unauthorized_code: "401".to_string(),
        }
    }
}

/// Session-expiry handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UnauthorizedConfig {
    /// Window during which repeated 401s collapse into one notification.
    pub debounce_ms: u64,

    /// Delay before the session store is torn down.
    pub logout_delay_ms: u64,
}

impl Default for UnauthorizedConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 3_000,
            logout_delay_ms: 500,
        }
    }
}

/// Multi-tenant header settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Header carrying the tenant id.
    pub header: String,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            header: "X-Tenant-Id".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
