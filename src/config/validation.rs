//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: the base URL parses,
//! timeouts are non-zero, header names are legal.
//! Every problem is reported, not just the first.

use reqwest::header::HeaderName;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.endpoint.base_url) {
        Ok(url) if url.cannot_be_a_base() => {
            errors.push(ValidationError::new("endpoint.base_url", "must be an absolute base URL"));
        }
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(ValidationError::new(
                "endpoint.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("endpoint.base_url", e.to_string())),
    }

    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::new("timeouts.request_ms", "must be greater than 0"));
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::new("timeouts.connect_ms", "must be greater than 0"));
    }

    if config.retries.max_delay_ms < config.retries.delay_ms {
        errors.push(ValidationError::new(
            "retries.max_delay_ms",
            "must not be smaller than retries.delay_ms",
        ));
    }

    if config.envelope.success_code.is_empty() {
        errors.push(ValidationError::new("envelope.success_code", "must not be empty"));
    }
    if config.envelope.success_code == config.envelope.unauthorized_code {
        errors.push(ValidationError::new(
            "envelope.unauthorized_code",
            "must differ from envelope.success_code",
        ));
    }

    if config.unauthorized.debounce_ms == 0 {
        errors.push(ValidationError::new("unauthorized.debounce_ms", "must be greater than 0"));
    }

    if HeaderName::from_bytes(config.tenant.header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "tenant.header",
            format!("'{}' is not a valid header name", config.tenant.header),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
