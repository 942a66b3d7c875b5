//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level
//! - Every format writes to stderr; stdout belongs to command output

use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directive for a configured level.
pub fn default_directive(level: &str) -> String {
    format!("console_client={level},console_cli={level}")
}

/// Build the subscriber for a configuration without installing it.
pub fn subscriber(config: &ObservabilityConfig) -> Box<dyn Subscriber + Send + Sync> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        Box::new(registry.with(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        Box::new(registry.with(fmt::layer().with_writer(std::io::stderr)))
    }
}

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    subscriber(config).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("debug"), "console_client=debug,console_cli=debug");
    }

    #[test]
    fn test_json_subscriber_accepts_events() {
        let config = ObservabilityConfig {
            json_logs: true,
            ..ObservabilityConfig::default()
        };
        tracing::subscriber::with_default(subscriber(&config), || {
            tracing::info!(target: "console_client", answer = 42, "json event");
        });
    }

    #[test]
    fn test_pretty_subscriber_accepts_events() {
        let config = ObservabilityConfig::default();
        tracing::subscriber::with_default(subscriber(&config), || {
            tracing::info!(target: "console_client", "pretty event");
        });
    }
}
