//! Translation of the pipeline's own user-facing messages.

use std::collections::HashMap;

pub const REQUEST_FAILED: &str = "httpMsg.requestFailed";
pub const UNAUTHORIZED: &str = "httpMsg.unauthorized";
pub const REQUEST_CONFIG_ERROR: &str = "httpMsg.requestConfigError";
pub const REQUEST_TIMEOUT: &str = "httpMsg.requestTimeout";
pub const NETWORK_ERROR: &str = "httpMsg.networkError";
pub const DECODE_ERROR: &str = "httpMsg.decodeError";

/// Resolves a message key to display text.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// English catalog for the `httpMsg.*` keys, with optional overrides.
///
/// Unknown keys come back unchanged.
#[derive(Debug, Clone, Default)]
pub struct DefaultTranslator {
    overrides: HashMap<String, String>,
}

impl DefaultTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text for `key`.
    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), text.into());
        self
    }

    fn builtin(key: &str) -> Option<&'static str> {
        Some(match key {
            REQUEST_FAILED => "Request failed",
            UNAUTHORIZED => "Your session has expired, please log in again",
            REQUEST_CONFIG_ERROR => "Request configuration error",
            REQUEST_TIMEOUT => "Request timed out",
            NETWORK_ERROR => "Network error, please check your connection",
            DECODE_ERROR => "Unexpected response from server",
            _ => return None,
        })
    }
}

impl Translator for DefaultTranslator {
    fn translate(&self, key: &str) -> String {
        if let Some(text) = self.overrides.get(key) {
            return text.clone();
        }
        Self::builtin(key).map_or_else(|| key.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_and_fallback() {
        let t = DefaultTranslator::new();
        assert_eq!(t.translate(REQUEST_TIMEOUT), "Request timed out");
        assert_eq!(t.translate("menu.users"), "menu.users");
    }

    #[test]
    fn test_override() {
        let t = DefaultTranslator::new().with(UNAUTHORIZED, "登录已过期");
        assert_eq!(t.translate(UNAUTHORIZED), "登录已过期");
    }
}
