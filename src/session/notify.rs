//! User-facing notification surface.

/// Where success and failure toasts go.
pub trait Notifier: Send + Sync {
    fn show_error(&self, message: &str);
    fn show_success(&self, message: &str);
}

/// Routes notifications into the log. Used by the CLI and as a default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show_error(&self, message: &str) {
        tracing::error!(target: "console_client::notify", "{message}");
    }

    fn show_success(&self, message: &str) {
        tracing::info!(target: "console_client::notify", "{message}");
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn show_error(&self, _message: &str) {}
    fn show_success(&self, _message: &str) {}
}
