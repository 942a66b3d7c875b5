//! Debounced "session expired" handling.
//!
//! Concurrent 401s collapse into a single notification and a single session
//! teardown per debounce window. Every call still rejects with
//! `HttpError::Unauthorized`; only the side effects are debounced.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::Sleeper;
use crate::session::{Notifier, SessionStore};

/// Check-and-set gate that opens once per window.
///
/// The check and the set happen under one lock, so two tasks on different
/// worker threads can never both win.
#[derive(Debug)]
pub struct UnauthorizedGuard {
    window: Duration,
    shown_at: Mutex<Option<Instant>>,
}

impl UnauthorizedGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            shown_at: Mutex::new(None),
        }
    }

    /// Returns true for the first caller in a window, false for the rest.
    pub fn try_acquire(&self) -> bool {
        let mut shown_at = self.shown_at.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match *shown_at {
            Some(at) if now.duration_since(at) < self.window => false,
            _ => {
                *shown_at = Some(now);
                true
            }
        }
    }

    /// Whether a window is currently open.
    pub fn is_active(&self) -> bool {
        let shown_at = self.shown_at.lock().unwrap_or_else(PoisonError::into_inner);
        shown_at.is_some_and(|at| at.elapsed() < self.window)
    }

    /// Close the current window early.
    pub fn reset(&self) {
        *self.shown_at.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Runs the side effects of an expired session.
pub(crate) struct UnauthorizedHandler {
    guard: UnauthorizedGuard,
    logout_delay: Duration,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    sleeper: Arc<dyn Sleeper>,
}

impl UnauthorizedHandler {
    pub(crate) fn new(
        window: Duration,
        logout_delay: Duration,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            guard: UnauthorizedGuard::new(window),
            logout_delay,
            session,
            notifier,
            sleeper,
        }
    }

    pub(crate) fn guard(&self) -> &UnauthorizedGuard {
        &self.guard
    }

    /// Log out and notify, unless that already happened in this window.
    /// Returns whether the side effects ran.
    pub(crate) fn handle(&self, message: &str) -> bool {
        if !self.guard.try_acquire() {
            tracing::debug!("Unauthorized response inside debounce window, suppressed");
            metrics::record_unauthorized(true);
            return false;
        }

        tracing::warn!(
            logout_delay_ms = self.logout_delay.as_millis() as u64,
            "Session expired, logging out"
        );
        metrics::record_unauthorized(false);
        self.schedule_log_out();
        self.notifier.show_error(message);
        true
    }

    fn schedule_log_out(&self) {
        if self.logout_delay.is_zero() {
            self.session.log_out();
            return;
        }

        let session = Arc::clone(&self.session);
        let sleeper = Arc::clone(&self.sleeper);
        let delay = self.logout_delay;
        tokio::spawn(async move {
            sleeper.sleep(delay).await;
            session.log_out();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::TokioSleeper;
    use crate::session::{MemorySession, SessionState};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingNotifier {
        errors: AtomicUsize,
    }

    impl Notifier for CountingNotifier {
        fn show_error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn show_success(&self, _message: &str) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_opens_once_per_window() {
        let guard = UnauthorizedGuard::new(Duration::from_secs(3));
        assert!(guard.try_acquire());
        assert!(!guard.try_acquire());
        assert!(guard.is_active());

        tokio::time::advance(Duration::from_millis(2_999)).await;
        assert!(!guard.try_acquire());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!guard.is_active());
        assert!(guard.try_acquire());
    }

    #[test]
    fn test_reset_reopens() {
        let guard = UnauthorizedGuard::new(Duration::from_secs(60));
        assert!(guard.try_acquire());
        guard.reset();
        assert!(guard.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_log_out() {
        let session = Arc::new(MemorySession::new(SessionState {
            access_token: Some("t".into()),
            ..SessionState::default()
        }));
        let notifier = Arc::new(CountingNotifier::default());
        let handler = UnauthorizedHandler::new(
            Duration::from_secs(3),
            Duration::from_millis(500),
            session.clone(),
            notifier.clone(),
            Arc::new(TokioSleeper),
        );

        assert!(handler.handle("expired"));
        assert!(!handler.handle("expired"));
        assert_eq!(notifier.errors.load(Ordering::SeqCst), 1);
        assert!(session.access_token().is_some());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(session.access_token().is_none());
    }
}
