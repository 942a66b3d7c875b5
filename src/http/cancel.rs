//! Registry of in-flight calls, so they can be cancelled in bulk
//! (on logout, on route change) or by URL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Method;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct PendingEntry {
    method: Method,
    url: String,
    token: CancellationToken,
}

/// Thread-safe set of pending calls.
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    entries: Arc<DashMap<u64, PendingEntry>>,
    next_id: Arc<AtomicU64>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a call. The entry is removed when the guard drops.
    ///
    /// The registered token is a child of `parent` when one is given, so
    /// cancelling through the registry never cancels the caller's own token.
    pub fn register(
        &self,
        method: &Method,
        url: &str,
        parent: Option<&CancellationToken>,
    ) -> PendingGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);

        self.entries.insert(
            id,
            PendingEntry {
                method: method.clone(),
                url: url.to_string(),
                token: token.clone(),
            },
        );

        PendingGuard {
            id,
            entries: Arc::clone(&self.entries),
            token,
        }
    }

    /// Cancel every pending call. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let mut count = 0;
        for entry in self.entries.iter() {
            entry.token.cancel();
            count += 1;
        }
        if count > 0 {
            tracing::info!(count, "Cancelled all pending requests");
        }
        count
    }

    /// Cancel pending calls whose URL matches exactly.
    pub fn cancel_by_url(&self, url: &str) -> usize {
        let mut count = 0;
        for entry in self.entries.iter().filter(|e| e.url == url) {
            tracing::debug!(method = %entry.method, url = %entry.url, "Cancelling pending request");
            entry.token.cancel();
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keeps a call registered while it is in flight.
#[derive(Debug)]
pub struct PendingGuard {
    id: u64,
    entries: Arc<DashMap<u64, PendingEntry>>,
    token: CancellationToken,
}

impl PendingGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.entries.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_deregisters_on_drop() {
        let pending = PendingRequests::new();
        let guard = pending.register(&Method::GET, "/a", None);
        assert_eq!(pending.len(), 1);
        drop(guard);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_cancel_by_url() {
        let pending = PendingRequests::new();
        let a = pending.register(&Method::GET, "/a", None);
        let b = pending.register(&Method::GET, "/b", None);

        assert_eq!(pending.cancel_by_url("/a"), 1);
        assert!(a.token().is_cancelled());
        assert!(!b.token().is_cancelled());
    }

    #[test]
    fn test_cancel_all_spares_parent() {
        let pending = PendingRequests::new();
        let parent = CancellationToken::new();
        let a = pending.register(&Method::GET, "/a", Some(&parent));
        let b = pending.register(&Method::POST, "/b", None);

        assert_eq!(pending.cancel_all(), 2);
        assert!(a.token().is_cancelled());
        assert!(b.token().is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_parent_cancels_child() {
        let pending = PendingRequests::new();
        let parent = CancellationToken::new();
        let a = pending.register(&Method::GET, "/a", Some(&parent));
        parent.cancel();
        assert!(a.token().is_cancelled());
    }
}
