//! Session state the pipeline reads on every request.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Externally owned session state.
///
/// The pipeline only reads the token and tenant at request-build time and
/// calls [`SessionStore::log_out`] when the session is found to be expired.
pub trait SessionStore: Send + Sync {
    /// Current access token, if logged in.
    fn access_token(&self) -> Option<String>;

    /// Whether tenant isolation is active.
    fn tenant_enabled(&self) -> bool;

    /// Current tenant id, if known.
    fn tenant_id(&self) -> Option<String>;

    /// Tear down the local session.
    fn log_out(&self);
}

/// Snapshot of an in-memory session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub tenant_enabled: bool,
    pub tenant_id: Option<String>,
}

/// Lock-free in-memory session store.
///
/// Readers never block writers; every update swaps in a fresh snapshot.
#[derive(Debug, Default)]
pub struct MemorySession {
    state: ArcSwap<SessionState>,
}

impl MemorySession {
    pub fn new(state: SessionState) -> Self {
        Self {
            state: ArcSwap::from_pointee(state),
        }
    }

    pub fn snapshot(&self) -> Arc<SessionState> {
        self.state.load_full()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.state.rcu(|current| SessionState {
            access_token: Some(token.clone()),
            ..(**current).clone()
        });
    }

    pub fn set_tenant_enabled(&self, enabled: bool) {
        self.state.rcu(|current| SessionState {
            tenant_enabled: enabled,
            ..(**current).clone()
        });
    }

    pub fn set_tenant_id(&self, tenant_id: Option<String>) {
        self.state.rcu(|current| SessionState {
            tenant_id: tenant_id.clone(),
            ..(**current).clone()
        });
    }

    /// True when tenant isolation is on but no tenant has been chosen yet.
    pub fn needs_tenant_code(&self) -> bool {
        let state = self.state.load();
        state.tenant_enabled && state.tenant_id.is_none()
    }
}

impl SessionStore for MemorySession {
    fn access_token(&self) -> Option<String> {
        self.state.load().access_token.clone()
    }

    fn tenant_enabled(&self) -> bool {
        self.state.load().tenant_enabled
    }

    fn tenant_id(&self) -> Option<String> {
        self.state.load().tenant_id.clone()
    }

    fn log_out(&self) {
        // Tenant isolation is a deployment property and survives logout.
        self.state.rcu(|current| SessionState {
            access_token: None,
            tenant_enabled: current.tenant_enabled,
            tenant_id: None,
        });
        tracing::info!("Session cleared");
    }
}
