//! Collaborators the pipeline consumes but does not own.
//!
//! # Data Flow
//! ```text
//! request build  → store.rs (token, tenant)
//! settle         → notify.rs (success / error toast)
//!                → i18n.rs (message text)
//! 401            → store.rs (log_out, once per debounce window)
//! ```

pub mod i18n;
pub mod notify;
pub mod store;

pub use i18n::{DefaultTranslator, Translator};
pub use notify::{Notifier, SilentNotifier, TracingNotifier};
pub use store::{MemorySession, SessionState, SessionStore};
