//! Console API client library.
//!
//! A shared HTTP pipeline for admin-console backends: auth and tenant header
//! injection, response-envelope unwrapping, transient-failure retry and a
//! debounced session-expiry handler.
//!
//! ```text
//!   domain API (auth, users, roles, ...)
//!        │ get/post/put/patch/delete/upload/download
//!        ▼
//!   ┌──────────────────────── http ────────────────────────┐
//!   │ request → headers (session) → send → 401? → envelope │
//!   │    ▲                                     │           │
//!   │    └──────── resilience (retry) ◀────────┘           │
//!   └───────────────────────────────────────────────────────┘
//!        │ notifications / logout
//!        ▼
//!   session (store, notifier, translator)
//! ```

pub mod api;
pub mod config;
pub mod http;
pub mod observability;
pub mod resilience;
pub mod session;

pub use config::ClientConfig;
pub use http::{HttpClient, HttpError, HttpResult, RequestOptions};
