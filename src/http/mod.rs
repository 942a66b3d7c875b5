//! HTTP request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Domain API call (get/post/put/patch/delete/upload/download)
//!     → request.rs (route params to query or body, per-call options)
//!     → cancel.rs (register in-flight call)
//!     → client.rs (inject auth/tenant/request-id headers, send)
//!     → 401? → unauthorized.rs (debounced logout + one notification)
//!     → response.rs (parse envelope, unwrap data)
//!     → error.rs (classify failure) → resilience (retry transient ones)
//!     → notification per call options
//! ```

pub mod cancel;
pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod unauthorized;

pub use cancel::PendingRequests;
pub use client::{HttpClient, HttpClientBuilder, SuccessPredicate};
pub use error::{HttpError, HttpResult, TransportKind};
pub use request::{Payload, RequestDescriptor, RequestOptions, UploadForm, X_REQUEST_ID};
pub use response::{DownloadResponse, Envelope, RawResponse};
pub use unauthorized::UnauthorizedGuard;
