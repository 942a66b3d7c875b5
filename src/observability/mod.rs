//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline produces:
//!     → logging.rs (structured log events, request id on every attempt)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - X-Request-Id is logged with every attempt
//! - Metrics go through the facade; no recorder is installed here

pub mod logging;
pub mod metrics;
