//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline attempt fails:
//!     → retries.rs (is the method + error class retryable, budget left?)
//!     → backoff.rs (fixed or exponential delay)
//!     → sleep.rs (injected sleeper waits, racing the cancel token)
//!     → next attempt
//! ```
//!
//! # Design Decisions
//! - Every call has a deadline (reqwest timeout); timeouts are retryable
//! - Retries only for idempotent requests unless configured otherwise
//! - Sleeping is a trait so tests never wait on wall-clock time

pub mod backoff;
pub mod retries;
pub mod sleep;

pub use retries::{is_transient_status, RetryPolicy};
pub use sleep::{Sleeper, TokioSleeper};
