//! Error classification for pipeline calls.

use thiserror::Error;

use crate::resilience::retries::is_transient_status;

/// How the transport layer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The request or connection deadline elapsed.
    Timeout,
    /// No connection could be established.
    Connect,
    /// The server answered with a non-success HTTP status.
    Status,
    /// Anything else reqwest reports (body read, redirect loop, ...).
    Other,
}

/// Errors a pipeline call can settle with.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be built (bad URL, header or parameters).
    #[error("Invalid request: {0}")]
    Config(String),

    /// The envelope reported a business failure.
    #[error("{message} (code {code})")]
    Business {
        code: String,
        message: String,
        status: u16,
    },

    /// The session is missing or expired.
    #[error("{message}")]
    Unauthorized { message: String },

    /// Network failure, timeout or an error HTTP status without an envelope.
    #[error("{message}")]
    Transport {
        kind: TransportKind,
        status: Option<u16>,
        message: String,
    },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Result type for pipeline calls.
pub type HttpResult<T> = Result<T, HttpError>;

impl HttpError {
    /// Business code, if the failure came from an envelope.
    pub fn code(&self) -> Option<&str> {
        match self {
            HttpError::Business { code, .. } => Some(code),
            _ => None,
        }
    }

    /// HTTP status the failure arrived with, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Business { status, .. } => Some(*status),
            HttpError::Unauthorized { .. } => Some(401),
            HttpError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, HttpError::Unauthorized { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpError::Cancelled)
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Business failures count only when the server also flagged the response
    /// with a transient HTTP status.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Transport { kind, status, .. } => match kind {
                TransportKind::Timeout | TransportKind::Connect => true,
                TransportKind::Status => status.is_some_and(is_transient_status),
                TransportKind::Other => false,
            },
            HttpError::Business { status, .. } => is_transient_status(*status),
            _ => false,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind_label(&self) -> &'static str {
        match self {
            HttpError::Config(_) => "config",
            HttpError::Business { .. } => "business",
            HttpError::Unauthorized { .. } => "unauthorized",
            HttpError::Transport { .. } => "transport",
            HttpError::Cancelled => "cancelled",
            HttpError::Decode(_) => "decode",
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else if err.is_status() {
            TransportKind::Status
        } else if err.is_builder() {
            return HttpError::Config(err.to_string());
        } else if err.is_decode() {
            return HttpError::Decode(err.to_string());
        } else {
            TransportKind::Other
        };

        HttpError::Transport {
            kind,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
