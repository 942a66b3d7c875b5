//! Request description and normalization.
//!
//! # Responsibilities
//! - Per-call options (toasts, unauthorized opt-out, headers, timeout, cancel)
//! - Route parameters to the query string or the JSON body by method
//! - Resolve relative paths against the configured base URL
//! - Carry multipart forms in a re-sendable shape for retries

use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::http::error::{HttpError, HttpResult};

/// Header carrying the per-attempt correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Per-call flags and overrides.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Raise an error notification when the call fails.
    pub show_error_message: bool,
    /// Raise a success notification with the envelope message.
    pub show_success_message: bool,
    /// Bypass the 401 flow entirely (no logout, no notification).
    pub skip_unauthorized_handler: bool,
    /// Extra headers; these override the pipeline's own.
    pub headers: Vec<(String, String)>,
    /// Explicit JSON body. When set, parameters go to the query string.
    pub body: Option<Value>,
    /// Per-call timeout overriding the client default.
    pub timeout: Option<Duration>,
    /// Caller-owned cancellation signal.
    pub cancel: Option<CancellationToken>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            show_error_message: true,
            show_success_message: false,
            skip_unauthorized_handler: false,
            headers: Vec::new(),
            body: None,
            timeout: None,
            cancel: None,
        }
    }
}

impl RequestOptions {
    /// Suppress the failure notification.
    pub fn quiet(mut self) -> Self {
        self.show_error_message = false;
        self
    }

    pub fn with_success_message(mut self) -> Self {
        self.show_success_message = true;
        self
    }

    pub fn skip_unauthorized(mut self) -> Self {
        self.skip_unauthorized_handler = true;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[derive(Debug, Clone)]
enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Bytes,
    },
}

/// A multipart form that can be rebuilt for every attempt.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    parts: Vec<FormPart>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            bytes: bytes.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn to_multipart(&self) -> HttpResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut p = reqwest::multipart::Part::bytes(bytes.to_vec())
                        .file_name(file_name.clone());
                    if let Some(mime) = mime {
                        p = p
                            .mime_str(mime)
                            .map_err(|e| {
                                HttpError::Config(format!("invalid mime type '{mime}': {e}"))
                            })?;
                    }
                    form.part(name.clone(), p)
                }
            };
        }
        Ok(form)
    }
}

/// Request body.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    Json(Value),
    Multipart(UploadForm),
}

/// Everything needed to send (and re-send) one call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub payload: Payload,
    pub options: RequestOptions,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            payload: Payload::Empty,
            options: RequestOptions::default(),
        }
    }

    /// Build a descriptor, routing `params` by method.
    ///
    /// GET and HEAD put parameters in the query string and reject an
    /// explicit `options.body`. Other methods send them as the JSON body,
    /// unless `options.body` is set, in which case the explicit body wins and
    /// parameters go to the query string. Parameters must be an object, or
    /// null / unit for none.
    pub fn with_params<P>(
        method: Method,
        url: impl Into<String>,
        params: &P,
        mut options: RequestOptions,
    ) -> HttpResult<Self>
    where
        P: Serialize + ?Sized,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| HttpError::Config(format!("parameters could not be serialized: {e}")))?;

        let (query, payload) = if method == Method::GET || method == Method::HEAD {
            if options.body.is_some() {
                return Err(HttpError::Config(format!("{method} requests cannot carry a body")));
            }
            (query_pairs(&params)?, Payload::Empty)
        } else if let Some(body) = options.body.take() {
            (query_pairs(&params)?, Payload::Json(body))
        } else {
            match params {
                Value::Null => (Vec::new(), Payload::Empty),
                object @ Value::Object(_) => (Vec::new(), Payload::Json(object)),
                other => {
                    return Err(HttpError::Config(format!(
                        "body parameters must be an object, got {}",
                        type_name(&other)
                    )))
                }
            }
        };

        Ok(Self {
            method,
            url: url.into(),
            query,
            payload,
            options,
        })
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Flatten a JSON object into query pairs.
///
/// Null members are skipped, arrays become repeated keys, nested objects are
/// JSON-encoded. Null or unit input means "no parameters".
pub fn query_pairs(params: &Value) -> HttpResult<Vec<(String, String)>> {
    let map = match params {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(HttpError::Config(format!(
                "query parameters must be an object, got {}",
                type_name(other)
            )))
        }
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = scalar_to_string(item) {
                        pairs.push((key.clone(), s));
                    }
                }
            }
            other => {
                if let Some(s) = scalar_to_string(other) {
                    pairs.push((key.clone(), s));
                }
            }
        }
    }
    Ok(pairs)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Join `path` onto `base` the way a front-end base URL works: absolute URLs
/// pass through, relative paths are appended with exactly one slash.
pub fn resolve_url(base: &str, path: &str) -> HttpResult<url::Url> {
    let joined = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    };

    url::Url::parse(&joined).map_err(|e| HttpError::Config(format!("invalid URL '{joined}': {e}")))
}
