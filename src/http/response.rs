//! Response envelope and raw response types.
//!
//! # Responsibilities
//! - Model the `{code, msg, success, timestamp, data}` business envelope
//! - Normalize numeric and string codes to one canonical string form
//! - Carry binary bodies for downloads, with the file name the server suggested

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The JSON wrapper around every console API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Envelope<T = Value> {
    /// Business status code, always held as a string.
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,

    #[serde(default, alias = "message")]
    pub msg: String,

    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub timestamp: Option<i64>,

    #[serde(default)]
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            code: self.code,
            msg: self.msg,
            success: self.success,
            timestamp: self.timestamp,
            data: f(self.data),
        }
    }
}

fn code_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(s) => s,
        Code::Number(n) => n.to_string(),
    })
}

/// A response as it came off the wire, after 401 handling.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// Parse the body as an envelope, if it is one.
    pub fn envelope(&self) -> Option<Envelope<Value>> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

/// A binary download. The body is never envelope-unwrapped.
#[derive(Debug, Clone)]
pub struct DownloadResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub content_type: Option<String>,
    /// File name from `Content-Disposition`, when the server sent one.
    pub file_name: Option<String>,
    pub body: Bytes,
}

impl From<RawResponse> for DownloadResponse {
    fn from(raw: RawResponse) -> Self {
        let content_type = raw.content_type().map(str::to_string);
        let file_name = raw
            .headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition);

        Self {
            status: raw.status,
            headers: raw.headers,
            content_type,
            file_name,
            body: raw.body,
        }
    }
}

/// Extract the file name from a `Content-Disposition` value.
///
/// `filename*=UTF-8''...` wins over `filename=...`; both are percent-decoded.
pub fn file_name_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let raw = raw.trim().trim_matches('"');

        if key == "filename*" {
            let encoded = raw.rsplit_once("''").map_or(raw, |(_, name)| name);
            let decoded = percent_decode_str(encoded).decode_utf8_lossy().into_owned();
            if !decoded.is_empty() {
                return Some(decoded);
            }
        } else if key == "filename" && plain.is_none() && !raw.is_empty() {
            plain = Some(percent_decode_str(raw).decode_utf8_lossy().into_owned());
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_and_numeric_codes() {
        let e: Envelope =
            serde_json::from_value(json!({"code": "0", "msg": "ok", "data": 1})).unwrap();
        assert_eq!(e.code, "0");

        let e: Envelope = serde_json::from_value(json!({"code": 200, "message": "ok"})).unwrap();
        assert_eq!(e.code, "200");
        assert_eq!(e.msg, "ok");
        assert_eq!(e.data, Value::Null);
    }

    #[test]
    fn test_missing_code_is_not_an_envelope() {
        assert!(serde_json::from_value::<Envelope>(json!({"records": []})).is_err());
    }

    #[test]
    fn test_full_envelope() {
        let e: Envelope = serde_json::from_value(json!({
            "code": "0",
            "msg": "ok",
            "success": true,
            "timestamp": 1_700_000_000_000i64,
            "data": {"id": 1}
        }))
        .unwrap();
        assert_eq!(e.success, Some(true));
        assert_eq!(e.timestamp, Some(1_700_000_000_000));
        assert_eq!(e.data["id"], 1);
    }

    #[test]
    fn test_disposition_parsing() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=users.xlsx").as_deref(),
            Some("users.xlsx")
        );
        assert_eq!(
            file_name_from_disposition(r#"attachment; filename="report 1.csv""#).as_deref(),
            Some("report 1.csv")
        );
        assert_eq!(
            file_name_from_disposition(
                "attachment; filename=fallback.xlsx; filename*=UTF-8''%E7%94%A8%E6%88%B7.xlsx"
            )
            .as_deref(),
            Some("用户.xlsx")
        );
        assert_eq!(file_name_from_disposition("inline"), None);
    }
}
