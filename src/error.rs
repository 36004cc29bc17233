//! Typed failures for every backend call.
//!
//! Domain API modules never recover locally: each failure reaches the
//! calling page as an [`ApiError`], and the page decides how to present it.
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`ApiError::Network`] | no response was received |
//! | [`ApiError::Timeout`] | the configured deadline elapsed |
//! | [`ApiError::HttpStatus`] | non-2xx response, with the backend's message |
//! | [`ApiError::Validation`] | input rejected before any request was sent |
//! | [`ApiError::Decode`] | 2xx response whose body is not the expected shape |

use fehres_core::ValidationError;
use serde_json::Value;
use thiserror::Error;

/// Result type for backend calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unexpected response body: {message}")]
    Decode { message: String },
}

/// Coarse classification, for pages that branch on the failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    HttpStatus,
    Validation,
    Decode,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Timeout { .. } => ErrorKind::Timeout,
            ApiError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Decode { .. } => ErrorKind::Decode,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable text for presenting to a user. For HTTP failures this
    /// is the backend's own message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::HttpStatus { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                seconds: timeout_secs,
            }
        } else if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }

    /// Build an [`ApiError::HttpStatus`] from a non-2xx response body.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| backend_message(&json))
            .unwrap_or_else(|| format!("request failed with status {}", status));
        ApiError::HttpStatus { status, message }
    }
}

/// Pick the most specific message from an error envelope.
///
/// Precedence: `error`, `message`, `detail` (string), then the signal
/// field in either casing.
fn backend_message(json: &Value) -> Option<String> {
    ["error", "message", "detail", "signal", "Signal"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
