//! Client-side validation failures.
//!
//! These are raised before any network call is attempted, so a page can
//! reject bad input without touching the backend.

use thiserror::Error;

/// Input rejected on the client before a request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{input}' is not an absolute URL")]
    InvalidUrl { input: String },

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("result limit must be between {min} and {max}, got {actual}")]
    LimitOutOfRange { actual: i64, min: i64, max: i64 },

    #[error("project id must be a positive integer, got '{input}'")]
    InvalidProjectId { input: String },

    #[error("API URL must not be empty")]
    EmptyApiUrl,

    #[error("library '{name}' does not exist")]
    UnknownLibrary { name: String },

    #[error("upload '{id}' cannot move from {from} to {to}")]
    InvalidUploadTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("unknown upload '{id}'")]
    UnknownUpload { id: String },
}
