//! Domain API modules.
//!
//! Each function maps one typed request onto exactly one transport call and
//! one typed response. None of them hold state or recover from failures.
//!
//! The backend names fields inconsistently (`signal` next to `Signal`,
//! `Inserted_chunks` next to `processed_files`, `Do_reset` next to
//! `do_reset`). All of that is confined to the private `*Wire` structs in
//! these modules; everything they return uses one internal naming
//! convention.
//!
//! | Module | Endpoints |
//! |--------|-----------|
//! | [`system`] | `GET /health` |
//! | [`data`] | `/data/libraries`, `/data/upload`, `/data/process`, `/data/scrape*`, `/data/reset`, `/data/asset*` |
//! | [`nlp`] | `/nlp/index/push`, `/nlp/index/info`, `/nlp/index/search`, `/nlp/index/answer` |
//! | [`prescription`] | `/prescription/analyze` |

pub mod data;
pub mod nlp;
pub mod prescription;
pub mod system;

use fehres_core::ValidationError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Smallest and largest result limit accepted by search and answer calls.
pub const RESULT_LIMIT_RANGE: std::ops::RangeInclusive<i64> = 1..=20;

/// Generic acknowledgement returned by fire-and-forget endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default, alias = "Signal")]
    pub signal: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reset flags travel as `0`/`1` integers.
pub(crate) fn flag(value: bool) -> u8 {
    u8::from(value)
}

pub(crate) fn require_absolute_url(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => Ok(trimmed.to_string()),
        _ => Err(ValidationError::InvalidUrl {
            input: input.to_string(),
        }),
    }
}

pub(crate) fn require_query(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    Ok(())
}

pub(crate) fn require_limit(limit: i64) -> Result<(), ValidationError> {
    if !RESULT_LIMIT_RANGE.contains(&limit) {
        return Err(ValidationError::LimitOutOfRange {
            actual: limit,
            min: *RESULT_LIMIT_RANGE.start(),
            max: *RESULT_LIMIT_RANGE.end(),
        });
    }
    Ok(())
}
