use std::collections::BTreeMap;
use std::fmt;

use serde::Serializer;
use thiserror::Error;

/// Why a single fetch did not produce a usable document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("network failure: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("empty response body")]
    EmptyBody,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("transport error for {url}: {cause}")]
    Transport { url: String, cause: FetchFailure },

    #[error("malformed document at {url}: {reason}")]
    MalformedDocument { url: String, reason: String },

    #[error("could not extract field `{field}` from {raw_text:?}")]
    FieldExtraction { field: String, raw_text: String },

    #[error("listing \"{name}\" has no detail page link")]
    MissingLink { name: String },

    #[error("weighted average undefined for \"{name}\": all rating buckets are zero")]
    DivisionUndefined { name: String },

    #[error("failed to persist page {name}: {source}")]
    Storage {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ScrapeError {
    pub(crate) fn field(field: &str, raw_text: &str) -> Self {
        Self::FieldExtraction {
            field: field.to_string(),
            raw_text: raw_text.to_string(),
        }
    }

    pub(crate) fn malformed(url: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Record-scoped errors void a single hotel and leave the rest of the run
    /// untouched. Everything else stops the run.
    #[must_use]
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            Self::FieldExtraction { .. } | Self::MissingLink { .. } | Self::DivisionUndefined { .. }
        )
    }

    /// Only transport failures are worth another attempt.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub(crate) fn serialize_display<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: fmt::Display,
{
    serializer.collect_str(value)
}

pub(crate) fn serialize_error_map<S>(
    failures: &BTreeMap<String, ScrapeError>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(failures.iter().map(|(name, error)| (name, error.to_string())))
}
