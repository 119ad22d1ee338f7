//! Error types for the identity layer.

use thiserror::Error;

/// Result type for identity operations.
pub type SidResult<T> = Result<T, SidError>;

/// Errors that can occur while parsing or resolving security identifiers.
#[derive(Debug, Error)]
pub enum SidError {
    /// The string form is not a valid `S-R-I-S...` identifier.
    #[error("invalid SID string '{input}': {reason}")]
    Parse { input: String, reason: String },

    /// The binary form is truncated or inconsistent.
    #[error("malformed SID bytes: {0}")]
    Malformed(String),

    /// A named lookup (current user, well-known identity) failed.
    #[error("could not resolve {identity}: {reason}")]
    Resolution { identity: String, reason: String },
}

impl SidError {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn resolution(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            identity: identity.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from an identity lookup.
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }
}
