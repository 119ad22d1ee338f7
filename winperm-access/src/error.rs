//! Error types for entry construction.

use thiserror::Error;

/// Result type for entry construction.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors that can occur while building access-control entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// A name trustee was given an empty name.
    #[error("trustee name cannot be empty")]
    EmptyTrusteeName,

    /// A name trustee contains a NUL character.
    #[error("trustee name {0:?} contains a NUL character")]
    NulInTrusteeName(String),
}
