//! Error types for file mode handling.

use thiserror::Error;

/// Result type for file mode operations.
pub type FileModeResult<T> = Result<T, FileModeError>;

/// Errors that can occur while parsing a file mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileModeError {
    /// The string is not an octal mode.
    #[error("invalid file mode '{0}': expected octal digits such as 0755")]
    InvalidMode(String),
}
