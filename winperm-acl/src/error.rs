//! Error types for the ACL layer.

use std::io;
use thiserror::Error;
use winperm_access::AccessError;
use winperm_sid::SidError;

/// Result type for applicator operations.
pub type AclResult<T> = Result<T, AclError>;

/// Result type for descriptor store operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors that can occur while applying a security change.
#[derive(Debug, Error)]
pub enum AclError {
    /// The request itself is unusable (empty path, empty trustee name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An identity could not be resolved.
    #[error(transparent)]
    Identity(#[from] SidError),

    /// The descriptor store rejected the operation.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl AclError {
    /// Returns true if the target object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Host(e) if e.kind() == HostErrorKind::NotFound)
    }

    /// Returns the host failure category, if this is a store error.
    #[must_use]
    pub fn host_kind(&self) -> Option<HostErrorKind> {
        match self {
            Self::Host(e) => Some(e.kind()),
            _ => None,
        }
    }
}

impl From<AccessError> for AclError {
    fn from(err: AccessError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Failure category of a [`HostError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostErrorKind {
    NotFound,
    AlreadyExists,
    AccessDenied,
    AccountNotFound,
    Malformed,
    Os,
}

/// Errors reported by a descriptor store.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("object not found: {path}")]
    NotFound { path: String },

    #[error("object already exists: {path}")]
    AlreadyExists { path: String },

    #[error("access denied: {path}")]
    AccessDenied { path: String },

    /// A name trustee did not map to any account.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The host returned or was given a descriptor it could not use.
    #[error("malformed security data: {0}")]
    Malformed(String),

    #[error("{operation} failed on {path}: {source}")]
    Os {
        operation: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl HostError {
    #[must_use]
    pub fn kind(&self) -> HostErrorKind {
        match self {
            Self::NotFound { .. } => HostErrorKind::NotFound,
            Self::AlreadyExists { .. } => HostErrorKind::AlreadyExists,
            Self::AccessDenied { .. } => HostErrorKind::AccessDenied,
            Self::AccountNotFound(_) => HostErrorKind::AccountNotFound,
            Self::Malformed(_) => HostErrorKind::Malformed,
            Self::Os { .. } => HostErrorKind::Os,
        }
    }

    /// Maps a Win32 error code returned by `operation` on `path`.
    #[must_use]
    pub fn from_win32(operation: &'static str, path: &str, code: u32) -> Self {
        match code {
            // ERROR_FILE_NOT_FOUND, ERROR_PATH_NOT_FOUND
            2 | 3 => Self::NotFound {
                path: path.to_string(),
            },
            5 => Self::AccessDenied {
                path: path.to_string(),
            },
            // ERROR_FILE_EXISTS, ERROR_ALREADY_EXISTS
            80 | 183 => Self::AlreadyExists {
                path: path.to_string(),
            },
            // ERROR_NONE_MAPPED
            1332 => Self::AccountNotFound(path.to_string()),
            // ERROR_INVALID_PARAMETER, ERROR_INVALID_ACL, ERROR_INVALID_SID,
            // ERROR_INVALID_SECURITY_DESCR
            87 | 1336..=1338 => Self::Malformed(format!("{operation} rejected {path} (error {code})")),
            _ => Self::Os {
                operation,
                path: path.to_string(),
                source: io::Error::from_raw_os_error(code as i32),
            },
        }
    }
}

impl From<SidError> for HostError {
    fn from(err: SidError) -> Self {
        Self::Malformed(err.to_string())
    }
}
