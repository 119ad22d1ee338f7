//! POSIX file mode value.

use crate::error::{FileModeError, FileModeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PERMISSION_BITS: u32 = 0o777;
const MAX_MODE: u32 = 0o7777;

/// A POSIX mode: owner/group/other read-write-execute plus the special bits.
///
/// Only the permission bits take part in translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileMode(u32);

impl FileMode {
    /// Creates a mode from raw bits.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the nine permission bits.
    #[must_use]
    pub const fn permissions(self) -> u32 {
        self.0 & PERMISSION_BITS
    }

    /// Parses an octal mode such as `"0755"`, `"755"` or `"0o755"`.
    pub fn parse(s: &str) -> FileModeResult<Self> {
        s.parse()
    }
}

impl From<u32> for FileMode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl FromStr for FileMode {
    type Err = FileModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0o")
            .or_else(|| s.strip_prefix("0O"))
            .unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(FileModeError::InvalidMode(s.to_string()));
        }
        match u32::from_str_radix(digits, 8) {
            Ok(bits) if bits <= MAX_MODE => Ok(Self(bits)),
            _ => Err(FileModeError::InvalidMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for FileMode {
    type Error = FileModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileMode> for String {
    fn from(mode: FileMode) -> Self {
        mode.to_string()
    }
}
