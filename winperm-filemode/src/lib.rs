//! POSIX file mode translation for winperm.
//!
//! Converts the classic nine permission bits into three access masks
//! (owner, group, everyone) and expands those masks into grant entries bound
//! to concrete identities.
//!
//! # Bit mapping
//!
//! | POSIX bit | Access mask bits |
//! |-----------|------------------|
//! | `r` | `GENERIC_READ` |
//! | `w` | `GENERIC_WRITE` + `DELETE` |
//! | `x` | `GENERIC_EXECUTE` |
//!
//! Bits above `0o777` (setuid, setgid, sticky) are ignored.
//!
//! # Example
//!
//! ```
//! use winperm_filemode::{AccessMasks, FileMode};
//!
//! let masks = AccessMasks::from_mode(FileMode::new(0o750));
//! assert!(!masks.owner.is_empty());
//! assert!(!masks.group.is_empty());
//! assert!(masks.everyone.is_empty());
//! ```

mod error;
mod masks;
mod mode;

pub use error::{FileModeError, FileModeResult};
pub use masks::{AccessMasks, AdminFallback};
pub use mode::FileMode;
