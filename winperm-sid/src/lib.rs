//! Security identifiers and identity resolution for winperm.
//!
//! This crate defines the identity layer that the rest of the workspace
//! builds on:
//! - [`Sid`], an owned security identifier with its canonical string and
//!   binary forms
//! - [`WellKnownSid`], the host's catalogue of well-known principals
//! - [`IdentityResolver`], the lookup service for "who" questions (current
//!   user, current group, everyone, administrators, local system)
//! - [`Identities`], a resolved snapshot that callers compute once and pass
//!   down instead of relying on process-wide caches
//!
//! Resolution never panics. A failed lookup is reported as
//! [`SidError::Resolution`] and it is up to the caller to abort the
//! enclosing operation.

mod error;
mod identities;
mod resolver;
mod sid;
mod well_known;

#[cfg(windows)]
mod host;

pub use error::{SidError, SidResult};
pub use identities::Identities;
pub use resolver::{IdentityResolver, StaticResolver};
pub use sid::{Sid, MAX_SUB_AUTHORITIES};
pub use well_known::WellKnownSid;

#[cfg(windows)]
pub use host::{copy_sid, HostResolver};
