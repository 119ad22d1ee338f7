//! Access masks and access-control entries for winperm.
//!
//! - [`AccessMask`]: the rights bitfield carried by every entry
//! - [`ExplicitAccess`]: one (rights, grant/deny, trustee, inheritance) tuple
//! - [`grant_sid`], [`grant_name`], [`deny_sid`], [`deny_name`]: the only
//!   constructors, all propagating to sub-containers and objects
//!
//! Trustee names are kept as given. Resolving them to SIDs is the job of
//! whatever consumes the entries (the descriptor store in `winperm-acl`).

mod builder;
mod entry;
mod error;
mod mask;

pub use builder::{deny_name, deny_sid, grant_name, grant_sid};
pub use entry::{AccessMode, AceFlags, ExplicitAccess, Inheritance, Trustee};
pub use error::{AccessError, AccessResult};
pub use mask::AccessMask;
