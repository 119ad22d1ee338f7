//! ACL application for winperm.
//!
//! Takes owner, group and access-control entries produced by the other
//! winperm crates and writes them to filesystem objects:
//!
//! - [`AclApplicator`] offers `change_owner_group`, `change_mode`,
//!   `ensure_directory` and `apply`
//! - [`SecurityChange`] is the validated request every operation funnels
//!   through
//! - [`DescriptorStore`] is the boundary to the host, implemented by
//!   [`MemoryStore`] everywhere and by `HostStore` on Windows
//!
//! # Example
//!
//! ```
//! use winperm_acl::{AclApplicator, MemoryStore};
//! use winperm_filemode::FileMode;
//! use winperm_sid::{Identities, Sid, StaticResolver};
//!
//! let user = Sid::parse("S-1-5-21-1-2-3-1001").unwrap();
//! let group = Sid::parse("S-1-5-21-1-2-3-513").unwrap();
//! let identities =
//!     Identities::resolve(&StaticResolver::new(user.clone(), group.clone())).unwrap();
//!
//! let store = MemoryStore::new(user, group);
//! store.insert_file("C:\\app\\config.toml");
//!
//! let applicator = AclApplicator::new(store);
//! applicator
//!     .change_mode("C:\\app\\config.toml", FileMode::new(0o640), &identities)
//!     .unwrap();
//!
//! let dacl = applicator.store().descriptor("C:\\app\\config.toml").unwrap().dacl.unwrap();
//! assert_eq!(dacl.len(), 2);
//! ```

mod applicator;
mod change;
mod config;
mod descriptor;
mod error;
mod store;

pub use applicator::AclApplicator;
pub use change::SecurityChange;
pub use config::{AclConfig, DEFAULT_CHOWN_MODE};
pub use descriptor::{
    Ace, AceKind, Dacl, DescriptorControl, ObjectKind, SecurityAttributes, SecurityDescriptor,
    SecurityInformation,
};
pub use error::{AclError, AclResult, HostError, HostErrorKind, HostResult};
pub use store::{DescriptorStore, MemoryStore, StoreCall};

#[cfg(windows)]
pub use store::HostStore;
