//! Descriptor store abstraction.
//!
//! The applicator never talks to the host directly. Every read and write of
//! a security descriptor goes through a [`DescriptorStore`], so the same
//! logic runs against the real host API or an in-process model.

mod memory;

#[cfg(windows)]
mod host;

pub use memory::{MemoryStore, StoreCall};

#[cfg(windows)]
pub use host::HostStore;

use crate::descriptor::{
    Ace, AceKind, Dacl, ObjectKind, SecurityAttributes, SecurityDescriptor, SecurityInformation,
};
use crate::error::HostResult;
use winperm_access::{AccessMode, ExplicitAccess};
use winperm_sid::Sid;

/// Read and write access to the security descriptors of named objects.
pub trait DescriptorStore {
    /// Returns true if an object exists at `path`.
    fn exists(&self, path: &str) -> HostResult<bool>;

    /// Creates a directory at `path` with the given security attributes.
    ///
    /// Fails with `AlreadyExists` if something is already there.
    fn create_with_security(&self, path: &str, attributes: &SecurityAttributes) -> HostResult<()>;

    /// Writes the parts of a descriptor selected by `info`.
    ///
    /// Arguments for parts not selected are ignored.
    fn set_security(
        &self,
        path: &str,
        kind: ObjectKind,
        info: SecurityInformation,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        dacl: Option<&Dacl>,
    ) -> HostResult<()>;

    /// Reads the parts of a descriptor selected by `info`.
    fn get_security(
        &self,
        path: &str,
        kind: ObjectKind,
        info: SecurityInformation,
    ) -> HostResult<SecurityDescriptor>;

    /// Encodes entries as a DACL, resolving name trustees.
    fn build_dacl(&self, entries: &[ExplicitAccess]) -> HostResult<Dacl>;
}

impl<S: DescriptorStore + ?Sized> DescriptorStore for &S {
    fn exists(&self, path: &str) -> HostResult<bool> {
        (**self).exists(path)
    }

    fn create_with_security(&self, path: &str, attributes: &SecurityAttributes) -> HostResult<()> {
        (**self).create_with_security(path, attributes)
    }

    fn set_security(
        &self,
        path: &str,
        kind: ObjectKind,
        info: SecurityInformation,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        dacl: Option<&Dacl>,
    ) -> HostResult<()> {
        (**self).set_security(path, kind, info, owner, group, dacl)
    }

    fn get_security(
        &self,
        path: &str,
        kind: ObjectKind,
        info: SecurityInformation,
    ) -> HostResult<SecurityDescriptor> {
        (**self).get_security(path, kind, info)
    }

    fn build_dacl(&self, entries: &[ExplicitAccess]) -> HostResult<Dacl> {
        (**self).build_dacl(entries)
    }
}

/// Encodes one entry whose trustee is already resolved to `sid`.
pub(crate) fn encode_entry(entry: &ExplicitAccess, sid: Sid) -> Ace {
    Ace {
        kind: match entry.mode() {
            AccessMode::Grant => AceKind::Allowed,
            AccessMode::Deny => AceKind::Denied,
        },
        flags: entry.inheritance().ace_flags(),
        mask: entry.permissions(),
        sid,
    }
}
