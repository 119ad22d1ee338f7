//! Security change requests.

use crate::descriptor::{
    Dacl, DescriptorControl, SecurityAttributes, SecurityDescriptor, SecurityInformation,
};
use crate::error::{AclError, AclResult, HostResult};
use crate::store::DescriptorStore;
use winperm_access::ExplicitAccess;
use winperm_sid::Sid;

/// What to change on one object.
///
/// Absent owner or group and an empty entry list mean "leave unchanged".
/// A change with nothing set is a valid no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityChange {
    path: String,
    owner: Option<Sid>,
    group: Option<Sid>,
    entries: Vec<ExplicitAccess>,
}

impl SecurityChange {
    /// Starts a change for `path`. Fails if the path is empty.
    pub fn new(path: impl Into<String>) -> AclResult<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(AclError::InvalidArgument("path cannot be empty".to_string()));
        }
        if path.contains('\0') {
            return Err(AclError::InvalidArgument(format!(
                "path {path:?} contains a NUL character"
            )));
        }
        Ok(Self {
            path,
            owner: None,
            group: None,
            entries: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_owner(mut self, owner: Option<Sid>) -> Self {
        self.owner = owner;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: Option<Sid>) -> Self {
        self.group = group;
        self
    }

    /// Replaces the DACL entries. Order is kept as given.
    #[must_use]
    pub fn with_entries(mut self, entries: Vec<ExplicitAccess>) -> Self {
        self.entries = entries;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn owner(&self) -> Option<&Sid> {
        self.owner.as_ref()
    }

    #[must_use]
    pub fn group(&self) -> Option<&Sid> {
        self.group.as_ref()
    }

    #[must_use]
    pub fn entries(&self) -> &[ExplicitAccess] {
        &self.entries
    }

    /// Descriptor parts this change writes.
    ///
    /// Entries replace the whole DACL and mark it protected, so parent
    /// entries stop flowing in.
    #[must_use]
    pub fn security_information(&self) -> SecurityInformation {
        let mut info = SecurityInformation::empty();
        if self.owner.is_some() {
            info |= SecurityInformation::OWNER;
        }
        if self.group.is_some() {
            info |= SecurityInformation::GROUP;
        }
        if !self.entries.is_empty() {
            info |= SecurityInformation::DACL | SecurityInformation::PROTECTED_DACL;
        }
        info
    }

    /// Returns true if committing this change touches nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.security_information().is_empty()
    }

    /// Encodes the entries through `store`, or `None` if there are none.
    pub fn to_dacl<S: DescriptorStore + ?Sized>(&self, store: &S) -> HostResult<Option<Dacl>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        store.build_dacl(&self.entries).map(Some)
    }

    /// Attributes for creating a new object with this change applied.
    ///
    /// With entries, the descriptor carries a protected DACL. Without, no
    /// descriptor is passed and the object takes the parent's inheritable
    /// entries.
    pub fn to_security_attributes<S: DescriptorStore + ?Sized>(
        &self,
        store: &S,
    ) -> HostResult<SecurityAttributes> {
        let Some(dacl) = self.to_dacl(store)? else {
            return Ok(SecurityAttributes {
                descriptor: None,
                inherit_handle: true,
            });
        };
        Ok(SecurityAttributes {
            descriptor: Some(SecurityDescriptor {
                owner: self.owner.clone(),
                group: self.group.clone(),
                dacl: Some(dacl),
                control: DescriptorControl::DACL_PRESENT | DescriptorControl::DACL_PROTECTED,
            }),
            inherit_handle: false,
        })
    }
}
