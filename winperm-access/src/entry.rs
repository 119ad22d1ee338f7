//! Access-control entry types.

use crate::mask::AccessMask;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use winperm_sid::Sid;

/// Whether an entry grants or denies its rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    Grant,
    Deny,
}

impl AccessMode {
    /// Host numeric code (`GRANT_ACCESS` = 1, `DENY_ACCESS` = 3).
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Grant => 1,
            Self::Deny => 3,
        }
    }
}

bitflags! {
    /// Inheritance flags as stored on an ACE header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AceFlags: u8 {
        const OBJECT_INHERIT = 0x01;
        const CONTAINER_INHERIT = 0x02;
        const NO_PROPAGATE_INHERIT = 0x04;
        const INHERIT_ONLY = 0x08;
        const INHERITED = 0x10;
    }
}

impl AceFlags {
    /// Returns true if the ACE flows to child objects (files).
    #[must_use]
    pub fn inherits_to_objects(&self) -> bool {
        self.contains(Self::OBJECT_INHERIT)
    }

    /// Returns true if the ACE flows to child containers (directories).
    #[must_use]
    pub fn inherits_to_containers(&self) -> bool {
        self.contains(Self::CONTAINER_INHERIT)
    }
}

/// How an entry propagates to descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Inheritance {
    /// Applies to the object only.
    None,
    /// Applies to the object and its child objects.
    SubObjects,
    /// Applies to the object and its child containers.
    SubContainers,
    /// Applies to the object and all descendant containers and objects.
    SubContainersAndObjects,
}

impl Inheritance {
    /// ACE flags the host writes for this inheritance mode.
    #[must_use]
    pub const fn ace_flags(self) -> AceFlags {
        match self {
            Self::None => AceFlags::empty(),
            Self::SubObjects => AceFlags::OBJECT_INHERIT,
            Self::SubContainers => AceFlags::CONTAINER_INHERIT,
            Self::SubContainersAndObjects => {
                AceFlags::OBJECT_INHERIT.union(AceFlags::CONTAINER_INHERIT)
            }
        }
    }
}

/// Principal an entry refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trustee {
    /// An already-resolved identity.
    Sid(Sid),
    /// An account name, resolved when the entry is consumed.
    Name(String),
}

impl Trustee {
    /// Returns the SID if this trustee is already resolved.
    #[must_use]
    pub fn as_sid(&self) -> Option<&Sid> {
        match self {
            Self::Sid(sid) => Some(sid),
            Self::Name(_) => None,
        }
    }
}

impl fmt::Display for Trustee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sid(sid) => write!(f, "{sid}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// One explicit access-control entry.
///
/// Immutable after construction; build with [`crate::grant_sid`] and friends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExplicitAccess {
    permissions: AccessMask,
    mode: AccessMode,
    inheritance: Inheritance,
    trustee: Trustee,
}

impl ExplicitAccess {
    pub(crate) fn new(
        permissions: AccessMask,
        mode: AccessMode,
        inheritance: Inheritance,
        trustee: Trustee,
    ) -> Self {
        Self {
            permissions,
            mode,
            inheritance,
            trustee,
        }
    }

    #[must_use]
    pub fn permissions(&self) -> AccessMask {
        self.permissions
    }

    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    #[must_use]
    pub fn inheritance(&self) -> Inheritance {
        self.inheritance
    }

    #[must_use]
    pub fn trustee(&self) -> &Trustee {
        &self.trustee
    }

    #[must_use]
    pub fn is_grant(&self) -> bool {
        self.mode == AccessMode::Grant
    }
}

impl fmt::Display for ExplicitAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.mode {
            AccessMode::Grant => "grant",
            AccessMode::Deny => "deny",
        };
        write!(f, "{verb} {:#010x} to {}", self.permissions.bits(), self.trustee)
    }
}
