//! Security descriptor model.
//!
//! These types mirror the host's descriptor layout closely enough for a
//! [`crate::DescriptorStore`] to encode them, while staying plain owned data
//! that can be compared in tests.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use winperm_access::{AccessMask, AceFlags};
use winperm_sid::Sid;

bitflags! {
    /// Which parts of a descriptor a read or write touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SecurityInformation: u32 {
        const OWNER = 0x0000_0001;
        const GROUP = 0x0000_0002;
        const DACL = 0x0000_0004;
        /// Blocks inheritable entries of the parent from flowing in.
        const PROTECTED_DACL = 0x8000_0000;
    }
}

bitflags! {
    /// Descriptor control bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DescriptorControl: u16 {
        const DACL_PRESENT = 0x0004;
        const DACL_AUTO_INHERITED = 0x0400;
        const DACL_PROTECTED = 0x1000;
    }
}

/// Kind of securable object a path names.
///
/// Discriminants are the host's `SE_OBJECT_TYPE` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(i32)]
pub enum ObjectKind {
    #[default]
    File = 1,
    Service = 2,
    Printer = 3,
    RegistryKey = 4,
    Share = 5,
}

impl ObjectKind {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AceKind {
    Allowed,
    Denied,
}

/// One access-control entry in its encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ace {
    pub kind: AceKind,
    pub flags: AceFlags,
    pub mask: AccessMask,
    pub sid: Sid,
}

impl Ace {
    /// Returns true if this entry was copied from a parent.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.flags.contains(AceFlags::INHERITED)
    }
}

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            AceKind::Allowed => "A",
            AceKind::Denied => "D",
        };
        write!(
            f,
            "({kind};{:#04x};{:#010x};{})",
            self.flags.bits(),
            self.mask.bits(),
            self.sid
        )
    }
}

/// Discretionary access-control list: an ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Dacl {
    pub aces: Vec<Ace>,
}

impl Dacl {
    #[must_use]
    pub fn new(aces: Vec<Ace>) -> Self {
        Self { aces }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aces.len()
    }

    /// Entries set directly on the object.
    pub fn explicit(&self) -> impl Iterator<Item = &Ace> {
        self.aces.iter().filter(|ace| !ace.is_inherited())
    }

    /// Entries copied from a parent.
    pub fn inherited(&self) -> impl Iterator<Item = &Ace> {
        self.aces.iter().filter(|ace| ace.is_inherited())
    }
}

/// Owner, group and DACL of one object.
///
/// A `None` field was either not requested or is not set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityDescriptor {
    pub owner: Option<Sid>,
    pub group: Option<Sid>,
    pub dacl: Option<Dacl>,
    pub control: DescriptorControl,
}

impl SecurityDescriptor {
    /// Returns true if the DACL blocks parent inheritance.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.control.contains(DescriptorControl::DACL_PROTECTED)
    }
}

/// Descriptor plus handle inheritability, passed to object creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityAttributes {
    /// `None` creates the object with the parent's inherited defaults.
    pub descriptor: Option<SecurityDescriptor>,
    pub inherit_handle: bool,
}
