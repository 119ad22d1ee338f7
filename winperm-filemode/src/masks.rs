//! Mode → access masks → grant entries.

use crate::mode::FileMode;
use tracing::trace;
use winperm_access::{grant_sid, AccessMask, ExplicitAccess};
use winperm_sid::{Identities, Sid};

/// Whether expansion adds the built-in administrators entry when owner and
/// group are both the local system account.
///
/// A service running as local system resolves both its user and its primary
/// group to `S-1-5-18`. No interactive account can act as that principal,
/// so an ACL naming only it locks every person out of the object.
/// [`AdminFallback::Apply`] appends a grant of the owner mask to the
/// built-in administrators group in that case. An empty owner mask adds
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminFallback {
    Apply,
    Skip,
}

/// Access masks for the three POSIX permission classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessMasks {
    pub owner: AccessMask,
    pub group: AccessMask,
    pub everyone: AccessMask,
}

impl AccessMasks {
    /// Translates the permission bits of `mode`.
    ///
    /// The `rwx` triplet of each class is shifted onto
    /// `GENERIC_READ | GENERIC_WRITE | GENERIC_EXECUTE`, and the class's
    /// write bit is shifted onto `DELETE`.
    #[must_use]
    pub fn from_mode(mode: FileMode) -> Self {
        let mode = mode.permissions();
        Self {
            owner: AccessMask::from_raw(((mode & 0o700) << 23) | ((mode & 0o200) << 9)),
            group: AccessMask::from_raw(((mode & 0o070) << 26) | ((mode & 0o020) << 12)),
            everyone: AccessMask::from_raw(((mode & 0o007) << 29) | ((mode & 0o002) << 15)),
        }
    }

    /// Expands the masks into grant entries, in owner, group, everyone order.
    ///
    /// `owner` and `group` default to the snapshot's current user and group.
    /// Zero masks produce no entry. With [`AdminFallback::Apply`], an extra
    /// owner-mask grant for the built-in administrators group is appended
    /// when both owner and group are the local system account and the
    /// owner mask is not empty.
    #[must_use]
    pub fn expand(
        &self,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        identities: &Identities,
        fallback: AdminFallback,
    ) -> Vec<ExplicitAccess> {
        let owner = owner.unwrap_or(&identities.user);
        let group = group.unwrap_or(&identities.group);

        let mut entries = Vec::with_capacity(4);
        if !self.owner.is_empty() {
            entries.push(grant_sid(self.owner, owner));
        }
        if !self.group.is_empty() {
            entries.push(grant_sid(self.group, group));
        }
        if !self.everyone.is_empty() {
            entries.push(grant_sid(self.everyone, &identities.everyone));
        }

        if fallback == AdminFallback::Apply
            && !self.owner.is_empty()
            && identities.is_system(owner)
            && identities.is_system(group)
        {
            trace!("Owner and group are local system, granting owner rights to administrators");
            entries.push(grant_sid(self.owner, &identities.administrators));
        }

        trace!(
            "Expanded masks owner={:#x} group={:#x} everyone={:#x} into {} entries",
            self.owner.bits(),
            self.group.bits(),
            self.everyone.bits(),
            entries.len()
        );
        entries
    }

    /// Expands with the administrators fallback applied.
    ///
    /// Use when owner and group are being set, so an object handed to the
    /// local system account stays reachable by administrators.
    #[must_use]
    pub fn to_entries(
        &self,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        identities: &Identities,
    ) -> Vec<ExplicitAccess> {
        self.expand(owner, group, identities, AdminFallback::Apply)
    }

    /// Expands without the administrators fallback.
    ///
    /// Use when only the mode changes and the object's existing owner and
    /// group are kept as they are.
    #[must_use]
    pub fn to_entries_preserving_identities(
        &self,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        identities: &Identities,
    ) -> Vec<ExplicitAccess> {
        self.expand(owner, group, identities, AdminFallback::Skip)
    }
}

impl From<FileMode> for AccessMasks {
    fn from(mode: FileMode) -> Self {
        Self::from_mode(mode)
    }
}
