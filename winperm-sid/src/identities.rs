//! Resolved identity snapshot.

use crate::error::SidResult;
use crate::resolver::IdentityResolver;
use crate::sid::Sid;
use crate::well_known::WellKnownSid;
use tracing::debug;

/// The identities permission translation needs, resolved once.
///
/// Resolve a snapshot when the process starts (or whenever the caller wants
/// fresh answers) and pass it to the mode translator. Nothing in this
/// workspace caches identities behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identities {
    /// Current user, used as the owner when none is given.
    pub user: Sid,
    /// Current primary group, used as the group when none is given.
    pub group: Sid,
    /// The "Everyone" pseudo-group.
    pub everyone: Sid,
    /// Built-in administrators group.
    pub administrators: Sid,
    /// Local system account.
    pub system: Sid,
}

impl Identities {
    /// Resolves every identity through `resolver`, failing on the first
    /// lookup that fails.
    pub fn resolve<R: IdentityResolver + ?Sized>(resolver: &R) -> SidResult<Self> {
        let identities = Self {
            user: resolver.current_user()?,
            group: resolver.current_group()?,
            everyone: resolver.everyone()?,
            administrators: resolver.administrators()?,
            system: resolver.local_system()?,
        };
        debug!(
            "Resolved identities: user={} group={}",
            identities.user, identities.group
        );
        Ok(identities)
    }

    /// Returns true if `sid` is the local system account of this snapshot.
    #[must_use]
    pub fn is_system(&self, sid: &Sid) -> bool {
        *sid == self.system || sid.is_well_known(WellKnownSid::LocalSystem)
    }
}
