//! ACL applicator - commits owner, group and DACL changes to a descriptor
//! store.
//!
//! Higher-level operations (`change_owner_group`, `change_mode`,
//! `ensure_directory`) translate their inputs into a [`SecurityChange`] and
//! funnel it through [`AclApplicator::commit`], which makes at most one
//! `set_security` call.

use crate::change::SecurityChange;
use crate::config::AclConfig;
use crate::error::AclResult;
use crate::store::DescriptorStore;
use tracing::debug;
use winperm_access::ExplicitAccess;
use winperm_filemode::{AccessMasks, FileMode};
use winperm_sid::{Identities, Sid};

/// Applies security changes through a [`DescriptorStore`].
#[derive(Debug)]
pub struct AclApplicator<S> {
    store: S,
    config: AclConfig,
}

impl<S: DescriptorStore> AclApplicator<S> {
    /// Creates an applicator with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, AclConfig::default())
    }

    pub fn with_config(store: S, config: AclConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    /// Sets owner and group and replaces the DACL with the configured
    /// default mode (0755 unless configured otherwise).
    ///
    /// The mode is expanded against the new owner and group, falling back
    /// to the snapshot's current user and group for whichever is absent.
    /// If both end up as the local system account, administrators also
    /// receive the owner's rights.
    pub fn change_owner_group(
        &self,
        path: &str,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        identities: &Identities,
    ) -> AclResult<()> {
        let entries =
            AccessMasks::from_mode(self.config.chown_mode).to_entries(owner, group, identities);
        self.apply(path, owner, group, &entries)
    }

    /// Replaces the DACL with entries derived from `mode`.
    ///
    /// Owner and group stay as they are. The entries are bound to the
    /// snapshot's current user and group, without the administrators
    /// fallback. A mode with no permission bits leaves the object untouched.
    pub fn change_mode(&self, path: &str, mode: FileMode, identities: &Identities) -> AclResult<()> {
        let entries =
            AccessMasks::from_mode(mode).to_entries_preserving_identities(None, None, identities);
        debug!("Changing mode of {} to {}", path, mode);
        self.apply(path, None, None, &entries)
    }

    /// Makes sure a directory exists at `path` carrying `entries`.
    ///
    /// An existing object gets `entries` applied with owner and group left
    /// alone. A missing directory is created with a protected DACL built
    /// from `entries`, or with the parent's inheritable entries when
    /// `entries` is empty.
    pub fn ensure_directory(&self, path: &str, entries: &[ExplicitAccess]) -> AclResult<()> {
        let change = SecurityChange::new(path)?.with_entries(entries.to_vec());

        if self.store.exists(change.path())? {
            debug!("Directory {} exists, applying {} entries", path, entries.len());
            return self.commit(&change);
        }

        let attributes = change.to_security_attributes(&self.store)?;
        debug!("Creating directory {} with {} entries", path, entries.len());
        self.store.create_with_security(change.path(), &attributes)?;
        Ok(())
    }

    /// Sets any combination of owner, group and DACL in one store call.
    ///
    /// `None` and an empty `entries` leave the corresponding part unchanged.
    /// When nothing is to change the store is not contacted at all.
    pub fn apply(
        &self,
        path: &str,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        entries: &[ExplicitAccess],
    ) -> AclResult<()> {
        let change = SecurityChange::new(path)?
            .with_owner(owner.cloned())
            .with_group(group.cloned())
            .with_entries(entries.to_vec());
        self.commit(&change)
    }

    /// Commits a prepared change.
    pub fn commit(&self, change: &SecurityChange) -> AclResult<()> {
        let info = change.security_information();
        if info.is_empty() {
            debug!("Nothing to change on {}", change.path());
            return Ok(());
        }

        let dacl = change.to_dacl(&self.store)?;
        self.store.set_security(
            change.path(),
            self.config.object_kind,
            info,
            change.owner(),
            change.group(),
            dacl.as_ref(),
        )?;
        debug!(
            "Applied {:?} to {} ({} entries)",
            info,
            change.path(),
            change.entries().len()
        );
        Ok(())
    }
}
