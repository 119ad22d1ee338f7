//! Applicator configuration.

use crate::descriptor::ObjectKind;
use serde::{Deserialize, Serialize};
use winperm_filemode::FileMode;

/// Default mode applied by an ownership change.
pub const DEFAULT_CHOWN_MODE: FileMode = FileMode::new(0o755);

/// Configuration for [`crate::AclApplicator`].
///
/// Every field has a default, so an empty table deserializes to
/// [`AclConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Mode whose entries replace the DACL when owner and group change.
    pub chown_mode: FileMode,
    /// Kind of object the applicator's paths name.
    pub object_kind: ObjectKind,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            chown_mode: DEFAULT_CHOWN_MODE,
            object_kind: ObjectKind::File,
        }
    }
}
