//! In-process descriptor store.

use super::{encode_entry, DescriptorStore};
use crate::descriptor::{
    Ace, Dacl, DescriptorControl, ObjectKind, SecurityAttributes, SecurityDescriptor,
    SecurityInformation,
};
use crate::error::{HostError, HostResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::trace;
use winperm_access::{AceFlags, ExplicitAccess, Trustee};
use winperm_sid::{Sid, WellKnownSid};

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Exists {
        path: String,
    },
    CreateWithSecurity {
        path: String,
        attributes: SecurityAttributes,
    },
    SetSecurity {
        path: String,
        kind: ObjectKind,
        info: SecurityInformation,
        owner: Option<Sid>,
        group: Option<Sid>,
        dacl: Option<Dacl>,
    },
    GetSecurity {
        path: String,
        kind: ObjectKind,
        info: SecurityInformation,
    },
    BuildDacl {
        entries: usize,
    },
}

#[derive(Debug, Clone)]
struct Object {
    directory: bool,
    descriptor: SecurityDescriptor,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, Object>,
    calls: Vec<StoreCall>,
}

/// Deterministic descriptor store backed by a map of paths.
///
/// Paths use either `/` or `\` as separator. A path whose parent is empty or
/// a bare drive (`C:`) sits at the root; any other parent must exist before
/// a child can be created. Objects are created with the store's default
/// owner and group unless the descriptor names others.
///
/// Inheritance follows the host's rules for a single level: an object whose
/// DACL is absent or unprotected receives the parent's inheritable entries,
/// marked inherited, after its own entries. Writes do not propagate to
/// existing children.
///
/// Every trait call is recorded and can be inspected with
/// [`MemoryStore::calls`].
#[derive(Debug)]
pub struct MemoryStore {
    default_owner: Sid,
    default_group: Sid,
    accounts: Mutex<HashMap<String, Sid>>,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store whose new objects belong to `default_owner`
    /// and `default_group`.
    #[must_use]
    pub fn new(default_owner: Sid, default_group: Sid) -> Self {
        let mut accounts = HashMap::new();
        for kind in WellKnownSid::ALL {
            if let (Some(name), Some(sid)) = (kind.account_name(), kind.fixed_sid()) {
                if let Some((_, short)) = name.split_once('\\') {
                    accounts.insert(short.to_lowercase(), sid.clone());
                }
                accounts.insert(name.to_lowercase(), sid);
            }
        }
        Self {
            default_owner,
            default_group,
            accounts: Mutex::new(accounts),
            state: Mutex::new(State::default()),
        }
    }

    /// Makes `name` resolvable in name trustees. Lookup ignores case.
    pub fn register_account(&self, name: &str, sid: Sid) {
        lock(&self.accounts).insert(name.to_lowercase(), sid);
    }

    /// Seeds a file without recording a call. Missing parents are not checked.
    pub fn insert_file(&self, path: &str) {
        self.seed(path, false);
    }

    /// Seeds a directory without recording a call. Missing parents are not
    /// checked.
    pub fn insert_directory(&self, path: &str) {
        self.seed(path, true);
    }

    /// Returns the full descriptor of `path`, without recording a call.
    #[must_use]
    pub fn descriptor(&self, path: &str) -> Option<SecurityDescriptor> {
        lock(&self.state)
            .objects
            .get(normalize(path))
            .map(|object| object.descriptor.clone())
    }

    /// Returns true if `path` was created as a directory.
    #[must_use]
    pub fn is_directory(&self, path: &str) -> bool {
        lock(&self.state)
            .objects
            .get(normalize(path))
            .is_some_and(|object| object.directory)
    }

    /// Returns every call recorded so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    fn seed(&self, path: &str, directory: bool) {
        let mut state = lock(&self.state);
        let descriptor = SecurityDescriptor {
            owner: Some(self.default_owner.clone()),
            group: Some(self.default_group.clone()),
            dacl: None,
            control: DescriptorControl::empty(),
        };
        let descriptor = inherit(&state, path, directory, descriptor);
        state.objects.insert(
            normalize(path).to_string(),
            Object {
                directory,
                descriptor,
            },
        );
    }

    fn resolve(&self, trustee: &Trustee) -> HostResult<Sid> {
        match trustee {
            Trustee::Sid(sid) => Ok(sid.clone()),
            Trustee::Name(name) => lock(&self.accounts)
                .get(&name.to_lowercase())
                .cloned()
                .ok_or_else(|| HostError::AccountNotFound(name.clone())),
        }
    }
}

impl DescriptorStore for MemoryStore {
    fn exists(&self, path: &str) -> HostResult<bool> {
        let mut state = lock(&self.state);
        state.calls.push(StoreCall::Exists {
            path: path.to_string(),
        });
        Ok(state.objects.contains_key(normalize(path)))
    }

    fn create_with_security(&self, path: &str, attributes: &SecurityAttributes) -> HostResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(StoreCall::CreateWithSecurity {
            path: path.to_string(),
            attributes: attributes.clone(),
        });

        let key = normalize(path);
        if state.objects.contains_key(key) {
            return Err(HostError::AlreadyExists {
                path: path.to_string(),
            });
        }
        if let Some(parent) = parent(key) {
            if !state.objects.contains_key(parent) {
                return Err(HostError::NotFound {
                    path: parent.to_string(),
                });
            }
        }

        let requested = attributes.descriptor.clone().unwrap_or_default();
        let descriptor = SecurityDescriptor {
            owner: requested.owner.or_else(|| Some(self.default_owner.clone())),
            group: requested.group.or_else(|| Some(self.default_group.clone())),
            dacl: requested.dacl,
            control: requested.control,
        };
        let descriptor = inherit(&state, key, true, descriptor);
        trace!("Created directory {}", path);
        state.objects.insert(
            key.to_string(),
            Object {
                directory: true,
                descriptor,
            },
        );
        Ok(())
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
        let mut state = lock(&self.state);
        state.calls.push(StoreCall::SetSecurity {
            path: path.to_string(),
            kind,
            info,
            owner: owner.cloned(),
            group: group.cloned(),
            dacl: dacl.cloned(),
        });

        let key = normalize(path);
        let Some(object) = state.objects.get(key) else {
            return Err(HostError::NotFound {
                path: path.to_string(),
            });
        };
        let directory = object.directory;
        let mut descriptor = object.descriptor.clone();

        if info.contains(SecurityInformation::OWNER) {
            descriptor.owner = Some(required(owner, "owner")?.clone());
        }
        if info.contains(SecurityInformation::GROUP) {
            descriptor.group = Some(required(group, "group")?.clone());
        }
        if info.contains(SecurityInformation::DACL) {
            let explicit = dacl.map(|d| Dacl::new(d.explicit().cloned().collect()));
            descriptor.dacl = explicit;
            descriptor.control.set(
                DescriptorControl::DACL_PROTECTED,
                info.contains(SecurityInformation::PROTECTED_DACL),
            );
            descriptor = inherit(&state, key, directory, descriptor);
        }

        if let Some(object) = state.objects.get_mut(key) {
            object.descriptor = descriptor;
        }
        Ok(())
    }

    fn get_security(
        &self,
        path: &str,
        kind: ObjectKind,
        info: SecurityInformation,
    ) -> HostResult<SecurityDescriptor> {
        let mut state = lock(&self.state);
        state.calls.push(StoreCall::GetSecurity {
            path: path.to_string(),
            kind,
            info,
        });

        let object = state
            .objects
            .get(normalize(path))
            .ok_or_else(|| HostError::NotFound {
                path: path.to_string(),
            })?;
        let full = &object.descriptor;
        let mut descriptor = SecurityDescriptor::default();
        if info.contains(SecurityInformation::OWNER) {
            descriptor.owner = full.owner.clone();
        }
        if info.contains(SecurityInformation::GROUP) {
            descriptor.group = full.group.clone();
        }
        if info.contains(SecurityInformation::DACL) {
            descriptor.dacl = full.dacl.clone();
            descriptor.control = full.control;
        }
        Ok(descriptor)
    }

    fn build_dacl(&self, entries: &[ExplicitAccess]) -> HostResult<Dacl> {
        lock(&self.state).calls.push(StoreCall::BuildDacl {
            entries: entries.len(),
        });
        let aces = entries
            .iter()
            .map(|entry| Ok(encode_entry(entry, self.resolve(entry.trustee())?)))
            .collect::<HostResult<Vec<_>>>()?;
        Ok(Dacl::new(aces))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn required<'a>(sid: Option<&'a Sid>, part: &str) -> HostResult<&'a Sid> {
    sid.ok_or_else(|| HostError::Malformed(format!("{part} flagged for update but not given")))
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() { path } else { trimmed }
}

/// Parent of a normalized path, or `None` at the root.
fn parent(path: &str) -> Option<&str> {
    let (parent, _) = path.rsplit_once(['/', '\\'])?;
    if parent.is_empty() || parent.ends_with(':') {
        None
    } else {
        Some(parent)
    }
}

/// Appends the parent's inheritable entries unless the DACL is protected.
fn inherit(
    state: &State,
    path: &str,
    directory: bool,
    mut descriptor: SecurityDescriptor,
) -> SecurityDescriptor {
    if descriptor.is_protected() {
        return descriptor;
    }
    let Some(parent_dacl) = parent(normalize(path))
        .and_then(|p| state.objects.get(p))
        .and_then(|object| object.descriptor.dacl.as_ref())
    else {
        return descriptor;
    };

    let inherited: Vec<Ace> = parent_dacl
        .aces
        .iter()
        .filter_map(|ace| inherited_ace(ace, directory))
        .collect();
    if inherited.is_empty() {
        return descriptor;
    }

    let dacl = descriptor.dacl.get_or_insert_with(Dacl::default);
    dacl.aces.extend(inherited);
    descriptor.control |= DescriptorControl::DACL_AUTO_INHERITED;
    descriptor
}

fn inherited_ace(ace: &Ace, directory: bool) -> Option<Ace> {
    let flags = if directory {
        if !ace.flags.inherits_to_containers() {
            return None;
        }
        if ace.flags.contains(AceFlags::NO_PROPAGATE_INHERIT) {
            AceFlags::INHERITED
        } else {
            (ace.flags - AceFlags::INHERIT_ONLY) | AceFlags::INHERITED
        }
    } else {
        if !ace.flags.inherits_to_objects() {
            return None;
        }
        AceFlags::INHERITED
    };
    Some(Ace {
        flags,
        ..ace.clone()
    })
}
