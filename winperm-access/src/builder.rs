//! Entry constructors.
//!
//! Every entry built here inherits to sub-containers and objects, so rights
//! set on a directory flow to everything created beneath it.

use crate::entry::{AccessMode, ExplicitAccess, Inheritance, Trustee};
use crate::error::{AccessError, AccessResult};
use crate::mask::AccessMask;
use winperm_sid::Sid;

const INHERITANCE: Inheritance = Inheritance::SubContainersAndObjects;

/// Grants `permissions` to the principal identified by `sid`.
#[must_use]
pub fn grant_sid(permissions: AccessMask, sid: &Sid) -> ExplicitAccess {
    ExplicitAccess::new(permissions, AccessMode::Grant, INHERITANCE, Trustee::Sid(sid.clone()))
}

/// Grants `permissions` to the account called `name`.
pub fn grant_name(permissions: AccessMask, name: &str) -> AccessResult<ExplicitAccess> {
    Ok(ExplicitAccess::new(
        permissions,
        AccessMode::Grant,
        INHERITANCE,
        name_trustee(name)?,
    ))
}

/// Denies `permissions` to the principal identified by `sid`.
#[must_use]
pub fn deny_sid(permissions: AccessMask, sid: &Sid) -> ExplicitAccess {
    ExplicitAccess::new(permissions, AccessMode::Deny, INHERITANCE, Trustee::Sid(sid.clone()))
}

/// Denies `permissions` to the account called `name`.
pub fn deny_name(permissions: AccessMask, name: &str) -> AccessResult<ExplicitAccess> {
    Ok(ExplicitAccess::new(
        permissions,
        AccessMode::Deny,
        INHERITANCE,
        name_trustee(name)?,
    ))
}

fn name_trustee(name: &str) -> AccessResult<Trustee> {
    if name.is_empty() {
        return Err(AccessError::EmptyTrusteeName);
    }
    if name.contains('\0') {
        return Err(AccessError::NulInTrusteeName(name.to_string()));
    }
    Ok(Trustee::Name(name.to_string()))
}
