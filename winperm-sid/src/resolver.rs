//! Identity lookup service.

use crate::error::{SidError, SidResult};
use crate::sid::Sid;
use crate::well_known::WellKnownSid;

/// Answers "who" questions with resolved identity handles.
///
/// Implementations must report lookup failures as
/// [`SidError::Resolution`] rather than panicking, and must not mutate any
/// host state.
pub trait IdentityResolver {
    /// SID of the user the process runs as.
    fn current_user(&self) -> SidResult<Sid>;

    /// SID of the primary group of the process.
    fn current_group(&self) -> SidResult<Sid>;

    /// SID of the given well-known category.
    fn well_known(&self, kind: WellKnownSid) -> SidResult<Sid>;

    /// SID of the "Everyone" pseudo-group.
    fn everyone(&self) -> SidResult<Sid> {
        self.well_known(WellKnownSid::World)
    }

    /// SID of the built-in administrators group.
    fn administrators(&self) -> SidResult<Sid> {
        self.well_known(WellKnownSid::BuiltinAdministrators)
    }

    /// SID of the local system account.
    fn local_system(&self) -> SidResult<Sid> {
        self.well_known(WellKnownSid::LocalSystem)
    }
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn current_user(&self) -> SidResult<Sid> {
        (**self).current_user()
    }

    fn current_group(&self) -> SidResult<Sid> {
        (**self).current_group()
    }

    fn well_known(&self, kind: WellKnownSid) -> SidResult<Sid> {
        (**self).well_known(kind)
    }
}

/// Resolver over a fixed user and group.
///
/// Useful wherever the process identity is known up front: tests, services
/// configured to act on behalf of a specific account, or tools that resolve
/// the identity once and want deterministic lookups afterwards.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    user: Sid,
    group: Sid,
    domain: Option<Sid>,
}

impl StaticResolver {
    /// Creates a resolver reporting `user` and `group` as the current identity.
    #[must_use]
    pub fn new(user: Sid, group: Sid) -> Self {
        Self {
            user,
            group,
            domain: None,
        }
    }

    /// Creates a resolver for a process running as the local system account,
    /// where both the user and the primary group are `S-1-5-18`.
    pub fn local_system() -> SidResult<Self> {
        let system = fixed(WellKnownSid::LocalSystem)?;
        Ok(Self::new(system.clone(), system))
    }

    /// Sets the account domain used for domain-relative categories.
    #[must_use]
    pub fn with_domain(mut self, domain: Sid) -> Self {
        self.domain = Some(domain);
        self
    }
}

impl IdentityResolver for StaticResolver {
    fn current_user(&self) -> SidResult<Sid> {
        Ok(self.user.clone())
    }

    fn current_group(&self) -> SidResult<Sid> {
        Ok(self.group.clone())
    }

    fn well_known(&self, kind: WellKnownSid) -> SidResult<Sid> {
        match &self.domain {
            Some(domain) => kind.in_domain(domain).ok_or_else(|| unsupported(kind)),
            None => fixed(kind),
        }
    }
}

fn fixed(kind: WellKnownSid) -> SidResult<Sid> {
    kind.fixed_sid().ok_or_else(|| unsupported(kind))
}

fn unsupported(kind: WellKnownSid) -> SidError {
    SidError::resolution(
        format!("well-known SID {kind}"),
        "category has no fixed SID and no account domain is configured",
    )
}
