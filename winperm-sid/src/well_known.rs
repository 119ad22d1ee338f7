//! Catalogue of well-known security principals.

use crate::sid::Sid;
use serde::{Deserialize, Serialize};
use std::fmt;

const NULL_AUTHORITY: u64 = 0;
const WORLD_AUTHORITY: u64 = 1;
const LOCAL_AUTHORITY: u64 = 2;
const CREATOR_AUTHORITY: u64 = 3;
const NT_AUTHORITY: u64 = 5;

const BUILTIN_DOMAIN_RID: u32 = 32;
const DOMAIN_USER_RID_ADMIN: u32 = 500;

/// Well-known identity categories, numbered as the host numbers them.
///
/// Most categories map to a fixed SID that is the same on every machine.
/// Domain-relative categories such as [`WellKnownSid::AccountAdministrator`]
/// only exist relative to an account domain and have no fixed SID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(i32)]
pub enum WellKnownSid {
    Null = 0,
    World = 1,
    Local = 2,
    CreatorOwner = 3,
    CreatorGroup = 4,
    CreatorOwnerServer = 5,
    CreatorGroupServer = 6,
    NtAuthority = 7,
    Dialup = 8,
    Network = 9,
    Batch = 10,
    Interactive = 11,
    Service = 12,
    Anonymous = 13,
    Proxy = 14,
    EnterpriseControllers = 15,
    SelfPrincipal = 16,
    AuthenticatedUser = 17,
    RestrictedCode = 18,
    TerminalServer = 19,
    RemoteLogonId = 20,
    LogonIds = 21,
    LocalSystem = 22,
    LocalService = 23,
    NetworkService = 24,
    BuiltinDomain = 25,
    BuiltinAdministrators = 26,
    BuiltinUsers = 27,
    BuiltinGuests = 28,
    AccountAdministrator = 38,
}

impl WellKnownSid {
    /// Every category this crate knows about.
    pub const ALL: [WellKnownSid; 30] = [
        Self::Null,
        Self::World,
        Self::Local,
        Self::CreatorOwner,
        Self::CreatorGroup,
        Self::CreatorOwnerServer,
        Self::CreatorGroupServer,
        Self::NtAuthority,
        Self::Dialup,
        Self::Network,
        Self::Batch,
        Self::Interactive,
        Self::Service,
        Self::Anonymous,
        Self::Proxy,
        Self::EnterpriseControllers,
        Self::SelfPrincipal,
        Self::AuthenticatedUser,
        Self::RestrictedCode,
        Self::TerminalServer,
        Self::RemoteLogonId,
        Self::LogonIds,
        Self::LocalSystem,
        Self::LocalService,
        Self::NetworkService,
        Self::BuiltinDomain,
        Self::BuiltinAdministrators,
        Self::BuiltinUsers,
        Self::BuiltinGuests,
        Self::AccountAdministrator,
    ];

    /// Returns the host's numeric code for this category.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Looks up a category by its host numeric code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Returns the authority and sub-authorities of the fixed SID, if the
    /// category has one.
    fn components(self) -> Option<(u64, &'static [u32])> {
        let parts: (u64, &'static [u32]) = match self {
            Self::Null => (NULL_AUTHORITY, &[0]),
            Self::World => (WORLD_AUTHORITY, &[0]),
            Self::Local => (LOCAL_AUTHORITY, &[0]),
            Self::CreatorOwner => (CREATOR_AUTHORITY, &[0]),
            Self::CreatorGroup => (CREATOR_AUTHORITY, &[1]),
            Self::CreatorOwnerServer => (CREATOR_AUTHORITY, &[2]),
            Self::CreatorGroupServer => (CREATOR_AUTHORITY, &[3]),
            Self::NtAuthority => (NT_AUTHORITY, &[]),
            Self::Dialup => (NT_AUTHORITY, &[1]),
            Self::Network => (NT_AUTHORITY, &[2]),
            Self::Batch => (NT_AUTHORITY, &[3]),
            Self::Interactive => (NT_AUTHORITY, &[4]),
            Self::Service => (NT_AUTHORITY, &[6]),
            Self::Anonymous => (NT_AUTHORITY, &[7]),
            Self::Proxy => (NT_AUTHORITY, &[8]),
            Self::EnterpriseControllers => (NT_AUTHORITY, &[9]),
            Self::SelfPrincipal => (NT_AUTHORITY, &[10]),
            Self::AuthenticatedUser => (NT_AUTHORITY, &[11]),
            Self::RestrictedCode => (NT_AUTHORITY, &[12]),
            Self::TerminalServer => (NT_AUTHORITY, &[13]),
            Self::RemoteLogonId => (NT_AUTHORITY, &[14]),
            Self::LocalSystem => (NT_AUTHORITY, &[18]),
            Self::LocalService => (NT_AUTHORITY, &[19]),
            Self::NetworkService => (NT_AUTHORITY, &[20]),
            Self::BuiltinDomain => (NT_AUTHORITY, &[BUILTIN_DOMAIN_RID]),
            Self::BuiltinAdministrators => (NT_AUTHORITY, &[BUILTIN_DOMAIN_RID, 544]),
            Self::BuiltinUsers => (NT_AUTHORITY, &[BUILTIN_DOMAIN_RID, 545]),
            Self::BuiltinGuests => (NT_AUTHORITY, &[BUILTIN_DOMAIN_RID, 546]),
            // Logon SIDs are minted per session.
            Self::LogonIds => return None,
            Self::AccountAdministrator => return None,
        };
        Some(parts)
    }

    /// Returns the machine-independent SID for this category, or `None` for
    /// categories that depend on a domain or logon session.
    #[must_use]
    pub fn fixed_sid(self) -> Option<Sid> {
        let (authority, subs) = self.components()?;
        Sid::new(authority, subs).ok()
    }

    /// Returns the SID of this category within the given account domain.
    ///
    /// Only meaningful for domain-relative categories; fixed categories
    /// return their fixed SID regardless of the domain.
    #[must_use]
    pub fn in_domain(self, domain: &Sid) -> Option<Sid> {
        match self {
            Self::AccountAdministrator => domain.with_rid(DOMAIN_USER_RID_ADMIN).ok(),
            other => other.fixed_sid(),
        }
    }

    /// Returns the account name the host reports for this principal, for the
    /// categories that have a stable English name.
    #[must_use]
    pub const fn account_name(self) -> Option<&'static str> {
        match self {
            Self::World => Some("Everyone"),
            Self::CreatorOwner => Some("CREATOR OWNER"),
            Self::CreatorGroup => Some("CREATOR GROUP"),
            Self::Interactive => Some("NT AUTHORITY\\INTERACTIVE"),
            Self::Service => Some("NT AUTHORITY\\SERVICE"),
            Self::AuthenticatedUser => Some("NT AUTHORITY\\Authenticated Users"),
            Self::LocalSystem => Some("NT AUTHORITY\\SYSTEM"),
            Self::LocalService => Some("NT AUTHORITY\\LOCAL SERVICE"),
            Self::NetworkService => Some("NT AUTHORITY\\NETWORK SERVICE"),
            Self::BuiltinAdministrators => Some("BUILTIN\\Administrators"),
            Self::BuiltinUsers => Some("BUILTIN\\Users"),
            Self::BuiltinGuests => Some("BUILTIN\\Guests"),
            _ => None,
        }
    }
}

impl fmt::Display for WellKnownSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
