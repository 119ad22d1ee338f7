//! Owned security identifiers.
//!
//! A SID is a revision, a 48-bit identifier authority and up to fifteen
//! 32-bit sub-authorities. The canonical string form is `S-1-5-32-544`;
//! the binary form is the layout the host security API reads and writes.

use crate::error::{SidError, SidResult};
use crate::well_known::WellKnownSid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of sub-authorities a SID may carry.
pub const MAX_SUB_AUTHORITIES: usize = 15;

const SID_REVISION: u8 = 1;
const MAX_AUTHORITY: u64 = (1 << 48) - 1;
const HEADER_LEN: usize = 8;

/// Opaque identifier of a security principal (user, group or pseudo-account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sid {
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl Sid {
    /// Creates a SID from an identifier authority and its sub-authorities.
    pub fn new(authority: u64, sub_authorities: &[u32]) -> SidResult<Self> {
        if authority > MAX_AUTHORITY {
            return Err(SidError::Malformed(format!(
                "identifier authority {authority} exceeds 48 bits"
            )));
        }
        if sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(SidError::Malformed(format!(
                "{} sub-authorities, at most {MAX_SUB_AUTHORITIES} allowed",
                sub_authorities.len()
            )));
        }
        Ok(Self {
            authority,
            sub_authorities: sub_authorities.to_vec(),
        })
    }

    /// Parses a SID from its canonical string form.
    pub fn parse(s: &str) -> SidResult<Self> {
        s.parse()
    }

    /// Returns the identifier authority.
    #[must_use]
    pub const fn authority(&self) -> u64 {
        self.authority
    }

    /// Returns the sub-authorities in order.
    #[must_use]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Returns the relative identifier (the last sub-authority), if any.
    #[must_use]
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }

    /// Returns a new SID with `rid` appended, as used for domain-relative accounts.
    pub fn with_rid(&self, rid: u32) -> SidResult<Self> {
        let mut subs = self.sub_authorities.clone();
        subs.push(rid);
        Self::new(self.authority, &subs)
    }

    /// Returns true if this SID is the fixed SID of the given well-known category.
    #[must_use]
    pub fn is_well_known(&self, kind: WellKnownSid) -> bool {
        kind.fixed_sid().is_some_and(|sid| sid == *self)
    }

    /// Length in bytes of the binary form.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        HEADER_LEN + 4 * self.sub_authorities.len()
    }

    /// Encodes the SID in the host's binary layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        out.push(SID_REVISION);
        out.push(self.sub_authorities.len() as u8);
        out.extend_from_slice(&self.authority.to_be_bytes()[2..]);
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }

    /// Decodes a SID from the host's binary layout.
    ///
    /// Trailing bytes beyond the length implied by the header are ignored.
    pub fn from_bytes(bytes: &[u8]) -> SidResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SidError::Malformed(format!(
                "expected at least {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[0] != SID_REVISION {
            return Err(SidError::Malformed(format!("unsupported revision {}", bytes[0])));
        }
        let count = bytes[1] as usize;
        if count > MAX_SUB_AUTHORITIES {
            return Err(SidError::Malformed(format!(
                "{count} sub-authorities, at most {MAX_SUB_AUTHORITIES} allowed"
            )));
        }
        let needed = HEADER_LEN + 4 * count;
        if bytes.len() < needed {
            return Err(SidError::Malformed(format!(
                "expected {needed} bytes for {count} sub-authorities, got {}",
                bytes.len()
            )));
        }

        let mut authority_bytes = [0u8; 8];
        authority_bytes[2..].copy_from_slice(&bytes[2..HEADER_LEN]);
        let authority = u64::from_be_bytes(authority_bytes);

        let sub_authorities = bytes[HEADER_LEN..needed]
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self {
            authority,
            sub_authorities,
        })
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The host prints authorities that do not fit in 32 bits as hex.
        if self.authority >= 1 << 32 {
            write!(f, "S-{SID_REVISION}-0x{:012X}", self.authority)?;
        } else {
            write!(f, "S-{SID_REVISION}-{}", self.authority)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl FromStr for Sid {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');

        match parts.next() {
            Some(prefix) if prefix.eq_ignore_ascii_case("S") => {}
            _ => return Err(SidError::parse(s, "missing 'S-' prefix")),
        }

        let revision = parts
            .next()
            .ok_or_else(|| SidError::parse(s, "missing revision"))?;
        if revision != "1" {
            return Err(SidError::parse(s, format!("unsupported revision '{revision}'")));
        }

        let authority_str = parts
            .next()
            .ok_or_else(|| SidError::parse(s, "missing identifier authority"))?;
        let authority = parse_authority(authority_str)
            .ok_or_else(|| SidError::parse(s, format!("invalid authority '{authority_str}'")))?;

        let sub_authorities = parts
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| SidError::parse(s, format!("invalid sub-authority '{part}'")))
            })
            .collect::<SidResult<Vec<_>>>()?;

        Self::new(authority, &sub_authorities).map_err(|e| SidError::parse(s, e.to_string()))
    }
}

fn parse_authority(s: &str) -> Option<u64> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => s.parse::<u64>().ok()?,
    };
    (value <= MAX_AUTHORITY).then_some(value)
}

impl TryFrom<String> for Sid {
    type Error = SidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sid> for String {
    fn from(sid: Sid) -> Self {
        sid.to_string()
    }
}
