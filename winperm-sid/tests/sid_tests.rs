use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;
use winperm_sid::{Sid, SidError, WellKnownSid, MAX_SUB_AUTHORITIES};

// ── Parsing ───────────────────────────────────────────────────────

#[test]
fn parse_builtin_administrators() {
    let sid = Sid::parse("S-1-5-32-544").unwrap();
    assert_eq!(sid.authority(), 5);
    assert_eq!(sid.sub_authorities(), &[32, 544]);
    assert_eq!(sid.rid(), Some(544));
}

#[test]
fn parse_without_sub_authorities() {
    let sid = Sid::parse("S-1-5").unwrap();
    assert_eq!(sid.authority(), 5);
    assert!(sid.sub_authorities().is_empty());
    assert_eq!(sid.rid(), None);
}

#[test]
fn parse_lowercase_prefix() {
    let sid = Sid::from_str("s-1-1-0").unwrap();
    assert_eq!(sid.to_string(), "S-1-1-0");
}

#[test]
fn parse_hex_authority() {
    let sid = Sid::parse("S-1-0x000000000005-18").unwrap();
    assert_eq!(sid, Sid::parse("S-1-5-18").unwrap());
}

#[test]
fn parse_rejects_garbage() {
    for input in ["", "S", "S-1", "X-1-5-18", "S-2-5-18", "S-1-5-abc", "S-1-5-", "S-1--5"] {
        let err = Sid::parse(input).unwrap_err();
        assert!(matches!(err, SidError::Parse { .. }), "{input}: {err}");
    }
}

#[test]
fn parse_rejects_sub_authority_overflow() {
    assert!(Sid::parse("S-1-5-4294967296").is_err());
}

#[test]
fn parse_rejects_too_many_sub_authorities() {
    let subs = vec!["1"; MAX_SUB_AUTHORITIES + 1].join("-");
    assert!(Sid::parse(&format!("S-1-5-{subs}")).is_err());

    let subs = vec!["1"; MAX_SUB_AUTHORITIES].join("-");
    assert!(Sid::parse(&format!("S-1-5-{subs}")).is_ok());
}

// ── Binary form ───────────────────────────────────────────────────

#[test]
fn local_system_bytes() {
    let sid = Sid::parse("S-1-5-18").unwrap();
    assert_eq!(sid.to_bytes(), vec![1, 1, 0, 0, 0, 0, 0, 5, 18, 0, 0, 0]);
    assert_eq!(sid.byte_len(), 12);
}

#[test]
fn from_bytes_ignores_trailing_data() {
    let mut bytes = Sid::parse("S-1-1-0").unwrap().to_bytes();
    bytes.extend_from_slice(&[0xAA, 0xBB]);
    assert_eq!(Sid::from_bytes(&bytes).unwrap().to_string(), "S-1-1-0");
}

#[test]
fn from_bytes_rejects_truncation() {
    let bytes = Sid::parse("S-1-5-32-544").unwrap().to_bytes();
    let err = Sid::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, SidError::Malformed(_)));
    assert!(Sid::from_bytes(&bytes[..4]).is_err());
}

#[test]
fn from_bytes_rejects_bad_revision() {
    let mut bytes = Sid::parse("S-1-5-18").unwrap().to_bytes();
    bytes[0] = 2;
    assert!(Sid::from_bytes(&bytes).is_err());
}

// ── Equality and serialization ────────────────────────────────────

#[test]
fn sid_hash_and_eq() {
    let mut set = HashSet::new();
    set.insert(Sid::parse("S-1-5-18").unwrap());
    set.insert(Sid::parse("s-1-5-18").unwrap());
    set.insert(Sid::parse("S-1-5-19").unwrap());
    assert_eq!(set.len(), 2);
}

#[test]
fn sid_serializes_as_string() {
    let sid = Sid::parse("S-1-5-21-1004336348-1177238915-682003330-512").unwrap();
    let json = serde_json::to_string(&sid).unwrap();
    assert_eq!(json, "\"S-1-5-21-1004336348-1177238915-682003330-512\"");
    let parsed: Sid = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, sid);
}

#[test]
fn sid_deserialize_invalid() {
    assert!(serde_json::from_str::<Sid>("\"not-a-sid\"").is_err());
}

#[test]
fn with_rid_appends() {
    let domain = Sid::parse("S-1-5-21-1-2-3").unwrap();
    assert_eq!(domain.with_rid(500).unwrap().to_string(), "S-1-5-21-1-2-3-500");
}

// ── Well-known categories ─────────────────────────────────────────

#[test]
fn well_known_fixed_sids() {
    let cases = [
        (WellKnownSid::World, "S-1-1-0"),
        (WellKnownSid::Service, "S-1-5-6"),
        (WellKnownSid::LocalService, "S-1-5-19"),
        (WellKnownSid::NtAuthority, "S-1-5"),
        (WellKnownSid::LocalSystem, "S-1-5-18"),
        (WellKnownSid::BuiltinAdministrators, "S-1-5-32-544"),
        (WellKnownSid::BuiltinUsers, "S-1-5-32-545"),
        (WellKnownSid::CreatorOwner, "S-1-3-0"),
    ];
    for (kind, expected) in cases {
        assert_eq!(kind.fixed_sid().unwrap().to_string(), expected, "{kind}");
    }
}

#[test]
fn well_known_codes_match_host_numbering() {
    assert_eq!(WellKnownSid::World.code(), 1);
    assert_eq!(WellKnownSid::Service.code(), 12);
    assert_eq!(WellKnownSid::LocalSystem.code(), 22);
    assert_eq!(WellKnownSid::BuiltinAdministrators.code(), 26);
    assert_eq!(WellKnownSid::AccountAdministrator.code(), 38);
    assert_eq!(WellKnownSid::from_code(22), Some(WellKnownSid::LocalSystem));
    assert_eq!(WellKnownSid::from_code(999), None);
}

#[test]
fn domain_relative_has_no_fixed_sid() {
    assert!(WellKnownSid::AccountAdministrator.fixed_sid().is_none());
    assert!(WellKnownSid::LogonIds.fixed_sid().is_none());
}

#[test]
fn is_well_known_compares_fixed_sid() {
    let system = Sid::parse("S-1-5-18").unwrap();
    assert!(system.is_well_known(WellKnownSid::LocalSystem));
    assert!(!system.is_well_known(WellKnownSid::LocalService));
    assert!(!system.is_well_known(WellKnownSid::AccountAdministrator));
}

#[test]
fn fixed_sids_are_distinct() {
    let sids: HashSet<Sid> = WellKnownSid::ALL
        .iter()
        .filter_map(|kind| kind.fixed_sid())
        .collect();
    let with_fixed = WellKnownSid::ALL
        .iter()
        .filter(|kind| kind.fixed_sid().is_some())
        .count();
    assert_eq!(sids.len(), with_fixed);
}

// ── Properties ────────────────────────────────────────────────────

fn sid_strategy() -> impl Strategy<Value = Sid> {
    (
        0u64..(1 << 48),
        prop::collection::vec(any::<u32>(), 0..=MAX_SUB_AUTHORITIES),
    )
        .prop_map(|(authority, subs)| Sid::new(authority, &subs).unwrap())
}

proptest! {
    #[test]
    fn string_form_roundtrips(sid in sid_strategy()) {
        let parsed = Sid::parse(&sid.to_string()).unwrap();
        prop_assert_eq!(parsed, sid);
    }

    #[test]
    fn binary_form_roundtrips(sid in sid_strategy()) {
        let bytes = sid.to_bytes();
        prop_assert_eq!(bytes.len(), sid.byte_len());
        prop_assert_eq!(Sid::from_bytes(&bytes).unwrap(), sid);
    }
}
