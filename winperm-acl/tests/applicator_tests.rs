//! Tests for the applicator against the in-memory descriptor store.

use pretty_assertions::assert_eq;
use winperm_access::{deny_sid, grant_name, grant_sid, AccessMask, AceFlags};
use winperm_acl::{
    Ace, AceKind, AclApplicator, AclConfig, AclError, Dacl, HostErrorKind, MemoryStore,
    ObjectKind, SecurityAttributes, SecurityChange, SecurityInformation, StoreCall,
};
use winperm_filemode::FileMode;
use winperm_sid::{Identities, Sid, StaticResolver};

const RWX: AccessMask = AccessMask::from_raw(0xE001_0000);
const RX: AccessMask = AccessMask::from_raw(0xA000_0000);
const INHERIT: AceFlags = AceFlags::OBJECT_INHERIT.union(AceFlags::CONTAINER_INHERIT);

fn sid(s: &str) -> Sid {
    Sid::parse(s).unwrap()
}

fn user() -> Sid {
    sid("S-1-5-21-1-2-3-1001")
}

fn group() -> Sid {
    sid("S-1-5-21-1-2-3-513")
}

fn everyone() -> Sid {
    sid("S-1-1-0")
}

fn system() -> Sid {
    sid("S-1-5-18")
}

fn administrators() -> Sid {
    sid("S-1-5-32-544")
}

fn user_identities() -> Identities {
    Identities::resolve(&StaticResolver::new(user(), group())).unwrap()
}

fn system_identities() -> Identities {
    Identities::resolve(&StaticResolver::local_system().unwrap()).unwrap()
}

fn applicator() -> AclApplicator<MemoryStore> {
    init_tracing();
    AclApplicator::new(MemoryStore::new(user(), group()))
}

fn allowed(mask: AccessMask, sid: Sid) -> Ace {
    Ace {
        kind: AceKind::Allowed,
        flags: INHERIT,
        mask,
        sid,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dacl_of(applicator: &AclApplicator<MemoryStore>, path: &str) -> Vec<Ace> {
    applicator
        .store()
        .descriptor(path)
        .and_then(|d| d.dacl)
        .map(|d| d.aces)
        .unwrap_or_default()
}

// ── apply ───────────────────────────────────────────────────────

#[test]
fn apply_with_nothing_to_change_never_contacts_store() {
    let acl = applicator();
    acl.apply("C:\\missing", None, None, &[]).unwrap();
    assert!(acl.store().calls().is_empty());
}

#[test]
fn apply_rejects_empty_path() {
    let acl = applicator();
    let err = acl
        .apply("", Some(&user()), None, &[grant_sid(RWX, &user())])
        .unwrap_err();
    assert!(matches!(err, AclError::InvalidArgument(_)));
    assert!(acl.store().calls().is_empty());
}

#[test]
fn apply_rejects_nul_in_path_before_store() {
    let acl = applicator();
    let err = acl
        .apply("C:\\data\0.evil", Some(&user()), None, &[grant_sid(RWX, &user())])
        .unwrap_err();
    assert!(matches!(err, AclError::InvalidArgument(_)));
    assert!(acl.store().calls().is_empty());
}

#[test]
fn apply_owner_only_touches_owner() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");
    let new_owner = sid("S-1-5-21-1-2-3-1500");

    acl.apply("C:\\data.txt", Some(&new_owner), None, &[]).unwrap();

    assert_eq!(
        acl.store().calls(),
        vec![StoreCall::SetSecurity {
            path: "C:\\data.txt".to_string(),
            kind: ObjectKind::File,
            info: SecurityInformation::OWNER,
            owner: Some(new_owner.clone()),
            group: None,
            dacl: None,
        }]
    );
    let descriptor = acl.store().descriptor("C:\\data.txt").unwrap();
    assert_eq!(descriptor.owner, Some(new_owner));
    assert_eq!(descriptor.group, Some(group()));
}

#[test]
fn apply_entries_replaces_dacl_and_protects_it() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");

    acl.apply("C:\\data.txt", None, None, &[grant_sid(RWX, &everyone())])
        .unwrap();

    let expected = Dacl::new(vec![allowed(RWX, everyone())]);
    assert_eq!(
        acl.store().calls(),
        vec![
            StoreCall::BuildDacl { entries: 1 },
            StoreCall::SetSecurity {
                path: "C:\\data.txt".to_string(),
                kind: ObjectKind::File,
                info: SecurityInformation::DACL | SecurityInformation::PROTECTED_DACL,
                owner: None,
                group: None,
                dacl: Some(expected.clone()),
            },
        ]
    );
    let descriptor = acl.store().descriptor("C:\\data.txt").unwrap();
    assert!(descriptor.is_protected());
    assert_eq!(descriptor.dacl, Some(expected));
}

#[test]
fn apply_keeps_entry_order() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");
    let entries = [
        grant_sid(RWX, &user()),
        deny_sid(AccessMask::GENERIC_WRITE, &everyone()),
    ];

    acl.apply("C:\\data.txt", None, None, &entries).unwrap();

    let aces = dacl_of(&acl, "C:\\data.txt");
    assert_eq!(aces.len(), 2);
    assert_eq!(aces[0].kind, AceKind::Allowed);
    assert_eq!(aces[1].kind, AceKind::Denied);
    assert_eq!(aces[1].sid, everyone());
}

#[test]
fn apply_is_idempotent() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");
    let entries = [grant_sid(RWX, &user()), grant_sid(RX, &everyone())];

    acl.apply("C:\\data.txt", Some(&user()), Some(&group()), &entries)
        .unwrap();
    let first = acl.store().descriptor("C:\\data.txt");
    acl.apply("C:\\data.txt", Some(&user()), Some(&group()), &entries)
        .unwrap();

    assert_eq!(acl.store().descriptor("C:\\data.txt"), first);
}

#[test]
fn apply_on_missing_object_is_not_found() {
    let acl = applicator();
    let err = acl
        .apply("C:\\missing", None, None, &[grant_sid(RWX, &user())])
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn apply_resolves_name_trustees() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");
    let service = sid("S-1-5-21-7-7-7-2001");
    acl.store().register_account("CONTOSO\\svc-backup", service.clone());

    let entries = [
        grant_name(RX, "everyone").unwrap(),
        grant_name(RWX, "contoso\\SVC-BACKUP").unwrap(),
        grant_name(RWX, "NT AUTHORITY\\SYSTEM").unwrap(),
    ];
    acl.apply("C:\\data.txt", None, None, &entries).unwrap();

    assert_eq!(
        dacl_of(&acl, "C:\\data.txt"),
        vec![
            allowed(RX, everyone()),
            allowed(RWX, service),
            allowed(RWX, system()),
        ]
    );
}

#[test]
fn unknown_account_fails_before_writing() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");

    let err = acl
        .apply("C:\\data.txt", None, None, &[grant_name(RX, "nobody").unwrap()])
        .unwrap_err();

    assert_eq!(err.host_kind(), Some(HostErrorKind::AccountNotFound));
    assert!(
        !acl.store()
            .calls()
            .iter()
            .any(|call| matches!(call, StoreCall::SetSecurity { .. }))
    );
}

#[test]
fn commit_of_noop_change_is_silent() {
    let acl = applicator();
    let change = SecurityChange::new("C:\\anything").unwrap();
    acl.commit(&change).unwrap();
    assert!(acl.store().calls().is_empty());
}

// ── change_owner_group ──────────────────────────────────────────

#[test]
fn change_owner_group_applies_default_mode_to_new_identities() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");
    let owner = sid("S-1-5-21-1-2-3-1500");
    let grp = sid("S-1-5-32-545");

    acl.change_owner_group("C:\\data.txt", Some(&owner), Some(&grp), &user_identities())
        .unwrap();

    let descriptor = acl.store().descriptor("C:\\data.txt").unwrap();
    assert_eq!(descriptor.owner, Some(owner.clone()));
    assert_eq!(descriptor.group, Some(grp.clone()));
    assert_eq!(
        descriptor.dacl.unwrap().aces,
        vec![
            allowed(RWX, owner),
            allowed(RX, grp),
            allowed(RX, everyone()),
        ]
    );
}

#[test]
fn change_owner_group_falls_back_to_current_identities() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");
    let owner = sid("S-1-5-21-1-2-3-1500");

    acl.change_owner_group("C:\\data.txt", Some(&owner), None, &user_identities())
        .unwrap();

    let descriptor = acl.store().descriptor("C:\\data.txt").unwrap();
    assert_eq!(descriptor.owner, Some(owner.clone()));
    assert_eq!(
        descriptor.dacl.unwrap().aces,
        vec![
            allowed(RWX, owner),
            allowed(RX, group()),
            allowed(RX, everyone()),
        ]
    );
    assert!(matches!(
        acl.store().calls().last(),
        Some(StoreCall::SetSecurity { info, .. })
            if *info == SecurityInformation::OWNER
                | SecurityInformation::DACL
                | SecurityInformation::PROTECTED_DACL
    ));
}

#[test]
fn change_owner_group_to_system_grants_administrators() {
    let acl = applicator();
    acl.store().insert_file("C:\\svc.log");

    acl.change_owner_group("C:\\svc.log", Some(&system()), Some(&system()), &system_identities())
        .unwrap();

    assert_eq!(
        dacl_of(&acl, "C:\\svc.log"),
        vec![
            allowed(RWX, system()),
            allowed(RX, system()),
            allowed(RX, everyone()),
            allowed(RWX, administrators()),
        ]
    );
}

#[test]
fn change_owner_group_uses_configured_mode() {
    let config = AclConfig {
        chown_mode: FileMode::new(0o700),
        ..AclConfig::default()
    };
    let acl = AclApplicator::with_config(MemoryStore::new(user(), group()), config);
    acl.store().insert_file("C:\\secret");

    acl.change_owner_group("C:\\secret", Some(&user()), Some(&group()), &user_identities())
        .unwrap();

    assert_eq!(dacl_of(&acl, "C:\\secret"), vec![allowed(RWX, user())]);
}

#[test]
fn change_owner_group_rejects_empty_path() {
    let acl = applicator();
    let err = acl
        .change_owner_group("", Some(&user()), None, &user_identities())
        .unwrap_err();
    assert!(matches!(err, AclError::InvalidArgument(_)));
}

// ── change_mode ─────────────────────────────────────────────────

#[test]
fn change_mode_binds_entries_to_process_identity() {
    let file_owner = sid("S-1-5-21-1-2-3-1777");
    let file_group = sid("S-1-5-32-545");
    let acl = AclApplicator::new(MemoryStore::new(file_owner.clone(), file_group.clone()));
    acl.store().insert_file("C:\\shared.txt");

    acl.change_mode("C:\\shared.txt", FileMode::new(0o750), &user_identities())
        .unwrap();

    let descriptor = acl.store().descriptor("C:\\shared.txt").unwrap();
    assert_eq!(descriptor.owner, Some(file_owner));
    assert_eq!(descriptor.group, Some(file_group));
    assert_eq!(
        descriptor.dacl.unwrap().aces,
        vec![allowed(RWX, user()), allowed(RX, group())]
    );
}

#[test]
fn change_mode_leaves_owner_and_group_alone() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");

    acl.change_mode("C:\\data.txt", FileMode::new(0o777), &user_identities())
        .unwrap();

    assert_eq!(
        acl.store().calls(),
        vec![
            StoreCall::BuildDacl { entries: 3 },
            StoreCall::SetSecurity {
                path: "C:\\data.txt".to_string(),
                kind: ObjectKind::File,
                info: SecurityInformation::DACL | SecurityInformation::PROTECTED_DACL,
                owner: None,
                group: None,
                dacl: Some(Dacl::new(vec![
                    allowed(RWX, user()),
                    allowed(RWX, group()),
                    allowed(RWX, everyone()),
                ])),
            },
        ]
    );
}

#[test]
fn change_mode_on_system_object_skips_administrators() {
    let acl = AclApplicator::new(MemoryStore::new(system(), system()));
    acl.store().insert_file("C:\\svc.log");

    acl.change_mode("C:\\svc.log", FileMode::new(0o755), &system_identities())
        .unwrap();

    let aces = dacl_of(&acl, "C:\\svc.log");
    assert_eq!(aces.len(), 3);
    assert!(aces.iter().all(|ace| ace.sid != administrators()));
}

#[test]
fn change_mode_zero_writes_nothing() {
    let acl = applicator();
    acl.store().insert_file("C:\\data.txt");
    let before = acl.store().descriptor("C:\\data.txt");

    acl.change_mode("C:\\data.txt", FileMode::new(0), &user_identities())
        .unwrap();

    assert_eq!(acl.store().descriptor("C:\\data.txt"), before);
    assert!(acl.store().calls().is_empty());
}

#[test]
fn change_mode_rejects_empty_path() {
    let acl = applicator();
    let err = acl
        .change_mode("", FileMode::new(0o644), &user_identities())
        .unwrap_err();
    assert!(matches!(err, AclError::InvalidArgument(_)));
}

#[test]
fn change_mode_on_missing_object_is_not_found() {
    let acl = applicator();
    let err = acl
        .change_mode("C:\\missing", FileMode::new(0o644), &user_identities())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn change_mode_uses_configured_object_kind() {
    let config = AclConfig {
        object_kind: ObjectKind::RegistryKey,
        ..AclConfig::default()
    };
    let acl = AclApplicator::with_config(MemoryStore::new(user(), group()), config);
    acl.store().insert_file("HKLM\\SOFTWARE\\app");

    acl.change_mode("HKLM\\SOFTWARE\\app", FileMode::new(0o700), &user_identities())
        .unwrap();

    assert!(
        acl.store()
            .calls()
            .iter()
            .all(|call| match call {
                StoreCall::SetSecurity { kind, .. } => {
                    *kind == ObjectKind::RegistryKey
                }
                _ => true,
            })
    );
}

// ── ensure_directory ────────────────────────────────────────────

#[test]
fn ensure_directory_rejects_empty_path() {
    let acl = applicator();
    let err = acl.ensure_directory("", &[]).unwrap_err();
    assert!(matches!(err, AclError::InvalidArgument(_)));
    assert!(acl.store().calls().is_empty());
}

#[test]
fn ensure_directory_creates_with_protected_dacl() {
    let acl = applicator();
    acl.store().insert_directory("C:\\app");
    acl.apply("C:\\app", None, None, &[grant_sid(RX, &everyone())])
        .unwrap();
    acl.store().clear_calls();

    acl.ensure_directory("C:\\app\\data", &[grant_sid(RWX, &user())])
        .unwrap();

    let calls = acl.store().calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        StoreCall::Exists {
            path: "C:\\app\\data".to_string()
        }
    );
    assert!(matches!(
        &calls[2],
        StoreCall::CreateWithSecurity { attributes, .. }
            if !attributes.inherit_handle
                && attributes.descriptor.as_ref().is_some_and(|d| d.is_protected())
    ));

    assert!(acl.store().is_directory("C:\\app\\data"));
    let descriptor = acl.store().descriptor("C:\\app\\data").unwrap();
    assert!(descriptor.is_protected());
    assert_eq!(descriptor.owner, Some(user()));
    assert_eq!(descriptor.dacl.unwrap().aces, vec![allowed(RWX, user())]);
}

#[test]
fn ensure_directory_without_entries_inherits_from_parent() {
    let acl = applicator();
    acl.store().insert_directory("C:\\app");
    acl.apply("C:\\app", None, None, &[grant_sid(RX, &everyone())])
        .unwrap();
    acl.store().clear_calls();

    acl.ensure_directory("C:\\app\\cache", &[]).unwrap();

    assert_eq!(
        acl.store().calls(),
        vec![
            StoreCall::Exists {
                path: "C:\\app\\cache".to_string()
            },
            StoreCall::CreateWithSecurity {
                path: "C:\\app\\cache".to_string(),
                attributes: SecurityAttributes {
                    descriptor: None,
                    inherit_handle: true,
                },
            },
        ]
    );
    let descriptor = acl.store().descriptor("C:\\app\\cache").unwrap();
    assert!(!descriptor.is_protected());
    assert_eq!(
        descriptor.dacl.unwrap().aces,
        vec![Ace {
            flags: INHERIT | AceFlags::INHERITED,
            ..allowed(RX, everyone())
        }]
    );
}

#[test]
fn ensure_directory_on_existing_applies_without_owner_or_group() {
    let acl = applicator();
    acl.store().insert_directory("C:\\app");

    acl.ensure_directory("C:\\app", &[grant_sid(RWX, &everyone())])
        .unwrap();

    let calls = acl.store().calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(
        &calls[2],
        StoreCall::SetSecurity { owner: None, group: None, info, .. }
            if *info == SecurityInformation::DACL | SecurityInformation::PROTECTED_DACL
    ));
    assert_eq!(dacl_of(&acl, "C:\\app"), vec![allowed(RWX, everyone())]);
}

#[test]
fn ensure_directory_on_existing_without_entries_changes_nothing() {
    let acl = applicator();
    acl.store().insert_directory("C:\\app");
    let before = acl.store().descriptor("C:\\app");

    acl.ensure_directory("C:\\app", &[]).unwrap();

    assert_eq!(acl.store().descriptor("C:\\app"), before);
    assert_eq!(
        acl.store().calls(),
        vec![StoreCall::Exists {
            path: "C:\\app".to_string()
        }]
    );
}

#[test]
fn ensure_directory_twice_is_idempotent() {
    let acl = applicator();
    let entries = [grant_sid(RWX, &user()), grant_sid(RX, &everyone())];

    acl.ensure_directory("C:\\app", &entries).unwrap();
    let first = acl.store().descriptor("C:\\app");
    acl.ensure_directory("C:\\app", &entries).unwrap();

    assert_eq!(acl.store().descriptor("C:\\app"), first);
}

#[test]
fn ensure_directory_with_missing_parent_is_not_found() {
    let acl = applicator();
    let err = acl
        .ensure_directory("C:\\missing\\child", &[])
        .unwrap_err();
    assert!(err.is_not_found());
}

// ── Properties ──────────────────────────────────────────────────

proptest::proptest! {
    #[test]
    fn change_mode_is_idempotent(mode in 0u32..=0o777) {
        let acl = AclApplicator::new(MemoryStore::new(user(), group()));
        acl.store().insert_file("C:\\data.txt");
        let ids = user_identities();

        acl.change_mode("C:\\data.txt", FileMode::new(mode), &ids).unwrap();
        let once = acl.store().descriptor("C:\\data.txt");
        acl.change_mode("C:\\data.txt", FileMode::new(mode), &ids).unwrap();

        proptest::prop_assert_eq!(acl.store().descriptor("C:\\data.txt"), once);
    }

    #[test]
    fn dacl_written_iff_any_permission_bit(mode in 0u32..=0o777) {
        let acl = AclApplicator::new(MemoryStore::new(user(), group()));
        acl.store().insert_file("C:\\data.txt");

        acl.change_mode("C:\\data.txt", FileMode::new(mode), &user_identities()).unwrap();

        let wrote = acl
            .store()
            .calls()
            .iter()
            .any(|call| matches!(call, StoreCall::SetSecurity { .. }));
        proptest::prop_assert_eq!(wrote, mode != 0);
    }
}
