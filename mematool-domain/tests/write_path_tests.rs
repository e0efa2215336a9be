use mematool_domain::{
    application::ports::{FactoryConfig, MembershipPolicy, MembershipRepository, Modification},
    domain::{
        entities::{CascadeAction, DirectoryEntity, Member, StepOutcome, REDACTED_CREDENTIAL},
        errors::DomainError,
    },
    infrastructure::adapters::LdapModelFactory,
};
use std::sync::Arc;

mod mocks;
use mocks::*;

fn new_member(uid: &str) -> Member {
    let mut member = Member::new(uid.to_string()).unwrap();
    member.cn = Some("Dave Null".to_string());
    member.sn = Some("Null".to_string());
    member.given_name = Some("Dave".to_string());
    member.home_directory = Some(format!("/home/{uid}"));
    member.login_shell = Some("/bin/bash".to_string());
    member.mail = Some(format!("{uid}@example.org"));
    member.is_minor = Some(false);
    member.user_password = Some("{SSHA}initial".to_string());
    member.jpeg_photo = Some("/9j/".to_string());
    member.full_member = true;
    member
}

#[tokio::test]
async fn test_add_member_round_trips_through_get_user() {
    let (factory, directory) = factory_with(hackerspace());
    let mut dave = new_member("dave");

    let report = factory.add_member(&mut dave).await.unwrap();

    assert_eq!(dave.uid_number, Some(1003));
    assert_eq!(dave.gid_number, Some(100));
    assert!(report.is_complete());
    assert_eq!(
        report.outcome_of(&CascadeAction::JoinGroup {
            group: "syn2cat_full_member".to_string()
        }),
        Some(&StepOutcome::Applied)
    );
    assert_eq!(
        report.outcome_of(&CascadeAction::LeaveGroup {
            group: "syn2cat_locked_member".to_string()
        }),
        Some(&StepOutcome::Unchanged)
    );

    let stored = factory.get_user("dave", false).await.unwrap();
    for descriptor in Member::auto_update_fields() {
        assert_eq!(
            stored.value_of(descriptor.attribute),
            dave.value_of(descriptor.attribute),
            "{} differs after round trip",
            descriptor.attribute
        );
    }
    assert!(stored.full_member);
    assert!(!stored.locked_member);
    assert_eq!(stored.user_password.as_deref(), Some("{SSHA}initial"));

    let entry = directory.inner.entry(&user_dn("dave")).await.unwrap();
    assert!(entry
        .values("objectClass")
        .unwrap()
        .iter()
        .any(|c| c == "syn2catPerson"));
    assert_eq!(entry.first_value("ou"), Some("People"));
    assert!(entry.values("jpegPhoto").is_none());
}

#[tokio::test]
async fn test_add_member_derives_samba_sid_when_configured() {
    let directory = Arc::new(RecordingDirectory::new(hackerspace()));
    let config = FactoryConfig {
        membership: MembershipPolicy {
            samba_domain_sid: Some("S-1-5-21-1-2-3".to_string()),
            ..MembershipPolicy::default()
        },
        ..test_config()
    };
    let factory = LdapModelFactory::new(directory.clone(), config);

    let mut dave = new_member("dave");
    factory.add_member(&mut dave).await.unwrap();

    assert_eq!(dave.samba_sid.as_deref(), Some("S-1-5-21-1-2-3-3006"));
    let entry = directory.inner.entry(&user_dn("dave")).await.unwrap();
    assert_eq!(entry.first_value("sambaSID"), Some("S-1-5-21-1-2-3-3006"));
}

#[tokio::test]
async fn test_add_member_conflicts_with_existing_uid() {
    let (factory, directory) = factory_with(hackerspace());
    let mut alice = new_member("alice");

    let err = factory.add_member(&mut alice).await.unwrap_err();

    assert!(err.is_conflict());
    let stored = directory.inner.entry(&user_dn("alice")).await.unwrap();
    assert_eq!(stored.first_value("cn"), Some("alice"));
}

#[tokio::test]
async fn test_add_member_rejects_invalid_uid() {
    let (factory, directory) = factory_with(hackerspace());
    let mut member = Member {
        uid: "bad,uid".to_string(),
        ..Default::default()
    };

    let err = factory.add_member(&mut member).await.unwrap_err();

    assert!(matches!(err, DomainError::Validation { .. }));
    assert!(directory.writes().is_empty());
}

#[tokio::test]
async fn test_add_member_fails_when_top_uid_is_taken() {
    let entries = vec![member_entry("olduser", 64998), member_entry("lastuser", 64999)];
    let (factory, directory) = factory_with(entries);
    let mut dave = new_member("dave");

    let err = factory.add_member(&mut dave).await.unwrap_err();

    assert!(matches!(err, DomainError::IdPoolExhausted { ref pool } if pool == "uidNumber"));
    assert_eq!(dave.uid_number, None);
    assert!(directory.writes().is_empty());
    assert!(!directory.inner.contains(&user_dn("dave")).await);
}

#[tokio::test]
async fn test_admin_update_writes_only_the_difference() {
    let (factory, directory) = factory_with(hackerspace());
    let mut alice = factory.get_user("alice", true).await.unwrap();

    alice.mobile = Some("+352 621 000 000".to_string());
    alice.cn = Some("Alice Smith".to_string());
    alice.home_directory = None;
    alice.groups = vec!["board".to_string(), "syn2cat_full_member".to_string()];

    let report = factory.update_member(&alice, true).await.unwrap();

    let writes = directory.writes_to(&user_dn("alice"));
    assert_eq!(writes.len(), 1);
    let WriteOp::Modify { mods, .. } = &writes[0] else {
        panic!("expected a modify request, got {:?}", writes[0]);
    };
    assert_eq!(mods.len(), 3);
    assert!(mods.contains(&Modification::Add {
        attribute: "mobile".to_string(),
        values: vec!["+352 621 000 000".to_string()],
    }));
    assert!(mods.contains(&Modification::Replace {
        attribute: "cn".to_string(),
        values: vec!["Alice Smith".to_string()],
    }));
    assert!(mods.iter().any(|m| matches!(
        m,
        Modification::Delete { attribute, .. } if attribute == "homeDirectory"
    )));
    assert!(!mods.iter().any(|m| m.attribute() == "userPassword"));

    assert_eq!(
        report.outcome_of(&CascadeAction::LeaveGroup {
            group: "office".to_string()
        }),
        Some(&StepOutcome::Applied)
    );
    assert_eq!(
        report.outcome_of(&CascadeAction::JoinGroup {
            group: "board".to_string()
        }),
        Some(&StepOutcome::Applied)
    );

    let stored = factory.get_user("alice", false).await.unwrap();
    assert_eq!(stored.cn.as_deref(), Some("Alice Smith"));
    assert_eq!(stored.home_directory, None);
    assert_eq!(stored.groups, vec!["board", "syn2cat_full_member"]);
}

#[tokio::test]
async fn test_self_service_update_only_touches_credentials() {
    let (factory, directory) = factory_with(hackerspace());
    let mut bob = factory.get_user("bob", true).await.unwrap();

    bob.cn = Some("Robert".to_string());
    bob.groups.push("board".to_string());
    bob.user_password = Some("{SSHA}changed".to_string());
    bob.samba_nt_password = Some("0CB6948805F797BF2A82807973B89537".to_string());

    let report = factory.update_member(&bob, false).await.unwrap();

    assert!(report.steps.is_empty());
    let writes = directory.writes();
    assert_eq!(
        writes,
        vec![WriteOp::Modify {
            dn: user_dn("bob"),
            mods: vec![
                Modification::replace("userPassword", "{SSHA}changed"),
                Modification::replace("sambaNTPassword", "0CB6948805F797BF2A82807973B89537"),
            ],
        }]
    );

    let stored = factory.get_user("bob", false).await.unwrap();
    assert_eq!(stored.cn.as_deref(), Some("bob"));
    assert!(!stored.is_in_group("board"));
}

#[tokio::test]
async fn test_samba_hash_needs_a_new_password() {
    let (factory, directory) = factory_with(hackerspace());
    let mut bob = factory.get_user("bob", true).await.unwrap();
    bob.samba_nt_password = Some("0CB6948805F797BF2A82807973B89537".to_string());

    factory.update_member(&bob, false).await.unwrap();

    assert!(directory.writes().is_empty());
}

#[tokio::test]
async fn test_unchanged_member_issues_no_writes() {
    let (factory, directory) = factory_with(hackerspace());
    let alice = factory.get_user("alice", true).await.unwrap();
    assert_eq!(alice.user_password.as_deref(), Some(REDACTED_CREDENTIAL));

    let report = factory.update_member(&alice, true).await.unwrap();

    assert!(report.steps.is_empty());
    assert!(directory.writes().is_empty());
}

#[tokio::test]
async fn test_update_member_unknown_user() {
    let (factory, directory) = factory_with(hackerspace());
    let ghost = Member::new("ghost".to_string()).unwrap();

    assert!(factory
        .update_member(&ghost, true)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(directory.writes().is_empty());
}

#[tokio::test]
async fn test_update_avatar_skips_identical_photo() {
    let (factory, directory) = factory_with(hackerspace());

    factory.update_avatar("carol", "/9j/4AAQSkZJRg==").await.unwrap();
    factory.update_avatar("carol", "/9j/4AAQSkZJRg==").await.unwrap();

    let writes = directory.writes_to(&user_dn("carol"));
    assert_eq!(
        writes,
        vec![WriteOp::Modify {
            dn: user_dn("carol"),
            mods: vec![Modification::Add {
                attribute: "jpegPhoto".to_string(),
                values: vec!["/9j/4AAQSkZJRg==".to_string()],
            }],
        }]
    );

    factory.update_avatar("carol", "iVBORw0KGgo=").await.unwrap();
    let carol = factory.get_user("carol", false).await.unwrap();
    assert_eq!(carol.jpeg_photo.as_deref(), Some("iVBORw0KGgo="));
    assert_eq!(directory.writes_to(&user_dn("carol")).len(), 2);
}

#[tokio::test]
async fn test_add_group_allocates_next_gid_number() {
    let (factory, directory) = factory_with(hackerspace());

    let group = factory.add_group("workshop").await.unwrap();
    assert_eq!(group.gid_number, Some(1104));

    let stored = factory.get_group("workshop").await.unwrap();
    assert_eq!(stored.gid_number, Some(1104));
    assert!(stored.users.is_empty());

    let entry = directory.inner.entry(&group_dn("workshop")).await.unwrap();
    assert_eq!(
        entry.values("objectClass").unwrap(),
        &vec!["top".to_string(), "posixGroup".to_string()]
    );
}

#[tokio::test]
async fn test_add_group_rejects_duplicates_without_writing() {
    let (factory, directory) = factory_with(hackerspace());

    let err = factory.add_group("office").await.unwrap_err();

    assert!(err.is_conflict());
    assert!(directory.writes().is_empty());
    assert_eq!(factory.get_group_members("office").await.unwrap(), vec!["alice"]);
}

#[tokio::test]
async fn test_add_group_in_empty_directory_starts_at_floor() {
    let (factory, _) = factory_with(Vec::new());

    let group = factory.add_group("board").await.unwrap();
    assert_eq!(group.gid_number, Some(1000));
}

#[tokio::test]
async fn test_delete_group() {
    let (factory, _) = factory_with(hackerspace());

    factory.delete_group("board").await.unwrap();

    assert!(factory.get_group("board").await.unwrap_err().is_not_found());
    assert!(factory
        .delete_group("board")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_domain_lifecycle() {
    let (factory, directory) = factory_with(hackerspace());

    let domain = factory.add_domain("hackerspace.lu").await.unwrap();
    assert_eq!(domain.dc, "hackerspace.lu");
    assert_eq!(
        factory.get_domain_list().await.unwrap(),
        vec!["example.org", "hackerspace.lu"]
    );

    directory.clear_writes();
    assert!(factory
        .add_domain("hackerspace.lu")
        .await
        .unwrap_err()
        .is_conflict());
    assert!(directory.writes().is_empty());

    factory.delete_domain("hackerspace.lu").await.unwrap();
    assert!(factory
        .get_domain("hackerspace.lu")
        .await
        .unwrap_err()
        .is_not_found());
    assert!(factory
        .delete_domain("hackerspace.lu")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_add_domain_validates_name() {
    let (factory, directory) = factory_with(hackerspace());

    let err = factory.add_domain("not a domain").await.unwrap_err();

    assert!(matches!(err, DomainError::Validation { .. }));
    assert!(directory.writes().is_empty());
}
