#![allow(dead_code)]

use async_trait::async_trait;
use mematool_domain::{
    application::ports::{
        DirectoryConnection, DirectoryEntry, DirectoryLayout, EntryAttributes, FactoryConfig,
        MembershipPolicy, Modification, SearchScope,
    },
    domain::errors::{DirectoryError, DirectoryResult},
    infrastructure::adapters::{InMemoryDirectory, LdapModelFactory},
};
use ldap3::dn_escape;
use std::sync::{Arc, Mutex};

pub const BASEDN: &str = "ou=mail,dc=example,dc=org";
pub const BASEDN_USERS: &str = "ou=People,dc=example,dc=org";
pub const BASEDN_GROUPS: &str = "ou=Groups,dc=example,dc=org";

/// A write request as seen by the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Add { dn: String },
    Modify { dn: String, mods: Vec<Modification> },
    Delete { dn: String },
}

impl WriteOp {
    pub fn dn(&self) -> &str {
        match self {
            WriteOp::Add { dn } | WriteOp::Modify { dn, .. } | WriteOp::Delete { dn } => dn,
        }
    }
}

/// Which request an injected failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Add,
    Modify,
    Delete,
}

/// In-memory directory that records every write attempt and can be told
/// to fail specific requests
pub struct RecordingDirectory {
    pub inner: InMemoryDirectory,
    writes: Mutex<Vec<WriteOp>>,
    searches: Mutex<usize>,
    failures: Mutex<Vec<(FailOn, String, DirectoryError)>>,
}

impl RecordingDirectory {
    pub fn new(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        Self {
            inner: InMemoryDirectory::with_entries(base_entries().into_iter().chain(entries)),
            writes: Mutex::new(Vec::new()),
            searches: Mutex::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Fail every `op` request on `dn` with `error`
    pub fn fail(&self, op: FailOn, dn: &str, error: DirectoryError) {
        self.failures
            .lock()
            .unwrap()
            .push((op, dn.to_lowercase(), error));
    }

    pub fn writes(&self) -> Vec<WriteOp> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_to(&self, dn: &str) -> Vec<WriteOp> {
        self.writes()
            .into_iter()
            .filter(|w| w.dn().eq_ignore_ascii_case(dn))
            .collect()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }

    pub fn search_count(&self) -> usize {
        *self.searches.lock().unwrap()
    }

    fn record(&self, op: WriteOp) {
        self.writes.lock().unwrap().push(op);
    }

    fn injected(&self, op: FailOn, dn: &str) -> DirectoryResult<()> {
        let failures = self.failures.lock().unwrap();
        match failures
            .iter()
            .find(|(o, d, _)| *o == op && d == &dn.to_lowercase())
        {
            Some((_, _, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DirectoryConnection for RecordingDirectory {
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        *self.searches.lock().unwrap() += 1;
        self.inner.search(base, scope, filter, attrs).await
    }

    async fn add(&self, dn: &str, attrs: EntryAttributes) -> DirectoryResult<()> {
        self.record(WriteOp::Add { dn: dn.to_string() });
        self.injected(FailOn::Add, dn)?;
        self.inner.add(dn, attrs).await
    }

    async fn modify(&self, dn: &str, mods: Vec<Modification>) -> DirectoryResult<()> {
        self.record(WriteOp::Modify {
            dn: dn.to_string(),
            mods: mods.clone(),
        });
        self.injected(FailOn::Modify, dn)?;
        self.inner.modify(dn, mods).await
    }

    async fn delete(&self, dn: &str) -> DirectoryResult<()> {
        self.record(WriteOp::Delete { dn: dn.to_string() });
        self.injected(FailOn::Delete, dn)?;
        self.inner.delete(dn).await
    }

    async fn close(&self) -> DirectoryResult<()> {
        self.inner.close().await
    }
}

pub fn base_entries() -> Vec<DirectoryEntry> {
    vec![
        DirectoryEntry::new("dc=example,dc=org").with_attribute("objectClass", &["top", "domain"]),
        DirectoryEntry::new(BASEDN).with_attribute("objectClass", &["organizationalUnit"]),
        DirectoryEntry::new(BASEDN_USERS).with_attribute("objectClass", &["organizationalUnit"]),
        DirectoryEntry::new(BASEDN_GROUPS).with_attribute("objectClass", &["organizationalUnit"]),
    ]
}

pub fn user_dn(uid: &str) -> String {
    format!("uid={uid},{BASEDN_USERS}")
}

pub fn group_dn(cn: &str) -> String {
    format!("cn={cn},{BASEDN_GROUPS}")
}

pub fn domain_dn(dc: &str) -> String {
    format!("dc={dc},{BASEDN}")
}

pub fn alias_dn(address: &str) -> String {
    let domain = address.split_once('@').map(|(_, d)| d).unwrap_or_default();
    format!("mail={},dc={},{BASEDN}", dn_escape(address), dn_escape(domain))
}

pub fn member_entry(uid: &str, uid_number: u32) -> DirectoryEntry {
    let uid_number = uid_number.to_string();
    let home = format!("/home/{uid}");
    DirectoryEntry::new(user_dn(uid))
        .with_attribute(
            "objectClass",
            &["posixAccount", "inetOrgPerson", "top", "syn2catPerson"],
        )
        .with_attribute("uid", &[uid])
        .with_attribute("uidNumber", &[uid_number.as_str()])
        .with_attribute("gidNumber", &["100"])
        .with_attribute("cn", &[uid])
        .with_attribute("sn", &[uid])
        .with_attribute("homeDirectory", &[home.as_str()])
}

pub fn group_entry(cn: &str, gid_number: u32, members: &[&str]) -> DirectoryEntry {
    let gid_number = gid_number.to_string();
    let mut entry = DirectoryEntry::new(group_dn(cn))
        .with_attribute("objectClass", &["top", "posixGroup"])
        .with_attribute("cn", &[cn])
        .with_attribute("gidNumber", &[gid_number.as_str()]);
    if !members.is_empty() {
        entry = entry.with_attribute("memberUid", members);
    }
    entry
}

pub fn domain_entry(dc: &str) -> DirectoryEntry {
    DirectoryEntry::new(domain_dn(dc))
        .with_attribute("objectClass", &["top", "domain", "mailDomain"])
        .with_attribute("dc", &[dc])
}

pub fn alias_entry(address: &str, mail: &[&str], maildrops: &[&str]) -> DirectoryEntry {
    let mut addresses = vec![address];
    addresses.extend(mail.iter().filter(|m| **m != address));
    DirectoryEntry::new(alias_dn(address))
        .with_attribute("objectClass", &["mailAlias"])
        .with_attribute("mail", &addresses)
        .with_attribute("maildrop", maildrops)
}

pub fn test_config() -> FactoryConfig {
    FactoryConfig {
        layout: DirectoryLayout::with_base_dns(BASEDN, BASEDN_USERS, BASEDN_GROUPS),
        membership: MembershipPolicy::default(),
    }
}

/// Factory over a recording directory seeded with `entries`
pub fn factory_with(
    entries: impl IntoIterator<Item = DirectoryEntry>,
) -> (LdapModelFactory, Arc<RecordingDirectory>) {
    let directory = Arc::new(RecordingDirectory::new(entries));
    let factory = LdapModelFactory::new(directory.clone(), test_config());
    (factory, directory)
}

/// A small hackerspace: three members, a few groups, one mail domain
pub fn hackerspace() -> Vec<DirectoryEntry> {
    vec![
        member_entry("alice", 1000),
        member_entry("bob", 1001),
        member_entry("carol", 1002),
        group_entry("syn2cat_full_member", 1100, &["alice", "bob"]),
        group_entry("syn2cat_locked_member", 1101, &["carol"]),
        group_entry("office", 1102, &["alice"]),
        group_entry("board", 1103, &[]),
        domain_entry("example.org"),
        alias_entry("info@example.org", &[], &["alice", "bob"]),
        alias_entry("alice@example.org", &["a.smith@example.org"], &["alice"]),
    ]
}
