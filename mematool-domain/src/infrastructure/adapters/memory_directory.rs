use super::filter::LdapFilter;
use crate::application::ports::directory::*;
use crate::domain::errors::{DirectoryError, DirectoryResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Directory held in memory, for tests and local development.
///
/// Follows LDAP semantics where the membership model depends on them:
/// case-insensitive DNs, attribute names and matching, result codes for
/// missing entries, duplicate adds and duplicate/missing values.
///
/// Clones share the same entries.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    entries: Arc<RwLock<BTreeMap<String, DirectoryEntry>>>,
    closed: Arc<AtomicBool>,
}

/// Canonical form of a DN used as the storage key
pub fn normalize_dn(dn: &str) -> String {
    split_rdns(dn)
        .into_iter()
        .map(|rdn| rdn.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

fn find_key(attrs: &HashMap<String, Vec<String>>, name: &str) -> Option<String> {
    attrs.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned()
}

fn in_scope(key: &str, base: &str, scope: SearchScope) -> bool {
    match scope {
        SearchScope::Base => key == base,
        SearchScope::OneLevel => {
            let rdns = split_rdns(key);
            rdns.len() > 1 && rdns[1..].join(",") == base
        }
        SearchScope::Subtree => key == base || key.ends_with(&format!(",{base}")),
    }
}

fn project(entry: &DirectoryEntry, requested: &[&str]) -> DirectoryEntry {
    let wants_all = requested.is_empty() || requested.contains(&ALL_ATTRIBUTES);
    let attrs = entry
        .attrs
        .iter()
        .filter(|(name, _)| {
            wants_all || requested.iter().any(|r| r.eq_ignore_ascii_case(name))
        })
        .map(|(name, values)| (name.clone(), values.clone()))
        .collect();

    DirectoryEntry {
        dn: entry.dn.clone(),
        attrs,
    }
}

fn apply_modification(
    dn: &str,
    attrs: &mut HashMap<String, Vec<String>>,
    modification: Modification,
) -> DirectoryResult<()> {
    match modification {
        Modification::Add { attribute, values } => {
            let key = find_key(attrs, &attribute).unwrap_or_else(|| attribute.clone());
            let current = attrs.entry(key).or_default();
            for value in values {
                if current.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
                    return Err(DirectoryError::ValueExists {
                        dn: dn.to_string(),
                        attribute,
                    });
                }
                current.push(value);
            }
        }
        Modification::Replace { attribute, values } => {
            if let Some(key) = find_key(attrs, &attribute) {
                attrs.remove(&key);
            }
            if !values.is_empty() {
                attrs.insert(attribute, values);
            }
        }
        Modification::Delete { attribute, values } => {
            let Some(key) = find_key(attrs, &attribute) else {
                return Err(DirectoryError::NoSuchAttribute {
                    dn: dn.to_string(),
                    attribute,
                });
            };

            if values.is_empty() {
                attrs.remove(&key);
                return Ok(());
            }

            let current = attrs.entry(key.clone()).or_default();
            for value in values {
                let Some(idx) = current.iter().position(|v| v.eq_ignore_ascii_case(&value)) else {
                    return Err(DirectoryError::NoSuchAttribute {
                        dn: dn.to_string(),
                        attribute,
                    });
                };
                current.remove(idx);
            }
            if current.is_empty() {
                attrs.remove(&key);
            }
        }
    }
    Ok(())
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (normalize_dn(&entry.dn), entry))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
            closed: Arc::default(),
        }
    }

    fn ensure_open(&self) -> DirectoryResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DirectoryError::ConnectionFailed {
                message: "connection closed".to_string(),
            });
        }
        Ok(())
    }

    /// Store an entry, replacing any entry with the same DN
    pub async fn insert(&self, entry: DirectoryEntry) {
        self.entries
            .write()
            .await
            .insert(normalize_dn(&entry.dn), entry);
    }

    /// Stored copy of the entry at `dn`
    pub async fn entry(&self, dn: &str) -> Option<DirectoryEntry> {
        self.entries.read().await.get(&normalize_dn(dn)).cloned()
    }

    pub async fn contains(&self, dn: &str) -> bool {
        self.entries.read().await.contains_key(&normalize_dn(dn))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryConnection for InMemoryDirectory {
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        self.ensure_open()?;
        let filter = LdapFilter::parse(filter)?;
        let base_key = normalize_dn(base);
        let entries = self.entries.read().await;

        let base_known = entries.contains_key(&base_key)
            || entries.keys().any(|k| k.ends_with(&format!(",{base_key}")));
        if !base_known {
            return Err(DirectoryError::NoSuchObject {
                dn: base.to_string(),
            });
        }

        let found: Vec<DirectoryEntry> = entries
            .iter()
            .filter(|(key, _)| in_scope(key, &base_key, scope))
            .filter(|(_, entry)| filter.matches(&entry.attrs))
            .map(|(_, entry)| project(entry, attrs))
            .collect();

        debug!(base = %base, count = found.len(), "In-memory search");
        Ok(found)
    }

    async fn add(&self, dn: &str, attrs: EntryAttributes) -> DirectoryResult<()> {
        self.ensure_open()?;
        let key = normalize_dn(dn);
        let mut entries = self.entries.write().await;

        if entries.contains_key(&key) {
            return Err(DirectoryError::AlreadyExists { dn: dn.to_string() });
        }

        let mut entry = DirectoryEntry::new(dn);
        for (name, values) in attrs.into_iter().filter(|(_, v)| !v.is_empty()) {
            match find_key(&entry.attrs, &name) {
                Some(existing) => entry.attrs.entry(existing).or_default().extend(values),
                None => {
                    entry.attrs.insert(name, values);
                }
            }
        }

        entries.insert(key, entry);
        Ok(())
    }

    async fn modify(&self, dn: &str, mods: Vec<Modification>) -> DirectoryResult<()> {
        self.ensure_open()?;
        let key = normalize_dn(dn);
        let mut entries = self.entries.write().await;

        let Some(stored) = entries.get(&key) else {
            return Err(DirectoryError::NoSuchObject { dn: dn.to_string() });
        };

        // all or nothing, like a single LDAP modify request
        let mut attrs = stored.attrs.clone();
        for modification in mods {
            apply_modification(dn, &mut attrs, modification)?;
        }

        if let Some(stored) = entries.get_mut(&key) {
            stored.attrs = attrs;
        }
        Ok(())
    }

    async fn delete(&self, dn: &str) -> DirectoryResult<()> {
        self.ensure_open()?;
        match self.entries.write().await.remove(&normalize_dn(dn)) {
            Some(_) => Ok(()),
            None => Err(DirectoryError::NoSuchObject { dn: dn.to_string() }),
        }
    }

    async fn close(&self) -> DirectoryResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
