use crate::application::ports::{
    DirectoryConnection, DirectoryEntry, EntryAttributes, LdapConfig, Modification, SearchScope,
};
use crate::domain::errors::{DirectoryError, DirectoryResult, DomainError, DomainResult};
use async_trait::async_trait;
use base64::Engine;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, LdapResult, Mod, Scope, SearchEntry};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

const RC_SUCCESS: u32 = 0;
const RC_INVALID_CREDENTIALS: u32 = 49;

/// `DirectoryConnection` backed by an ldap3 session
pub struct LdapConnection {
    ldap: Ldap,
    url: String,
}

fn transport_error(operation: &str, err: LdapError) -> DirectoryError {
    DirectoryError::ConnectionFailed {
        message: format!("{operation}: {err}"),
    }
}

fn check(operation: &str, dn: &str, attribute: Option<&str>, result: LdapResult) -> DirectoryResult<()> {
    if result.rc == RC_SUCCESS {
        return Ok(());
    }
    Err(DirectoryError::from_result_code(
        operation,
        dn,
        attribute,
        result.rc,
        &result.text,
    ))
}

fn to_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn to_mod(modification: Modification) -> Mod<String> {
    match modification {
        Modification::Add { attribute, values } => Mod::Add(attribute, values.into_iter().collect()),
        Modification::Replace { attribute, values } => {
            Mod::Replace(attribute, values.into_iter().collect())
        }
        Modification::Delete { attribute, values } => {
            Mod::Delete(attribute, values.into_iter().collect())
        }
    }
}

/// Binary values are surfaced base64-encoded, like every other value a string
fn to_entry(entry: SearchEntry) -> DirectoryEntry {
    let mut attrs = entry.attrs;
    for (name, values) in entry.bin_attrs {
        let encoded = values
            .iter()
            .map(|v| base64::engine::general_purpose::STANDARD.encode(v))
            .collect::<Vec<_>>();
        attrs.entry(name).or_default().extend(encoded);
    }

    DirectoryEntry { dn: entry.dn, attrs }
}

impl LdapConnection {
    /// Open a connection and bind with the configured credentials
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &LdapConfig) -> DomainResult<Self> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(config.get_connect_timeout())
            .set_starttls(config.starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &config.url)
            .await
            .map_err(|e| DomainError::Directory {
                operation: "connect".to_string(),
                message: format!("Failed to connect to {}: {e}", config.url),
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        if !config.bind_dn.is_empty() {
            debug!(bind_dn = %config.bind_dn, "Performing LDAP bind");

            let result = ldap
                .simple_bind(&config.bind_dn, &config.bind_password)
                .await
                .map_err(|e| DomainError::Directory {
                    operation: "bind".to_string(),
                    message: e.to_string(),
                })?;

            if result.rc == RC_INVALID_CREDENTIALS {
                return Err(DomainError::Directory {
                    operation: "bind".to_string(),
                    message: format!("Invalid credentials for {}", config.bind_dn),
                });
            }
            if result.rc != RC_SUCCESS {
                return Err(DomainError::Directory {
                    operation: "bind".to_string(),
                    message: format!("code {}: {}", result.rc, result.text),
                });
            }
        }

        info!("Connected to directory server");
        Ok(Self {
            ldap,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl DirectoryConnection for LdapConnection {
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        let mut ldap = self.ldap.clone();
        let result = ldap
            .search(base, to_scope(scope), filter, attrs.to_vec())
            .await
            .map_err(|e| transport_error("search", e))?;

        let ldap3::SearchResult(entries, status) = result;
        check("search", base, None, status)?;

        debug!(base = %base, filter = %filter, count = entries.len(), "Search completed");
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(to_entry)
            .collect())
    }

    async fn add(&self, dn: &str, attrs: EntryAttributes) -> DirectoryResult<()> {
        let mut ldap = self.ldap.clone();
        let attrs: Vec<(String, HashSet<String>)> = attrs
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name, values.into_iter().collect()))
            .collect();

        let result = ldap
            .add(dn, attrs)
            .await
            .map_err(|e| transport_error("add", e))?;
        check("add", dn, None, result)
    }

    async fn modify(&self, dn: &str, mods: Vec<Modification>) -> DirectoryResult<()> {
        let mut ldap = self.ldap.clone();
        let attribute = mods.first().map(|m| m.attribute().to_string());
        let mods: Vec<Mod<String>> = mods.into_iter().map(to_mod).collect();

        let result = ldap
            .modify(dn, mods)
            .await
            .map_err(|e| transport_error("modify", e))?;
        check("modify", dn, attribute.as_deref(), result)
    }

    async fn delete(&self, dn: &str) -> DirectoryResult<()> {
        let mut ldap = self.ldap.clone();
        let result = ldap
            .delete(dn)
            .await
            .map_err(|e| transport_error("delete", e))?;
        check("delete", dn, None, result)
    }

    async fn close(&self) -> DirectoryResult<()> {
        let mut ldap = self.ldap.clone();
        ldap.unbind().await.map_err(|e| transport_error("unbind", e))?;
        info!(url = %self.url, "Directory connection closed");
        Ok(())
    }
}
