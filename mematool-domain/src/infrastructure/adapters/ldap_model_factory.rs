use crate::application::ports::*;
use crate::domain::{diff::*, entities::*, errors::*};
use crate::infrastructure::adapters::ldap_connection::LdapConnection;
use async_trait::async_trait;
use ldap3::{dn_escape, ldap_escape};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Membership model backed by a directory connection.
///
/// Every operation reads fresh state from the directory and issues its
/// requests one at a time. The factory never caches entities between
/// calls.
pub struct LdapModelFactory {
    connection: Arc<dyn DirectoryConnection>,
    config: FactoryConfig,
}

fn ascii(value: &str) -> String {
    ValueEncoding::Ascii.encode(value)
}

/// Attribute names from a comma separated configuration value
fn attribute_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect()
}

/// Translate entry-level directory errors into errors about `entity_type`
fn entry_error<'a>(
    entity_type: &'a str,
    identifier: &'a str,
) -> impl FnOnce(DirectoryError) -> DomainError + 'a {
    move |err| match err {
        DirectoryError::NoSuchObject { .. } => DomainError::not_found(entity_type, identifier),
        DirectoryError::AlreadyExists { .. } => DomainError::already_exists(entity_type, identifier),
        other => other.into(),
    }
}

/// Lowest id handed out from either pool.
///
/// The member floor applies to gidNumbers as well, so a group created in a
/// directory holding only system groups (gid < 1000) starts at 1000 rather
/// than right after them.
const MIN_ALLOCATED_ID: u32 = MIN_MEMBER_UID_NUMBER;

/// Free successor of `existing`, `None` when no regular id is in use yet.
/// Fails once the last slot below [`ID_CEILING`] is taken.
fn successor(existing: &[u32], pool: &str) -> DomainResult<Option<u32>> {
    match next_id(existing.iter().copied()) {
        Some(id) => Ok(Some(id)),
        None if existing.contains(&(ID_CEILING - 1)) => Err(DomainError::IdPoolExhausted {
            pool: pool.to_string(),
        }),
        None => Ok(None),
    }
}

/// Id for a new member or group, never below [`MIN_ALLOCATED_ID`]
fn allocate(existing: &[u32], pool: &str) -> DomainResult<u32> {
    Ok(successor(existing, pool)?.map_or(MIN_ALLOCATED_ID, |id| id.max(MIN_ALLOCATED_ID)))
}

/// Entries of `desired` missing from `current`
fn missing_from(desired: &[String], current: &[String]) -> Vec<String> {
    desired
        .iter()
        .filter(|v| !current.contains(v))
        .cloned()
        .collect()
}

impl LdapModelFactory {
    pub fn new(connection: Arc<dyn DirectoryConnection>, config: FactoryConfig) -> Self {
        Self { connection, config }
    }

    /// Connect to the configured directory server and build a factory on top
    pub async fn connect(config: &dyn ConfigurationPort) -> DomainResult<Self> {
        config.validate()?;
        let connection = LdapConnection::connect(config.get_ldap_config()).await?;
        Ok(Self::new(Arc::new(connection), config.factory_config()))
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Release the directory connection
    pub async fn close(self) -> DomainResult<()> {
        self.connection.close().await?;
        Ok(())
    }

    fn layout(&self) -> &DirectoryLayout {
        &self.config.layout
    }

    fn policy(&self) -> &MembershipPolicy {
        &self.config.membership
    }

    fn user_dn(&self, uid: &str) -> String {
        format!("uid={},{}", dn_escape(ascii(uid)), self.layout().basedn_users)
    }

    fn group_dn(&self, gid: &str) -> String {
        format!("cn={},{}", dn_escape(ascii(gid)), self.layout().basedn_groups)
    }

    fn domain_dn(&self, domain: &str) -> String {
        format!("dc={},{}", dn_escape(ascii(domain)), self.layout().basedn)
    }

    /// Search where a missing base simply yields nothing
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DomainResult<Vec<DirectoryEntry>> {
        debug!(base = %base, filter = %filter, "Directory search");
        match self.connection.search(base, scope, filter, attrs).await {
            Ok(entries) => Ok(entries),
            Err(DirectoryError::NoSuchObject { .. }) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Every numeric id matched by an id scan
    async fn scan_ids(&self, base: &str, filter: &str, attrs: &str) -> DomainResult<Vec<u32>> {
        let attrs = attribute_list(attrs);
        let entries = self.search(base, SearchScope::Subtree, filter, &attrs).await?;

        Ok(entries
            .iter()
            .flat_map(|entry| attrs.iter().filter_map(move |a| entry.first_value(a)))
            .filter_map(|v| v.trim().parse::<u32>().ok())
            .collect())
    }

    async fn scan_uid_numbers(&self) -> DomainResult<Vec<u32>> {
        let layout = self.layout();
        self.scan_ids(&layout.basedn_users, &layout.uid_filter, &layout.uid_filter_attrs)
            .await
    }

    async fn scan_gid_numbers(&self) -> DomainResult<Vec<u32>> {
        let layout = self.layout();
        self.scan_ids(&layout.basedn_groups, &layout.gid_filter, &layout.gid_filter_attrs)
            .await
    }

    /// Locate an alias entry by any of its addresses
    async fn find_alias(&self, address: &str) -> DomainResult<(Alias, String)> {
        let filter = format!(
            "(&(objectClass={ALIAS_OBJECT_CLASS})(mail={}))",
            ldap_escape(address)
        );
        let entries = self
            .search(&self.layout().basedn, SearchScope::Subtree, &filter, &[ALL_ATTRIBUTES])
            .await?;

        let Some(first) = entries.first() else {
            return Err(DomainError::not_found("alias", address));
        };
        let dn = first.dn.clone();

        let domain = rdn_value(&dn, 1)
            .or_else(|| Alias::domain_of(address).ok())
            .unwrap_or_default();
        // the entry is named after its primary address
        let dn_mail = rdn_value(&dn, 0).unwrap_or_else(|| address.to_string());
        let mut alias = Alias {
            dn_mail,
            domain,
            ..Default::default()
        };

        for entry in entries {
            for (attribute, values) in entry.attrs {
                if attribute.eq_ignore_ascii_case(OBJECT_CLASS) {
                    continue;
                }
                alias.apply_values(&attribute, values);
            }
        }

        Ok((alias, dn))
    }

    /// Toggle one membership and record it; returns whether the step failed
    async fn record_membership(
        &self,
        report: &mut CascadeReport,
        uid: &str,
        group: &str,
        status: bool,
    ) -> bool {
        let action = if status {
            CascadeAction::JoinGroup {
                group: group.to_string(),
            }
        } else {
            CascadeAction::LeaveGroup {
                group: group.to_string(),
            }
        };

        let outcome = match self.change_user_group(uid, group, status).await {
            Ok(change) => StepOutcome::from(change),
            Err(e) => {
                warn!(uid = %uid, group = %group, error = %e, "Membership change failed");
                StepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let failed = outcome.is_failure();
        report.record(action, outcome);
        failed
    }
}

#[async_trait]
impl MembershipRepository for LdapModelFactory {
    #[instrument(skip(self))]
    async fn get_user(&self, uid: &str, clear_credentials: bool) -> DomainResult<Member> {
        let filter = format!("(uid={})", ldap_escape(uid));
        let entries = self
            .search(&self.user_dn(uid), SearchScope::Subtree, &filter, &[ALL_ATTRIBUTES])
            .await?;

        if entries.is_empty() {
            return Err(DomainError::not_found("user", uid));
        }

        let mut member = Member::default();
        for entry in entries {
            for (attribute, values) in entry.attrs {
                if attribute.eq_ignore_ascii_case(OBJECT_CLASS) {
                    continue;
                }
                member.apply_values(&attribute, values);
            }
        }
        if member.uid.is_empty() {
            member.uid = uid.to_string();
        }

        if clear_credentials {
            member.clear_credentials();
        }

        member.groups = self.get_user_group_list(uid).await?;
        member.full_member = member.is_in_group(&self.policy().group_fullmember);
        member.locked_member = member.is_in_group(&self.policy().group_lockedmember);

        Ok(member)
    }

    #[instrument(skip(self))]
    async fn get_user_list(&self) -> DomainResult<Vec<String>> {
        let filter = format!("(&(uid=*)(gidNumber={}))", self.policy().users_gid_number);
        let entries = self
            .search(
                &self.layout().basedn_users,
                SearchScope::Subtree,
                &filter,
                &["uid", "uidNumber"],
            )
            .await?;

        let mut users: Vec<String> = entries
            .iter()
            .filter(|entry| {
                entry
                    .first_value("uidNumber")
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .is_some_and(|n| (MIN_MEMBER_UID_NUMBER..ID_CEILING).contains(&n))
            })
            .filter_map(|entry| entry.first_value("uid").map(str::to_string))
            .collect();

        users.sort();
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_active_member_list(&self) -> DomainResult<Vec<String>> {
        let locked = self.policy().group_lockedmember.clone();
        let mut active = Vec::new();

        for uid in self.get_user_list().await? {
            if !self.is_user_in_group(&uid, &locked).await? {
                active.push(uid);
            }
        }

        Ok(active)
    }

    #[instrument(skip(self))]
    async fn get_user_group_list(&self, uid: &str) -> DomainResult<Vec<String>> {
        let filter = format!("({MEMBER_UID}={})", ldap_escape(uid));
        let entries = self
            .search(&self.layout().basedn_groups, SearchScope::Subtree, &filter, &["cn"])
            .await?;

        Ok(entries
            .iter()
            .filter_map(|entry| entry.values("cn"))
            .flatten()
            .cloned()
            .collect())
    }

    async fn is_user_in_group(&self, uid: &str, group: &str) -> DomainResult<bool> {
        Ok(self
            .get_user_group_list(uid)
            .await?
            .iter()
            .any(|g| g == group))
    }

    #[instrument(skip(self))]
    async fn get_uid_number_from_uid(&self, uid: &str) -> DomainResult<String> {
        let filter = format!("(uid={})", ldap_escape(uid));
        let entries = self
            .search(&self.layout().basedn_users, SearchScope::Subtree, &filter, &["uidNumber"])
            .await?;

        entries
            .iter()
            .rev()
            .find_map(|entry| entry.first_value("uidNumber"))
            .map(str::to_string)
            .ok_or_else(|| DomainError::not_found("user", uid))
    }

    #[instrument(skip(self))]
    async fn get_highest_uid_number(&self) -> DomainResult<String> {
        let ids = self.scan_uid_numbers().await?;
        Ok(successor(&ids, "uidNumber")?.map_or_else(|| "0".to_string(), |id| id.to_string()))
    }

    #[instrument(skip(self, member), fields(uid = %member.uid))]
    async fn add_member(&self, member: &mut Member) -> DomainResult<CascadeReport> {
        Member::validate_uid(&member.uid)?;

        let uid_number = allocate(&self.scan_uid_numbers().await?, "uidNumber")?;
        member.uid_number = Some(uid_number);
        if member.gid_number.is_none() {
            member.gid_number = Some(self.policy().users_gid_number);
        }
        if let Some(domain_sid) = &self.policy().samba_domain_sid {
            member.generate_samba_sid(domain_sid)?;
        }

        let mut attrs: EntryAttributes = vec![
            (
                OBJECT_CLASS.to_string(),
                MEMBER_OBJECT_CLASSES.iter().map(|c| c.to_string()).collect(),
            ),
            ("ou".to_string(), vec![MEMBER_OU.to_string()]),
        ];

        let creation_fields = Member::auto_update_fields()
            .chain(Member::no_auto_update_fields().filter(|d| d.field != "jpeg_photo"));
        attrs.extend(
            diff_fields(&*member, None, creation_fields)
                .into_iter()
                .filter_map(AttributeChange::into_entry_attribute),
        );

        if let Some(password) = Member::writable_credential(&member.user_password) {
            attrs.push(("userPassword".to_string(), vec![password.to_string()]));
        }
        if let Some(hash) = Member::writable_credential(&member.samba_nt_password) {
            attrs.push(("sambaNTPassword".to_string(), vec![hash.to_string()]));
        }

        let dn = self.user_dn(&member.uid);
        self.connection
            .add(&dn, attrs)
            .await
            .map_err(entry_error("user", &member.uid))?;
        info!(dn = %dn, uid_number, "Member created");

        let mut report = CascadeReport::new(member.uid.clone());
        let policy = self.policy().clone();
        self.record_membership(&mut report, &member.uid, &policy.group_fullmember, member.full_member)
            .await;
        self.record_membership(
            &mut report,
            &member.uid,
            &policy.group_lockedmember,
            member.locked_member,
        )
        .await;

        Ok(report)
    }

    #[instrument(skip(self, member), fields(uid = %member.uid))]
    async fn update_member(&self, member: &Member, is_admin: bool) -> DomainResult<CascadeReport> {
        let old = self.get_user(&member.uid, false).await?;
        let mut mods = Vec::new();

        if is_admin {
            mods.extend(
                diff_fields(member, Some(&old), Member::auto_update_fields())
                    .into_iter()
                    .filter_map(Modification::from_change),
            );
        }

        if let Some(password) = Member::writable_credential(&member.user_password) {
            mods.push(Modification::replace("userPassword", password));
            if let Some(hash) = Member::writable_credential(&member.samba_nt_password) {
                mods.push(Modification::replace("sambaNTPassword", hash));
            }
        }

        if mods.is_empty() {
            debug!("No attribute changes");
        } else {
            let dn = self.user_dn(&member.uid);
            let count = mods.len();
            self.connection
                .modify(&dn, mods)
                .await
                .map_err(entry_error("user", &member.uid))?;
            info!(dn = %dn, modifications = count, "Member updated");
        }

        let mut report = CascadeReport::new(member.uid.clone());
        if is_admin {
            for group in missing_from(&old.groups, &member.groups) {
                self.record_membership(&mut report, &member.uid, &group, false)
                    .await;
            }
            for group in missing_from(&member.groups, &old.groups) {
                self.record_membership(&mut report, &member.uid, &group, true)
                    .await;
            }
        }

        Ok(report)
    }

    #[instrument(skip(self, jpeg_base64))]
    async fn update_avatar(&self, uid: &str, jpeg_base64: &str) -> DomainResult<()> {
        let old = self.get_user(uid, false).await?;
        let mut member = old.clone();
        member.jpeg_photo = Some(jpeg_base64.to_string());

        let change = prepare_volatile_attribute(&member, Some(&old), "jpegPhoto", ValueEncoding::Raw);
        let Some(modification) = Modification::from_change(change) else {
            debug!("Avatar unchanged");
            return Ok(());
        };

        self.connection
            .modify(&self.user_dn(uid), vec![modification])
            .await
            .map_err(entry_error("user", uid))?;
        info!(uid = %uid, "Avatar updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, uid: &str, policy: CascadePolicy) -> DomainResult<CascadeReport> {
        let dn = self.user_dn(uid);
        let filter = format!("(uid={})", ldap_escape(uid));
        if self
            .search(&dn, SearchScope::Subtree, &filter, &[NO_ATTRIBUTES])
            .await?
            .is_empty()
        {
            return Err(DomainError::not_found("user", uid));
        }

        let stop_on_failure = policy == CascadePolicy::StopOnFailure;
        let mut report = CascadeReport::new(uid);
        let mut halted = false;

        for group in self.get_user_group_list(uid).await? {
            if halted {
                report.record(CascadeAction::LeaveGroup { group }, StepOutcome::Skipped);
                continue;
            }
            let failed = self.record_membership(&mut report, uid, &group, false).await;
            halted = failed && stop_on_failure;
        }

        for (alias_dn, maildrops) in self.get_maildrop_list(uid).await? {
            // the last destination takes the whole alias with it
            let sole_destination = maildrops.len() <= 1;
            let action = if sole_destination {
                CascadeAction::DeleteAlias {
                    alias_dn: alias_dn.clone(),
                }
            } else {
                CascadeAction::RemoveMaildrop {
                    alias_dn: alias_dn.clone(),
                }
            };

            if halted {
                report.record(action, StepOutcome::Skipped);
                continue;
            }

            let result = if sole_destination {
                self.connection
                    .delete(&alias_dn)
                    .await
                    .map_err(entry_error("alias", &alias_dn))
            } else {
                self.delete_maildrop(&alias_dn, uid).await
            };

            let outcome = match result {
                Ok(()) => StepOutcome::Applied,
                Err(e) => {
                    warn!(uid = %uid, step = %action, error = %e, "Alias cleanup failed");
                    halted = stop_on_failure;
                    StepOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.record(action, outcome);
        }

        let action = CascadeAction::DeleteEntry { dn: dn.clone() };
        if halted {
            warn!(uid = %uid, "Cascade stopped, member entry kept");
            report.record(action, StepOutcome::Skipped);
            return Ok(report);
        }

        self.connection
            .delete(&dn)
            .await
            .map_err(entry_error("user", uid))?;
        report.record(action, StepOutcome::Applied);

        if report.has_failures() {
            warn!(uid = %uid, failures = report.failures().count(), "Member deleted with failed cleanup steps");
        } else {
            info!(uid = %uid, "Member deleted");
        }
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn change_user_group(
        &self,
        uid: &str,
        group: &str,
        status: bool,
    ) -> DomainResult<MembershipChange> {
        let member = self.get_user(uid, false).await?;

        let (modification, change) = match (status, member.is_in_group(group)) {
            (true, false) => (Modification::add(MEMBER_UID, ascii(uid)), MembershipChange::Added),
            (false, true) => (
                Modification::delete_value(MEMBER_UID, ascii(uid)),
                MembershipChange::Removed,
            ),
            _ => {
                debug!("Membership already in requested state");
                return Ok(MembershipChange::Unchanged);
            }
        };

        match self
            .connection
            .modify(&self.group_dn(group), vec![modification])
            .await
        {
            Ok(()) => {
                info!(uid = %uid, group = %group, ?change, "Membership changed");
                Ok(change)
            }
            Err(e) if e.is_already_in_state() => {
                debug!(error = %e, "Directory reports membership already in place");
                Ok(MembershipChange::Unchanged)
            }
            Err(e) => Err(entry_error("group", group)(e)),
        }
    }

    #[instrument(skip(self))]
    async fn get_group(&self, gid: &str) -> DomainResult<Group> {
        let filter = format!("(cn={})", ldap_escape(gid));
        let entries = self
            .search(&self.layout().basedn_groups, SearchScope::Subtree, &filter, &[ALL_ATTRIBUTES])
            .await?;

        if entries.is_empty() {
            return Err(DomainError::not_found("group", gid));
        }

        let mut group = Group::default();
        for entry in entries {
            for (attribute, values) in entry.attrs {
                if attribute.eq_ignore_ascii_case(OBJECT_CLASS) {
                    continue;
                }
                group.apply_values(&attribute, values);
            }
        }

        Ok(group)
    }

    #[instrument(skip(self))]
    async fn get_group_list(&self) -> DomainResult<Vec<String>> {
        let entries = self
            .search(
                &self.layout().basedn_groups,
                SearchScope::Subtree,
                "(cn=*)",
                &["cn", "gidNumber"],
            )
            .await?;

        Ok(entries
            .iter()
            .filter_map(|entry| entry.first_value("cn").map(str::to_string))
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_group_members(&self, gid: &str) -> DomainResult<Vec<String>> {
        let filter = format!("(cn={})", ldap_escape(gid));
        let entries = self
            .search(&self.layout().basedn_groups, SearchScope::Subtree, &filter, &[MEMBER_UID])
            .await?;

        if entries.is_empty() {
            return Err(DomainError::not_found("group", gid));
        }

        Ok(entries
            .iter()
            .filter_map(|entry| entry.values(MEMBER_UID))
            .flatten()
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_highest_gid_number(&self) -> DomainResult<String> {
        let ids = self.scan_gid_numbers().await?;
        Ok(successor(&ids, "gidNumber")?.map_or_else(|| "0".to_string(), |id| id.to_string()))
    }

    #[instrument(skip(self))]
    async fn add_group(&self, gid: &str) -> DomainResult<Group> {
        let mut group = Group::new(gid.to_string())?;

        if self.get_group_list().await?.iter().any(|g| g == gid) {
            return Err(DomainError::already_exists("group", gid));
        }

        group.gid_number = Some(allocate(&self.scan_gid_numbers().await?, "gidNumber")?);

        let mut attrs: EntryAttributes = vec![(
            OBJECT_CLASS.to_string(),
            GROUP_OBJECT_CLASSES.iter().map(|c| c.to_string()).collect(),
        )];
        attrs.extend(
            diff_fields(&group, None, Group::descriptors())
                .into_iter()
                .filter_map(AttributeChange::into_entry_attribute),
        );

        let dn = self.group_dn(gid);
        self.connection
            .add(&dn, attrs)
            .await
            .map_err(entry_error("group", gid))?;
        info!(dn = %dn, gid_number = ?group.gid_number, "Group created");

        Ok(group)
    }

    #[instrument(skip(self))]
    async fn delete_group(&self, gid: &str) -> DomainResult<()> {
        let dn = self.group_dn(gid);
        self.connection
            .delete(&dn)
            .await
            .map_err(entry_error("group", gid))?;
        info!(dn = %dn, "Group deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_domain(&self, domain: &str) -> DomainResult<MailDomain> {
        let entries = self
            .search(
                &self.domain_dn(domain),
                SearchScope::Base,
                "(objectClass=mailDomain)",
                &[ALL_ATTRIBUTES],
            )
            .await?;

        if entries.is_empty() {
            return Err(DomainError::not_found("domain", domain));
        }

        let mut mail_domain = MailDomain::default();
        for entry in entries {
            for (attribute, values) in entry.attrs {
                if attribute.eq_ignore_ascii_case(OBJECT_CLASS) {
                    continue;
                }
                mail_domain.apply_values(&attribute, values);
            }
        }
        if mail_domain.dc.is_empty() {
            mail_domain.dc = domain.to_string();
        }

        Ok(mail_domain)
    }

    #[instrument(skip(self))]
    async fn get_domain_list(&self) -> DomainResult<Vec<String>> {
        let layout = self.layout();
        let attrs = attribute_list(&layout.domain_filter_attrs);
        let entries = self
            .search(&layout.basedn, SearchScope::Subtree, &layout.domain_filter, &attrs)
            .await?;

        Ok(entries
            .iter()
            .flat_map(|entry| attrs.iter().filter_map(move |a| entry.values(a)))
            .flatten()
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn add_domain(&self, domain: &str) -> DomainResult<MailDomain> {
        let mail_domain = MailDomain::new(domain.to_string())?;

        if self.get_domain_list().await?.iter().any(|d| d == domain) {
            return Err(DomainError::already_exists("domain", domain));
        }

        let mut attrs: EntryAttributes = vec![(
            OBJECT_CLASS.to_string(),
            DOMAIN_OBJECT_CLASSES.iter().map(|c| c.to_string()).collect(),
        )];
        attrs.extend(
            diff_fields(&mail_domain, None, MailDomain::descriptors())
                .into_iter()
                .filter_map(AttributeChange::into_entry_attribute),
        );

        let dn = self.domain_dn(domain);
        self.connection
            .add(&dn, attrs)
            .await
            .map_err(entry_error("domain", domain))?;
        info!(dn = %dn, "Domain created");

        Ok(mail_domain)
    }

    #[instrument(skip(self))]
    async fn delete_domain(&self, domain: &str) -> DomainResult<()> {
        if !self.get_domain_list().await?.iter().any(|d| d == domain) {
            return Err(DomainError::not_found("domain", domain));
        }

        let dn = self.domain_dn(domain);
        self.connection
            .delete(&dn)
            .await
            .map_err(entry_error("domain", domain))?;
        info!(dn = %dn, "Domain deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_alias(&self, address: &str) -> DomainResult<Alias> {
        let (alias, _) = self.find_alias(address).await?;
        Ok(alias)
    }

    #[instrument(skip(self))]
    async fn get_alias_list(&self, domain: &str) -> DomainResult<Vec<String>> {
        let filter = format!("(objectClass={ALIAS_OBJECT_CLASS})");
        let entries = self
            .search(&self.domain_dn(domain), SearchScope::Subtree, &filter, &[NO_ATTRIBUTES])
            .await?;

        Ok(entries
            .iter()
            .filter_map(DirectoryEntry::rdn_value)
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_maildrop_list(&self, uid: &str) -> DomainResult<MaildropMap> {
        let filter = format!(
            "(&(objectClass={ALIAS_OBJECT_CLASS})({MAILDROP}={}))",
            ldap_escape(uid)
        );
        let entries = self
            .search(&self.layout().basedn, SearchScope::Subtree, &filter, &[MAILDROP])
            .await?;

        let mut aliases = MaildropMap::new();
        for entry in entries {
            let maildrops = entry.values(MAILDROP).cloned().unwrap_or_default();
            aliases.entry(entry.dn).or_default().extend(maildrops);
        }
        Ok(aliases)
    }

    #[instrument(skip(self, alias), fields(dn_mail = %alias.dn_mail))]
    async fn add_alias(&self, alias: &Alias) -> DomainResult<()> {
        match self.find_alias(&alias.dn_mail).await {
            Ok(_) => return Err(DomainError::already_exists("alias", alias.dn_mail.clone())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let mut attrs: EntryAttributes = vec![(
            OBJECT_CLASS.to_string(),
            ALIAS_OBJECT_CLASSES.iter().map(|c| c.to_string()).collect(),
        )];
        attrs.extend(
            diff_fields(alias, None, Alias::descriptors())
                .into_iter()
                .filter_map(AttributeChange::into_entry_attribute),
        );

        let dn = alias.dn(&self.layout().basedn);
        self.connection
            .add(&dn, attrs)
            .await
            .map_err(entry_error("alias", &alias.dn_mail))?;
        info!(dn = %dn, "Alias created");
        Ok(())
    }

    #[instrument(skip(self, alias), fields(dn_mail = %alias.dn_mail))]
    async fn update_alias(&self, alias: &Alias) -> DomainResult<bool> {
        let (old, dn) = self.find_alias(&alias.dn_mail).await?;
        let mut mods = Vec::new();

        let secondary = |addresses: &[String]| -> Vec<String> {
            addresses
                .iter()
                .filter(|m| **m != alias.dn_mail)
                .cloned()
                .collect()
        };
        let (new_mail, old_mail) = (secondary(&alias.mail), secondary(&old.mail));

        for address in missing_from(&new_mail, &old_mail) {
            mods.push(Modification::add(MAIL, ascii(&address)));
        }
        for address in missing_from(&old_mail, &new_mail) {
            mods.push(Modification::delete_value(MAIL, ascii(&address)));
        }
        for target in missing_from(&alias.maildrop, &old.maildrop) {
            mods.push(Modification::add(MAILDROP, ascii(&target)));
        }
        for target in missing_from(&old.maildrop, &alias.maildrop) {
            mods.push(Modification::delete_value(MAILDROP, ascii(&target)));
        }

        if mods.is_empty() {
            debug!("Alias unchanged");
            return Ok(false);
        }

        let count = mods.len();
        self.connection
            .modify(&dn, mods)
            .await
            .map_err(entry_error("alias", &alias.dn_mail))?;
        info!(dn = %dn, modifications = count, "Alias updated");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete_maildrop(&self, alias_dn: &str, uid: &str) -> DomainResult<()> {
        self.connection
            .modify(alias_dn, vec![Modification::delete_value(MAILDROP, ascii(uid))])
            .await
            .map_err(entry_error("alias", alias_dn))?;
        info!(alias_dn = %alias_dn, uid = %uid, "Maildrop removed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_alias(&self, address: &str) -> DomainResult<()> {
        let (_, dn) = self.find_alias(address).await?;
        self.connection
            .delete(&dn)
            .await
            .map_err(entry_error("alias", address))?;
        info!(dn = %dn, "Alias deleted");
        Ok(())
    }
}
