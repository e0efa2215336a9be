use crate::domain::{entities::*, errors::DomainResult};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Alias DN to its maildrop values
pub type MaildropMap = BTreeMap<String, Vec<String>>;

/// Repository port for the membership model.
///
/// Reads build fresh entities from the backing store on every call;
/// writes diff the desired state against what is stored.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    // Member operations
    async fn get_user(&self, uid: &str, clear_credentials: bool) -> DomainResult<Member>;
    async fn get_user_list(&self) -> DomainResult<Vec<String>>;
    async fn get_active_member_list(&self) -> DomainResult<Vec<String>>;
    async fn get_user_group_list(&self, uid: &str) -> DomainResult<Vec<String>>;
    async fn is_user_in_group(&self, uid: &str, group: &str) -> DomainResult<bool>;
    async fn get_uid_number_from_uid(&self, uid: &str) -> DomainResult<String>;
    async fn get_highest_uid_number(&self) -> DomainResult<String>;

    /// Create a member. Allocates its uid-number (and samba SID when
    /// configured) into `member`.
    async fn add_member(&self, member: &mut Member) -> DomainResult<CascadeReport>;
    async fn update_member(&self, member: &Member, is_admin: bool) -> DomainResult<CascadeReport>;
    async fn update_avatar(&self, uid: &str, jpeg_base64: &str) -> DomainResult<()>;
    async fn delete_user(&self, uid: &str, policy: CascadePolicy) -> DomainResult<CascadeReport>;
    async fn change_user_group(
        &self,
        uid: &str,
        group: &str,
        status: bool,
    ) -> DomainResult<MembershipChange>;

    // Group operations
    async fn get_group(&self, gid: &str) -> DomainResult<Group>;
    async fn get_group_list(&self) -> DomainResult<Vec<String>>;
    async fn get_group_members(&self, gid: &str) -> DomainResult<Vec<String>>;
    async fn get_highest_gid_number(&self) -> DomainResult<String>;
    async fn add_group(&self, gid: &str) -> DomainResult<Group>;
    async fn delete_group(&self, gid: &str) -> DomainResult<()>;

    // Domain operations
    async fn get_domain(&self, domain: &str) -> DomainResult<MailDomain>;
    async fn get_domain_list(&self) -> DomainResult<Vec<String>>;
    async fn add_domain(&self, domain: &str) -> DomainResult<MailDomain>;
    async fn delete_domain(&self, domain: &str) -> DomainResult<()>;

    // Alias operations
    async fn get_alias(&self, address: &str) -> DomainResult<Alias>;
    async fn get_alias_list(&self, domain: &str) -> DomainResult<Vec<String>>;
    async fn get_maildrop_list(&self, uid: &str) -> DomainResult<MaildropMap>;
    async fn add_alias(&self, alias: &Alias) -> DomainResult<()>;
    /// Returns `false` when the stored alias already matched
    async fn update_alias(&self, alias: &Alias) -> DomainResult<bool>;
    async fn delete_maildrop(&self, alias_dn: &str, uid: &str) -> DomainResult<()>;
    async fn delete_alias(&self, address: &str) -> DomainResult<()>;
}
