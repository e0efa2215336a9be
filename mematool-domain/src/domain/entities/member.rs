use super::common::*;
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// Lowest uid-number handed to regular members
pub const MIN_MEMBER_UID_NUMBER: u32 = 1000;

/// Numeric ids at or above this value are reserved for system accounts
pub const ID_CEILING: u32 = 65000;

/// Successor of the highest existing id below `ID_CEILING - 1`.
///
/// Returns `None` when no id qualifies, or when the successor itself is
/// already taken (the last free slot below [`ID_CEILING`] is in use).
pub fn next_id(existing: impl IntoIterator<Item = u32>) -> Option<u32> {
    let existing: Vec<u32> = existing.into_iter().collect();
    let candidate = existing.iter().filter(|v| **v < ID_CEILING - 1).max()? + 1;
    (!existing.contains(&candidate)).then_some(candidate)
}

/// Schema classes every member entry carries
pub const MEMBER_OBJECT_CLASSES: &[&str] = &[
    "posixAccount",
    "organizationalPerson",
    "inetOrgPerson",
    "shadowAccount",
    "top",
    "samsePerson",
    "sambaSamAccount",
    "ldapPublicKey",
    "syn2catPerson",
];

/// Organisational unit written on member creation
pub const MEMBER_OU: &str = "People";

const MEMBER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::create_only("uid", "uid", FieldKind::Text),
    FieldDescriptor::auto("uid_number", "uidNumber", FieldKind::Number),
    FieldDescriptor::auto("gid_number", "gidNumber", FieldKind::Number),
    FieldDescriptor::auto("cn", "cn", FieldKind::Text),
    FieldDescriptor::auto("sn", "sn", FieldKind::Text),
    FieldDescriptor::auto("given_name", "givenName", FieldKind::Text),
    FieldDescriptor::auto("home_directory", "homeDirectory", FieldKind::Text),
    FieldDescriptor::auto("login_shell", "loginShell", FieldKind::Text),
    FieldDescriptor::auto("mail", "mail", FieldKind::Text),
    FieldDescriptor::auto("mobile", "mobile", FieldKind::Text),
    FieldDescriptor::auto("telephone_number", "telephoneNumber", FieldKind::Text),
    FieldDescriptor::auto("home_postal_address", "homePostalAddress", FieldKind::Text),
    FieldDescriptor::auto("birth_date", "birthDate", FieldKind::Text),
    FieldDescriptor::auto("arrival_date", "arrivalDate", FieldKind::Text),
    FieldDescriptor::auto("leaving_date", "leavingDate", FieldKind::Text),
    FieldDescriptor::auto("nationality", "nationality", FieldKind::Text),
    FieldDescriptor::auto("ssh_public_key", "sshPublicKey", FieldKind::Text),
    FieldDescriptor::auto("pgp_key", "pgpKey", FieldKind::Text),
    FieldDescriptor::auto("iban", "iban", FieldKind::Text),
    FieldDescriptor::auto("xmpp_id", "xmppID", FieldKind::Text),
    FieldDescriptor::auto("convention_signer", "conventionSigner", FieldKind::Text),
    FieldDescriptor::auto("is_minor", "isMinor", FieldKind::Flag),
    FieldDescriptor::create_only("samba_sid", "sambaSID", FieldKind::Text),
    FieldDescriptor::create_only("jpeg_photo", "jpegPhoto", FieldKind::Text)
        .with_encoding(ValueEncoding::Raw),
    FieldDescriptor::credential("user_password", "userPassword"),
    FieldDescriptor::credential("samba_nt_password", "sambaNTPassword"),
];

/// A member account as stored under the users base DN
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub uid: String,
    pub uid_number: Option<u32>,
    pub gid_number: Option<u32>,
    pub cn: Option<String>,
    pub sn: Option<String>,
    pub given_name: Option<String>,
    pub home_directory: Option<String>,
    pub login_shell: Option<String>,
    pub mail: Option<String>,
    pub mobile: Option<String>,
    pub telephone_number: Option<String>,
    pub home_postal_address: Option<String>,
    pub birth_date: Option<String>,
    pub arrival_date: Option<String>,
    pub leaving_date: Option<String>,
    pub nationality: Option<String>,
    pub ssh_public_key: Option<String>,
    pub pgp_key: Option<String>,
    pub iban: Option<String>,
    pub xmpp_id: Option<String>,
    pub convention_signer: Option<String>,
    pub is_minor: Option<bool>,
    pub samba_sid: Option<String>,
    pub jpeg_photo: Option<String>,
    #[serde(skip_serializing)]
    pub user_password: Option<String>,
    #[serde(skip_serializing)]
    pub samba_nt_password: Option<String>,
    pub full_member: bool,
    pub locked_member: bool,
    /// Group names at read time, from the reverse membership lookup
    pub groups: Vec<String>,
}

impl Member {
    /// Create a new member with the given uid
    pub fn new(uid: String) -> DomainResult<Self> {
        Self::validate_uid(&uid)?;

        Ok(Self {
            uid,
            ..Default::default()
        })
    }

    /// Validate a uid according to POSIX account naming rules
    pub fn validate_uid(uid: &str) -> DomainResult<()> {
        if uid.is_empty() {
            return Err(DomainError::Validation {
                field: "uid".to_string(),
                message: "Uid cannot be empty".to_string(),
            });
        }

        if uid.len() > 32 {
            return Err(DomainError::Validation {
                field: "uid".to_string(),
                message: "Uid cannot exceed 32 characters".to_string(),
            });
        }

        if !uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(DomainError::Validation {
                field: "uid".to_string(),
                message: "Uid can only contain ASCII letters, digits, hyphens, underscores and dots"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Attributes kept in sync by diff-based updates
    pub fn auto_update_fields() -> impl Iterator<Item = &'static FieldDescriptor> {
        MEMBER_FIELDS.iter().filter(|d| d.auto_update)
    }

    /// Attributes written once at creation
    pub fn no_auto_update_fields() -> impl Iterator<Item = &'static FieldDescriptor> {
        MEMBER_FIELDS
            .iter()
            .filter(|d| !d.auto_update && !d.credential)
    }

    pub fn credential_fields() -> impl Iterator<Item = &'static FieldDescriptor> {
        MEMBER_FIELDS.iter().filter(|d| d.credential)
    }

    /// Replace credential fields with a placeholder
    pub fn clear_credentials(&mut self) {
        self.user_password = Some(REDACTED_CREDENTIAL.to_string());
        self.samba_nt_password = Some(REDACTED_CREDENTIAL.to_string());
    }

    /// A credential value that should be written to the directory
    pub fn writable_credential(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .filter(|v| !v.is_empty() && *v != REDACTED_CREDENTIAL)
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Derive the samba SID from a domain SID using the algorithmic RID mapping
    pub fn generate_samba_sid(&mut self, domain_sid: &str) -> DomainResult<()> {
        let uid_number = self.uid_number.ok_or_else(|| DomainError::Validation {
            field: "uid_number".to_string(),
            message: "A uid-number is required to derive the samba SID".to_string(),
        })?;

        let rid = u64::from(uid_number) * 2 + 1000;
        self.samba_sid = Some(format!("{domain_sid}-{rid}"));
        Ok(())
    }
}

fn parse_number(values: &[String]) -> Option<u32> {
    values.first().and_then(|v| v.trim().parse().ok())
}

fn first_text(values: Vec<String>) -> Option<String> {
    values.into_iter().next()
}

impl DirectoryEntity for Member {
    fn descriptors() -> &'static [FieldDescriptor] {
        MEMBER_FIELDS
    }

    fn value_of(&self, attribute: &str) -> AttributeValue {
        let Some(descriptor) = Self::descriptor(attribute) else {
            return AttributeValue::Absent;
        };

        match descriptor.field {
            "uid" => AttributeValue::Text(self.uid.clone()),
            "uid_number" => AttributeValue::number(self.uid_number),
            "gid_number" => AttributeValue::number(self.gid_number),
            "cn" => AttributeValue::text(&self.cn),
            "sn" => AttributeValue::text(&self.sn),
            "given_name" => AttributeValue::text(&self.given_name),
            "home_directory" => AttributeValue::text(&self.home_directory),
            "login_shell" => AttributeValue::text(&self.login_shell),
            "mail" => AttributeValue::text(&self.mail),
            "mobile" => AttributeValue::text(&self.mobile),
            "telephone_number" => AttributeValue::text(&self.telephone_number),
            "home_postal_address" => AttributeValue::text(&self.home_postal_address),
            "birth_date" => AttributeValue::text(&self.birth_date),
            "arrival_date" => AttributeValue::text(&self.arrival_date),
            "leaving_date" => AttributeValue::text(&self.leaving_date),
            "nationality" => AttributeValue::text(&self.nationality),
            "ssh_public_key" => AttributeValue::text(&self.ssh_public_key),
            "pgp_key" => AttributeValue::text(&self.pgp_key),
            "iban" => AttributeValue::text(&self.iban),
            "xmpp_id" => AttributeValue::text(&self.xmpp_id),
            "convention_signer" => AttributeValue::text(&self.convention_signer),
            "is_minor" => AttributeValue::flag(self.is_minor),
            "samba_sid" => AttributeValue::text(&self.samba_sid),
            "jpeg_photo" => AttributeValue::text(&self.jpeg_photo),
            "user_password" => AttributeValue::text(&self.user_password),
            "samba_nt_password" => AttributeValue::text(&self.samba_nt_password),
            _ => AttributeValue::Absent,
        }
    }

    fn apply_values(&mut self, attribute: &str, values: Vec<String>) -> bool {
        let Some(descriptor) = Self::descriptor(attribute) else {
            return false;
        };

        match descriptor.field {
            "uid" => self.uid = first_text(values).unwrap_or_default(),
            "uid_number" => self.uid_number = parse_number(&values),
            "gid_number" => self.gid_number = parse_number(&values),
            "cn" => self.cn = first_text(values),
            "sn" => self.sn = first_text(values),
            "given_name" => self.given_name = first_text(values),
            "home_directory" => self.home_directory = first_text(values),
            "login_shell" => self.login_shell = first_text(values),
            "mail" => self.mail = first_text(values),
            "mobile" => self.mobile = first_text(values),
            "telephone_number" => self.telephone_number = first_text(values),
            "home_postal_address" => self.home_postal_address = first_text(values),
            "birth_date" => self.birth_date = first_text(values),
            "arrival_date" => self.arrival_date = first_text(values),
            "leaving_date" => self.leaving_date = first_text(values),
            "nationality" => self.nationality = first_text(values),
            "ssh_public_key" => self.ssh_public_key = first_text(values),
            "pgp_key" => self.pgp_key = first_text(values),
            "iban" => self.iban = first_text(values),
            "xmpp_id" => self.xmpp_id = first_text(values),
            "convention_signer" => self.convention_signer = first_text(values),
            "is_minor" => self.is_minor = values.first().and_then(|v| parse_flag(v)),
            // an empty SID is as good as none
            "samba_sid" => self.samba_sid = first_text(values).filter(|v| !v.is_empty()),
            "jpeg_photo" => self.jpeg_photo = first_text(values),
            "user_password" => self.user_password = first_text(values),
            "samba_nt_password" => self.samba_nt_password = first_text(values),
            _ => return false,
        }

        true
    }
}
