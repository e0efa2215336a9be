use super::common::*;
use crate::domain::errors::{DomainError, DomainResult};
use ldap3::dn_escape;
use serde::{Deserialize, Serialize};

pub const ALIAS_OBJECT_CLASSES: &[&str] = &["mailAlias"];
pub const ALIAS_OBJECT_CLASS: &str = "mailAlias";
pub const MAIL: &str = "mail";
pub const MAILDROP: &str = "maildrop";

const ALIAS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::auto("mail", MAIL, FieldKind::List),
    FieldDescriptor::auto("maildrop", MAILDROP, FieldKind::List),
];

/// A mail alias: a set of addresses forwarding to a set of maildrops
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Primary address, names the entry
    pub dn_mail: String,
    /// Addresses the alias answers to
    pub mail: Vec<String>,
    /// Destinations, uids or addresses
    pub maildrop: Vec<String>,
    /// Domain the entry lives under
    pub domain: String,
}

impl Alias {
    /// Create an alias for `dn_mail`, deriving its domain from the address
    pub fn new(dn_mail: String) -> DomainResult<Self> {
        let domain = Self::domain_of(&dn_mail)?;

        Ok(Self {
            mail: vec![dn_mail.clone()],
            dn_mail,
            maildrop: Vec::new(),
            domain,
        })
    }

    /// Domain part of an address
    pub fn domain_of(address: &str) -> DomainResult<String> {
        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(domain.to_string())
            }
            _ => Err(DomainError::Validation {
                field: "dn_mail".to_string(),
                message: format!("'{address}' is not a valid mail address"),
            }),
        }
    }

    /// Distinguished name of the entry: `mail=<dn_mail>,dc=<domain>,<basedn>`,
    /// with both values escaped
    pub fn dn(&self, basedn: &str) -> String {
        format!(
            "mail={},dc={},{}",
            dn_escape(ValueEncoding::Ascii.encode(&self.dn_mail)),
            dn_escape(ValueEncoding::Ascii.encode(&self.domain)),
            basedn
        )
    }

    /// Addresses to store, always including `dn_mail`
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses = Vec::with_capacity(self.mail.len() + 1);
        if !self.mail.iter().any(|m| m == &self.dn_mail) {
            addresses.push(self.dn_mail.clone());
        }
        for m in &self.mail {
            if !m.is_empty() && !addresses.contains(m) {
                addresses.push(m.clone());
            }
        }
        addresses
    }
}

impl DirectoryEntity for Alias {
    fn descriptors() -> &'static [FieldDescriptor] {
        ALIAS_FIELDS
    }

    fn value_of(&self, attribute: &str) -> AttributeValue {
        match Self::descriptor(attribute).map(|d| d.field) {
            Some("mail") => AttributeValue::List(self.addresses()),
            Some("maildrop") => AttributeValue::List(self.maildrop.clone()),
            _ => AttributeValue::Absent,
        }
    }

    fn apply_values(&mut self, attribute: &str, values: Vec<String>) -> bool {
        match Self::descriptor(attribute).map(|d| d.field) {
            Some("mail") => self.mail.extend(values),
            Some("maildrop") => self.maildrop.extend(values),
            _ => return false,
        }
        true
    }
}
