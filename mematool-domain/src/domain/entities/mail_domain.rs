use super::common::*;
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DOMAIN_OBJECT_CLASSES: &[&str] = &["top", "domain", "mailDomain"];

const DOMAIN_FIELDS: &[FieldDescriptor] = &[FieldDescriptor::auto("dc", "dc", FieldKind::Text)];

/// A mail domain hosted below the base DN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailDomain {
    pub dc: String,
    /// Remaining directory attributes, first value each
    pub attributes: BTreeMap<String, String>,
}

impl MailDomain {
    pub fn new(dc: String) -> DomainResult<Self> {
        Self::validate_domain_name(&dc)?;

        Ok(Self {
            dc,
            attributes: BTreeMap::new(),
        })
    }

    pub fn validate_domain_name(name: &str) -> DomainResult<()> {
        if name.is_empty() {
            return Err(DomainError::Validation {
                field: "dc".to_string(),
                message: "Domain name cannot be empty".to_string(),
            });
        }

        let labels_valid = name.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        });

        if !labels_valid {
            return Err(DomainError::Validation {
                field: "dc".to_string(),
                message: format!("'{name}' is not a valid domain name"),
            });
        }

        Ok(())
    }

    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }
}

impl DirectoryEntity for MailDomain {
    fn descriptors() -> &'static [FieldDescriptor] {
        DOMAIN_FIELDS
    }

    fn value_of(&self, attribute: &str) -> AttributeValue {
        if attribute.eq_ignore_ascii_case("dc") {
            return AttributeValue::Text(self.dc.clone());
        }
        match self.attributes.get(attribute) {
            Some(v) => AttributeValue::Text(v.clone()),
            None => AttributeValue::Absent,
        }
    }

    fn apply_values(&mut self, attribute: &str, values: Vec<String>) -> bool {
        let Some(first) = values.into_iter().next() else {
            return false;
        };

        if attribute.eq_ignore_ascii_case("dc") {
            self.dc = first;
        } else {
            self.attributes.insert(attribute.to_string(), first);
        }
        true
    }
}
