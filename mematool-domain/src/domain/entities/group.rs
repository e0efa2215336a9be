use super::common::*;
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

pub const GROUP_OBJECT_CLASSES: &[&str] = &["top", "posixGroup"];

/// Multi-valued attribute listing the uids of a group's members
pub const MEMBER_UID: &str = "memberUid";

const GROUP_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::auto("gid", "cn", FieldKind::Text),
    FieldDescriptor::auto("gid_number", "gidNumber", FieldKind::Number),
    FieldDescriptor::auto("users", MEMBER_UID, FieldKind::List).with_encoding(ValueEncoding::Ascii),
];

/// Domain entity representing a POSIX group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, stored as `cn`
    pub gid: String,
    pub gid_number: Option<u32>,
    /// Member uids in directory order
    pub users: Vec<String>,
}

impl Group {
    /// Create a new group with required fields
    pub fn new(gid: String) -> DomainResult<Self> {
        Self::validate_group_name(&gid)?;

        Ok(Self {
            gid,
            gid_number: None,
            users: Vec::new(),
        })
    }

    /// Validate group name according to business rules
    pub fn validate_group_name(name: &str) -> DomainResult<()> {
        if name.is_empty() {
            return Err(DomainError::Validation {
                field: "gid".to_string(),
                message: "Group name cannot be empty".to_string(),
            });
        }

        if name.len() > 255 {
            return Err(DomainError::Validation {
                field: "gid".to_string(),
                message: "Group name cannot exceed 255 characters".to_string(),
            });
        }

        if name.contains([',', '=', '+', '/']) {
            return Err(DomainError::Validation {
                field: "gid".to_string(),
                message: "Group name cannot contain ',', '=', '+' or '/'".to_string(),
            });
        }

        Ok(())
    }
}

impl DirectoryEntity for Group {
    fn descriptors() -> &'static [FieldDescriptor] {
        GROUP_FIELDS
    }

    fn value_of(&self, attribute: &str) -> AttributeValue {
        match Self::descriptor(attribute).map(|d| d.field) {
            Some("gid") => AttributeValue::Text(self.gid.clone()),
            Some("gid_number") => AttributeValue::number(self.gid_number),
            Some("users") => AttributeValue::List(self.users.clone()),
            _ => AttributeValue::Absent,
        }
    }

    fn apply_values(&mut self, attribute: &str, values: Vec<String>) -> bool {
        match Self::descriptor(attribute).map(|d| d.field) {
            Some("gid") => self.gid = values.into_iter().next().unwrap_or_default(),
            Some("gid_number") => {
                self.gid_number = values.first().and_then(|v| v.trim().parse().ok())
            }
            Some("users") => self.users.extend(values),
            _ => return false,
        }
        true
    }
}
