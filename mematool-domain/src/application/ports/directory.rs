use crate::domain::{diff::AttributeChange, errors::DirectoryResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Search scope relative to the base DN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchScope {
    Base,
    OneLevel,
    Subtree,
}

/// Attribute selector requesting every user attribute
pub const ALL_ATTRIBUTES: &str = "*";

/// Attribute selector requesting no attributes, only DNs
pub const NO_ATTRIBUTES: &str = "1.1";

/// One entry returned by a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, values: &[&str]) -> Self {
        self.attrs.insert(
            name.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Values of an attribute, matched case-insensitively
    pub fn values(&self, name: &str) -> Option<&Vec<String>> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name)?.first().map(String::as_str)
    }

    /// Value of the leading RDN (`uid=alice,ou=...` gives `alice`)
    pub fn rdn_value(&self) -> Option<String> {
        rdn_value(&self.dn, 0)
    }
}

/// RDNs of a DN, split on commas that are not escaped
pub fn split_rdns(dn: &str) -> Vec<&str> {
    let mut rdns = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                rdns.push(&dn[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    rdns.push(&dn[start..]);
    rdns
}

/// Resolve RFC 4514 escapes (`\+` and `\2B` both give `+`)
fn unescape_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes.get(i + 1) {
            Some(&next) if bytes[i] == b'\\' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|pair| pair.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|pair| std::str::from_utf8(pair).ok())
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok());
                match hex {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(next);
                        i += 2;
                    }
                }
            }
            _ => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Unescaped value of the `index`-th RDN of a DN
pub fn rdn_value(dn: &str, index: usize) -> Option<String> {
    let (_, value) = split_rdns(dn).get(index)?.split_once('=')?;
    let value = value.trim_start();
    let value = if value.ends_with("\\ ") {
        value
    } else {
        value.trim_end()
    };
    Some(unescape_value(value))
}

/// Complete attribute set of a new entry
pub type EntryAttributes = Vec<(String, Vec<String>)>;

/// A single modification of an existing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modification {
    Add { attribute: String, values: Vec<String> },
    Replace { attribute: String, values: Vec<String> },
    /// Empty `values` removes the whole attribute
    Delete { attribute: String, values: Vec<String> },
}

impl Modification {
    pub fn add(attribute: &str, value: impl Into<String>) -> Self {
        Modification::Add {
            attribute: attribute.to_string(),
            values: vec![value.into()],
        }
    }

    pub fn replace(attribute: &str, value: impl Into<String>) -> Self {
        Modification::Replace {
            attribute: attribute.to_string(),
            values: vec![value.into()],
        }
    }

    pub fn delete_value(attribute: &str, value: impl Into<String>) -> Self {
        Modification::Delete {
            attribute: attribute.to_string(),
            values: vec![value.into()],
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            Modification::Add { attribute, .. }
            | Modification::Replace { attribute, .. }
            | Modification::Delete { attribute, .. } => attribute,
        }
    }

    /// Modification equivalent of a diff result; `NoChange` has none
    pub fn from_change(change: AttributeChange) -> Option<Self> {
        match change {
            AttributeChange::NoChange => None,
            AttributeChange::Add { attribute, values } => Some(Modification::Add { attribute, values }),
            AttributeChange::Replace { attribute, values } => {
                Some(Modification::Replace { attribute, values })
            }
            AttributeChange::Delete { attribute } => Some(Modification::Delete {
                attribute,
                values: Vec::new(),
            }),
        }
    }
}

/// Directory access port: the primitives the membership model is built on.
///
/// Implementations issue one request per call and report LDAP result
/// codes as typed [`DirectoryError`](crate::domain::errors::DirectoryError)s.
#[async_trait]
pub trait DirectoryConnection: Send + Sync {
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>>;

    async fn add(&self, dn: &str, attrs: EntryAttributes) -> DirectoryResult<()>;

    async fn modify(&self, dn: &str, mods: Vec<Modification>) -> DirectoryResult<()>;

    async fn delete(&self, dn: &str) -> DirectoryResult<()>;

    /// Release the connection. Further calls fail.
    async fn close(&self) -> DirectoryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rdn_values_are_extracted() {
        let entry = DirectoryEntry::new("mail=info@example.org,dc=example.org,dc=mail");
        assert_eq!(entry.rdn_value().as_deref(), Some("info@example.org"));
        assert_eq!(rdn_value(&entry.dn, 1).as_deref(), Some("example.org"));
        assert_eq!(rdn_value(&entry.dn, 5), None);
    }

    #[test]
    fn rdn_values_are_unescaped() {
        let dn = r"mail=foo\+bar@example.org,cn=Smith\, John,cn=caf\C3\A9,dc=org";
        assert_eq!(split_rdns(dn).len(), 4);
        assert_eq!(rdn_value(dn, 0).as_deref(), Some("foo+bar@example.org"));
        assert_eq!(rdn_value(dn, 1).as_deref(), Some("Smith, John"));
        assert_eq!(rdn_value(dn, 2).as_deref(), Some("café"));
        assert_eq!(rdn_value(r"cn=\+1", 0).as_deref(), Some("+1"));
        assert_eq!(rdn_value(r"cn=trailing\ ", 0).as_deref(), Some("trailing "));
    }

    #[test]
    fn escaped_values_survive_a_round_trip() {
        for value in ["foo+bar@example.org", "a,b", "x=y", "semi;colon", "back\\slash"] {
            let dn = format!("mail={},dc=example.org", ldap3::dn_escape(value));
            assert_eq!(rdn_value(&dn, 0).as_deref(), Some(value), "{dn}");
            assert_eq!(rdn_value(&dn, 1).as_deref(), Some("example.org"));
        }
    }

    #[test]
    fn attribute_lookup_ignores_case() {
        let entry = DirectoryEntry::new("uid=a").with_attribute("uidNumber", &["1000"]);
        assert_eq!(entry.first_value("uidnumber"), Some("1000"));
    }

    #[test]
    fn changes_map_onto_modifications() {
        assert_eq!(Modification::from_change(AttributeChange::NoChange), None);
        assert_eq!(
            Modification::from_change(AttributeChange::Delete { attribute: "mobile".into() }),
            Some(Modification::Delete {
                attribute: "mobile".into(),
                values: vec![]
            })
        );
    }
}
