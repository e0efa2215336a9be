//! Minimal attribute-level changes between a desired entity and a snapshot.

use crate::domain::entities::{AttributeValue, DirectoryEntity, FieldDescriptor, ValueEncoding};
use serde::{Deserialize, Serialize};

/// The single change needed to bring one attribute in line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeChange {
    NoChange,
    Add { attribute: String, values: Vec<String> },
    Replace { attribute: String, values: Vec<String> },
    Delete { attribute: String },
}

impl AttributeChange {
    pub fn is_change(&self) -> bool {
        !matches!(self, AttributeChange::NoChange)
    }

    pub fn attribute(&self) -> Option<&str> {
        match self {
            AttributeChange::NoChange => None,
            AttributeChange::Add { attribute, .. }
            | AttributeChange::Replace { attribute, .. }
            | AttributeChange::Delete { attribute } => Some(attribute),
        }
    }

    /// Attribute/value pair for an add request. Only `Add` contributes.
    pub fn into_entry_attribute(self) -> Option<(String, Vec<String>)> {
        match self {
            AttributeChange::Add { attribute, values } => Some((attribute, values)),
            _ => None,
        }
    }
}

fn same_values(mut a: Vec<String>, mut b: Vec<String>) -> bool {
    a.sort();
    b.sort();
    a == b
}

/// Compute the change for `attribute` of `entity` relative to `old`.
///
/// Without a snapshot, every meaningful value becomes an `Add`. Both
/// sides are encoded before comparison, so the old value is compared in
/// the same representation the new value would be written in.
pub fn prepare_volatile_attribute<E: DirectoryEntity>(
    entity: &E,
    old: Option<&E>,
    attribute: &str,
    encoding: ValueEncoding,
) -> AttributeChange {
    let attribute_name = E::descriptor(attribute)
        .map(|d| d.attribute.to_string())
        .unwrap_or_else(|| attribute.to_string());

    let new_value = entity.value_of(attribute);
    let old_value = old
        .map(|o| o.value_of(attribute))
        .filter(AttributeValue::is_meaningful);

    if new_value.is_meaningful() {
        let encoded = new_value.encode(encoding);

        match old_value {
            Some(previous) => {
                if same_values(previous.encode(encoding), encoded.clone()) {
                    AttributeChange::NoChange
                } else {
                    AttributeChange::Replace {
                        attribute: attribute_name,
                        values: encoded,
                    }
                }
            }
            None => AttributeChange::Add {
                attribute: attribute_name,
                values: encoded,
            },
        }
    } else if old_value.is_some() {
        AttributeChange::Delete {
            attribute: attribute_name,
        }
    } else {
        AttributeChange::NoChange
    }
}

/// Diff every field in `fields`, dropping `NoChange` results
pub fn diff_fields<'a, E: DirectoryEntity>(
    entity: &E,
    old: Option<&E>,
    fields: impl IntoIterator<Item = &'a FieldDescriptor>,
) -> Vec<AttributeChange> {
    fields
        .into_iter()
        .map(|d| prepare_volatile_attribute(entity, old, d.attribute, d.encoding))
        .filter(AttributeChange::is_change)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Group, Member};

    fn member(mail: Option<&str>) -> Member {
        Member {
            uid: "alice".into(),
            mail: mail.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn four_outcomes() {
        let utf8 = ValueEncoding::Utf8;
        let a = member(Some("a@example.org"));
        let b = member(Some("b@example.org"));
        let none = member(None);

        assert_eq!(
            prepare_volatile_attribute(&a, Some(&a), "mail", utf8),
            AttributeChange::NoChange
        );
        assert_eq!(
            prepare_volatile_attribute(&a, Some(&none), "mail", utf8),
            AttributeChange::Add {
                attribute: "mail".into(),
                values: vec!["a@example.org".into()]
            }
        );
        assert_eq!(
            prepare_volatile_attribute(&none, Some(&a), "mail", utf8),
            AttributeChange::Delete { attribute: "mail".into() }
        );
        assert_eq!(
            prepare_volatile_attribute(&b, Some(&a), "mail", utf8),
            AttributeChange::Replace {
                attribute: "mail".into(),
                values: vec!["b@example.org".into()]
            }
        );
        assert_eq!(
            prepare_volatile_attribute(&none, Some(&none), "mail", utf8),
            AttributeChange::NoChange
        );
    }

    #[test]
    fn empty_string_counts_as_absent() {
        let blank = member(Some(""));
        let a = member(Some("a@example.org"));
        assert_eq!(
            prepare_volatile_attribute(&blank, Some(&a), "mail", ValueEncoding::Utf8),
            AttributeChange::Delete { attribute: "mail".into() }
        );
        assert_eq!(
            prepare_volatile_attribute(&a, Some(&blank), "mail", ValueEncoding::Utf8).attribute(),
            Some("mail")
        );
    }

    #[test]
    fn booleans_use_upper_case_literals() {
        let mut m = member(None);
        m.is_minor = Some(false);
        assert_eq!(
            prepare_volatile_attribute(&m, None, "isMinor", ValueEncoding::Utf8),
            AttributeChange::Add {
                attribute: "isMinor".into(),
                values: vec!["FALSE".into()]
            }
        );

        let mut old = m.clone();
        old.is_minor = Some(true);
        assert_eq!(
            prepare_volatile_attribute(&m, Some(&old), "isMinor", ValueEncoding::Utf8),
            AttributeChange::Replace {
                attribute: "isMinor".into(),
                values: vec!["FALSE".into()]
            }
        );
    }

    #[test]
    fn values_are_transcoded_lossily() {
        let mut m = member(None);
        m.cn = Some("Zoë Müller".into());
        assert_eq!(
            prepare_volatile_attribute(&m, None, "cn", ValueEncoding::Ascii),
            AttributeChange::Add {
                attribute: "cn".into(),
                values: vec!["Zo Mller".into()]
            }
        );
    }

    #[test]
    fn list_comparison_ignores_order() {
        let mut new = Group::new("office".into()).unwrap();
        new.users = vec!["bob".into(), "alice".into()];
        let mut old = new.clone();
        old.users = vec!["alice".into(), "bob".into()];

        assert_eq!(
            prepare_volatile_attribute(&new, Some(&old), "memberUid", ValueEncoding::Ascii),
            AttributeChange::NoChange
        );
    }

    #[test]
    fn diff_fields_strips_no_change() {
        let old = member(Some("a@example.org"));
        let mut new = old.clone();
        new.sn = Some("Liddell".into());

        let changes = diff_fields(&new, Some(&old), Member::auto_update_fields());
        assert_eq!(
            changes,
            vec![AttributeChange::Add {
                attribute: "sn".into(),
                values: vec!["Liddell".into()]
            }]
        );
    }
}
