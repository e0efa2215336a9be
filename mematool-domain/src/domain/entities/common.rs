use serde::{Deserialize, Serialize};

/// Attribute name holding the schema classes of an entry
pub const OBJECT_CLASS: &str = "objectClass";

/// Placeholder written into credential fields when a caller asks for them to be hidden
pub const REDACTED_CREDENTIAL: &str = "******";

/// Target character encoding for values written to the directory.
///
/// Characters the target cannot represent are dropped rather than
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueEncoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
    /// Written as-is, no transcoding (base64 photo blobs)
    Raw,
}

impl ValueEncoding {
    pub fn encode(&self, value: &str) -> String {
        match self {
            ValueEncoding::Utf8 | ValueEncoding::Raw => value.to_string(),
            ValueEncoding::Latin1 => value.chars().filter(|c| (*c as u32) <= 0xFF).collect(),
            ValueEncoding::Ascii => value.chars().filter(char::is_ascii).collect(),
        }
    }
}

/// Shape of a field as stored in the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    /// Serialized as `TRUE` / `FALSE`
    Flag,
    /// Multi-valued, order preserved as returned by the directory
    List,
}

/// Describes how one entity field maps onto a directory attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust-side field name
    pub field: &'static str,
    /// Directory attribute name
    pub attribute: &'static str,
    pub kind: FieldKind,
    /// Kept in sync by diff-based updates; otherwise written at creation only
    pub auto_update: bool,
    /// Passwords and hashes, force-replaced instead of diffed
    pub credential: bool,
    pub encoding: ValueEncoding,
}

impl FieldDescriptor {
    pub const fn auto(field: &'static str, attribute: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            attribute,
            kind,
            auto_update: true,
            credential: false,
            encoding: ValueEncoding::Utf8,
        }
    }

    pub const fn create_only(field: &'static str, attribute: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            attribute,
            kind,
            auto_update: false,
            credential: false,
            encoding: ValueEncoding::Utf8,
        }
    }

    pub const fn credential(field: &'static str, attribute: &'static str) -> Self {
        Self {
            field,
            attribute,
            kind: FieldKind::Text,
            auto_update: false,
            credential: true,
            encoding: ValueEncoding::Utf8,
        }
    }

    pub const fn with_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Value of a single entity field, independent of its Rust type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Absent,
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn text(value: &Option<String>) -> Self {
        match value {
            Some(v) => AttributeValue::Text(v.clone()),
            None => AttributeValue::Absent,
        }
    }

    pub fn number(value: Option<u32>) -> Self {
        match value {
            Some(n) => AttributeValue::Text(n.to_string()),
            None => AttributeValue::Absent,
        }
    }

    pub fn flag(value: Option<bool>) -> Self {
        match value {
            Some(b) => AttributeValue::Flag(b),
            None => AttributeValue::Absent,
        }
    }

    /// Booleans always carry meaning; text and lists only when non-empty.
    pub fn is_meaningful(&self) -> bool {
        match self {
            AttributeValue::Absent => false,
            AttributeValue::Text(s) => !s.is_empty(),
            AttributeValue::Flag(_) => true,
            AttributeValue::List(values) => values.iter().any(|v| !v.is_empty()),
        }
    }

    /// Directory representation of the value in the given encoding
    pub fn encode(&self, encoding: ValueEncoding) -> Vec<String> {
        match self {
            AttributeValue::Absent => Vec::new(),
            AttributeValue::Text(s) => vec![encoding.encode(s)],
            AttributeValue::Flag(b) => vec![if *b { "TRUE" } else { "FALSE" }.to_string()],
            AttributeValue::List(values) => values
                .iter()
                .filter(|v| !v.is_empty())
                .map(|v| encoding.encode(v))
                .collect(),
        }
    }
}

/// Parse a directory boolean (`TRUE` / `FALSE`, case-insensitive)
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// An entity whose fields are described by a static descriptor table
pub trait DirectoryEntity {
    fn descriptors() -> &'static [FieldDescriptor];

    fn descriptor(attribute: &str) -> Option<&'static FieldDescriptor> {
        Self::descriptors()
            .iter()
            .find(|d| d.attribute.eq_ignore_ascii_case(attribute))
    }

    /// Current value of the field mapped to `attribute`
    fn value_of(&self, attribute: &str) -> AttributeValue;

    /// Fold raw directory values onto the entity. Returns `false` for
    /// attributes the entity does not track.
    fn apply_values(&mut self, attribute: &str, values: Vec<String>) -> bool;
}
