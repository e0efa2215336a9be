use thiserror::Error;

/// Domain-specific errors surfaced to callers of the membership model
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("{entity_type} already exists: {identifier}")]
    AlreadyExists {
        entity_type: String,
        identifier: String,
    },

    #[error("Directory operation failed: {operation} - {message}")]
    Directory { operation: String, message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("No free id left in the {pool} pool")]
    IdPoolExhausted { pool: String },
}

impl DomainError {
    pub fn not_found(entity_type: &str, identifier: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity_type: entity_type.to_string(),
            identifier: identifier.into(),
        }
    }

    pub fn already_exists(entity_type: &str, identifier: impl Into<String>) -> Self {
        DomainError::AlreadyExists {
            entity_type: entity_type.to_string(),
            identifier: identifier.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::AlreadyExists { .. })
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors reported by a directory connection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("No such object: {dn}")]
    NoSuchObject { dn: String },

    #[error("Entry already exists: {dn}")]
    AlreadyExists { dn: String },

    #[error("Attribute or value exists: {attribute} on {dn}")]
    ValueExists { dn: String, attribute: String },

    #[error("No such attribute: {attribute} on {dn}")]
    NoSuchAttribute { dn: String, attribute: String },

    #[error("Invalid filter {filter}: {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("{operation} failed with code {code}: {message}")]
    OperationFailed {
        operation: String,
        code: u32,
        message: String,
    },
}

impl DirectoryError {
    /// LDAP result codes for the conditions the model cares about
    pub const RC_NO_SUCH_ATTRIBUTE: u32 = 16;
    pub const RC_VALUE_EXISTS: u32 = 20;
    pub const RC_NO_SUCH_OBJECT: u32 = 32;
    pub const RC_ALREADY_EXISTS: u32 = 68;

    /// Build the error matching an LDAP result code
    pub fn from_result_code(
        operation: &str,
        dn: &str,
        attribute: Option<&str>,
        code: u32,
        message: &str,
    ) -> Self {
        let attribute = attribute.unwrap_or_default().to_string();
        match code {
            Self::RC_NO_SUCH_OBJECT => DirectoryError::NoSuchObject { dn: dn.to_string() },
            Self::RC_ALREADY_EXISTS => DirectoryError::AlreadyExists { dn: dn.to_string() },
            Self::RC_VALUE_EXISTS => DirectoryError::ValueExists {
                dn: dn.to_string(),
                attribute,
            },
            Self::RC_NO_SUCH_ATTRIBUTE => DirectoryError::NoSuchAttribute {
                dn: dn.to_string(),
                attribute,
            },
            _ => DirectoryError::OperationFailed {
                operation: operation.to_string(),
                code,
                message: message.to_string(),
            },
        }
    }

    /// Whether the directory reports the target state as already reached
    pub fn is_already_in_state(&self) -> bool {
        matches!(
            self,
            DirectoryError::ValueExists { .. } | DirectoryError::NoSuchAttribute { .. }
        )
    }
}

impl From<DirectoryError> for DomainError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NoSuchObject { dn } => DomainError::not_found("entry", dn),
            DirectoryError::AlreadyExists { dn } => DomainError::already_exists("entry", dn),
            DirectoryError::ConnectionFailed { message } => DomainError::Directory {
                operation: "connect".to_string(),
                message,
            },
            DirectoryError::InvalidFilter { filter, message } => DomainError::Directory {
                operation: "search".to_string(),
                message: format!("{filter}: {message}"),
            },
            DirectoryError::OperationFailed {
                operation,
                code,
                message,
            } => DomainError::Directory {
                operation,
                message: format!("code {code}: {message}"),
            },
            other @ (DirectoryError::ValueExists { .. }
            | DirectoryError::NoSuchAttribute { .. }) => DomainError::Directory {
                operation: "modify".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Directory-level result type
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired { key } => DomainError::Configuration {
                message: format!("Missing required configuration: {key}"),
            },
            ConfigError::InvalidValue { key, message } => DomainError::Configuration {
                message: format!("Invalid value for {key}: {message}"),
            },
        }
    }
}
