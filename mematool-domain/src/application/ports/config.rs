use crate::domain::errors::{ConfigError, DomainResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration port for accessing application configuration
pub trait ConfigurationPort: Send + Sync {
    /// Get directory server connection settings
    fn get_ldap_config(&self) -> &LdapConfig;

    /// Get the DN layout and search filters of the directory
    fn get_directory_layout(&self) -> &DirectoryLayout;

    /// Get membership policy (marker groups, defaults)
    fn get_membership_policy(&self) -> &MembershipPolicy;

    /// Get logging configuration
    fn get_logging_config(&self) -> &LoggingConfig;

    /// Validate all configuration
    fn validate(&self) -> DomainResult<()>;

    /// Check if running in development mode
    fn is_development(&self) -> bool;

    /// Check if running in test mode
    fn is_test(&self) -> bool;

    /// Immutable settings handed to a model factory
    fn factory_config(&self) -> FactoryConfig {
        FactoryConfig {
            layout: self.get_directory_layout().clone(),
            membership: self.get_membership_policy().clone(),
        }
    }
}

/// Directory server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    pub url: String,
    pub bind_dn: String,
    #[serde(skip_serializing)]
    pub bind_password: String,
    pub connect_timeout_seconds: u64,
    pub starttls: bool,
}

impl LdapConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "LDAP_URL".to_string(),
            }
            .into());
        }

        if !self.url.starts_with("ldap://")
            && !self.url.starts_with("ldaps://")
            && !self.url.starts_with("ldapi://")
        {
            return Err(ConfigError::InvalidValue {
                key: "LDAP_URL".to_string(),
                message: "Must start with ldap://, ldaps:// or ldapi://".to_string(),
            }
            .into());
        }

        if self.starttls && self.url.starts_with("ldaps://") {
            return Err(ConfigError::InvalidValue {
                key: "LDAP_STARTTLS".to_string(),
                message: "StartTLS cannot be combined with ldaps://".to_string(),
            }
            .into());
        }

        if self.connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "LDAP_CONNECT_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn get_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Where entries live in the directory tree and how id scans find them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLayout {
    pub basedn: String,
    pub basedn_users: String,
    pub basedn_groups: String,
    pub uid_filter: String,
    pub uid_filter_attrs: String,
    pub gid_filter: String,
    pub gid_filter_attrs: String,
    pub domain_filter: String,
    pub domain_filter_attrs: String,
}

impl DirectoryLayout {
    /// Layout with the stock id and domain filters
    pub fn with_base_dns(basedn: &str, basedn_users: &str, basedn_groups: &str) -> Self {
        Self {
            basedn: basedn.to_string(),
            basedn_users: basedn_users.to_string(),
            basedn_groups: basedn_groups.to_string(),
            uid_filter: "(uidNumber=*)".to_string(),
            uid_filter_attrs: "uidNumber".to_string(),
            gid_filter: "(gidNumber=*)".to_string(),
            gid_filter_attrs: "gidNumber".to_string(),
            domain_filter: "(objectClass=mailDomain)".to_string(),
            domain_filter_attrs: "dc".to_string(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let required = [
            ("LDAP_BASEDN", &self.basedn),
            ("LDAP_BASEDN_USERS", &self.basedn_users),
            ("LDAP_BASEDN_GROUPS", &self.basedn_groups),
            ("LDAP_UID_FILTER", &self.uid_filter),
            ("LDAP_UID_FILTER_ATTRS", &self.uid_filter_attrs),
            ("LDAP_GID_FILTER", &self.gid_filter),
            ("LDAP_GID_FILTER_ATTRS", &self.gid_filter_attrs),
            ("LDAP_DOMAIN_FILTER", &self.domain_filter),
            ("LDAP_DOMAIN_FILTER_ATTRS", &self.domain_filter_attrs),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    key: key.to_string(),
                }
                .into());
            }
        }

        for (key, dn) in [
            ("LDAP_BASEDN", &self.basedn),
            ("LDAP_BASEDN_USERS", &self.basedn_users),
            ("LDAP_BASEDN_GROUPS", &self.basedn_groups),
        ] {
            if !dn.split(',').all(|rdn| rdn.contains('=')) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{dn}' is not a distinguished name"),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Group names and defaults that drive member workflows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPolicy {
    pub group_fullmember: String,
    pub group_lockedmember: String,
    /// Primary gid-number of regular member accounts
    pub users_gid_number: u32,
    pub samba_domain_sid: Option<String>,
}

impl Default for MembershipPolicy {
    fn default() -> Self {
        Self {
            group_fullmember: "syn2cat_full_member".to_string(),
            group_lockedmember: "syn2cat_locked_member".to_string(),
            users_gid_number: 100,
            samba_domain_sid: None,
        }
    }
}

impl MembershipPolicy {
    pub fn validate(&self) -> DomainResult<()> {
        if self.group_fullmember.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "MEMATOOL_GROUP_FULLMEMBER".to_string(),
            }
            .into());
        }

        if self.group_lockedmember.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "MEMATOOL_GROUP_LOCKEDMEMBER".to_string(),
            }
            .into());
        }

        if self.group_fullmember == self.group_lockedmember {
            return Err(ConfigError::InvalidValue {
                key: "MEMATOOL_GROUP_LOCKEDMEMBER".to_string(),
                message: "Must differ from the full-member group".to_string(),
            }
            .into());
        }

        if let Some(sid) = &self.samba_domain_sid {
            if !sid.starts_with("S-1-") {
                return Err(ConfigError::InvalidValue {
                    key: "MEMATOOL_SAMBA_DOMAIN_SID".to_string(),
                    message: "Must start with S-1-".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Immutable configuration a model factory is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    pub layout: DirectoryLayout,
    pub membership: MembershipPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub enable_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            enable_colors: true,
        }
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log format enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
    Full,
}

/// Environment-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub ldap: LdapConfig,
    pub layout: DirectoryLayout,
    pub membership: MembershipPolicy,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> DomainResult<()> {
        self.ldap.validate()?;
        self.layout.validate()?;
        self.membership.validate()?;
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_test(&self) -> bool {
        self.environment == Environment::Test
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Load configuration from environment variables
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| ConfigError::MissingRequired {
                key: key.to_string(),
            })
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = or_default("ENVIRONMENT", "development")
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "ENVIRONMENT".to_string(),
                message: "Must be one of: development, test, staging, production".to_string(),
            })?;

        let ldap = LdapConfig {
            url: required("LDAP_URL")?,
            bind_dn: or_default("LDAP_BIND_DN", ""),
            bind_password: or_default("LDAP_BIND_PASSWORD", ""),
            connect_timeout_seconds: or_default("LDAP_CONNECT_TIMEOUT_SECONDS", "10")
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "LDAP_CONNECT_TIMEOUT_SECONDS".to_string(),
                    message: "Must be a number of seconds".to_string(),
                })?,
            starttls: or_default("LDAP_STARTTLS", "false").parse().unwrap_or(false),
        };

        let basedn = required("LDAP_BASEDN")?;
        let defaults = DirectoryLayout::with_base_dns(&basedn, "", "");
        let layout = DirectoryLayout {
            basedn_users: required("LDAP_BASEDN_USERS")?,
            basedn_groups: required("LDAP_BASEDN_GROUPS")?,
            uid_filter: or_default("LDAP_UID_FILTER", &defaults.uid_filter),
            uid_filter_attrs: or_default("LDAP_UID_FILTER_ATTRS", &defaults.uid_filter_attrs),
            gid_filter: or_default("LDAP_GID_FILTER", &defaults.gid_filter),
            gid_filter_attrs: or_default("LDAP_GID_FILTER_ATTRS", &defaults.gid_filter_attrs),
            domain_filter: or_default("LDAP_DOMAIN_FILTER", &defaults.domain_filter),
            domain_filter_attrs: or_default(
                "LDAP_DOMAIN_FILTER_ATTRS",
                &defaults.domain_filter_attrs,
            ),
            basedn,
        };

        let policy_defaults = MembershipPolicy::default();
        let membership = MembershipPolicy {
            group_fullmember: or_default(
                "MEMATOOL_GROUP_FULLMEMBER",
                &policy_defaults.group_fullmember,
            ),
            group_lockedmember: or_default(
                "MEMATOOL_GROUP_LOCKEDMEMBER",
                &policy_defaults.group_lockedmember,
            ),
            users_gid_number: or_default("MEMATOOL_USERS_GID_NUMBER", "100")
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "MEMATOOL_USERS_GID_NUMBER".to_string(),
                    message: "Must be a numeric gid".to_string(),
                })?,
            samba_domain_sid: lookup("MEMATOOL_SAMBA_DOMAIN_SID").filter(|s| !s.is_empty()),
        };

        let logging = LoggingConfig {
            level: or_default("LOG_LEVEL", "info").parse().unwrap_or(LogLevel::Info),
            format: or_default("LOG_FORMAT", "compact")
                .parse()
                .unwrap_or(LogFormat::Compact),
            enable_colors: or_default("LOG_COLORS", "true").parse().unwrap_or(true),
        };

        let config = AppConfig {
            environment,
            ldap,
            layout,
            membership,
            logging,
        };

        config.validate()?;
        Ok(config)
    }
}

/// String parsing implementations
impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Invalid environment: {s}")),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "full" => Ok(LogFormat::Full),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}
