use crate::application::ports::{
    AppConfig, ConfigurationPort, DirectoryLayout, LdapConfig, LoggingConfig, MembershipPolicy,
};
use crate::domain::errors::DomainResult;

/// Environment-based configuration adapter
pub struct EnvConfigurationAdapter {
    config: AppConfig,
}

impl EnvConfigurationAdapter {
    pub fn new() -> DomainResult<Self> {
        let config = AppConfig::from_env()?;
        Ok(Self { config })
    }

    /// Adapter over an already assembled configuration, e.g. one read with
    /// [`AppConfig::from_lookup`]
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }
}

impl ConfigurationPort for EnvConfigurationAdapter {
    fn get_ldap_config(&self) -> &LdapConfig {
        &self.config.ldap
    }

    fn get_directory_layout(&self) -> &DirectoryLayout {
        &self.config.layout
    }

    fn get_membership_policy(&self) -> &MembershipPolicy {
        &self.config.membership
    }

    fn get_logging_config(&self) -> &LoggingConfig {
        &self.config.logging
    }

    fn validate(&self) -> DomainResult<()> {
        self.config.validate()
    }

    fn is_development(&self) -> bool {
        self.config.is_development()
    }

    fn is_test(&self) -> bool {
        self.config.is_test()
    }
}
