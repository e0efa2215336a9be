pub mod env_config;
pub mod filter;
pub mod ldap_connection;
pub mod ldap_model_factory;
pub mod logging;
pub mod memory_directory;

pub use env_config::*;
pub use filter::LdapFilter;
pub use ldap_connection::LdapConnection;
pub use ldap_model_factory::LdapModelFactory;
pub use logging::init_tracing;
pub use memory_directory::InMemoryDirectory;
