/*!
# MeMaTool Domain

Membership model for a hackerspace directory, using hexagonal architecture
principles.

This crate provides:
- Domain models for the directory entities (Member, Group, MailDomain, Alias)
- An attribute diff engine that turns desired state into minimal modifications
- Port definitions for the directory connection, the model factory and configuration
- Infrastructure adapters: an ldap3-backed connection, an in-memory directory
  and the LDAP model factory

## Architecture

```text
┌─────────────────────────────────────────────────────────────┐
│                      Domain Layer                           │
├─────────────────────────────────────────────────────────────┤
│  • Member / Group / MailDomain / Alias                      │
│  • Field descriptor tables    • Attribute diff engine       │
│  • CascadeReport              • DomainError                 │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                 Application Layer (Ports)                   │
├─────────────────────────────────────────────────────────────┤
│  • MembershipRepository       • DirectoryConnection         │
│  • ConfigurationPort                                        │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│              Infrastructure Layer (Adapters)                │
├─────────────────────────────────────────────────────────────┤
│  • LdapModelFactory           • LdapConnection (ldap3)      │
│  • InMemoryDirectory          • EnvConfigurationAdapter     │
└─────────────────────────────────────────────────────────────┘
```

## Usage

```rust,no_run
use mematool_domain::{
    infrastructure::adapters::{init_tracing, EnvConfigurationAdapter, LdapModelFactory},
    CascadePolicy, ConfigurationPort, MembershipRepository,
};

# async fn run() -> mematool_domain::DomainResult<()> {
let config = EnvConfigurationAdapter::new()?;
init_tracing(config.get_logging_config())?;

let factory = LdapModelFactory::connect(&config).await?;

let member = factory.get_user("jdoe", true).await?;
let report = factory.delete_user(&member.uid, CascadePolicy::StopOnFailure).await?;
assert!(report.is_complete());

factory.close().await?;
# Ok(())
# }
```
*/

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::ports::*;
pub use domain::diff::*;
pub use domain::entities::*;
pub use domain::errors::*;
