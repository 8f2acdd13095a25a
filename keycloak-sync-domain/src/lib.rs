/*!
# Keycloak Sync Domain

Typed Keycloak admin entities and the reconciliation logic that keeps them in
line with a declarative definition, organized along hexagonal architecture
lines.

This crate provides:
- Domain models for realms, authentication flows, client scopes, default roles,
  LDAP user federation and identity provider mappers
- A typed codec between those models and Keycloak's generic component config
- Port definitions for the admin REST API, token acquisition and configuration
- Application services for create-or-adopt, relation diffing and tolerated deletes
- Infrastructure adapters backed by `reqwest`

## Architecture

```text
┌─────────────────────────────────────────────────────────────┐
│                    Primary Adapters                         │
├─────────────────────────────────────────────────────────────┤
│        Resource callbacks (keycloak-sync-provider)          │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                Application Layer                            │
├─────────────────────────────────────────────────────────────┤
│  • RealmManagementService   • AuthenticationFlowService     │
│  • ClientScopeService       • LdapFederationService         │
│  • DefaultRolesService      • IdentityProviderMapperService │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                 Domain Layer (Ports)                        │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakRepository       • TokenManager                  │
│  • ConfigurationPort                                        │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│              Infrastructure Layer (Adapters)                │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakRestAdapter      • EnvConfigurationAdapter       │
│  • KeycloakTokenManager                                     │
└─────────────────────────────────────────────────────────────┘
```

## Usage

```rust,no_run
use std::sync::Arc;
use keycloak_sync_domain::{
    infrastructure::adapters::{KeycloakRestAdapter, KeycloakTokenManager},
    AppConfig, AuthenticationFlow, AuthenticationFlowService, LookupRetry,
};

# async fn run() -> keycloak_sync_domain::DomainResult<()> {
let config = AppConfig::from_env()?;
let tokens = Arc::new(KeycloakTokenManager::new(config.keycloak.get_server_root()));
let repository = Arc::new(KeycloakRestAdapter::new(&config.keycloak, &config.http, tokens)?);

let flows = AuthenticationFlowService::new(repository, LookupRetry::from(&config.reconcile));
let flow = flows
    .create_flow(&AuthenticationFlow::new("my-realm", "browser-with-otp"))
    .await?;
# Ok(())
# }
```
*/

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::ports::*;
pub use application::services::*;
pub use domain::entities::*;
pub use domain::errors::*;
