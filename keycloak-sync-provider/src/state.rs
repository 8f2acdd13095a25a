use keycloak_sync_domain::{
    application::{
        ports::{ConfigurationPort, KeycloakRepository},
        services::LookupRetry,
    },
    domain::errors::DomainResult,
    infrastructure::adapters::{build_http_client, KeycloakRestAdapter, KeycloakTokenManager},
};
use std::sync::Arc;
use tracing::info;

use crate::resources::Registry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    /// Wire the REST adapter and every resource from validated configuration
    pub fn new(config: &dyn ConfigurationPort) -> DomainResult<Self> {
        config.validate()?;

        let keycloak = config.get_keycloak_config();
        let client = build_http_client(config.get_http_config(), &keycloak.additional_headers)?;
        let token_manager = Arc::new(KeycloakTokenManager::new_with_client(
            keycloak.get_server_root(),
            client.clone(),
        ));
        let repository = Arc::new(KeycloakRestAdapter::new_with_client(
            keycloak,
            client,
            token_manager,
        )?);

        info!(
            url = %keycloak.url,
            realm = %keycloak.realm,
            client_id = %keycloak.client_id,
            "Keycloak admin client configured"
        );

        let lookup = LookupRetry::from(config.get_reconcile_config());
        Ok(Self::with_repository(repository, lookup))
    }

    pub fn with_repository(repository: Arc<dyn KeycloakRepository>, lookup: LookupRetry) -> Self {
        Self {
            registry: Arc::new(Registry::for_repository(repository, lookup)),
        }
    }
}
