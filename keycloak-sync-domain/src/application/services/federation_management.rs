use crate::{
    application::ports::*,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// LDAP user federation components and the mapper components below them
pub struct LdapFederationService {
    repository: Arc<dyn KeycloakRepository>,
}

impl LdapFederationService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    /// Create the federation.
    ///
    /// With `delete_default_mappers`, the mappers Keycloak provisions alongside
    /// a new LDAP provider are removed so only declared mappers remain.
    #[instrument(skip(self, federation), fields(realm = %federation.realm_id, name = %federation.name))]
    pub async fn create_federation(
        &self,
        federation: &LdapUserFederation,
        delete_default_mappers: bool,
    ) -> DomainResult<LdapUserFederation> {
        federation.validate()?;
        let component = federation.to_component()?;

        let id = self
            .repository
            .create_component(&federation.realm_id, &component)
            .await?;
        info!("Created LDAP user federation '{}' ({})", federation.name, id);

        if delete_default_mappers {
            let defaults = self
                .repository
                .list_components(&federation.realm_id, id.as_str(), LDAP_MAPPER_PROVIDER_TYPE)
                .await?;
            for mapper in defaults {
                let Some(mapper_id) = mapper.id else { continue };
                debug!("Removing default LDAP mapper '{}'", mapper.name);
                self.repository
                    .delete_component(&federation.realm_id, mapper_id.as_str())
                    .await?;
            }
        }

        Ok(LdapUserFederation {
            id: Some(id),
            ..federation.clone()
        })
    }

    /// Read the federation back, keeping `local_credential` when Keycloak masks the bind secret
    #[instrument(skip(self, local_credential), fields(realm = %realm, id = %federation_id))]
    pub async fn get_federation(
        &self,
        realm: &str,
        federation_id: &str,
        local_credential: Option<String>,
    ) -> DomainResult<LdapUserFederation> {
        let component = self.repository.get_component(realm, federation_id).await?;
        if component.provider_id != LDAP_PROVIDER_ID {
            return Err(DomainError::not_found("LDAP user federation", federation_id));
        }

        let mut federation = LdapUserFederation::from_component(&component)?;
        federation.realm_id = realm.to_string();
        federation.keep_local_credential(local_credential);
        Ok(federation)
    }

    #[instrument(skip(self, federation), fields(realm = %federation.realm_id, name = %federation.name))]
    pub async fn update_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<LdapUserFederation> {
        federation.validate()?;
        if federation.id.is_none() {
            return Err(DomainError::validation(
                "id",
                "LDAP user federation ID is required for updates",
            ));
        }

        let component = federation.to_component()?;
        self.repository
            .update_component(&federation.realm_id, &component)
            .await?;
        Ok(federation.clone())
    }

    #[instrument(skip(self), fields(realm = %realm, id = %federation_id))]
    pub async fn delete_federation(&self, realm: &str, federation_id: &str) -> DomainResult<()> {
        self.repository.delete_component(realm, federation_id).await
    }

    /// Mappers of a federation whose provider id is one of the known kinds
    #[instrument(skip(self), fields(realm = %realm, federation = %federation_id))]
    pub async fn list_mappers(
        &self,
        realm: &str,
        federation_id: &str,
    ) -> DomainResult<Vec<LdapMapper>> {
        let components = self
            .repository
            .list_components(realm, federation_id, LDAP_MAPPER_PROVIDER_TYPE)
            .await?;

        let mut mappers = Vec::with_capacity(components.len());
        for component in &components {
            match LdapMapper::from_component(realm, component)? {
                Some(mapper) => mappers.push(mapper),
                None => debug!(
                    "Skipping LDAP mapper '{}' with provider '{}'",
                    component.name, component.provider_id
                ),
            }
        }
        Ok(mappers)
    }

    #[instrument(skip(self, mapper), fields(realm = %mapper.realm_id, name = %mapper.name))]
    pub async fn create_mapper(&self, mapper: &LdapMapper) -> DomainResult<LdapMapper> {
        let component = mapper.to_component()?;
        let id = self
            .repository
            .create_component(&mapper.realm_id, &component)
            .await?;
        Ok(LdapMapper {
            id: Some(id.to_string()),
            ..mapper.clone()
        })
    }

    pub async fn get_mapper(&self, realm: &str, mapper_id: &str) -> DomainResult<LdapMapper> {
        let component = self.repository.get_component(realm, mapper_id).await?;
        LdapMapper::from_component(realm, &component)?
            .ok_or_else(|| DomainError::not_found("LDAP mapper", mapper_id))
    }

    pub async fn update_mapper(&self, mapper: &LdapMapper) -> DomainResult<LdapMapper> {
        if mapper.id.is_none() {
            return Err(DomainError::validation("id", "LDAP mapper ID is required for updates"));
        }
        let component = mapper.to_component()?;
        self.repository
            .update_component(&mapper.realm_id, &component)
            .await?;
        Ok(mapper.clone())
    }

    pub async fn delete_mapper(&self, realm: &str, mapper_id: &str) -> DomainResult<()> {
        self.repository.delete_component(realm, mapper_id).await
    }
}
