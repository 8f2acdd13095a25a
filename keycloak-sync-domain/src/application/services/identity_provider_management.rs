use crate::{
    application::ports::*,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Mappers attached to identity provider instances
pub struct IdentityProviderMapperService {
    repository: Arc<dyn KeycloakRepository>,
}

impl IdentityProviderMapperService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, mapper), fields(realm = %mapper.realm, alias = %mapper.identity_provider_alias, name = %mapper.name))]
    pub async fn create_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<IdentityProviderMapper> {
        mapper.validate()?;
        let id = self.repository.create_identity_provider_mapper(mapper).await?;
        info!("Created identity provider mapper '{}' ({})", mapper.name, id);
        Ok(IdentityProviderMapper {
            id: Some(id.to_string()),
            ..mapper.clone()
        })
    }

    #[instrument(skip(self), fields(realm = %realm, alias = %alias, id = %mapper_id))]
    pub async fn get_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> DomainResult<IdentityProviderMapper> {
        self.repository
            .get_identity_provider_mapper(realm, alias, mapper_id)
            .await
    }

    pub async fn list_mappers(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<Vec<IdentityProviderMapper>> {
        self.repository
            .list_identity_provider_mappers(realm, alias)
            .await
    }

    #[instrument(skip(self, mapper), fields(realm = %mapper.realm, alias = %mapper.identity_provider_alias, name = %mapper.name))]
    pub async fn update_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<IdentityProviderMapper> {
        mapper.validate()?;
        if mapper.id.is_none() {
            return Err(DomainError::validation(
                "id",
                "Identity provider mapper ID is required for updates",
            ));
        }
        self.repository.update_identity_provider_mapper(mapper).await?;
        Ok(mapper.clone())
    }

    #[instrument(skip(self), fields(realm = %realm, alias = %alias, id = %mapper_id))]
    pub async fn delete_mapper(&self, realm: &str, alias: &str, mapper_id: &str) -> DomainResult<()> {
        self.repository
            .delete_identity_provider_mapper(realm, alias, mapper_id)
            .await
    }
}
