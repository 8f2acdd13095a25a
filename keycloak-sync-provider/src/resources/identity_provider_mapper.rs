use async_trait::async_trait;
use keycloak_sync_domain::{
    application::services::IdentityProviderMapperService,
    domain::entities::IdentityProviderMapper,
};
use std::sync::Arc;
use tracing::instrument;

use super::Resource;
use crate::error::ProviderResult;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

const REALM: &str = "realm";
const ALIAS: &str = "identity_provider_alias";

/// `keycloak_identity_provider_mapper`
pub struct IdentityProviderMapperResource {
    service: Arc<IdentityProviderMapperService>,
}

impl IdentityProviderMapperResource {
    pub fn new(service: Arc<IdentityProviderMapperService>) -> Self {
        Self { service }
    }

    fn mapper_from(data: &ResourceData) -> ProviderResult<IdentityProviderMapper> {
        let mut mapper = IdentityProviderMapper::new(
            data.get_string(REALM)?,
            data.get_string(ALIAS)?,
            data.get_string("name")?,
            data.get_string("identity_provider_mapper")?,
        );
        mapper.id = data.id().map(str::to_string);
        mapper.config = data.get_string_map("extra_config")?;
        Ok(mapper)
    }

    fn write(data: &mut ResourceData, mapper: &IdentityProviderMapper) {
        if let Some(id) = &mapper.id {
            data.set_id(id.clone());
        }
        data.set(REALM, mapper.realm.clone());
        data.set(ALIAS, mapper.identity_provider_alias.clone());
        data.set("name", mapper.name.clone());
        data.set("identity_provider_mapper", mapper.identity_provider_mapper.clone());
        data.set_string_map("extra_config", &mapper.config);
    }
}

#[async_trait]
impl Resource for IdentityProviderMapperResource {
    fn type_name(&self) -> &'static str {
        "keycloak_identity_provider_mapper"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::string(REALM).required().force_new(),
            Attribute::string(ALIAS).required().force_new(),
            Attribute::string("name").required().force_new(),
            Attribute::string("identity_provider_mapper")
                .required()
                .force_new()
                .describe("Mapper provider id, e.g. `hardcoded-attribute-idp-mapper`"),
            Attribute::map("extra_config"),
        ])
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}/{idpAlias}/{id}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let created = self.service.create_mapper(&Self::mapper_from(&data)?).await?;
        Self::write(&mut data, &created);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM)?;
        let alias = data.get_string(ALIAS)?;
        let mapper = self
            .service
            .get_mapper(&realm, &alias, data.require_id()?)
            .await?;
        Self::write(&mut data, &mapper);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn update(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self.service.update_mapper(&Self::mapper_from(&data)?).await?;
        Self::write(&mut data, &updated);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        let realm = data.get_string(REALM)?;
        let alias = data.get_string(ALIAS)?;
        Ok(self
            .service
            .delete_mapper(&realm, &alias, data.require_id()?)
            .await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set(REALM, parts[0].clone());
        data.set(ALIAS, parts[1].clone());
        data.set_id(parts[2].clone());
        Ok(data)
    }
}
