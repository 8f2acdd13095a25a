use async_trait::async_trait;
use keycloak_sync_domain::{application::services::DefaultRolesService, domain::entities::DefaultRoles};
use std::sync::Arc;
use tracing::instrument;

use super::{Resource, REALM_ID};
use crate::error::ProviderResult;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

/// `keycloak_default_roles`: realm roles composed into the realm's default role.
///
/// Identified by the id of the `default-roles-{realm}` composite.
pub struct DefaultRolesResource {
    service: Arc<DefaultRolesService>,
}

impl DefaultRolesResource {
    pub fn new(service: Arc<DefaultRolesService>) -> Self {
        Self { service }
    }

    fn roles_from(data: &ResourceData) -> ProviderResult<DefaultRoles> {
        Ok(DefaultRoles::new(
            data.get_string(REALM_ID)?,
            data.get_string_set("default_roles")?,
        ))
    }

    fn write(data: &mut ResourceData, roles: &DefaultRoles) {
        if let Some(id) = &roles.default_role_id {
            data.set_id(id.clone());
        }
        data.set(REALM_ID, roles.realm_id.clone());
        data.set_strings("default_roles", roles.roles.iter().cloned());
    }

    async fn apply(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self
            .service
            .update_default_roles(&Self::roles_from(&data)?)
            .await?;
        Self::write(&mut data, &updated);
        Ok(data)
    }
}

#[async_trait]
impl Resource for DefaultRolesResource {
    fn type_name(&self) -> &'static str {
        "keycloak_default_roles"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::string(REALM_ID).required().force_new(),
            Attribute::set("default_roles")
                .required()
                .describe("Realm role names; client roles already composed in are left alone"),
        ])
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, data: ResourceData) -> ProviderResult<ResourceData> {
        self.apply(data).await
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let current = self.service.get_default_roles(&realm).await?;
        Self::write(&mut data, &current);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn update(&self, data: ResourceData) -> ProviderResult<ResourceData> {
        self.apply(data).await
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        Ok(self
            .service
            .delete_default_roles(&Self::roles_from(&data)?)
            .await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set(REALM_ID, parts[0].clone());
        // Replaced by the composite's id once read
        data.set_id(parts[0].clone());
        Ok(data)
    }
}
