use async_trait::async_trait;
use keycloak_sync_domain::{
    application::services::{ClientDefaultScopesService, ClientScopeService},
    domain::entities::{ClientDefaultScopes, OpenidClientScope},
};
use std::sync::Arc;
use tracing::instrument;

use super::{Resource, REALM_ID};
use crate::error::ProviderResult;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

/// `keycloak_openid_client_scope`
pub struct OpenidClientScopeResource {
    service: Arc<ClientScopeService>,
}

impl OpenidClientScopeResource {
    pub fn new(service: Arc<ClientScopeService>) -> Self {
        Self { service }
    }

    fn scope_from(data: &ResourceData) -> ProviderResult<OpenidClientScope> {
        let mut scope = OpenidClientScope::new(data.get_string(REALM_ID)?, data.get_string("name")?);
        scope.id = data.id().map(str::to_string);
        scope.description = data.get_string("description")?;
        scope.consent_screen_text = data.get_optional_string("consent_screen_text")?;
        scope.include_in_token_scope = data.get_bool("include_in_token_scope")?;
        scope.gui_order = data.get_optional_int("gui_order")?;
        Ok(scope)
    }

    fn write(data: &mut ResourceData, scope: &OpenidClientScope) {
        if let Some(id) = &scope.id {
            data.set_id(id.clone());
        }
        data.set(REALM_ID, scope.realm_id.clone());
        data.set("name", scope.name.clone());
        data.set("description", scope.description.clone());
        data.set_optional("consent_screen_text", scope.consent_screen_text.clone());
        data.set("include_in_token_scope", scope.include_in_token_scope);
        data.set_optional("gui_order", scope.gui_order);
    }
}

#[async_trait]
impl Resource for OpenidClientScopeResource {
    fn type_name(&self) -> &'static str {
        "keycloak_openid_client_scope"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::string(REALM_ID).required().force_new(),
            Attribute::string("name").required(),
            Attribute::string("description").default_value(""),
            Attribute::string("consent_screen_text")
                .describe("The consent screen is shown only when this is set"),
            Attribute::bool("include_in_token_scope").default_value(true),
            Attribute::int("gui_order"),
        ])
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}/{scopeId}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let created = self.service.create_scope(&Self::scope_from(&data)?).await?;
        Self::write(&mut data, &created);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let scope = self.service.get_scope(&realm, data.require_id()?).await?;
        Self::write(&mut data, &scope);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn update(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self.service.update_scope(&Self::scope_from(&data)?).await?;
        Self::write(&mut data, &updated);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        let realm = data.get_string(REALM_ID)?;
        Ok(self.service.delete_scope(&realm, data.require_id()?).await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set(REALM_ID, parts[0].clone());
        data.set_id(parts[1].clone());
        Ok(data)
    }
}

/// `keycloak_openid_client_default_scopes`, identified as `{realm}/{clientId}`
pub struct OpenidClientDefaultScopesResource {
    service: Arc<ClientDefaultScopesService>,
}

impl OpenidClientDefaultScopesResource {
    pub fn new(service: Arc<ClientDefaultScopesService>) -> Self {
        Self { service }
    }

    fn scopes_from(data: &ResourceData) -> ProviderResult<ClientDefaultScopes> {
        Ok(ClientDefaultScopes::new(
            data.get_string(REALM_ID)?,
            data.get_string("client_id")?,
            data.get_string_set("default_scopes")?,
        ))
    }

    fn write(data: &mut ResourceData, scopes: &ClientDefaultScopes) {
        data.set_id(format!("{}/{}", scopes.realm_id, scopes.client_id));
        data.set(REALM_ID, scopes.realm_id.clone());
        data.set("client_id", scopes.client_id.clone());
        data.set_strings("default_scopes", scopes.default_scopes.iter().cloned());
    }

    async fn apply(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self
            .service
            .set_default_scopes(&Self::scopes_from(&data)?)
            .await?;
        Self::write(&mut data, &updated);
        Ok(data)
    }
}

#[async_trait]
impl Resource for OpenidClientDefaultScopesResource {
    fn type_name(&self) -> &'static str {
        "keycloak_openid_client_default_scopes"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::string(REALM_ID).required().force_new(),
            Attribute::string("client_id")
                .required()
                .force_new()
                .describe("Internal id of the client, not its clientId"),
            Attribute::set("default_scopes").required(),
        ])
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}/{clientId}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, data: ResourceData) -> ProviderResult<ResourceData> {
        self.apply(data).await
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let client_id = data.get_string("client_id")?;
        let current = self.service.get_default_scopes(&realm, &client_id).await?;
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
            .remove_default_scopes(&Self::scopes_from(&data)?)
            .await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set_id(format!("{}/{}", parts[0], parts[1]));
        data.set(REALM_ID, parts[0].clone());
        data.set("client_id", parts[1].clone());
        Ok(data)
    }
}
