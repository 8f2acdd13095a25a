use async_trait::async_trait;
use keycloak_sync_domain::{
    application::services::{
        AuthenticationBindingsService, AuthenticationFlowService, AuthenticationSubFlowService,
    },
    domain::entities::*,
};
use std::sync::Arc;
use tracing::instrument;

use super::{Resource, REALM_ID};
use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

fn provider_id(data: &ResourceData) -> ProviderResult<FlowProviderId> {
    let value = data.get_string("provider_id")?;
    FlowProviderId::parse(&value)
        .ok_or_else(|| ProviderError::invalid_attribute("provider_id", value.as_str()))
}

/// `keycloak_authentication_flow`
pub struct AuthenticationFlowResource {
    service: Arc<AuthenticationFlowService>,
}

impl AuthenticationFlowResource {
    pub fn new(service: Arc<AuthenticationFlowService>) -> Self {
        Self { service }
    }

    fn flow_from(data: &ResourceData) -> ProviderResult<AuthenticationFlow> {
        let mut flow = AuthenticationFlow::new(data.get_string(REALM_ID)?, data.get_string("alias")?);
        flow.id = data.id().map(str::to_string);
        flow.description = data.get_string("description")?;
        flow.provider_id = provider_id(data)?;
        Ok(flow)
    }

    fn write(data: &mut ResourceData, flow: &AuthenticationFlow) {
        if let Some(id) = &flow.id {
            data.set_id(id.clone());
        }
        data.set(REALM_ID, flow.realm_id.clone());
        data.set("alias", flow.alias.clone());
        data.set("description", flow.description.clone());
        data.set("provider_id", flow.provider_id.as_str());
    }
}

#[async_trait]
impl Resource for AuthenticationFlowResource {
    fn type_name(&self) -> &'static str {
        "keycloak_authentication_flow"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::string(REALM_ID).required().force_new(),
            Attribute::string("alias").required(),
            Attribute::string("provider_id")
                .default_value(FlowProviderId::BasicFlow.as_str())
                .one_of([
                    FlowProviderId::BasicFlow.as_str(),
                    FlowProviderId::ClientFlow.as_str(),
                ]),
            Attribute::string("description").default_value(""),
        ])
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}/{flowId}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let created = self.service.create_flow(&Self::flow_from(&data)?).await?;
        Self::write(&mut data, &created);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let flow = self.service.get_flow(&realm, data.require_id()?).await?;
        Self::write(&mut data, &flow);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn update(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self.service.update_flow(&Self::flow_from(&data)?).await?;
        Self::write(&mut data, &updated);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        let realm = data.get_string(REALM_ID)?;
        Ok(self.service.delete_flow(&realm, data.require_id()?).await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set(REALM_ID, parts[0].clone());
        data.set_id(parts[1].clone());
        Ok(data)
    }
}

/// `keycloak_authentication_subflow`
pub struct AuthenticationSubFlowResource {
    service: Arc<AuthenticationSubFlowService>,
}

impl AuthenticationSubFlowResource {
    pub fn new(service: Arc<AuthenticationSubFlowService>) -> Self {
        Self { service }
    }

    fn sub_flow_from(data: &ResourceData) -> ProviderResult<AuthenticationSubFlow> {
        let mut sub_flow = AuthenticationSubFlow::new(
            data.get_string(REALM_ID)?,
            data.get_string("parent_flow_alias")?,
            data.get_string("alias")?,
        );
        sub_flow.id = data.id().map(str::to_string);
        sub_flow.description = data.get_string("description")?;
        sub_flow.provider_id = provider_id(data)?;
        sub_flow.authenticator = data.get_optional_string("authenticator")?;

        let requirement = data.get_string("requirement")?;
        sub_flow.requirement = Requirement::parse(&requirement)
            .ok_or_else(|| ProviderError::invalid_attribute("requirement", requirement.as_str()))?;

        Ok(sub_flow)
    }

    fn write(data: &mut ResourceData, sub_flow: &AuthenticationSubFlow) {
        if let Some(id) = &sub_flow.id {
            data.set_id(id.clone());
        }
        data.set(REALM_ID, sub_flow.realm_id.clone());
        data.set("parent_flow_alias", sub_flow.parent_flow_alias.clone());
        data.set("alias", sub_flow.alias.clone());
        data.set("description", sub_flow.description.clone());
        data.set("provider_id", sub_flow.provider_id.as_str());
        data.set_optional("authenticator", sub_flow.authenticator.clone());
        data.set("requirement", sub_flow.requirement.as_str());
    }
}

#[async_trait]
impl Resource for AuthenticationSubFlowResource {
    fn type_name(&self) -> &'static str {
        "keycloak_authentication_subflow"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::string(REALM_ID).required().force_new(),
            Attribute::string("parent_flow_alias").required().force_new(),
            Attribute::string("alias").required(),
            Attribute::string("provider_id")
                .default_value(FlowProviderId::BasicFlow.as_str())
                .one_of(FlowProviderId::names()),
            Attribute::string("description").default_value(""),
            Attribute::string("authenticator")
                .force_new()
                .describe("Authenticator bound to the execution; only needed by some custom subflows"),
            Attribute::string("requirement")
                .default_value(Requirement::Disabled.as_str())
                .one_of(Requirement::names()),
        ])
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}/{parentFlowAlias}/{subflowId}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let created = self
            .service
            .create_sub_flow(&Self::sub_flow_from(&data)?)
            .await?;
        Self::write(&mut data, &created);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let parent = data.get_string("parent_flow_alias")?;
        let sub_flow = self
            .service
            .get_sub_flow(&realm, &parent, data.require_id()?)
            .await?;
        Self::write(&mut data, &sub_flow);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn update(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self
            .service
            .update_sub_flow(&Self::sub_flow_from(&data)?)
            .await?;
        Self::write(&mut data, &updated);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        let realm = data.get_string(REALM_ID)?;
        let parent = data.get_string("parent_flow_alias")?;
        Ok(self
            .service
            .delete_sub_flow(&realm, &parent, data.require_id()?)
            .await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set(REALM_ID, parts[0].clone());
        data.set("parent_flow_alias", parts[1].clone());
        data.set_id(parts[2].clone());
        Ok(data)
    }
}

const BINDING_ATTRIBUTES: [&str; 6] = [
    "browser_flow",
    "registration_flow",
    "direct_grant_flow",
    "reset_credentials_flow",
    "client_authentication_flow",
    "docker_authentication_flow",
];

fn binding_fields(bindings: &mut AuthenticationBindings) -> [(&'static str, &mut String); 6] {
    [
        (BINDING_ATTRIBUTES[0], &mut bindings.browser_flow),
        (BINDING_ATTRIBUTES[1], &mut bindings.registration_flow),
        (BINDING_ATTRIBUTES[2], &mut bindings.direct_grant_flow),
        (BINDING_ATTRIBUTES[3], &mut bindings.reset_credentials_flow),
        (BINDING_ATTRIBUTES[4], &mut bindings.client_authentication_flow),
        (BINDING_ATTRIBUTES[5], &mut bindings.docker_authentication_flow),
    ]
}

/// `keycloak_authentication_bindings`, one per realm.
///
/// Bindings left out of the definition keep whatever the realm has.
pub struct AuthenticationBindingsResource {
    service: Arc<AuthenticationBindingsService>,
}

impl AuthenticationBindingsResource {
    pub fn new(service: Arc<AuthenticationBindingsService>) -> Self {
        Self { service }
    }

    async fn apply(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let mut bindings = self.service.get_bindings(&realm).await?;

        for (name, alias) in binding_fields(&mut bindings) {
            if let Some(wanted) = data.get_optional_string(name)? {
                *alias = wanted;
            }
        }

        let updated = self.service.update_bindings(&bindings).await?;
        Self::write(&mut data, updated);
        Ok(data)
    }

    fn write(data: &mut ResourceData, mut bindings: AuthenticationBindings) {
        data.set_id(bindings.realm_id.clone());
        data.set(REALM_ID, bindings.realm_id.clone());
        for (name, alias) in binding_fields(&mut bindings) {
            data.set(name, alias.clone());
        }
    }
}

#[async_trait]
impl Resource for AuthenticationBindingsResource {
    fn type_name(&self) -> &'static str {
        "keycloak_authentication_bindings"
    }

    fn schema(&self) -> Schema {
        let mut attributes = vec![Attribute::string(REALM_ID).required().force_new()];
        attributes.extend(
            BINDING_ATTRIBUTES
                .into_iter()
                .map(|name| Attribute::string(name).computed()),
        );
        Schema::new(attributes)
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, data: ResourceData) -> ProviderResult<ResourceData> {
        self.apply(data).await
    }

    #[instrument(skip(self, data), fields(realm = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let bindings = self.service.get_bindings(&realm).await?;
        Self::write(&mut data, bindings);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(realm = ?data.id()))]
    async fn update(&self, data: ResourceData) -> ProviderResult<ResourceData> {
        self.apply(data).await
    }

    /// Rebinds every flow to the one Keycloak ships with
    #[instrument(skip(self, data), fields(realm = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        let realm = data.get_string(REALM_ID)?;
        Ok(self.service.reset_bindings(&realm).await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set_id(parts[0].clone());
        data.set(REALM_ID, parts[0].clone());
        Ok(data)
    }
}
