pub mod authentication_flow;
pub mod client_scope;
pub mod default_roles;
pub mod identity_provider_mapper;
pub mod ldap_mapper;
pub mod ldap_user_federation;
pub mod realm;

use async_trait::async_trait;
use keycloak_sync_domain::{
    application::{ports::KeycloakRepository, services::*},
    domain::entities::{format_duration, parse_duration},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::import::parse_import_id;
use crate::resource_data::ResourceData;
use crate::schema::Schema;

pub use authentication_flow::{
    AuthenticationBindingsResource, AuthenticationFlowResource, AuthenticationSubFlowResource,
};
pub use client_scope::{OpenidClientDefaultScopesResource, OpenidClientScopeResource};
pub use default_roles::DefaultRolesResource;
pub use identity_provider_mapper::IdentityProviderMapperResource;
pub use ldap_mapper::LdapMapperResource;
pub use ldap_user_federation::LdapUserFederationResource;
pub use realm::RealmResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Operation::Create),
            "read" => Ok(Operation::Read),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "import" => Ok(Operation::Import),
            other => Err(ProviderError::UnknownOperation(other.to_string())),
        }
    }
}

/// Lifecycle callbacks for one declarative resource type
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name, e.g. `keycloak_realm`
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Slash-delimited import id formats, e.g. `{realm}/{flowId}`
    fn import_formats(&self) -> &'static [&'static str];

    async fn create(&self, data: ResourceData) -> ProviderResult<ResourceData>;

    async fn read(&self, data: ResourceData) -> ProviderResult<ResourceData>;

    async fn update(&self, data: ResourceData) -> ProviderResult<ResourceData>;

    async fn delete(&self, data: ResourceData) -> ProviderResult<()>;

    /// Seed just enough state from the parsed import id for [`Resource::read`]
    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData>;
}

/// Resources by type name
#[derive(Clone, Default)]
pub struct Registry {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every supported resource, backed by one repository
    pub fn for_repository(repository: Arc<dyn KeycloakRepository>, lookup: LookupRetry) -> Self {
        let flows = Arc::new(AuthenticationFlowService::new(repository.clone(), lookup));
        let sub_flows = Arc::new(AuthenticationSubFlowService::new(repository.clone(), lookup));
        let bindings = Arc::new(AuthenticationBindingsService::new(repository.clone()));
        let scopes = Arc::new(ClientScopeService::new(repository.clone(), lookup));
        let client_scopes = Arc::new(ClientDefaultScopesService::new(repository.clone()));
        let federations = Arc::new(LdapFederationService::new(repository.clone()));

        let registry = Self::new()
            .with(RealmResource::new(Arc::new(RealmManagementService::new(
                repository.clone(),
            ))))
            .with(AuthenticationFlowResource::new(flows))
            .with(AuthenticationSubFlowResource::new(sub_flows))
            .with(AuthenticationBindingsResource::new(bindings))
            .with(DefaultRolesResource::new(Arc::new(DefaultRolesService::new(
                repository.clone(),
            ))))
            .with(OpenidClientScopeResource::new(scopes))
            .with(OpenidClientDefaultScopesResource::new(client_scopes))
            .with(LdapUserFederationResource::new(federations.clone()))
            .with(IdentityProviderMapperResource::new(Arc::new(
                IdentityProviderMapperService::new(repository),
            )));

        LdapMapperResource::all(federations)
            .into_iter()
            .fold(registry, Self::with)
    }

    pub fn with(mut self, resource: impl Resource + 'static) -> Self {
        self.resources.insert(resource.type_name(), Arc::new(resource));
        self
    }

    pub fn get(&self, type_name: &str) -> ProviderResult<&Arc<dyn Resource>> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn schemas(&self) -> BTreeMap<&'static str, Schema> {
        self.resources
            .iter()
            .map(|(name, resource)| (*name, resource.schema()))
            .collect()
    }

    /// Run one callback, attaching the resource and operation to any domain error.
    ///
    /// A read that finds nothing returns the data with its id cleared, which
    /// tells the engine the resource is gone. A successful delete does the same.
    #[instrument(skip_all, fields(resource = %type_name, operation = %operation))]
    pub async fn invoke(
        &self,
        type_name: &str,
        operation: Operation,
        data: ResourceData,
    ) -> ProviderResult<ResourceData> {
        let resource = self.get(type_name)?;

        self.dispatch(resource.as_ref(), operation, data)
            .await
            .map_err(|e| e.in_operation(type_name, operation))
    }

    async fn dispatch(
        &self,
        resource: &dyn Resource,
        operation: Operation,
        mut data: ResourceData,
    ) -> ProviderResult<ResourceData> {
        let schema = resource.schema();

        match operation {
            Operation::Create => resource.create(schema.prepare(data)?).await,
            Operation::Update => {
                let data = schema.prepare(data)?;
                data.require_id()?;
                resource.update(data).await
            }
            Operation::Read => {
                schema.apply_defaults(&mut data);
                match resource.read(data.clone()).await {
                    Err(e) if e.is_not_found() => {
                        warn!(error = %e, "Resource no longer exists, clearing id");
                        data.clear_id();
                        Ok(data)
                    }
                    other => other,
                }
            }
            Operation::Delete => {
                schema.apply_defaults(&mut data);
                resource.delete(data.clone()).await?;
                data.clear_id();
                Ok(data)
            }
            Operation::Import => {
                let id = data.require_id()?.to_string();
                let parts = parse_import_id(&id, resource.import_formats())?;
                info!(import_id = %id, "Importing resource");
                let mut seed = resource.import(parts)?;
                schema.apply_defaults(&mut seed);
                resource.read(seed).await
            }
        }
    }
}

/// Realm-level attribute every realm-scoped resource shares
pub(crate) const REALM_ID: &str = "realm_id";

pub(crate) fn optional_duration(data: &ResourceData, name: &str) -> ProviderResult<Option<Duration>> {
    data.get_optional_string(name)?
        .map(|text| parse_duration(&text))
        .transpose()
        .map_err(ProviderError::from)
}

pub(crate) fn duration_text(duration: Option<Duration>) -> Option<String> {
    duration.map(format_duration)
}
