use crate::domain::{entities::*, errors::DomainResult};
use async_trait::async_trait;

/// Which realm-level default client scope collection an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultScopeKind {
    Default,
    Optional,
}

impl DefaultScopeKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            DefaultScopeKind::Default => "default-default-client-scopes",
            DefaultScopeKind::Optional => "default-optional-client-scopes",
        }
    }
}

/// Repository port over the Keycloak admin REST API.
///
/// Every method is one request/response exchange. `create_*` methods return the
/// id Keycloak put in the `Location` header.
#[async_trait]
pub trait KeycloakRepository: Send + Sync {
    // Realm operations
    async fn create_realm(&self, realm: &Realm) -> DomainResult<()>;
    async fn get_realm(&self, realm: &str) -> DomainResult<Realm>;
    async fn list_realms(&self) -> DomainResult<Vec<Realm>>;
    async fn update_realm(&self, realm: &Realm) -> DomainResult<()>;
    async fn delete_realm(&self, realm: &str) -> DomainResult<()>;

    // Realm default client scope relations
    async fn list_realm_default_scopes(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
    ) -> DomainResult<Vec<ClientScopeRepresentation>>;
    async fn add_realm_default_scope(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
        scope_id: &str,
    ) -> DomainResult<()>;
    async fn remove_realm_default_scope(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
        scope_id: &str,
    ) -> DomainResult<()>;

    // Role operations
    async fn get_realm_role(&self, realm: &str, role_name: &str)
        -> DomainResult<RoleRepresentation>;
    async fn list_role_composites(
        &self,
        realm: &str,
        role_id: &str,
    ) -> DomainResult<Vec<RoleRepresentation>>;
    async fn add_role_composites(
        &self,
        realm: &str,
        role_id: &str,
        roles: &[RoleRepresentation],
    ) -> DomainResult<()>;
    async fn remove_role_composites(
        &self,
        realm: &str,
        role_id: &str,
        roles: &[RoleRepresentation],
    ) -> DomainResult<()>;

    // Authentication flow operations
    async fn create_authentication_flow(&self, flow: &AuthenticationFlow)
        -> DomainResult<EntityId>;
    async fn get_authentication_flow(
        &self,
        realm: &str,
        flow_id: &str,
    ) -> DomainResult<AuthenticationFlow>;
    async fn list_authentication_flows(&self, realm: &str)
        -> DomainResult<Vec<AuthenticationFlow>>;
    async fn update_authentication_flow(&self, flow: &AuthenticationFlow) -> DomainResult<()>;
    async fn delete_authentication_flow(&self, realm: &str, flow_id: &str) -> DomainResult<()>;

    // Authentication execution operations
    async fn list_flow_executions(
        &self,
        realm: &str,
        flow_alias: &str,
    ) -> DomainResult<Vec<AuthenticationExecutionInfo>>;
    async fn update_flow_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        execution: &AuthenticationExecutionInfo,
    ) -> DomainResult<()>;
    async fn create_sub_flow(
        &self,
        realm: &str,
        parent_flow_alias: &str,
        sub_flow: &SubFlowCreation,
    ) -> DomainResult<EntityId>;
    async fn delete_execution(&self, realm: &str, execution_id: &str) -> DomainResult<()>;

    // Component operations
    async fn create_component(&self, realm: &str, component: &Component)
        -> DomainResult<EntityId>;
    async fn get_component(&self, realm: &str, component_id: &str) -> DomainResult<Component>;
    async fn list_components(
        &self,
        realm: &str,
        parent_id: &str,
        provider_type: &str,
    ) -> DomainResult<Vec<Component>>;
    async fn update_component(&self, realm: &str, component: &Component) -> DomainResult<()>;
    async fn delete_component(&self, realm: &str, component_id: &str) -> DomainResult<()>;

    // Client scope operations
    async fn create_client_scope(
        &self,
        realm: &str,
        scope: &ClientScopeRepresentation,
    ) -> DomainResult<EntityId>;
    async fn get_client_scope(
        &self,
        realm: &str,
        scope_id: &str,
    ) -> DomainResult<ClientScopeRepresentation>;
    async fn list_client_scopes(&self, realm: &str)
        -> DomainResult<Vec<ClientScopeRepresentation>>;
    async fn update_client_scope(
        &self,
        realm: &str,
        scope: &ClientScopeRepresentation,
    ) -> DomainResult<()>;
    async fn delete_client_scope(&self, realm: &str, scope_id: &str) -> DomainResult<()>;

    // Client default scope relations
    async fn list_client_default_scopes(
        &self,
        realm: &str,
        client_id: &str,
    ) -> DomainResult<Vec<ClientScopeRepresentation>>;
    async fn add_client_default_scope(
        &self,
        realm: &str,
        client_id: &str,
        scope_id: &str,
    ) -> DomainResult<()>;
    async fn remove_client_default_scope(
        &self,
        realm: &str,
        client_id: &str,
        scope_id: &str,
    ) -> DomainResult<()>;

    // Identity provider mapper operations
    async fn create_identity_provider_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<EntityId>;
    async fn get_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> DomainResult<IdentityProviderMapper>;
    async fn list_identity_provider_mappers(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<Vec<IdentityProviderMapper>>;
    async fn update_identity_provider_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<()>;
    async fn delete_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> DomainResult<()>;
}
