#![allow(dead_code)]

use async_trait::async_trait;
use keycloak_sync_domain::{
    application::ports::{DefaultScopeKind, KeycloakRepository},
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory stand-in for a Keycloak server
#[derive(Default)]
pub struct MockState {
    pub realms: HashMap<String, Realm>,
    pub flows: Vec<AuthenticationFlow>,
    /// (realm, flow alias) -> executions
    pub executions: HashMap<(String, String), Vec<AuthenticationExecutionInfo>>,
    /// component id -> (realm, component)
    pub components: HashMap<String, (String, Component)>,
    pub client_scopes: HashMap<String, Vec<ClientScopeRepresentation>>,
    pub realm_default_scopes: HashMap<(String, DefaultScopeKind), BTreeSet<String>>,
    pub client_default_scopes: HashMap<(String, String), BTreeSet<String>>,
    pub roles: HashMap<String, Vec<RoleRepresentation>>,
    /// role id -> composites
    pub composites: HashMap<String, Vec<RoleRepresentation>>,
    pub idp_mappers: Vec<IdentityProviderMapper>,
    pub calls: Vec<String>,
    pub failures: HashMap<String, VecDeque<DomainError>>,
    next_id: u32,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn flow_by_alias(&self, realm: &str, alias: &str) -> Option<&AuthenticationFlow> {
        self.flows
            .iter()
            .find(|f| f.realm_id == realm && f.alias == alias)
    }

    fn remove_flow_tree(&mut self, realm: &str, flow_id: &str) {
        let Some(position) = self
            .flows
            .iter()
            .position(|f| f.realm_id == realm && f.id.as_deref() == Some(flow_id))
        else {
            return;
        };
        let flow = self.flows.remove(position);
        let children = self
            .executions
            .remove(&(realm.to_string(), flow.alias))
            .unwrap_or_default();
        for child in children {
            if let Some(child_flow) = child.flow_id {
                self.remove_flow_tree(realm, &child_flow);
            }
        }
    }

    fn scope_by_id(&self, realm: &str, scope_id: &str) -> Option<&ClientScopeRepresentation> {
        self.client_scopes
            .get(realm)
            .and_then(|scopes| scopes.iter().find(|s| s.id.as_deref() == Some(scope_id)))
    }
}

pub struct MockKeycloakRepository {
    pub state: Arc<Mutex<MockState>>,
}

impl MockKeycloakRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Seed a realm whose default composite role is `default-role-{realm}`
    pub fn with_realm(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let mut realm = Realm::new(name);
            realm.id = Some(format!("{name}-id"));
            realm.default_role = Some(RoleReference {
                id: format!("default-role-{name}"),
                name: format!("default-roles-{name}"),
                extra: Default::default(),
            });
            state.realms.insert(name.to_string(), realm);
        }
        self
    }

    /// Make the next call to `operation` fail with `error`
    pub fn fail_next(&self, operation: &str, error: DomainError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(operation.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<String> {
        let prefix = format!("{operation}:");
        self.calls()
            .into_iter()
            .filter(|c| c == operation || c.starts_with(&prefix))
            .collect()
    }

    pub fn add_flow(&self, realm: &str, alias: &str, built_in: bool) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("flow");
        let mut flow = AuthenticationFlow::new(realm, alias);
        flow.id = Some(id.clone());
        flow.built_in = built_in;
        state.flows.push(flow);
        id
    }

    /// Add an execution to `parent`; with `sub_flow_alias` it wraps a new nested flow
    pub fn add_execution(
        &self,
        realm: &str,
        parent: &str,
        display_name: &str,
        sub_flow_alias: Option<&str>,
        built_in: bool,
    ) -> String {
        let mut state = self.state.lock().unwrap();
        let execution_id = state.next_id("execution");

        let flow_id = sub_flow_alias.map(|alias| {
            let id = state.next_id("flow");
            let mut flow = AuthenticationFlow::new(realm, alias);
            flow.id = Some(id.clone());
            flow.top_level = false;
            flow.built_in = built_in;
            state.flows.push(flow);
            id
        });

        let executions = state
            .executions
            .entry((realm.to_string(), parent.to_string()))
            .or_default();
        executions.push(AuthenticationExecutionInfo {
            id: execution_id.clone(),
            flow_id,
            display_name: display_name.to_string(),
            requirement: Requirement::Disabled,
            requirement_choices: Vec::new(),
            level: 0,
            index: executions.len() as i32,
            authentication_flow: sub_flow_alias.is_some(),
            provider_id: None,
        });
        execution_id
    }

    pub fn flow(&self, realm: &str, alias: &str) -> Option<AuthenticationFlow> {
        self.state
            .lock()
            .unwrap()
            .flow_by_alias(realm, alias)
            .cloned()
    }

    pub fn executions(&self, realm: &str, alias: &str) -> Vec<AuthenticationExecutionInfo> {
        self.state
            .lock()
            .unwrap()
            .executions
            .get(&(realm.to_string(), alias.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_client_scope(&self, realm: &str, name: &str, protocol: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("scope");
        state
            .client_scopes
            .entry(realm.to_string())
            .or_default()
            .push(ClientScopeRepresentation {
                id: Some(id.clone()),
                name: name.to_string(),
                protocol: protocol.to_string(),
                ..Default::default()
            });
        id
    }

    pub fn attach_realm_default_scope(&self, realm: &str, kind: DefaultScopeKind, scope_id: &str) {
        self.state
            .lock()
            .unwrap()
            .realm_default_scopes
            .entry((realm.to_string(), kind))
            .or_default()
            .insert(scope_id.to_string());
    }

    pub fn attach_client_default_scope(&self, realm: &str, client: &str, scope_id: &str) {
        self.state
            .lock()
            .unwrap()
            .client_default_scopes
            .entry((realm.to_string(), client.to_string()))
            .or_default()
            .insert(scope_id.to_string());
    }

    pub fn add_role(&self, realm: &str, name: &str) -> RoleRepresentation {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("role");
        let role = RoleRepresentation {
            id: Some(id),
            name: name.to_string(),
            description: None,
            composite: false,
            client_role: false,
            container_id: Some(format!("{realm}-id")),
        };
        state
            .roles
            .entry(realm.to_string())
            .or_default()
            .push(role.clone());
        role
    }

    pub fn add_composite(&self, role_id: &str, role: RoleRepresentation) {
        self.state
            .lock()
            .unwrap()
            .composites
            .entry(role_id.to_string())
            .or_default()
            .push(role);
    }

    pub fn component(&self, component_id: &str) -> Option<Component> {
        self.state
            .lock()
            .unwrap()
            .components
            .get(component_id)
            .map(|(_, c)| c.clone())
    }

    pub fn insert_component(&self, realm: &str, mut component: Component) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("component");
        component.id = Some(EntityId::from(id.as_str()));
        state
            .components
            .insert(id.clone(), (realm.to_string(), component));
        id
    }

    fn enter(&self, operation: &str, detail: &str) -> DomainResult<MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(if detail.is_empty() {
            operation.to_string()
        } else {
            format!("{operation}:{detail}")
        });
        if let Some(error) = state
            .failures
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        Ok(state)
    }
}

fn not_found(entity_type: &str, id: &str) -> DomainError {
    DomainError::not_found(entity_type, id)
}

fn conflict(entity_type: &str, id: &str) -> DomainError {
    DomainError::Conflict {
        entity_type: entity_type.to_string(),
        identifier: id.to_string(),
    }
}

fn rejected(message: &str) -> DomainError {
    DomainError::RemoteRejected {
        status: 400,
        message: format!(r#"{{"errorMessage":"{message}"}}"#),
    }
}

#[async_trait]
impl KeycloakRepository for MockKeycloakRepository {
    async fn create_realm(&self, realm: &Realm) -> DomainResult<()> {
        let mut state = self.enter("create_realm", &realm.realm)?;
        if state.realms.contains_key(&realm.realm) {
            return Err(conflict("Realm", &realm.realm));
        }
        let mut stored = realm.clone();
        stored.id = Some(format!("{}-id", realm.realm));
        stored.default_role = Some(RoleReference {
            id: format!("default-role-{}", realm.realm),
            name: format!("default-roles-{}", realm.realm),
            extra: Default::default(),
        });
        stored.default_default_client_scopes.clear();
        stored.default_optional_client_scopes.clear();
        state.realms.insert(realm.realm.clone(), stored);
        Ok(())
    }

    async fn get_realm(&self, realm: &str) -> DomainResult<Realm> {
        let state = self.enter("get_realm", realm)?;
        state
            .realms
            .get(realm)
            .cloned()
            .ok_or_else(|| not_found("Realm", realm))
    }

    async fn list_realms(&self) -> DomainResult<Vec<Realm>> {
        let state = self.enter("list_realms", "")?;
        Ok(state.realms.values().cloned().collect())
    }

    async fn update_realm(&self, realm: &Realm) -> DomainResult<()> {
        let mut state = self.enter("update_realm", &realm.realm)?;
        let stored = state
            .realms
            .get_mut(&realm.realm)
            .ok_or_else(|| not_found("Realm", &realm.realm))?;
        *stored = realm.clone();
        Ok(())
    }

    async fn delete_realm(&self, realm: &str) -> DomainResult<()> {
        let mut state = self.enter("delete_realm", realm)?;
        state
            .realms
            .remove(realm)
            .map(|_| ())
            .ok_or_else(|| not_found("Realm", realm))
    }

    async fn list_realm_default_scopes(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
    ) -> DomainResult<Vec<ClientScopeRepresentation>> {
        let state = self.enter("list_realm_default_scopes", realm)?;
        let ids = state
            .realm_default_scopes
            .get(&(realm.to_string(), kind))
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| state.scope_by_id(realm, id).cloned())
            .collect())
    }

    async fn add_realm_default_scope(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
        scope_id: &str,
    ) -> DomainResult<()> {
        let mut state = self.enter("add_realm_default_scope", scope_id)?;
        // One mapping per scope: a default cannot also be an optional default
        let mapped = state
            .realm_default_scopes
            .iter()
            .any(|((r, _), ids)| r == realm && ids.contains(scope_id));
        if mapped {
            return Err(conflict("Default client scope", scope_id));
        }
        state
            .realm_default_scopes
            .entry((realm.to_string(), kind))
            .or_default()
            .insert(scope_id.to_string());
        Ok(())
    }

    async fn remove_realm_default_scope(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
        scope_id: &str,
    ) -> DomainResult<()> {
        let mut state = self.enter("remove_realm_default_scope", scope_id)?;
        state
            .realm_default_scopes
            .entry((realm.to_string(), kind))
            .or_default()
            .remove(scope_id);
        Ok(())
    }

    async fn get_realm_role(
        &self,
        realm: &str,
        role_name: &str,
    ) -> DomainResult<RoleRepresentation> {
        let state = self.enter("get_realm_role", role_name)?;
        state
            .roles
            .get(realm)
            .and_then(|roles| roles.iter().find(|r| r.name == role_name))
            .cloned()
            .ok_or_else(|| not_found("Role", role_name))
    }

    async fn list_role_composites(
        &self,
        _realm: &str,
        role_id: &str,
    ) -> DomainResult<Vec<RoleRepresentation>> {
        let state = self.enter("list_role_composites", role_id)?;
        Ok(state.composites.get(role_id).cloned().unwrap_or_default())
    }

    async fn add_role_composites(
        &self,
        _realm: &str,
        role_id: &str,
        roles: &[RoleRepresentation],
    ) -> DomainResult<()> {
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        let mut state = self.enter("add_role_composites", &names.join(","))?;
        state
            .composites
            .entry(role_id.to_string())
            .or_default()
            .extend(roles.iter().cloned());
        Ok(())
    }

    async fn remove_role_composites(
        &self,
        _realm: &str,
        role_id: &str,
        roles: &[RoleRepresentation],
    ) -> DomainResult<()> {
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        let mut state = self.enter("remove_role_composites", &names.join(","))?;
        if let Some(composites) = state.composites.get_mut(role_id) {
            composites.retain(|c| !roles.iter().any(|r| r.id == c.id));
        }
        Ok(())
    }

    async fn create_authentication_flow(
        &self,
        flow: &AuthenticationFlow,
    ) -> DomainResult<EntityId> {
        let mut state = self.enter("create_authentication_flow", &flow.alias)?;
        if state.flow_by_alias(&flow.realm_id, &flow.alias).is_some() {
            return Err(conflict("Authentication flow", &flow.alias));
        }
        let id = state.next_id("flow");
        state.flows.push(AuthenticationFlow {
            id: Some(id.clone()),
            ..flow.clone()
        });
        Ok(EntityId::from(id))
    }

    async fn get_authentication_flow(
        &self,
        realm: &str,
        flow_id: &str,
    ) -> DomainResult<AuthenticationFlow> {
        let state = self.enter("get_authentication_flow", flow_id)?;
        state
            .flows
            .iter()
            .find(|f| f.realm_id == realm && f.id.as_deref() == Some(flow_id))
            .cloned()
            .ok_or_else(|| not_found("Authentication flow", flow_id))
    }

    async fn list_authentication_flows(
        &self,
        realm: &str,
    ) -> DomainResult<Vec<AuthenticationFlow>> {
        let state = self.enter("list_authentication_flows", realm)?;
        Ok(state
            .flows
            .iter()
            .filter(|f| f.realm_id == realm && f.top_level)
            .cloned()
            .collect())
    }

    async fn update_authentication_flow(&self, flow: &AuthenticationFlow) -> DomainResult<()> {
        let mut state = self.enter("update_authentication_flow", &flow.alias)?;
        let stored = state
            .flows
            .iter_mut()
            .find(|f| f.realm_id == flow.realm_id && f.id == flow.id)
            .ok_or_else(|| not_found("Authentication flow", &flow.alias))?;
        *stored = flow.clone();
        Ok(())
    }

    async fn delete_authentication_flow(&self, realm: &str, flow_id: &str) -> DomainResult<()> {
        let mut state = self.enter("delete_authentication_flow", flow_id)?;
        let flow = state
            .flows
            .iter()
            .find(|f| f.realm_id == realm && f.id.as_deref() == Some(flow_id))
            .ok_or_else(|| not_found("Authentication flow", flow_id))?;
        if flow.built_in {
            return Err(rejected("Can't delete built in flow"));
        }
        state.remove_flow_tree(realm, flow_id);
        Ok(())
    }

    async fn list_flow_executions(
        &self,
        realm: &str,
        flow_alias: &str,
    ) -> DomainResult<Vec<AuthenticationExecutionInfo>> {
        let state = self.enter("list_flow_executions", flow_alias)?;
        if state.flow_by_alias(realm, flow_alias).is_none() {
            return Err(not_found("Authentication flow", flow_alias));
        }
        Ok(state
            .executions
            .get(&(realm.to_string(), flow_alias.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_flow_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        execution: &AuthenticationExecutionInfo,
    ) -> DomainResult<()> {
        let mut state = self.enter("update_flow_execution", &execution.id)?;
        let stored = state
            .executions
            .get_mut(&(realm.to_string(), flow_alias.to_string()))
            .and_then(|list| list.iter_mut().find(|e| e.id == execution.id))
            .ok_or_else(|| not_found("Execution", &execution.id))?;
        *stored = execution.clone();
        Ok(())
    }

    async fn create_sub_flow(
        &self,
        realm: &str,
        parent_flow_alias: &str,
        sub_flow: &SubFlowCreation,
    ) -> DomainResult<EntityId> {
        let mut state = self.enter("create_sub_flow", &sub_flow.alias)?;
        if state.flow_by_alias(realm, parent_flow_alias).is_none() {
            return Err(not_found("Authentication flow", parent_flow_alias));
        }
        if state.flow_by_alias(realm, &sub_flow.alias).is_some() {
            return Err(conflict("Authentication flow", &sub_flow.alias));
        }

        let flow_id = state.next_id("flow");
        let execution_id = state.next_id("execution");
        state.flows.push(AuthenticationFlow {
            id: Some(flow_id.clone()),
            realm_id: realm.to_string(),
            alias: sub_flow.alias.clone(),
            description: sub_flow.description.clone(),
            provider_id: sub_flow.flow_type,
            top_level: false,
            built_in: false,
        });

        let executions = state
            .executions
            .entry((realm.to_string(), parent_flow_alias.to_string()))
            .or_default();
        executions.push(AuthenticationExecutionInfo {
            id: execution_id,
            flow_id: Some(flow_id.clone()),
            display_name: sub_flow.alias.clone(),
            requirement: Requirement::Disabled,
            requirement_choices: Vec::new(),
            level: 0,
            index: executions.len() as i32,
            authentication_flow: true,
            provider_id: Some(sub_flow.provider.clone()).filter(|p| !p.is_empty()),
        });
        Ok(EntityId::from(flow_id))
    }

    async fn delete_execution(&self, realm: &str, execution_id: &str) -> DomainResult<()> {
        let mut state = self.enter("delete_execution", execution_id)?;

        let parent = state
            .executions
            .iter()
            .find(|((r, _), list)| r == realm && list.iter().any(|e| e.id == execution_id))
            .map(|((_, alias), _)| alias.clone())
            .ok_or_else(|| not_found("Execution", execution_id))?;

        if state
            .flow_by_alias(realm, &parent)
            .is_some_and(|f| f.built_in)
        {
            return Err(rejected(
                "It is illegal to remove execution from a built in flow",
            ));
        }

        let key = (realm.to_string(), parent);
        let removed = {
            let list = state.executions.entry(key).or_default();
            let position = list
                .iter()
                .position(|e| e.id == execution_id)
                .ok_or_else(|| not_found("Execution", execution_id))?;
            list.remove(position)
        };
        if let Some(flow_id) = removed.flow_id {
            state.remove_flow_tree(realm, &flow_id);
        }
        Ok(())
    }

    async fn create_component(
        &self,
        realm: &str,
        component: &Component,
    ) -> DomainResult<EntityId> {
        let mut state = self.enter("create_component", &component.name)?;
        let id = state.next_id("component");
        let mut stored = component.clone();
        stored.id = Some(EntityId::from(id.as_str()));
        state
            .components
            .insert(id.clone(), (realm.to_string(), stored));

        // Keycloak provisions a couple of mappers with every new LDAP provider
        if component.provider_id == LDAP_PROVIDER_ID {
            for name in ["username", "email"] {
                let mapper_id = state.next_id("component");
                let mut mapper = Component::new(
                    name,
                    "user-attribute-ldap-mapper",
                    LDAP_MAPPER_PROVIDER_TYPE,
                    &id,
                );
                mapper.id = Some(EntityId::from(mapper_id.as_str()));
                state
                    .components
                    .insert(mapper_id, (realm.to_string(), mapper));
            }
        }

        Ok(EntityId::from(id))
    }

    async fn get_component(&self, realm: &str, component_id: &str) -> DomainResult<Component> {
        let state = self.enter("get_component", component_id)?;
        state
            .components
            .get(component_id)
            .filter(|(r, _)| r == realm)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| not_found("Component", component_id))
    }

    async fn list_components(
        &self,
        realm: &str,
        parent_id: &str,
        provider_type: &str,
    ) -> DomainResult<Vec<Component>> {
        let state = self.enter("list_components", parent_id)?;
        let mut components: Vec<Component> = state
            .components
            .values()
            .filter(|(r, c)| r == realm && c.parent_id == parent_id && c.provider_type == provider_type)
            .map(|(_, c)| c.clone())
            .collect();
        components.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(components)
    }

    async fn update_component(&self, realm: &str, component: &Component) -> DomainResult<()> {
        let id = component
            .id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        let mut state = self.enter("update_component", &id)?;
        let stored = state
            .components
            .get_mut(&id)
            .filter(|(r, _)| r == realm)
            .ok_or_else(|| not_found("Component", &id))?;
        stored.1 = component.clone();
        Ok(())
    }

    async fn delete_component(&self, realm: &str, component_id: &str) -> DomainResult<()> {
        let mut state = self.enter("delete_component", component_id)?;
        if !state
            .components
            .get(component_id)
            .is_some_and(|(r, _)| r == realm)
        {
            return Err(not_found("Component", component_id));
        }
        state.components.remove(component_id);
        state.components.retain(|_, (_, c)| c.parent_id != component_id);
        Ok(())
    }

    async fn create_client_scope(
        &self,
        realm: &str,
        scope: &ClientScopeRepresentation,
    ) -> DomainResult<EntityId> {
        let mut state = self.enter("create_client_scope", &scope.name)?;
        let exists = state
            .client_scopes
            .get(realm)
            .is_some_and(|scopes| scopes.iter().any(|s| s.name == scope.name));
        if exists {
            return Err(conflict("Client scope", &scope.name));
        }
        let id = state.next_id("scope");
        state
            .client_scopes
            .entry(realm.to_string())
            .or_default()
            .push(ClientScopeRepresentation {
                id: Some(id.clone()),
                ..scope.clone()
            });
        Ok(EntityId::from(id))
    }

    async fn get_client_scope(
        &self,
        realm: &str,
        scope_id: &str,
    ) -> DomainResult<ClientScopeRepresentation> {
        let state = self.enter("get_client_scope", scope_id)?;
        state
            .scope_by_id(realm, scope_id)
            .cloned()
            .ok_or_else(|| not_found("Client scope", scope_id))
    }

    async fn list_client_scopes(
        &self,
        realm: &str,
    ) -> DomainResult<Vec<ClientScopeRepresentation>> {
        let state = self.enter("list_client_scopes", realm)?;
        Ok(state.client_scopes.get(realm).cloned().unwrap_or_default())
    }

    async fn update_client_scope(
        &self,
        realm: &str,
        scope: &ClientScopeRepresentation,
    ) -> DomainResult<()> {
        let id = scope.id.clone().unwrap_or_default();
        let mut state = self.enter("update_client_scope", &id)?;
        let stored = state
            .client_scopes
            .get_mut(realm)
            .and_then(|scopes| scopes.iter_mut().find(|s| s.id.as_deref() == Some(id.as_str())))
            .ok_or_else(|| not_found("Client scope", &id))?;
        *stored = scope.clone();
        Ok(())
    }

    async fn delete_client_scope(&self, realm: &str, scope_id: &str) -> DomainResult<()> {
        let mut state = self.enter("delete_client_scope", scope_id)?;
        let in_use = state
            .client_default_scopes
            .iter()
            .any(|((r, _), ids)| r == realm && ids.contains(scope_id));
        if in_use {
            return Err(rejected("Cannot remove client scope, it is currently in use"));
        }
        let scopes = state.client_scopes.entry(realm.to_string()).or_default();
        let before = scopes.len();
        scopes.retain(|s| s.id.as_deref() != Some(scope_id));
        if scopes.len() == before {
            return Err(not_found("Client scope", scope_id));
        }
        Ok(())
    }

    async fn list_client_default_scopes(
        &self,
        realm: &str,
        client_id: &str,
    ) -> DomainResult<Vec<ClientScopeRepresentation>> {
        let state = self.enter("list_client_default_scopes", client_id)?;
        let ids = state
            .client_default_scopes
            .get(&(realm.to_string(), client_id.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| state.scope_by_id(realm, id).cloned())
            .collect())
    }

    async fn add_client_default_scope(
        &self,
        realm: &str,
        client_id: &str,
        scope_id: &str,
    ) -> DomainResult<()> {
        let mut state = self.enter("add_client_default_scope", scope_id)?;
        state
            .client_default_scopes
            .entry((realm.to_string(), client_id.to_string()))
            .or_default()
            .insert(scope_id.to_string());
        Ok(())
    }

    async fn remove_client_default_scope(
        &self,
        realm: &str,
        client_id: &str,
        scope_id: &str,
    ) -> DomainResult<()> {
        let mut state = self.enter("remove_client_default_scope", scope_id)?;
        state
            .client_default_scopes
            .entry((realm.to_string(), client_id.to_string()))
            .or_default()
            .remove(scope_id);
        Ok(())
    }

    async fn create_identity_provider_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<EntityId> {
        let mut state = self.enter("create_identity_provider_mapper", &mapper.name)?;
        let id = state.next_id("idp-mapper");
        state.idp_mappers.push(IdentityProviderMapper {
            id: Some(id.clone()),
            ..mapper.clone()
        });
        Ok(EntityId::from(id))
    }

    async fn get_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> DomainResult<IdentityProviderMapper> {
        let state = self.enter("get_identity_provider_mapper", mapper_id)?;
        state
            .idp_mappers
            .iter()
            .find(|m| {
                m.realm == realm
                    && m.identity_provider_alias == alias
                    && m.id.as_deref() == Some(mapper_id)
            })
            .cloned()
            .ok_or_else(|| not_found("Identity provider mapper", mapper_id))
    }

    async fn list_identity_provider_mappers(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<Vec<IdentityProviderMapper>> {
        let state = self.enter("list_identity_provider_mappers", alias)?;
        Ok(state
            .idp_mappers
            .iter()
            .filter(|m| m.realm == realm && m.identity_provider_alias == alias)
            .cloned()
            .collect())
    }

    async fn update_identity_provider_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<()> {
        let id = mapper.id.clone().unwrap_or_default();
        let mut state = self.enter("update_identity_provider_mapper", &id)?;
        let stored = state
            .idp_mappers
            .iter_mut()
            .find(|m| m.realm == mapper.realm && m.id == mapper.id)
            .ok_or_else(|| not_found("Identity provider mapper", &id))?;
        *stored = mapper.clone();
        Ok(())
    }

    async fn delete_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> DomainResult<()> {
        let mut state = self.enter("delete_identity_provider_mapper", mapper_id)?;
        let before = state.idp_mappers.len();
        state.idp_mappers.retain(|m| {
            !(m.realm == realm
                && m.identity_provider_alias == alias
                && m.id.as_deref() == Some(mapper_id))
        });
        if state.idp_mappers.len() == before {
            return Err(not_found("Identity provider mapper", mapper_id));
        }
        Ok(())
    }
}
