use crate::{
    application::{
        ports::*,
        services::retry::{retry_once_on_transient, LookupRetry},
    },
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const BUILT_IN_FLOW_DELETE: &str = "Can't delete built in flow";
const BUILT_IN_FLOW_UNKNOWN_ERROR: &str = "unknown_error";
const BUILT_IN_EXECUTION_DELETE: &str = "It is illegal to remove execution from a built in flow";

/// Top-level authentication flows, including adoption of built-in ones
pub struct AuthenticationFlowService {
    repository: Arc<dyn KeycloakRepository>,
    lookup: LookupRetry,
}

impl AuthenticationFlowService {
    pub fn new(repository: Arc<dyn KeycloakRepository>, lookup: LookupRetry) -> Self {
        Self { repository, lookup }
    }

    /// Create the flow, or adopt the existing flow with the same alias.
    ///
    /// An adopted built-in flow has all of its executions removed so the
    /// managed definition starts from an empty flow.
    #[instrument(skip(self, flow), fields(realm = %flow.realm_id, alias = %flow.alias))]
    pub async fn create_flow(&self, flow: &AuthenticationFlow) -> DomainResult<AuthenticationFlow> {
        flow.validate()?;
        let desired = flow.as_managed();

        match self.repository.create_authentication_flow(&desired).await {
            Ok(id) => {
                info!("Created authentication flow '{}' ({})", flow.alias, id);
                Ok(AuthenticationFlow {
                    id: Some(id.to_string()),
                    ..desired
                })
            }
            Err(e) if e.is_conflict() => {
                info!("Authentication flow '{}' already exists, adopting it", flow.alias);
                let existing = self.find_flow_by_alias(&flow.realm_id, &flow.alias).await?;

                if existing.built_in {
                    self.clear_built_in_executions(&existing).await?;
                }

                let adopted = AuthenticationFlow {
                    id: existing.id,
                    ..desired
                };
                self.repository.update_authentication_flow(&adopted).await?;
                Ok(adopted)
            }
            Err(e) => Err(e),
        }
    }

    /// Strip the built-in flag from a flow and its sub-flows, then remove every execution.
    #[instrument(skip(self, flow), fields(realm = %flow.realm_id, alias = %flow.alias))]
    pub async fn clear_built_in_executions(&self, flow: &AuthenticationFlow) -> DomainResult<()> {
        let unlocked = AuthenticationFlow {
            built_in: false,
            ..flow.clone()
        };
        self.repository.update_authentication_flow(&unlocked).await?;

        let executions = self
            .repository
            .list_flow_executions(&flow.realm_id, &flow.alias)
            .await?;

        for sub_flow_id in executions.iter().filter_map(|e| e.sub_flow_id()) {
            let mut sub_flow = self
                .repository
                .get_authentication_flow(&flow.realm_id, sub_flow_id)
                .await?;
            if sub_flow.built_in {
                sub_flow.built_in = false;
                self.repository.update_authentication_flow(&sub_flow).await?;
            }
        }

        for execution in &executions {
            match self
                .repository
                .delete_execution(&flow.realm_id, &execution.id)
                .await
            {
                Ok(()) => {}
                // Nested executions go away with their parent sub-flow
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        info!(
            "Cleared {} executions from built-in flow '{}'",
            executions.len(),
            flow.alias
        );
        Ok(())
    }

    #[instrument(skip(self), fields(realm = %realm, flow_id = %flow_id))]
    pub async fn get_flow(&self, realm: &str, flow_id: &str) -> DomainResult<AuthenticationFlow> {
        self.repository.get_authentication_flow(realm, flow_id).await
    }

    /// Find a flow by alias, polling while a fresh write is not yet visible
    #[instrument(skip(self), fields(realm = %realm, alias = %alias))]
    pub async fn find_flow_by_alias(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<AuthenticationFlow> {
        self.lookup
            .run("Authentication flow", alias, move || async move {
                let flows = self.repository.list_authentication_flows(realm).await?;
                Ok(flows.into_iter().find(|f| f.alias == alias))
            })
            .await
    }

    #[instrument(skip(self, flow), fields(realm = %flow.realm_id, alias = %flow.alias))]
    pub async fn update_flow(&self, flow: &AuthenticationFlow) -> DomainResult<AuthenticationFlow> {
        flow.validate()?;
        let desired = flow.as_managed();
        self.repository.update_authentication_flow(&desired).await?;
        Ok(desired)
    }

    /// Delete the flow; built-in flows Keycloak refuses to delete count as deleted.
    #[instrument(skip(self), fields(realm = %realm, flow_id = %flow_id))]
    pub async fn delete_flow(&self, realm: &str, flow_id: &str) -> DomainResult<()> {
        let result = retry_once_on_transient("delete authentication flow", move || {
            self.repository.delete_authentication_flow(realm, flow_id)
        })
        .await;

        match result {
            Err(e)
                if e.remote_message_contains(400, BUILT_IN_FLOW_DELETE)
                    || e.remote_message_contains(500, BUILT_IN_FLOW_UNKNOWN_ERROR) =>
            {
                warn!("Authentication flow {} is built in and was left in place: {}", flow_id, e);
                Ok(())
            }
            other => other,
        }
    }

    pub async fn list_executions(
        &self,
        realm: &str,
        flow_alias: &str,
    ) -> DomainResult<Vec<AuthenticationExecutionInfo>> {
        self.repository.list_flow_executions(realm, flow_alias).await
    }
}

/// Flows nested inside a parent flow
pub struct AuthenticationSubFlowService {
    repository: Arc<dyn KeycloakRepository>,
    lookup: LookupRetry,
}

impl AuthenticationSubFlowService {
    pub fn new(repository: Arc<dyn KeycloakRepository>, lookup: LookupRetry) -> Self {
        Self { repository, lookup }
    }

    /// Create the subflow under its parent, or adopt one with the same alias
    #[instrument(skip(self, sub_flow), fields(realm = %sub_flow.realm_id, parent = %sub_flow.parent_flow_alias, alias = %sub_flow.alias))]
    pub async fn create_sub_flow(
        &self,
        sub_flow: &AuthenticationSubFlow,
    ) -> DomainResult<AuthenticationSubFlow> {
        sub_flow.validate()?;
        let realm = &sub_flow.realm_id;
        let parent = &sub_flow.parent_flow_alias;

        let id = match self
            .repository
            .create_sub_flow(realm, parent, &sub_flow.creation_request())
            .await
        {
            Ok(id) => {
                info!("Created subflow '{}' under '{}'", sub_flow.alias, parent);
                id.to_string()
            }
            Err(e) if e.is_conflict() => {
                info!("Subflow '{}' already exists, adopting it", sub_flow.alias);
                let id = self
                    .find_sub_flow_id_by_alias(realm, parent, &sub_flow.alias)
                    .await?;
                let adopted = AuthenticationSubFlow {
                    id: Some(id.clone()),
                    ..sub_flow.clone()
                };
                self.repository
                    .update_authentication_flow(&adopted.to_flow())
                    .await?;
                id
            }
            Err(e) => return Err(e),
        };

        let created = AuthenticationSubFlow {
            id: Some(id),
            ..sub_flow.clone()
        };
        self.apply_requirement(&created).await?;
        Ok(created)
    }

    #[instrument(skip(self), fields(realm = %realm, parent = %parent_flow_alias, id = %sub_flow_id))]
    pub async fn get_sub_flow(
        &self,
        realm: &str,
        parent_flow_alias: &str,
        sub_flow_id: &str,
    ) -> DomainResult<AuthenticationSubFlow> {
        let flow = self
            .repository
            .get_authentication_flow(realm, sub_flow_id)
            .await?;
        let execution = self
            .find_parent_execution(realm, parent_flow_alias, sub_flow_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Authentication subflow execution", sub_flow_id))?;

        Ok(AuthenticationSubFlow::from_parts(
            flow,
            parent_flow_alias,
            &execution,
        ))
    }

    #[instrument(skip(self, sub_flow), fields(realm = %sub_flow.realm_id, alias = %sub_flow.alias))]
    pub async fn update_sub_flow(
        &self,
        sub_flow: &AuthenticationSubFlow,
    ) -> DomainResult<AuthenticationSubFlow> {
        sub_flow.validate()?;
        if sub_flow.id.is_none() {
            return Err(DomainError::validation("id", "Subflow ID is required for updates"));
        }

        self.repository
            .update_authentication_flow(&sub_flow.to_flow())
            .await?;
        self.apply_requirement(sub_flow).await?;
        Ok(sub_flow.clone())
    }

    /// Delete the execution wrapping the subflow; subflows of built-in flows count as deleted.
    #[instrument(skip(self), fields(realm = %realm, parent = %parent_flow_alias, id = %sub_flow_id))]
    pub async fn delete_sub_flow(
        &self,
        realm: &str,
        parent_flow_alias: &str,
        sub_flow_id: &str,
    ) -> DomainResult<()> {
        let execution = self
            .find_parent_execution(realm, parent_flow_alias, sub_flow_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Authentication subflow execution", sub_flow_id))?;

        match self.repository.delete_execution(realm, &execution.id).await {
            Err(e) if e.remote_message_contains(400, BUILT_IN_EXECUTION_DELETE) => {
                warn!("Subflow {} belongs to a built-in flow and was left in place", sub_flow_id);
                Ok(())
            }
            other => other,
        }
    }

    /// Id of the subflow called `alias` among the parent's executions
    pub async fn find_sub_flow_id_by_alias(
        &self,
        realm: &str,
        parent_flow_alias: &str,
        alias: &str,
    ) -> DomainResult<String> {
        self.lookup
            .run("Authentication subflow", alias, move || async move {
                let executions = self
                    .repository
                    .list_flow_executions(realm, parent_flow_alias)
                    .await?;
                Ok(executions
                    .iter()
                    .filter(|e| e.display_name == alias)
                    .find_map(|e| e.sub_flow_id().map(str::to_string)))
            })
            .await
    }

    async fn find_parent_execution(
        &self,
        realm: &str,
        parent_flow_alias: &str,
        sub_flow_id: &str,
    ) -> DomainResult<Option<AuthenticationExecutionInfo>> {
        let executions = self
            .repository
            .list_flow_executions(realm, parent_flow_alias)
            .await?;
        Ok(executions.into_iter().find(|e| e.wraps_flow(sub_flow_id)))
    }

    /// Requirement lives on the wrapping execution, not on the flow
    async fn apply_requirement(&self, sub_flow: &AuthenticationSubFlow) -> DomainResult<()> {
        let sub_flow_id = sub_flow.id.as_deref().unwrap_or_default();
        let realm = &sub_flow.realm_id;
        let parent = &sub_flow.parent_flow_alias;

        let mut execution = self
            .lookup
            .run("Authentication subflow execution", sub_flow_id, move || {
                self.find_parent_execution(realm, parent, sub_flow_id)
            })
            .await?;

        if execution.requirement != sub_flow.requirement {
            execution.requirement = sub_flow.requirement;
            self.repository
                .update_flow_execution(realm, parent, &execution)
                .await?;
        }
        Ok(())
    }
}

/// Flow aliases a realm binds to browser login, registration and friends
pub struct AuthenticationBindingsService {
    repository: Arc<dyn KeycloakRepository>,
}

impl AuthenticationBindingsService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(realm = %realm))]
    pub async fn get_bindings(&self, realm: &str) -> DomainResult<AuthenticationBindings> {
        let realm = self.repository.get_realm(realm).await?;
        Ok(AuthenticationBindings::from_realm(&realm))
    }

    #[instrument(skip(self, bindings), fields(realm = %bindings.realm_id))]
    pub async fn update_bindings(
        &self,
        bindings: &AuthenticationBindings,
    ) -> DomainResult<AuthenticationBindings> {
        let mut realm = self.repository.get_realm(&bindings.realm_id).await?;
        bindings.apply_to(&mut realm);
        self.repository.update_realm(&realm).await?;
        info!("Updated authentication bindings of realm '{}'", bindings.realm_id);
        Ok(bindings.clone())
    }

    /// Point every binding back at the flow Keycloak ships with
    #[instrument(skip(self), fields(realm = %realm))]
    pub async fn reset_bindings(&self, realm: &str) -> DomainResult<()> {
        self.update_bindings(&AuthenticationBindings::built_in(realm))
            .await?;
        Ok(())
    }
}
