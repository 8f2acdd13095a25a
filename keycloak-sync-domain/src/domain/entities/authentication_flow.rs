use super::realm::Realm;
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum FlowProviderId {
        BasicFlow => "basic-flow",
        FormFlow => "form-flow",
        ClientFlow => "client-flow",
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum Requirement {
        Required => "REQUIRED",
        Alternative => "ALTERNATIVE",
        Optional => "OPTIONAL",
        Conditional => "CONDITIONAL",
        #[default]
        Disabled => "DISABLED",
    }
}

/// Authentication flow representation (`/authentication/flows/{id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationFlow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip)]
    pub realm_id: String,
    pub alias: String,
    #[serde(default)]
    pub description: String,
    pub provider_id: FlowProviderId,
    #[serde(default)]
    pub top_level: bool,
    #[serde(default)]
    pub built_in: bool,
}

impl AuthenticationFlow {
    pub fn new(realm_id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id: None,
            realm_id: realm_id.into(),
            alias: alias.into(),
            description: String::new(),
            provider_id: FlowProviderId::BasicFlow,
            top_level: true,
            built_in: false,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_alias(&self.alias)?;

        if self.provider_id == FlowProviderId::FormFlow {
            return Err(DomainError::validation(
                "provider_id",
                "top-level flows must be basic-flow or client-flow",
            ));
        }

        Ok(())
    }

    /// Flags every flow written by this client carries
    pub fn as_managed(&self) -> Self {
        Self {
            top_level: true,
            built_in: false,
            ..self.clone()
        }
    }
}

/// Flow nested under a parent flow as one of its executions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationSubFlow {
    pub id: Option<String>,
    pub realm_id: String,
    pub parent_flow_alias: String,
    pub alias: String,
    pub provider_id: FlowProviderId,
    pub description: String,
    /// Authenticator bound to the execution; only needed by some custom subflows
    pub authenticator: Option<String>,
    pub requirement: Requirement,
}

impl AuthenticationSubFlow {
    pub fn new(
        realm_id: impl Into<String>,
        parent_flow_alias: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            realm_id: realm_id.into(),
            parent_flow_alias: parent_flow_alias.into(),
            alias: alias.into(),
            provider_id: FlowProviderId::BasicFlow,
            description: String::new(),
            authenticator: None,
            requirement: Requirement::Disabled,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_alias(&self.alias)?;
        if self.parent_flow_alias.trim().is_empty() {
            return Err(DomainError::validation(
                "parent_flow_alias",
                "Parent flow alias cannot be empty",
            ));
        }
        Ok(())
    }

    /// Flow representation PUT to `/authentication/flows/{id}`
    pub fn to_flow(&self) -> AuthenticationFlow {
        AuthenticationFlow {
            id: self.id.clone(),
            realm_id: self.realm_id.clone(),
            alias: self.alias.clone(),
            description: self.description.clone(),
            provider_id: self.provider_id,
            top_level: false,
            built_in: false,
        }
    }

    pub fn creation_request(&self) -> SubFlowCreation {
        SubFlowCreation {
            alias: self.alias.clone(),
            description: self.description.clone(),
            provider: self.authenticator.clone().unwrap_or_default(),
            flow_type: self.provider_id,
        }
    }

    /// Rebuild from the flow itself and the parent execution that wraps it
    pub fn from_parts(
        flow: AuthenticationFlow,
        parent_flow_alias: impl Into<String>,
        execution: &AuthenticationExecutionInfo,
    ) -> Self {
        Self {
            id: flow.id,
            realm_id: flow.realm_id,
            parent_flow_alias: parent_flow_alias.into(),
            alias: flow.alias,
            provider_id: flow.provider_id,
            description: flow.description,
            authenticator: execution.provider_id.clone().filter(|p| !p.is_empty()),
            requirement: execution.requirement,
        }
    }
}

/// Body of `POST /authentication/flows/{parent}/executions/flow`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubFlowCreation {
    pub alias: String,
    pub description: String,
    pub provider: String,
    #[serde(rename = "type")]
    pub flow_type: FlowProviderId,
}

/// One row of `GET /authentication/flows/{alias}/executions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExecutionInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(default)]
    pub requirement_choices: Vec<String>,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub index: i32,
    #[serde(default)]
    pub authentication_flow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl AuthenticationExecutionInfo {
    pub fn wraps_flow(&self, flow_id: &str) -> bool {
        self.flow_id.as_deref() == Some(flow_id)
    }

    pub fn sub_flow_id(&self) -> Option<&str> {
        self.flow_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Flow aliases bound to a realm's login, registration and client authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationBindings {
    pub realm_id: String,
    pub browser_flow: String,
    pub registration_flow: String,
    pub direct_grant_flow: String,
    pub reset_credentials_flow: String,
    pub client_authentication_flow: String,
    pub docker_authentication_flow: String,
}

impl AuthenticationBindings {
    /// Aliases of the flows Keycloak provisions with every realm
    pub fn built_in(realm_id: impl Into<String>) -> Self {
        Self {
            realm_id: realm_id.into(),
            browser_flow: "browser".to_string(),
            registration_flow: "registration".to_string(),
            direct_grant_flow: "direct grant".to_string(),
            reset_credentials_flow: "reset credentials".to_string(),
            client_authentication_flow: "clients".to_string(),
            docker_authentication_flow: "docker auth".to_string(),
        }
    }

    pub fn from_realm(realm: &Realm) -> Self {
        let alias = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            realm_id: realm.realm.clone(),
            browser_flow: alias(&realm.browser_flow),
            registration_flow: alias(&realm.registration_flow),
            direct_grant_flow: alias(&realm.direct_grant_flow),
            reset_credentials_flow: alias(&realm.reset_credentials_flow),
            client_authentication_flow: alias(&realm.client_authentication_flow),
            docker_authentication_flow: alias(&realm.docker_authentication_flow),
        }
    }

    pub fn apply_to(&self, realm: &mut Realm) {
        realm.browser_flow = Some(self.browser_flow.clone());
        realm.registration_flow = Some(self.registration_flow.clone());
        realm.direct_grant_flow = Some(self.direct_grant_flow.clone());
        realm.reset_credentials_flow = Some(self.reset_credentials_flow.clone());
        realm.client_authentication_flow = Some(self.client_authentication_flow.clone());
        realm.docker_authentication_flow = Some(self.docker_authentication_flow.clone());
    }
}

fn validate_alias(alias: &str) -> DomainResult<()> {
    if alias.trim().is_empty() {
        return Err(DomainError::validation("alias", "Flow alias cannot be empty"));
    }
    Ok(())
}
