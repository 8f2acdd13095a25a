use super::common::bool_string;
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const OPENID_CONNECT_PROTOCOL: &str = "openid-connect";

/// Client scope as exchanged with `/realms/{realm}/client-scopes`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientScopeRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub attributes: ClientScopeAttributes,
}

/// Keycloak keeps every scope attribute as a string, booleans included
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientScopeAttributes {
    #[serde(
        rename = "display.on.consent.screen",
        with = "bool_string",
        default
    )]
    pub display_on_consent_screen: bool,
    #[serde(rename = "consent.screen.text", default)]
    pub consent_screen_text: String,
    #[serde(rename = "gui.order", default)]
    pub gui_order: String,
    #[serde(rename = "include.in.token.scope", with = "bool_string", default)]
    pub include_in_token_scope: bool,
}

/// OpenID Connect client scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenidClientScope {
    pub id: Option<String>,
    pub realm_id: String,
    pub name: String,
    pub description: String,
    /// Consent screen text; the consent screen is shown only when set
    pub consent_screen_text: Option<String>,
    pub include_in_token_scope: bool,
    pub gui_order: Option<i64>,
}

impl OpenidClientScope {
    pub fn new(realm_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            realm_id: realm_id.into(),
            name: name.into(),
            description: String::new(),
            consent_screen_text: None,
            include_in_token_scope: true,
            gui_order: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name", "Client scope name cannot be empty"));
        }
        if self.name.contains(' ') {
            return Err(DomainError::validation(
                "name",
                "Client scope name cannot contain spaces",
            ));
        }
        Ok(())
    }

    pub fn to_representation(&self) -> ClientScopeRepresentation {
        let consent_screen_text = self.consent_screen_text.clone().unwrap_or_default();
        ClientScopeRepresentation {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            protocol: OPENID_CONNECT_PROTOCOL.to_string(),
            attributes: ClientScopeAttributes {
                display_on_consent_screen: !consent_screen_text.is_empty(),
                consent_screen_text,
                gui_order: self.gui_order.map(|o| o.to_string()).unwrap_or_default(),
                include_in_token_scope: self.include_in_token_scope,
            },
        }
    }

    pub fn from_representation(
        realm_id: impl Into<String>,
        representation: ClientScopeRepresentation,
    ) -> DomainResult<Self> {
        let attributes = representation.attributes;
        let gui_order = match attributes.gui_order.trim() {
            "" => None,
            value => Some(
                value
                    .parse()
                    .map_err(|_| DomainError::malformed("gui.order", value))?,
            ),
        };

        Ok(Self {
            id: representation.id,
            realm_id: realm_id.into(),
            name: representation.name,
            description: representation.description,
            consent_screen_text: Some(attributes.consent_screen_text).filter(|t| !t.is_empty()),
            include_in_token_scope: attributes.include_in_token_scope,
            gui_order,
        })
    }
}

/// Default client scopes attached to one client, by scope name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDefaultScopes {
    pub realm_id: String,
    /// Internal id of the client, not its `clientId`
    pub client_id: String,
    pub default_scopes: BTreeSet<String>,
}

impl ClientDefaultScopes {
    pub fn new<I, S>(realm_id: impl Into<String>, client_id: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            realm_id: realm_id.into(),
            client_id: client_id.into(),
            default_scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClientScopeRepresentation {
    pub fn is_openid_connect(&self) -> bool {
        self.protocol == OPENID_CONNECT_PROTOCOL
    }
}
