use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role as returned by `/roles` and `/roles-by-id/{id}/composites`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub client_role: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl RoleRepresentation {
    pub fn is_realm_role(&self) -> bool {
        !self.client_role
    }
}

/// Realm roles granted to every new user through the realm's default composite role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRoles {
    pub realm_id: String,
    /// Id of the `default-roles-{realm}` composite
    pub default_role_id: Option<String>,
    pub roles: BTreeSet<String>,
}

impl DefaultRoles {
    pub fn new<I, S>(realm_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            realm_id: realm_id.into(),
            default_role_id: None,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}
