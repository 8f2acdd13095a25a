use super::common::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider type of LDAP (and other) user storage components
pub const USER_STORAGE_PROVIDER_TYPE: &str = "org.keycloak.storage.UserStorageProvider";

/// Provider type of mappers hanging off an LDAP user storage component
pub const LDAP_MAPPER_PROVIDER_TYPE: &str = "org.keycloak.storage.ldap.mappers.LDAPStorageMapper";

/// Keycloak's string-keyed multivalue configuration bag.
///
/// An absent key means "leave untouched"; a key mapped to `[]` means "clear".
pub type ComponentConfig = BTreeMap<String, Vec<String>>;

/// Generic pluggable provider instance (`/realms/{realm}/components`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    pub provider_id: String,
    pub provider_type: String,
    pub parent_id: String,
    #[serde(default)]
    pub config: ComponentConfig,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        provider_id: impl Into<String>,
        provider_type: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            provider_id: provider_id.into(),
            provider_type: provider_type.into(),
            parent_id: parent_id.into(),
            config: ComponentConfig::new(),
        }
    }

    /// First value stored under `key`, or `""` when absent or empty
    pub fn get_config(&self, key: &str) -> &str {
        self.get_config_ok(key).unwrap_or_default()
    }

    /// First value stored under `key` when the key is present with at least one value
    pub fn get_config_ok(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn has_config_key(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }
}
