use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapper attached to an identity provider instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderMapper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip)]
    pub realm: String,
    pub name: String,
    pub identity_provider_alias: String,
    /// Mapper provider id, e.g. `hardcoded-attribute-idp-mapper`
    pub identity_provider_mapper: String,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl IdentityProviderMapper {
    pub fn new(
        realm: impl Into<String>,
        identity_provider_alias: impl Into<String>,
        name: impl Into<String>,
        identity_provider_mapper: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            realm: realm.into(),
            name: name.into(),
            identity_provider_alias: identity_provider_alias.into(),
            identity_provider_mapper: identity_provider_mapper.into(),
            config: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name", "Mapper name cannot be empty"));
        }
        if self.identity_provider_alias.trim().is_empty() {
            return Err(DomainError::validation(
                "identity_provider_alias",
                "Identity provider alias cannot be empty",
            ));
        }
        if self.identity_provider_mapper.trim().is_empty() {
            return Err(DomainError::validation(
                "identity_provider_mapper",
                "Mapper provider id cannot be empty",
            ));
        }
        Ok(())
    }
}
