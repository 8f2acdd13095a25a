use crate::{
    application::{ports::*, services::reconcile::RelationDiff},
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Realm roles granted to new users through the realm's default composite role.
///
/// Only realm-level composites are managed; client roles on the default role
/// are left untouched.
pub struct DefaultRolesService {
    repository: Arc<dyn KeycloakRepository>,
}

impl DefaultRolesService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(realm = %realm))]
    pub async fn get_default_roles(&self, realm: &str) -> DomainResult<DefaultRoles> {
        let default_role_id = self.default_role_id(realm).await?;
        let current = self.current_composites(realm, &default_role_id).await?;

        Ok(DefaultRoles {
            realm_id: realm.to_string(),
            default_role_id: Some(default_role_id),
            roles: current.into_keys().collect(),
        })
    }

    /// Make the default role's realm composites exactly `desired.roles`
    #[instrument(skip(self, desired), fields(realm = %desired.realm_id))]
    pub async fn update_default_roles(&self, desired: &DefaultRoles) -> DomainResult<DefaultRoles> {
        let realm = &desired.realm_id;
        let default_role_id = self.default_role_id(realm).await?;
        let current = self.current_composites(realm, &default_role_id).await?;

        let diff = RelationDiff::compute(current.keys().cloned(), desired.roles.iter().cloned());

        // Resolve every wanted role before the first write
        let mut attach = Vec::with_capacity(diff.to_attach.len());
        for name in &diff.to_attach {
            attach.push(self.repository.get_realm_role(realm, name).await?);
        }
        let detach: Vec<RoleRepresentation> = diff
            .to_detach
            .iter()
            .filter_map(|name| current.get(name).cloned())
            .collect();

        if !detach.is_empty() {
            info!("Removing {} default roles", detach.len());
            self.repository
                .remove_role_composites(realm, &default_role_id, &detach)
                .await?;
        }

        if !attach.is_empty() {
            info!("Adding {} default roles", attach.len());
            self.repository
                .add_role_composites(realm, &default_role_id, &attach)
                .await?;
        }

        Ok(DefaultRoles {
            default_role_id: Some(default_role_id),
            ..desired.clone()
        })
    }

    /// Detach every role this definition manages from the default role
    #[instrument(skip(self, managed), fields(realm = %managed.realm_id))]
    pub async fn delete_default_roles(&self, managed: &DefaultRoles) -> DomainResult<()> {
        let realm = &managed.realm_id;
        let default_role_id = self.default_role_id(realm).await?;
        let current = self.current_composites(realm, &default_role_id).await?;

        let detach: Vec<RoleRepresentation> = managed
            .roles
            .iter()
            .filter_map(|name| current.get(name).cloned())
            .collect();
        if detach.is_empty() {
            return Ok(());
        }

        info!("Removing {} default roles", detach.len());
        self.repository
            .remove_role_composites(realm, &default_role_id, &detach)
            .await
    }

    async fn default_role_id(&self, realm: &str) -> DomainResult<String> {
        let representation = self.repository.get_realm(realm).await?;
        representation
            .default_role
            .map(|role| role.id)
            .ok_or_else(|| DomainError::not_found("Default role", realm))
    }

    async fn current_composites(
        &self,
        realm: &str,
        default_role_id: &str,
    ) -> DomainResult<BTreeMap<String, RoleRepresentation>> {
        let composites = self
            .repository
            .list_role_composites(realm, default_role_id)
            .await?;
        Ok(composites
            .into_iter()
            .filter(RoleRepresentation::is_realm_role)
            .map(|role| (role.name.clone(), role))
            .collect())
    }
}
