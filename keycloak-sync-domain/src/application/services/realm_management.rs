use crate::{
    application::{
        ports::*,
        services::{reconcile::RelationDiff, retry::retry_once_on_transient},
    },
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Realm lifecycle plus the realm-level default client scope relations
pub struct RealmManagementService {
    repository: Arc<dyn KeycloakRepository>,
}

impl RealmManagementService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    /// List all realms
    #[instrument(skip(self))]
    pub async fn list_realms(&self) -> DomainResult<Vec<Realm>> {
        let realms = self.repository.list_realms().await?;
        info!("Found {} realms", realms.len());
        Ok(realms)
    }

    /// Get a realm with its default client scope names filled in
    #[instrument(skip(self), fields(realm = %realm_name))]
    pub async fn get_realm(&self, realm_name: &str) -> DomainResult<Realm> {
        let mut realm = self.repository.get_realm(realm_name).await?;

        realm.default_default_client_scopes = self
            .default_scope_names(realm_name, DefaultScopeKind::Default)
            .await?;
        realm.default_optional_client_scopes = self
            .default_scope_names(realm_name, DefaultScopeKind::Optional)
            .await?;

        Ok(realm)
    }

    /// Create a realm, then attach the wanted default client scopes
    #[instrument(skip(self, realm), fields(realm = %realm.realm))]
    pub async fn create_realm(&self, realm: &Realm) -> DomainResult<Realm> {
        realm.validate()?;

        info!("Creating realm '{}'", realm.realm);
        self.repository.create_realm(realm).await?;
        self.sync_all_default_scopes(realm).await?;

        self.get_realm(&realm.realm).await
    }

    /// Overlay the wanted settings onto the server's realm and PUT it back
    #[instrument(skip(self, realm), fields(realm = %realm.realm))]
    pub async fn update_realm(&self, realm: &Realm) -> DomainResult<Realm> {
        realm.validate()?;

        let remote = self.repository.get_realm(&realm.realm).await?;
        let merged = realm.merged_onto(remote);

        info!("Updating realm '{}'", realm.realm);
        self.repository.update_realm(&merged).await?;
        self.sync_all_default_scopes(realm).await?;

        self.get_realm(&realm.realm).await
    }

    #[instrument(skip(self), fields(realm = %realm_name))]
    pub async fn delete_realm(&self, realm_name: &str) -> DomainResult<()> {
        info!("Deleting realm '{}'", realm_name);
        retry_once_on_transient("delete realm", move || self.repository.delete_realm(realm_name)).await
    }

    async fn sync_all_default_scopes(&self, realm: &Realm) -> DomainResult<()> {
        // An empty list leaves the server's defaults alone
        let wanted: Vec<(DefaultScopeKind, &[String])> = [
            (DefaultScopeKind::Default, &realm.default_default_client_scopes),
            (DefaultScopeKind::Optional, &realm.default_optional_client_scopes),
        ]
        .into_iter()
        .filter(|(_, desired)| !desired.is_empty())
        .map(|(kind, desired)| (kind, desired.as_slice()))
        .collect();

        self.apply_default_scopes(&realm.realm, &wanted).await
    }

    /// Make the realm's default (or optional) client scopes exactly `desired`, by name
    #[instrument(skip(self, desired), fields(realm = %realm_name, kind = ?kind))]
    pub async fn sync_default_scopes(
        &self,
        realm_name: &str,
        kind: DefaultScopeKind,
        desired: &[String],
    ) -> DomainResult<()> {
        self.apply_default_scopes(realm_name, &[(kind, desired)]).await
    }

    /// Plan every kind first, then detach across all kinds before attaching any.
    ///
    /// A scope is either a default or an optional default, never both, so a
    /// scope moving between kinds must leave the old kind first.
    async fn apply_default_scopes(
        &self,
        realm_name: &str,
        wanted: &[(DefaultScopeKind, &[String])],
    ) -> DomainResult<()> {
        if wanted.is_empty() {
            return Ok(());
        }

        let scope_ids: BTreeMap<String, String> = self
            .repository
            .list_client_scopes(realm_name)
            .await?
            .into_iter()
            .filter_map(|scope| scope.id.map(|id| (scope.name, id)))
            .collect();
        let id_of = |name: &String| {
            scope_ids
                .get(name)
                .cloned()
                .map(|id| (name.clone(), id))
                .ok_or_else(|| DomainError::not_found("Client scope", name))
        };

        let mut detach = Vec::new();
        let mut attach = Vec::new();
        for (kind, desired) in wanted {
            let current: BTreeMap<String, Option<String>> = self
                .repository
                .list_realm_default_scopes(realm_name, *kind)
                .await?
                .into_iter()
                .map(|scope| (scope.name, scope.id))
                .collect();
            let diff = RelationDiff::compute(current.keys().cloned(), desired.iter().cloned());

            for name in &diff.to_detach {
                let scope = match current.get(name).cloned().flatten() {
                    Some(id) => (name.clone(), id),
                    None => id_of(name)?,
                };
                detach.push((*kind, scope));
            }
            for name in &diff.to_attach {
                attach.push((*kind, id_of(name)?));
            }
        }

        for (kind, (name, scope_id)) in &detach {
            info!("Detaching {:?} client scope '{}'", kind, name);
            self.repository
                .remove_realm_default_scope(realm_name, *kind, scope_id)
                .await?;
        }
        for (kind, (name, scope_id)) in &attach {
            info!("Attaching {:?} client scope '{}'", kind, name);
            self.repository
                .add_realm_default_scope(realm_name, *kind, scope_id)
                .await?;
        }

        Ok(())
    }

    async fn default_scope_names(
        &self,
        realm_name: &str,
        kind: DefaultScopeKind,
    ) -> DomainResult<Vec<String>> {
        let scopes = self
            .repository
            .list_realm_default_scopes(realm_name, kind)
            .await?;
        Ok(scopes.into_iter().map(|scope| scope.name).collect())
    }
}
