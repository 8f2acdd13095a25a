use crate::{
    application::{
        ports::*,
        services::{reconcile::RelationDiff, retry::LookupRetry},
    },
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const SCOPE_IN_USE: &str = "Cannot remove client scope, it is currently in use";

/// OpenID Connect client scopes
pub struct ClientScopeService {
    repository: Arc<dyn KeycloakRepository>,
    lookup: LookupRetry,
}

impl ClientScopeService {
    pub fn new(repository: Arc<dyn KeycloakRepository>, lookup: LookupRetry) -> Self {
        Self { repository, lookup }
    }

    /// Create the scope, or adopt the openid-connect scope that already has its name
    #[instrument(skip(self, scope), fields(realm = %scope.realm_id, name = %scope.name))]
    pub async fn create_scope(&self, scope: &OpenidClientScope) -> DomainResult<OpenidClientScope> {
        scope.validate()?;
        let realm = &scope.realm_id;

        match self
            .repository
            .create_client_scope(realm, &scope.to_representation())
            .await
        {
            Ok(id) => {
                info!("Created client scope '{}' ({})", scope.name, id);
                Ok(OpenidClientScope {
                    id: Some(id.to_string()),
                    ..scope.clone()
                })
            }
            Err(e) if e.is_conflict() => {
                info!("Client scope '{}' already exists, adopting it", scope.name);
                let existing = self.find_scope_by_name(realm, &scope.name).await?;
                let adopted = OpenidClientScope {
                    id: existing.id,
                    ..scope.clone()
                };
                self.repository
                    .update_client_scope(realm, &adopted.to_representation())
                    .await?;
                Ok(adopted)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(realm = %realm, scope_id = %scope_id))]
    pub async fn get_scope(&self, realm: &str, scope_id: &str) -> DomainResult<OpenidClientScope> {
        let representation = self.repository.get_client_scope(realm, scope_id).await?;
        OpenidClientScope::from_representation(realm, representation)
    }

    /// Openid-connect scope called `name`, polling while a fresh write is not yet visible
    pub async fn find_scope_by_name(
        &self,
        realm: &str,
        name: &str,
    ) -> DomainResult<ClientScopeRepresentation> {
        self.lookup
            .run("Client scope", name, move || async move {
                let scopes = self.repository.list_client_scopes(realm).await?;
                Ok(scopes
                    .into_iter()
                    .find(|s| s.is_openid_connect() && s.name == name))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(realm = %scope.realm_id, name = %scope.name))]
    pub async fn update_scope(&self, scope: &OpenidClientScope) -> DomainResult<OpenidClientScope> {
        scope.validate()?;
        if scope.id.is_none() {
            return Err(DomainError::validation("id", "Client scope ID is required for updates"));
        }
        self.repository
            .update_client_scope(&scope.realm_id, &scope.to_representation())
            .await?;
        Ok(scope.clone())
    }

    /// Delete the scope; a scope still attached to clients is reported as deleted.
    #[instrument(skip(self), fields(realm = %realm, scope_id = %scope_id))]
    pub async fn delete_scope(&self, realm: &str, scope_id: &str) -> DomainResult<()> {
        match self.repository.delete_client_scope(realm, scope_id).await {
            Err(e) if e.remote_message_contains(400, SCOPE_IN_USE) => {
                warn!("Client scope {} is still in use and was left in place", scope_id);
                Ok(())
            }
            other => other,
        }
    }
}

/// Default client scopes of a single client
pub struct ClientDefaultScopesService {
    repository: Arc<dyn KeycloakRepository>,
}

impl ClientDefaultScopesService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(realm = %realm, client = %client_id))]
    pub async fn get_default_scopes(
        &self,
        realm: &str,
        client_id: &str,
    ) -> DomainResult<ClientDefaultScopes> {
        let names = self.current_scope_names(realm, client_id).await?;
        Ok(ClientDefaultScopes {
            realm_id: realm.to_string(),
            client_id: client_id.to_string(),
            default_scopes: names,
        })
    }

    /// Make the client's default scopes exactly `desired.default_scopes`
    #[instrument(skip(self, desired), fields(realm = %desired.realm_id, client = %desired.client_id))]
    pub async fn set_default_scopes(
        &self,
        desired: &ClientDefaultScopes,
    ) -> DomainResult<ClientDefaultScopes> {
        let realm = &desired.realm_id;
        let client_id = &desired.client_id;

        let scope_ids = self.scope_ids_by_name(realm).await?;
        let current = self.current_scope_names(realm, client_id).await?;
        let diff = RelationDiff::compute(current, desired.default_scopes.iter().cloned());

        // Resolve every name before the first write
        let resolve = |names: &[String]| -> DomainResult<Vec<(String, String)>> {
            names
                .iter()
                .map(|name| lookup_id(&scope_ids, name).map(|id| (name.clone(), id.to_string())))
                .collect()
        };
        let detach = resolve(&diff.to_detach)?;
        let attach = resolve(&diff.to_attach)?;

        for (name, scope_id) in &detach {
            info!("Detaching default scope '{}'", name);
            self.repository
                .remove_client_default_scope(realm, client_id, scope_id)
                .await?;
        }

        for (name, scope_id) in &attach {
            info!("Attaching default scope '{}'", name);
            self.repository
                .add_client_default_scope(realm, client_id, scope_id)
                .await?;
        }

        Ok(desired.clone())
    }

    /// Detach the scopes this definition manages
    #[instrument(skip(self, managed), fields(realm = %managed.realm_id, client = %managed.client_id))]
    pub async fn remove_default_scopes(&self, managed: &ClientDefaultScopes) -> DomainResult<()> {
        let realm = &managed.realm_id;
        let client_id = &managed.client_id;

        let scope_ids = self.scope_ids_by_name(realm).await?;
        let current = self.current_scope_names(realm, client_id).await?;

        let detach = managed
            .default_scopes
            .intersection(&current)
            .map(|name| lookup_id(&scope_ids, name))
            .collect::<DomainResult<Vec<_>>>()?;

        for scope_id in detach {
            self.repository
                .remove_client_default_scope(realm, client_id, scope_id)
                .await?;
        }
        Ok(())
    }

    async fn current_scope_names(
        &self,
        realm: &str,
        client_id: &str,
    ) -> DomainResult<BTreeSet<String>> {
        let scopes = self
            .repository
            .list_client_default_scopes(realm, client_id)
            .await?;
        Ok(scopes.into_iter().map(|scope| scope.name).collect())
    }

    async fn scope_ids_by_name(&self, realm: &str) -> DomainResult<BTreeMap<String, String>> {
        let scopes = self.repository.list_client_scopes(realm).await?;
        Ok(scopes
            .into_iter()
            .filter_map(|scope| scope.id.map(|id| (scope.name, id)))
            .collect())
    }
}

fn lookup_id<'a>(scope_ids: &'a BTreeMap<String, String>, name: &str) -> DomainResult<&'a str> {
    scope_ids
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| DomainError::not_found("Client scope", name))
}
