use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, LOCATION};
use reqwest::{Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::application::ports::{
    AdminCredentials, AuthToken, DefaultScopeKind, HttpConfig, KeycloakConfig, KeycloakRepository,
    TokenManager,
};
use crate::domain::{entities::*, errors::*};

/// Seconds before expiry at which the cached admin token is renewed
const TOKEN_RENEWAL_LEEWAY_SECS: i64 = 10;

/// Keycloak admin REST adapter implementing the KeycloakRepository port
pub struct KeycloakRestAdapter {
    client: reqwest::Client,
    admin_url: Url,
    credentials: AdminCredentials,
    token_manager: Arc<dyn TokenManager>,
    token: RwLock<Option<AuthToken>>,
}

impl KeycloakRestAdapter {
    pub fn new(
        keycloak: &KeycloakConfig,
        http: &HttpConfig,
        token_manager: Arc<dyn TokenManager>,
    ) -> DomainResult<Self> {
        let client = build_http_client(http, &keycloak.additional_headers)?;
        Self::new_with_client(keycloak, client, token_manager)
    }

    pub fn new_with_client(
        keycloak: &KeycloakConfig,
        client: reqwest::Client,
        token_manager: Arc<dyn TokenManager>,
    ) -> DomainResult<Self> {
        let admin_url =
            Url::parse(&keycloak.get_admin_url()).map_err(|e| DomainError::Configuration {
                message: format!("Invalid Keycloak URL: {e}"),
            })?;

        Ok(Self {
            client,
            admin_url,
            credentials: keycloak.credentials(),
            token_manager,
            token: RwLock::new(None),
        })
    }

    /// Admin URL with `segments` appended, each one percent-encoded
    fn endpoint(&self, segments: &[&str]) -> DomainResult<Url> {
        let mut url = self.admin_url.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::Configuration {
                message: format!("Keycloak URL `{}` cannot be a base", self.admin_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn bearer_token(&self) -> DomainResult<AuthToken> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expiring_soon(TOKEN_RENEWAL_LEEWAY_SECS) {
                    return Ok(token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expiring_soon(TOKEN_RENEWAL_LEEWAY_SECS) {
                return Ok(token.clone());
            }
        }

        let refreshable = cached
            .as_ref()
            .filter(|token| token.refresh_token.is_some() && !token.is_expired());

        let fresh = match refreshable {
            Some(current) => {
                match self
                    .token_manager
                    .refresh_token(&self.credentials, current)
                    .await
                {
                    Ok(token) => token,
                    Err(e) => {
                        debug!(error = %e, "Token refresh failed, acquiring a new admin token");
                        self.token_manager.acquire_token(&self.credentials).await?
                    }
                }
            }
            None => self.token_manager.acquire_token(&self.credentials).await?,
        };

        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    /// Send one admin request, re-authenticating once if the token was rejected
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> DomainResult<Response> {
        let mut reauthenticated = false;

        loop {
            let token = self.bearer_token().await?;
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header(AUTHORIZATION, token.authorization_header());
            if let Some(body) = &body {
                request = request.json(body);
            }

            debug!(method = %method, url = %url, "Sending Keycloak admin request");
            let response = request.send().await?;

            if response.status() == StatusCode::UNAUTHORIZED && !reauthenticated {
                warn!(url = %url, "Admin token rejected, acquiring a new one");
                self.invalidate_token().await;
                reauthenticated = true;
                continue;
            }

            return check_status(response, &url).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> DomainResult<T> {
        let mut url = self.endpoint(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let response = self.execute(Method::GET, url, None).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> DomainResult<Response> {
        let url = self.endpoint(segments)?;
        self.execute(Method::POST, url, Some(serde_json::to_value(body)?))
            .await
    }

    /// POST that creates an entity and answers with its id in `Location`
    async fn create<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> DomainResult<EntityId> {
        let response = self.post_json(segments, body).await?;
        location_id(&response)
    }

    async fn put_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> DomainResult<()> {
        let url = self.endpoint(segments)?;
        self.execute(Method::PUT, url, Some(serde_json::to_value(body)?))
            .await?;
        Ok(())
    }

    async fn put_empty(&self, segments: &[&str]) -> DomainResult<()> {
        let url = self.endpoint(segments)?;
        self.execute(Method::PUT, url, None).await?;
        Ok(())
    }

    async fn delete(&self, segments: &[&str]) -> DomainResult<()> {
        let url = self.endpoint(segments)?;
        self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn delete_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> DomainResult<()> {
        let url = self.endpoint(segments)?;
        self.execute(Method::DELETE, url, Some(serde_json::to_value(body)?))
            .await?;
        Ok(())
    }
}

/// Build the shared HTTP client from timeout, TLS and header settings
pub fn build_http_client(
    http: &HttpConfig,
    additional_headers: &BTreeMap<String, String>,
) -> DomainResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in additional_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            DomainError::Configuration {
                message: format!("Invalid header name `{name}`: {e}"),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| DomainError::Configuration {
            message: format!("Invalid value for header `{name}`: {e}"),
        })?;
        headers.insert(name, value);
    }

    reqwest::Client::builder()
        .timeout(http.get_timeout())
        .danger_accept_invalid_certs(http.tls_insecure_skip_verify)
        .user_agent(http.user_agent.clone())
        .default_headers(headers)
        .build()
        .map_err(|e| DomainError::Configuration {
            message: format!("Failed to build HTTP client: {e}"),
        })
}

async fn check_status(response: Response, url: &Url) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), url.path(), message))
}

/// Map a non-2xx admin API status to the error taxonomy
pub fn status_error(status: u16, path: &str, message: String) -> DomainError {
    match status {
        404 => DomainError::not_found("Keycloak resource", path),
        409 => DomainError::Conflict {
            entity_type: "Keycloak resource".to_string(),
            identifier: path.to_string(),
        },
        500..=599 => DomainError::TransientServerError { status, message },
        _ => DomainError::RemoteRejected { status, message },
    }
}

fn location_id(response: &Response) -> DomainResult<EntityId> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| DomainError::Serialization {
            message: "Create response carries no Location header".to_string(),
        })?;
    EntityId::from_location(location)
}

fn require_id<'a>(id: Option<&'a str>, entity: &str) -> DomainResult<&'a str> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| DomainError::validation("id", format!("{entity} ID is required for updates")))
}

#[async_trait]
impl KeycloakRepository for KeycloakRestAdapter {
    // Realm operations
    async fn create_realm(&self, realm: &Realm) -> DomainResult<()> {
        self.post_json(&[], realm).await?;
        Ok(())
    }

    async fn get_realm(&self, realm: &str) -> DomainResult<Realm> {
        self.get_json(&[realm], &[]).await
    }

    async fn list_realms(&self) -> DomainResult<Vec<Realm>> {
        self.get_json(&[], &[]).await
    }

    async fn update_realm(&self, realm: &Realm) -> DomainResult<()> {
        self.put_json(&[realm.realm.as_str()], realm).await
    }

    async fn delete_realm(&self, realm: &str) -> DomainResult<()> {
        self.delete(&[realm]).await
    }

    // Realm default client scope relations
    async fn list_realm_default_scopes(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
    ) -> DomainResult<Vec<ClientScopeRepresentation>> {
        self.get_json(&[realm, kind.path_segment()], &[]).await
    }

    async fn add_realm_default_scope(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
        scope_id: &str,
    ) -> DomainResult<()> {
        self.put_empty(&[realm, kind.path_segment(), scope_id]).await
    }

    async fn remove_realm_default_scope(
        &self,
        realm: &str,
        kind: DefaultScopeKind,
        scope_id: &str,
    ) -> DomainResult<()> {
        self.delete(&[realm, kind.path_segment(), scope_id]).await
    }

    // Role operations
    async fn get_realm_role(
        &self,
        realm: &str,
        role_name: &str,
    ) -> DomainResult<RoleRepresentation> {
        self.get_json(&[realm, "roles", role_name], &[]).await
    }

    async fn list_role_composites(
        &self,
        realm: &str,
        role_id: &str,
    ) -> DomainResult<Vec<RoleRepresentation>> {
        self.get_json(&[realm, "roles-by-id", role_id, "composites"], &[])
            .await
    }

    async fn add_role_composites(
        &self,
        realm: &str,
        role_id: &str,
        roles: &[RoleRepresentation],
    ) -> DomainResult<()> {
        self.post_json(&[realm, "roles-by-id", role_id, "composites"], roles)
            .await?;
        Ok(())
    }

    async fn remove_role_composites(
        &self,
        realm: &str,
        role_id: &str,
        roles: &[RoleRepresentation],
    ) -> DomainResult<()> {
        self.delete_json(&[realm, "roles-by-id", role_id, "composites"], roles)
            .await
    }

    // Authentication flow operations
    async fn create_authentication_flow(
        &self,
        flow: &AuthenticationFlow,
    ) -> DomainResult<EntityId> {
        self.create(&[flow.realm_id.as_str(), "authentication", "flows"], flow)
            .await
    }

    async fn get_authentication_flow(
        &self,
        realm: &str,
        flow_id: &str,
    ) -> DomainResult<AuthenticationFlow> {
        let mut flow: AuthenticationFlow = self
            .get_json(&[realm, "authentication", "flows", flow_id], &[])
            .await?;
        flow.realm_id = realm.to_string();
        Ok(flow)
    }

    async fn list_authentication_flows(
        &self,
        realm: &str,
    ) -> DomainResult<Vec<AuthenticationFlow>> {
        let mut flows: Vec<AuthenticationFlow> = self
            .get_json(&[realm, "authentication", "flows"], &[])
            .await?;
        for flow in &mut flows {
            flow.realm_id = realm.to_string();
        }
        Ok(flows)
    }

    async fn update_authentication_flow(&self, flow: &AuthenticationFlow) -> DomainResult<()> {
        let id = require_id(flow.id.as_deref(), "Authentication flow")?;
        self.put_json(&[flow.realm_id.as_str(), "authentication", "flows", id], flow)
            .await
    }

    async fn delete_authentication_flow(&self, realm: &str, flow_id: &str) -> DomainResult<()> {
        self.delete(&[realm, "authentication", "flows", flow_id])
            .await
    }

    // Authentication execution operations
    async fn list_flow_executions(
        &self,
        realm: &str,
        flow_alias: &str,
    ) -> DomainResult<Vec<AuthenticationExecutionInfo>> {
        self.get_json(
            &[realm, "authentication", "flows", flow_alias, "executions"],
            &[],
        )
        .await
    }

    async fn update_flow_execution(
        &self,
        realm: &str,
        flow_alias: &str,
        execution: &AuthenticationExecutionInfo,
    ) -> DomainResult<()> {
        self.put_json(
            &[realm, "authentication", "flows", flow_alias, "executions"],
            execution,
        )
        .await
    }

    async fn create_sub_flow(
        &self,
        realm: &str,
        parent_flow_alias: &str,
        sub_flow: &SubFlowCreation,
    ) -> DomainResult<EntityId> {
        self.create(
            &[
                realm,
                "authentication",
                "flows",
                parent_flow_alias,
                "executions",
                "flow",
            ],
            sub_flow,
        )
        .await
    }

    async fn delete_execution(&self, realm: &str, execution_id: &str) -> DomainResult<()> {
        self.delete(&[realm, "authentication", "executions", execution_id])
            .await
    }

    // Component operations
    async fn create_component(
        &self,
        realm: &str,
        component: &Component,
    ) -> DomainResult<EntityId> {
        self.create(&[realm, "components"], component).await
    }

    async fn get_component(&self, realm: &str, component_id: &str) -> DomainResult<Component> {
        self.get_json(&[realm, "components", component_id], &[])
            .await
    }

    async fn list_components(
        &self,
        realm: &str,
        parent_id: &str,
        provider_type: &str,
    ) -> DomainResult<Vec<Component>> {
        self.get_json(
            &[realm, "components"],
            &[("parent", parent_id), ("type", provider_type)],
        )
        .await
    }

    async fn update_component(&self, realm: &str, component: &Component) -> DomainResult<()> {
        let id = require_id(component.id.as_ref().map(EntityId::as_str), "Component")?;
        self.put_json(&[realm, "components", id], component).await
    }

    async fn delete_component(&self, realm: &str, component_id: &str) -> DomainResult<()> {
        self.delete(&[realm, "components", component_id]).await
    }

    // Client scope operations
    async fn create_client_scope(
        &self,
        realm: &str,
        scope: &ClientScopeRepresentation,
    ) -> DomainResult<EntityId> {
        self.create(&[realm, "client-scopes"], scope).await
    }

    async fn get_client_scope(
        &self,
        realm: &str,
        scope_id: &str,
    ) -> DomainResult<ClientScopeRepresentation> {
        self.get_json(&[realm, "client-scopes", scope_id], &[]).await
    }

    async fn list_client_scopes(
        &self,
        realm: &str,
    ) -> DomainResult<Vec<ClientScopeRepresentation>> {
        self.get_json(&[realm, "client-scopes"], &[]).await
    }

    async fn update_client_scope(
        &self,
        realm: &str,
        scope: &ClientScopeRepresentation,
    ) -> DomainResult<()> {
        let id = require_id(scope.id.as_deref(), "Client scope")?;
        self.put_json(&[realm, "client-scopes", id], scope).await
    }

    async fn delete_client_scope(&self, realm: &str, scope_id: &str) -> DomainResult<()> {
        self.delete(&[realm, "client-scopes", scope_id]).await
    }

    // Client default scope relations
    async fn list_client_default_scopes(
        &self,
        realm: &str,
        client_id: &str,
    ) -> DomainResult<Vec<ClientScopeRepresentation>> {
        self.get_json(&[realm, "clients", client_id, "default-client-scopes"], &[])
            .await
    }

    async fn add_client_default_scope(
        &self,
        realm: &str,
        client_id: &str,
        scope_id: &str,
    ) -> DomainResult<()> {
        self.put_empty(&[
            realm,
            "clients",
            client_id,
            "default-client-scopes",
            scope_id,
        ])
        .await
    }

    async fn remove_client_default_scope(
        &self,
        realm: &str,
        client_id: &str,
        scope_id: &str,
    ) -> DomainResult<()> {
        self.delete(&[
            realm,
            "clients",
            client_id,
            "default-client-scopes",
            scope_id,
        ])
        .await
    }

    // Identity provider mapper operations
    async fn create_identity_provider_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<EntityId> {
        self.create(
            &[
                mapper.realm.as_str(),
                "identity-provider",
                "instances",
                mapper.identity_provider_alias.as_str(),
                "mappers",
            ],
            mapper,
        )
        .await
    }

    async fn get_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> DomainResult<IdentityProviderMapper> {
        let mut mapper: IdentityProviderMapper = self
            .get_json(
                &[realm, "identity-provider", "instances", alias, "mappers", mapper_id],
                &[],
            )
            .await?;
        mapper.realm = realm.to_string();
        Ok(mapper)
    }

    async fn list_identity_provider_mappers(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<Vec<IdentityProviderMapper>> {
        let mut mappers: Vec<IdentityProviderMapper> = self
            .get_json(
                &[realm, "identity-provider", "instances", alias, "mappers"],
                &[],
            )
            .await?;
        for mapper in &mut mappers {
            mapper.realm = realm.to_string();
        }
        Ok(mappers)
    }

    async fn update_identity_provider_mapper(
        &self,
        mapper: &IdentityProviderMapper,
    ) -> DomainResult<()> {
        let id = require_id(mapper.id.as_deref(), "Identity provider mapper")?;
        self.put_json(
            &[
                mapper.realm.as_str(),
                "identity-provider",
                "instances",
                mapper.identity_provider_alias.as_str(),
                "mappers",
                id,
            ],
            mapper,
        )
        .await
    }

    async fn delete_identity_provider_mapper(
        &self,
        realm: &str,
        alias: &str,
        mapper_id: &str,
    ) -> DomainResult<()> {
        self.delete(&[realm, "identity-provider", "instances", alias, "mappers", mapper_id])
            .await
    }
}
