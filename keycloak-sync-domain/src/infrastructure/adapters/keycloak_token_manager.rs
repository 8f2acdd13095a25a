use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::auth::*;
use crate::domain::errors::*;

/// Raw token response from Keycloak
#[derive(Debug, Clone, Deserialize)]
struct RawTokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
    token_type: Option<String>,
}

/// OpenID Connect token endpoint client for the admin credentials
pub struct KeycloakTokenManager {
    /// `{url}{base_path}`, without trailing slash
    server_root: String,
    client: reqwest::Client,
}

impl KeycloakTokenManager {
    pub fn new(server_root: String) -> Self {
        Self::new_with_client(server_root, reqwest::Client::new())
    }

    pub fn new_with_client(server_root: String, client: reqwest::Client) -> Self {
        Self {
            server_root: server_root.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn token_url(&self, realm: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.server_root, realm
        )
    }

    async fn request_token(
        &self,
        realm: &str,
        form: &[(&str, &str)],
    ) -> Result<RawTokenResponse, String> {
        let response = self
            .client
            .post(self.token_url(realm))
            .form(form)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("HTTP error {status}: {error_text}"));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Failed to parse token response: {e}"))
    }

    /// Convert raw token response to our domain AuthToken
    fn convert_raw_token(raw_token: RawTokenResponse) -> AuthToken {
        AuthToken::new(
            raw_token.access_token,
            raw_token.expires_in,
            raw_token.refresh_token,
            raw_token.token_type,
        )
    }
}

#[async_trait]
impl TokenManager for KeycloakTokenManager {
    async fn acquire_token(&self, credentials: &AdminCredentials) -> Result<AuthToken, AuthError> {
        let mut form = vec![
            ("client_id", credentials.client_id.as_str()),
            ("grant_type", credentials.grant_type()),
        ];
        if let Some(secret) = &credentials.client_secret {
            form.push(("client_secret", secret.as_str()));
        }
        if let (Some(username), Some(password)) = (&credentials.username, &credentials.password) {
            form.push(("username", username.as_str()));
            form.push(("password", password.as_str()));
        }

        debug!(
            realm = %credentials.realm,
            client_id = %credentials.client_id,
            grant_type = credentials.grant_type(),
            "Acquiring admin token"
        );

        let raw_token = self
            .request_token(&credentials.realm, &form)
            .await
            .map_err(|reason| AuthError::TokenAcquisitionFailed { reason })?;

        Ok(Self::convert_raw_token(raw_token))
    }

    async fn refresh_token(
        &self,
        credentials: &AdminCredentials,
        token: &AuthToken,
    ) -> Result<AuthToken, AuthError> {
        let refresh_token =
            token
                .refresh_token
                .as_deref()
                .ok_or_else(|| AuthError::TokenRefreshFailed {
                    reason: "No refresh token available".to_string(),
                })?;

        let mut form = vec![
            ("client_id", credentials.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = &credentials.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let raw_token = self
            .request_token(&credentials.realm, &form)
            .await
            .map_err(|reason| AuthError::TokenRefreshFailed { reason })?;

        Ok(Self::convert_raw_token(raw_token))
    }
}
