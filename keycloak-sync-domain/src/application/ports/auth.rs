use crate::domain::errors::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin bearer token issued by the Keycloak token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
}

impl AuthToken {
    pub fn new(
        access_token: String,
        expires_in: i64,
        refresh_token: Option<String>,
        token_type: Option<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
            token_type: token_type.unwrap_or_else(|| "Bearer".to_string()),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_expiring_soon(&self, seconds: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(seconds) >= self.expires_at
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Credentials used to obtain an admin token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub realm: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AdminCredentials {
    /// `password` grant against `client_id` (usually `admin-cli`)
    pub fn password(
        realm: String,
        client_id: String,
        username: String,
        password: String,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            realm,
            client_id,
            client_secret,
            username: Some(username),
            password: Some(password),
        }
    }

    /// `client_credentials` grant for a service account client
    pub fn service_account(realm: String, client_id: String, client_secret: String) -> Self {
        Self {
            realm,
            client_id,
            client_secret: Some(client_secret),
            username: None,
            password: None,
        }
    }

    pub fn grant_type(&self) -> &'static str {
        if self.username.is_some() && self.password.is_some() {
            "password"
        } else {
            "client_credentials"
        }
    }
}

/// Token management port
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Acquire a new token using credentials
    async fn acquire_token(&self, credentials: &AdminCredentials) -> Result<AuthToken, AuthError>;

    /// Refresh an existing token
    async fn refresh_token(
        &self,
        credentials: &AdminCredentials,
        token: &AuthToken,
    ) -> Result<AuthToken, AuthError>;
}
