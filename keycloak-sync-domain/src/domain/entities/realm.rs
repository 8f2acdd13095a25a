use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

wire_enum! {
    /// SSL requirement levels
    #[derive(Default)]
    pub enum SslRequired {
        None => "none",
        #[default]
        External => "external",
        All => "all",
    }
}

/// Reference to a role as embedded in a realm representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleReference {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Domain entity representing a Keycloak realm.
///
/// Fields the client does not model are kept in `extra` so a
/// GET, modify, PUT cycle never drops server state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Realm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub realm: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_html: Option<String>,
    #[serde(default)]
    pub user_managed_access_allowed: bool,

    // Login settings
    #[serde(default)]
    pub registration_allowed: bool,
    #[serde(default)]
    pub registration_email_as_username: bool,
    #[serde(default)]
    pub edit_username_allowed: bool,
    #[serde(default)]
    pub reset_password_allowed: bool,
    #[serde(default)]
    pub remember_me: bool,
    #[serde(default)]
    pub verify_email: bool,
    #[serde(default)]
    pub login_with_email_allowed: bool,
    #[serde(default)]
    pub duplicate_emails_allowed: bool,
    #[serde(default)]
    pub ssl_required: SslRequired,

    // Themes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_theme: Option<String>,

    // Token and session lifespans, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_lifespan: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code_lifespan: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_session_idle_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_session_max_lifespan: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_session_idle_timeout: Option<i64>,
    #[serde(default)]
    pub revoke_refresh_token: bool,
    #[serde(default)]
    pub refresh_token_max_reuse: i64,

    // Internationalization
    #[serde(default)]
    pub internationalization_enabled: bool,
    #[serde(default)]
    pub supported_locales: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,

    // Brute force detection
    #[serde(default)]
    pub brute_force_protected: bool,
    #[serde(default)]
    pub permanent_lockout: bool,
    #[serde(default)]
    pub failure_factor: i64,
    #[serde(default)]
    pub wait_increment_seconds: i64,
    #[serde(default)]
    pub quick_login_check_milli_seconds: i64,
    #[serde(default)]
    pub minimum_quick_login_wait_seconds: i64,
    #[serde(default)]
    pub max_failure_wait_seconds: i64,
    #[serde(default)]
    pub max_delta_time_seconds: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_policy: Option<String>,

    // Flow bindings (aliases)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_grant_flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_credentials_flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_authentication_flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_authentication_flow: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_role: Option<RoleReference>,

    /// Desired default-default client scope names; synced through relation endpoints
    #[serde(default, skip_serializing)]
    pub default_default_client_scopes: Vec<String>,
    /// Desired default-optional client scope names; synced through relation endpoints
    #[serde(default, skip_serializing)]
    pub default_optional_client_scopes: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Realm {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            id: None,
            realm: realm.into(),
            enabled: true,
            display_name: None,
            display_name_html: None,
            user_managed_access_allowed: false,
            registration_allowed: false,
            registration_email_as_username: false,
            edit_username_allowed: false,
            reset_password_allowed: false,
            remember_me: false,
            verify_email: false,
            login_with_email_allowed: true,
            duplicate_emails_allowed: false,
            ssl_required: SslRequired::External,
            login_theme: None,
            account_theme: None,
            admin_theme: None,
            email_theme: None,
            access_token_lifespan: None,
            access_code_lifespan: None,
            sso_session_idle_timeout: None,
            sso_session_max_lifespan: None,
            offline_session_idle_timeout: None,
            revoke_refresh_token: false,
            refresh_token_max_reuse: 0,
            internationalization_enabled: false,
            supported_locales: Vec::new(),
            default_locale: None,
            brute_force_protected: false,
            permanent_lockout: false,
            failure_factor: 30,
            wait_increment_seconds: 60,
            quick_login_check_milli_seconds: 1000,
            minimum_quick_login_wait_seconds: 60,
            max_failure_wait_seconds: 900,
            max_delta_time_seconds: 43200,
            password_policy: None,
            browser_flow: None,
            registration_flow: None,
            direct_grant_flow: None,
            reset_credentials_flow: None,
            client_authentication_flow: None,
            docker_authentication_flow: None,
            default_role: None,
            default_default_client_scopes: Vec::new(),
            default_optional_client_scopes: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Validate realm name according to business rules
    pub fn validate_realm_name(realm: &str) -> DomainResult<()> {
        if realm.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "realm".to_string(),
                message: "Realm name cannot be empty".to_string(),
            });
        }

        if realm.contains('/') {
            return Err(DomainError::Validation {
                field: "realm".to_string(),
                message: "Realm name cannot contain '/'".to_string(),
            });
        }

        Ok(())
    }

    /// Cross-field checks Keycloak would otherwise reject or silently ignore
    pub fn validate(&self) -> DomainResult<()> {
        Self::validate_realm_name(&self.realm)?;

        if self.duplicate_emails_allowed && self.registration_email_as_username {
            return Err(DomainError::validation(
                "duplicate_emails_allowed",
                "cannot be true if registration_email_as_username is true",
            ));
        }

        if self.duplicate_emails_allowed && self.login_with_email_allowed {
            return Err(DomainError::validation(
                "duplicate_emails_allowed",
                "cannot be true if login_with_email_allowed is true",
            ));
        }

        if self.internationalization_enabled {
            let default_locale = self.default_locale.as_deref().unwrap_or_default();
            if !self.supported_locales.iter().any(|l| l == default_locale) {
                return Err(DomainError::validation(
                    "default_locale",
                    "must be one of the supported locales",
                ));
            }
        }

        if let Some(policy) = &self.password_policy {
            if policy.trim().is_empty() {
                return Err(DomainError::validation(
                    "password_policy",
                    "Password policy cannot be empty",
                ));
            }
        }

        Ok(())
    }

    /// Overlay the locally managed fields onto a representation fetched from the server
    pub fn merged_onto(&self, mut remote: Realm) -> Realm {
        let extra = std::mem::take(&mut remote.extra);
        let default_role = remote.default_role.take();
        let mut merged = self.clone();
        merged.id = remote.id.or_else(|| self.id.clone());
        merged.default_role = self.default_role.clone().or(default_role);
        for (key, value) in extra {
            merged.extra.entry(key).or_insert(value);
        }
        merged
    }
}
