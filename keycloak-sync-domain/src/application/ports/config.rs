use super::auth::AdminCredentials;
use crate::domain::errors::{ConfigError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration port for accessing application configuration
pub trait ConfigurationPort: Send + Sync {
    /// Get Keycloak server configuration
    fn get_keycloak_config(&self) -> &KeycloakConfig;

    /// Get HTTP client configuration
    fn get_http_config(&self) -> &HttpConfig;

    /// Get reconciliation tuning
    fn get_reconcile_config(&self) -> &ReconcileConfig;

    /// Get logging configuration
    fn get_logging_config(&self) -> &LoggingConfig;

    /// Validate all configuration
    fn validate(&self) -> DomainResult<()>;
}

/// Keycloak server and admin credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    pub url: String,
    /// Path prefix in front of `/admin` and `/realms`, e.g. `/auth` on legacy distributions
    pub base_path: String,
    /// Realm the admin client authenticates against
    pub realm: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub additional_headers: BTreeMap<String, String>,
}

impl KeycloakConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_URL".to_string(),
            }
            .into());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_URL".to_string(),
                message: "Must start with http:// or https://".to_string(),
            }
            .into());
        }

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_BASE_PATH".to_string(),
                message: "Must start with /".to_string(),
            }
            .into());
        }

        if self.client_id.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_CLIENT_ID".to_string(),
            }
            .into());
        }

        let has_password = self.username.is_some() && self.password.is_some();
        if !has_password && self.client_secret.is_none() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_CLIENT_SECRET or KEYCLOAK_USER/KEYCLOAK_PASSWORD".to_string(),
            }
            .into());
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_USER".to_string(),
                message: "KEYCLOAK_USER and KEYCLOAK_PASSWORD must be set together".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// `{url}{base_path}` without trailing slashes
    pub fn get_server_root(&self) -> String {
        format!(
            "{}{}",
            self.url.trim_end_matches('/'),
            self.base_path.trim_end_matches('/')
        )
    }

    /// Root of the admin API, `{url}{base_path}/admin/realms`
    pub fn get_admin_url(&self) -> String {
        format!("{}/admin/realms", self.get_server_root())
    }

    pub fn get_token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.get_server_root(),
            self.realm
        )
    }

    pub fn credentials(&self) -> AdminCredentials {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => AdminCredentials::password(
                self.realm.clone(),
                self.client_id.clone(),
                username.clone(),
                password.clone(),
                self.client_secret.clone(),
            ),
            _ => AdminCredentials::service_account(
                self.realm.clone(),
                self.client_id.clone(),
                self.client_secret.clone().unwrap_or_default(),
            ),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub tls_insecure_skip_verify: bool,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            tls_insecure_skip_verify: false,
            user_agent: concat!("keycloak-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_CLIENT_TIMEOUT".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Tuning for the read-after-write lookups done during reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Extra attempts after the first lookup comes back empty
    pub lookup_retry_attempts: u32,
    pub lookup_retry_delay_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            lookup_retry_attempts: 3,
            lookup_retry_delay_ms: 50,
        }
    }
}

impl ReconcileConfig {
    pub fn get_lookup_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_retry_delay_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log format enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub keycloak: KeycloakConfig,
    pub http: HttpConfig,
    pub reconcile: ReconcileConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> DomainResult<()> {
        self.keycloak.validate()?;
        self.http.validate()?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = HttpConfig::default();

        let keycloak = KeycloakConfig {
            url: var("KEYCLOAK_URL").ok_or_else(|| ConfigError::MissingRequired {
                key: "KEYCLOAK_URL".to_string(),
            })?,
            base_path: var("KEYCLOAK_BASE_PATH").unwrap_or_default(),
            realm: var("KEYCLOAK_REALM").unwrap_or_else(|| "master".to_string()),
            client_id: var("KEYCLOAK_CLIENT_ID").unwrap_or_else(|| "admin-cli".to_string()),
            client_secret: var("KEYCLOAK_CLIENT_SECRET"),
            username: var("KEYCLOAK_USER"),
            password: var("KEYCLOAK_PASSWORD"),
            additional_headers: parse_headers(
                &var("KEYCLOAK_ADDITIONAL_HEADERS").unwrap_or_default(),
            )?,
        };

        let http = HttpConfig {
            timeout_seconds: var("KEYCLOAK_CLIENT_TIMEOUT")
                .unwrap_or_else(|| "15".to_string())
                .parse()
                .unwrap_or(15),
            tls_insecure_skip_verify: var("KEYCLOAK_TLS_INSECURE_SKIP_VERIFY")
                .unwrap_or_else(|| "false".to_string())
                .parse()
                .unwrap_or(false),
            user_agent: var("KEYCLOAK_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        let reconcile = ReconcileConfig {
            lookup_retry_attempts: var("KEYCLOAK_LOOKUP_RETRY_ATTEMPTS")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .unwrap_or(3),
            lookup_retry_delay_ms: var("KEYCLOAK_LOOKUP_RETRY_DELAY_MS")
                .unwrap_or_else(|| "50".to_string())
                .parse()
                .unwrap_or(50),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .parse()
                .unwrap_or(LogLevel::Info),
            format: var("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .parse()
                .unwrap_or(LogFormat::Compact),
        };

        let config = AppConfig {
            keycloak,
            http,
            reconcile,
            logging,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Parse `Name=value,Other=value` into a header map
fn parse_headers(raw: &str) -> DomainResult<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_ADDITIONAL_HEADERS".to_string(),
                message: format!("expected Name=value, got `{pair}`"),
            }
            .into()),
        })
        .collect()
}

/// String parsing implementations
impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_password_grant_with_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("KEYCLOAK_URL", "http://localhost:8080"),
            ("KEYCLOAK_USER", "admin"),
            ("KEYCLOAK_PASSWORD", "admin"),
        ]))
        .unwrap();

        assert_eq!(config.keycloak.client_id, "admin-cli");
        assert_eq!(config.keycloak.credentials().grant_type(), "password");
        assert_eq!(config.reconcile.lookup_retry_attempts, 3);
        assert_eq!(
            config.keycloak.get_token_url(),
            "http://localhost:8080/realms/master/protocol/openid-connect/token"
        );
    }

    #[test]
    fn base_path_prefixes_admin_url() {
        let config = AppConfig::from_lookup(lookup(&[
            ("KEYCLOAK_URL", "http://localhost:8080/"),
            ("KEYCLOAK_BASE_PATH", "/auth"),
            ("KEYCLOAK_CLIENT_ID", "terraform"),
            ("KEYCLOAK_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(
            config.keycloak.get_admin_url(),
            "http://localhost:8080/auth/admin/realms"
        );
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let result = AppConfig::from_lookup(lookup(&[("KEYCLOAK_URL", "http://localhost:8080")]));
        assert!(result.is_err());
    }

    #[test]
    fn additional_headers_are_parsed() {
        let headers = parse_headers("X-Tenant=a, X-Trace = on").unwrap();
        assert_eq!(headers.get("X-Tenant").map(String::as_str), Some("a"));
        assert_eq!(headers.get("X-Trace").map(String::as_str), Some("on"));
        assert!(parse_headers("broken").is_err());
    }
}
