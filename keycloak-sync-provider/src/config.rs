use keycloak_sync_domain::{
    application::ports::AppConfig,
    domain::errors::{DomainError, DomainResult},
};

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PROVIDER_PORT").filter(|value| !value.is_empty()) {
            None => DEFAULT_PORT,
            Some(value) => value.parse().map_err(|_| DomainError::Configuration {
                message: format!("Invalid PROVIDER_PORT: {value}"),
            })?,
        };

        Ok(Self {
            app: AppConfig::from_lookup(&lookup)?,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_port_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("KEYCLOAK_URL", "http://localhost:8080"),
            ("KEYCLOAK_USER", "admin"),
            ("KEYCLOAK_PASSWORD", "admin"),
        ]))
        .unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.app.keycloak.realm, "master");
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_lookup(lookup(&[
            ("KEYCLOAK_URL", "http://localhost:8080"),
            ("KEYCLOAK_USER", "admin"),
            ("KEYCLOAK_PASSWORD", "admin"),
            ("PROVIDER_PORT", "eighty"),
        ]));

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
