use thiserror::Error;

/// Domain-specific errors for Keycloak synchronization
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("{entity_type} already exists: {identifier}")]
    Conflict {
        entity_type: String,
        identifier: String,
    },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Keycloak rejected the request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    #[error("Keycloak server error ({status}): {message}")]
    TransientServerError { status: u16, message: String },

    #[error("Malformed value for config key `{key}`: {value:?}")]
    MalformedValue { key: String, value: String },

    #[error("Invalid import id `{id}`. Supported import formats: {formats}")]
    InvalidImportFormat { id: String, formats: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },
}

impl DomainError {
    pub fn not_found(entity_type: &str, identifier: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity_type: entity_type.to_string(),
            identifier: identifier.into(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed(key: &str, value: &str) -> Self {
        DomainError::MalformedValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict { .. })
    }

    /// 5xx responses; the only kind a delete is retried on.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::TransientServerError { .. })
    }

    /// True when the server answered `status` with a body containing `needle`.
    pub fn remote_message_contains(&self, status: u16, needle: &str) -> bool {
        match self {
            DomainError::RemoteRejected {
                status: actual,
                message,
            }
            | DomainError::TransientServerError {
                status: actual,
                message,
            } => *actual == status && message.contains(needle),
            _ => false,
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Authentication-specific errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token acquisition failed: {reason}")]
    TokenAcquisitionFailed { reason: String },

    #[error("Token refresh failed: {reason}")]
    TokenRefreshFailed { reason: String },
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => DomainError::AuthenticationFailed {
                reason: "Invalid credentials".to_string(),
            },
            AuthError::TokenAcquisitionFailed { reason } => {
                DomainError::AuthenticationFailed { reason }
            }
            AuthError::TokenRefreshFailed { reason } => {
                DomainError::AuthenticationFailed { reason }
            }
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired { key } => DomainError::Configuration {
                message: format!("Missing required configuration: {key}"),
            },
            ConfigError::InvalidValue { key, message } => DomainError::Configuration {
                message: format!("Invalid value for {key}: {message}"),
            },
        }
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DomainError::Serialization {
                message: err.to_string(),
            }
        } else {
            DomainError::Transport {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_message_matching_checks_status_and_body() {
        let err = DomainError::RemoteRejected {
            status: 400,
            message: r#"{"errorMessage":"Can't delete built in flow"}"#.to_string(),
        };
        assert!(err.remote_message_contains(400, "Can't delete built in flow"));
        assert!(!err.remote_message_contains(500, "Can't delete built in flow"));
        assert!(!err.is_transient());
    }

    #[test]
    fn transient_errors_are_flagged() {
        let err = DomainError::TransientServerError {
            status: 500,
            message: "unknown_error".to_string(),
        };
        assert!(err.is_transient());
        assert!(err.remote_message_contains(500, "unknown_error"));
    }
}
