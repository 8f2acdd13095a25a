use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keycloak_sync_domain::domain::errors::DomainError;
use serde_json::json;
use thiserror::Error;

use crate::resources::Operation;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{operation} {resource}: {source}")]
    Operation {
        resource: String,
        operation: Operation,
        #[source]
        source: DomainError,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid attribute `{name}`: {message}")]
    InvalidAttribute { name: String, message: String },

    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl ProviderError {
    pub fn invalid_attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Attach resource and operation context to a bare domain error
    pub fn in_operation(self, resource: &str, operation: Operation) -> Self {
        match self {
            ProviderError::Domain(source) => ProviderError::Operation {
                resource: resource.to_string(),
                operation,
                source,
            },
            other => other,
        }
    }

    /// The domain error underneath any added context
    pub fn domain_error(&self) -> Option<&DomainError> {
        match self {
            ProviderError::Operation { source, .. } => Some(source),
            ProviderError::Domain(source) => Some(source),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.domain_error().is_some_and(DomainError::is_not_found)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProviderError::InvalidAttribute { .. } => StatusCode::BAD_REQUEST,
            ProviderError::UnknownResource(_) | ProviderError::UnknownOperation(_) => {
                StatusCode::NOT_FOUND
            }
            ProviderError::Operation { source, .. } | ProviderError::Domain(source) => {
                match source {
                    DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                    DomainError::Conflict { .. } => StatusCode::CONFLICT,
                    DomainError::Validation { .. }
                    | DomainError::MalformedValue { .. }
                    | DomainError::InvalidImportFormat { .. } => StatusCode::BAD_REQUEST,
                    DomainError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
                    DomainError::RemoteRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    DomainError::TransientServerError { .. } | DomainError::Transport { .. } => {
                        StatusCode::BAD_GATEWAY
                    }
                    DomainError::Serialization { .. } | DomainError::Configuration { .. } => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                }
            }
        }
    }
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_context_keeps_the_error_kind() {
        let error = ProviderError::from(DomainError::not_found("Authentication flow", "abc"))
            .in_operation("keycloak_authentication_flow", Operation::Read);

        assert!(error.is_not_found());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert!(error.to_string().starts_with("read keycloak_authentication_flow"));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                DomainError::Conflict {
                    entity_type: "Realm".to_string(),
                    identifier: "test".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                DomainError::validation("alias", "empty"),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::InvalidImportFormat {
                    id: "a/b/c/d".to_string(),
                    formats: "{realm}/{flowId}".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::TransientServerError {
                    status: 503,
                    message: "down".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                DomainError::RemoteRejected {
                    status: 400,
                    message: "nope".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ProviderError::from(error).status_code(), expected);
        }
    }

    #[test]
    fn test_attribute_errors_are_bad_requests() {
        let error = ProviderError::invalid_attribute("priority", "expected an integer");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.domain_error().is_none());
    }
}
