#![allow(dead_code)]

use keycloak_sync_domain::{
    application::{
        ports::{HttpConfig, KeycloakConfig},
        services::LookupRetry,
    },
    infrastructure::adapters::{KeycloakRestAdapter, KeycloakTokenManager},
};
use keycloak_sync_provider::AppState;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";

/// Mock Keycloak with a password grant that always succeeds
pub async fn keycloak() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "expires_in": 300,
            "token_type": "Bearer"
        })))
        .mount(&server)
        .await;
    server
}

pub fn state_for(server: &MockServer) -> AppState {
    let config = KeycloakConfig {
        url: server.uri(),
        base_path: String::new(),
        realm: "master".to_string(),
        client_id: "admin-cli".to_string(),
        client_secret: None,
        username: Some("admin".to_string()),
        password: Some("admin".to_string()),
        additional_headers: BTreeMap::new(),
    };
    let tokens = Arc::new(KeycloakTokenManager::new(config.get_server_root()));
    let repository =
        Arc::new(KeycloakRestAdapter::new(&config, &HttpConfig::default(), tokens).unwrap());

    AppState::with_repository(
        repository,
        LookupRetry {
            attempts: 1,
            delay: Duration::from_millis(1),
        },
    )
}

pub async fn mount_json(server: &MockServer, http_method: &str, route: &str, body: serde_json::Value) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, http_method: &str, route: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Create endpoint answering 201 with the new entity's `Location`, matching a body subset
pub async fn mount_created(
    server: &MockServer,
    route: &str,
    expected_body: serde_json::Value,
    new_id: &str,
) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(body_partial_json(expected_body))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", format!("{}{route}/{new_id}", server.uri()).as_str()),
        )
        .expect(1)
        .mount(server)
        .await;
}
