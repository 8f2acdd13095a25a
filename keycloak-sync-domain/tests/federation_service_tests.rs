use keycloak_sync_domain::{
    application::services::LdapFederationService,
    domain::{entities::*, errors::DomainError},
};
use std::sync::Arc;
use std::time::Duration;

mod mocks;
use mocks::MockKeycloakRepository;

const REALM: &str = "test-realm";

fn ldap(name: &str) -> LdapUserFederation {
    let mut federation = LdapUserFederation::new(
        REALM,
        name,
        "ldap://ldap.example.com:389",
        "ou=people,dc=example,dc=com",
    );
    federation.bind_dn = Some("cn=admin,dc=example,dc=com".to_string());
    federation.bind_credential = Some("s3cret".to_string());
    federation.connection_timeout = Some(Duration::from_secs(5));
    federation
}

/// Replace the stored bind credential with the placeholder Keycloak returns on reads
fn mask_credential(repository: &MockKeycloakRepository, component_id: &str) {
    let mut state = repository.state.lock().unwrap();
    if let Some((_, component)) = state.components.get_mut(component_id) {
        component
            .config
            .insert("bindCredential".to_string(), vec![MASKED_SECRET.to_string()]);
    }
}

#[tokio::test]
async fn test_create_federation_keeps_default_mappers() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());

    let created = service.create_federation(&ldap("corp"), false).await.unwrap();
    let id = created.id.clone().unwrap();

    let mappers = service.list_mappers(REALM, id.as_str()).await.unwrap();
    assert_eq!(mappers.len(), 2);
    assert!(repository.calls_to("delete_component").is_empty());
}

#[tokio::test]
async fn test_create_federation_deletes_default_mappers() {
    // Arrange
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());

    // Act
    let created = service.create_federation(&ldap("corp"), true).await.unwrap();

    // Assert
    let id = created.id.clone().unwrap();
    assert!(service.list_mappers(REALM, id.as_str()).await.unwrap().is_empty());
    assert_eq!(repository.calls_to("delete_component").len(), 2);
    assert!(repository.component(id.as_str()).is_some());
}

#[tokio::test]
async fn test_create_federation_validates_before_sending() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());
    let mut federation = ldap("corp");
    federation.bind_credential = None;

    let result = service.create_federation(&federation, false).await;

    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert!(repository.calls().is_empty());
}

#[tokio::test]
async fn test_get_federation_keeps_local_credential_when_masked() {
    // Arrange
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());
    let created = service.create_federation(&ldap("corp"), true).await.unwrap();
    let id = created.id.clone().unwrap();
    mask_credential(&repository, id.as_str());

    // Act
    let read = service
        .get_federation(REALM, id.as_str(), Some("s3cret".to_string()))
        .await
        .unwrap();

    // Assert
    assert_eq!(read.bind_credential.as_deref(), Some("s3cret"));
    assert_eq!(read.realm_id, REALM);
    assert_eq!(read.connection_timeout, Some(Duration::from_secs(5)));
    assert_eq!(read.users_dn, "ou=people,dc=example,dc=com");
}

#[tokio::test]
async fn test_get_federation_never_surfaces_masked_value() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());
    let created = service.create_federation(&ldap("corp"), true).await.unwrap();
    let id = created.id.clone().unwrap();
    mask_credential(&repository, id.as_str());

    let read = service.get_federation(REALM, id.as_str(), None).await.unwrap();

    assert!(read.bind_credential.is_none());
}

#[tokio::test]
async fn test_get_federation_rejects_other_providers() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let id = repository.insert_component(
        REALM,
        Component::new("kerberos", "kerberos", USER_STORAGE_PROVIDER_TYPE, "test-realm-id"),
    );
    let service = LdapFederationService::new(repository.clone());

    let result = service.get_federation(REALM, &id, None).await;

    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_federation_requires_id() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());

    let result = service.update_federation(&ldap("corp")).await;

    assert!(matches!(result, Err(DomainError::Validation { .. })));
}

#[tokio::test]
async fn test_update_federation_writes_component() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());
    let mut federation = service.create_federation(&ldap("corp"), true).await.unwrap();
    let id = federation.id.clone().unwrap();

    federation.priority = 7;
    federation.cache = Some(CacheSettings {
        max_lifespan: Some(Duration::from_secs(3600)),
        ..CacheSettings::new(CachePolicy::MaxLifespan)
    });
    service.update_federation(&federation).await.unwrap();

    let read = service
        .get_federation(REALM, id.as_str(), Some("s3cret".to_string()))
        .await
        .unwrap();
    assert_eq!(read.priority, 7);
    assert_eq!(read.cache, federation.cache);
}

#[tokio::test]
async fn test_mapper_lifecycle() {
    // Arrange
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());
    let federation = service.create_federation(&ldap("corp"), true).await.unwrap();
    let federation_id = federation.id.unwrap().as_str().to_string();

    let mapper = LdapMapper {
        id: None,
        name: "admins".to_string(),
        realm_id: REALM.to_string(),
        ldap_user_federation_id: federation_id.clone(),
        kind: LdapMapperKind::HardcodedRole {
            role: "admin".to_string(),
        },
    };

    // Act
    let created = service.create_mapper(&mapper).await.unwrap();
    let mapper_id = created.id.clone().unwrap();

    // Assert
    let read = service.get_mapper(REALM, &mapper_id).await.unwrap();
    assert_eq!(read.kind, mapper.kind);
    assert_eq!(read.ldap_user_federation_id, federation_id);

    let listed = service.list_mappers(REALM, &federation_id).await.unwrap();
    assert_eq!(listed.len(), 1);

    service.delete_mapper(REALM, &mapper_id).await.unwrap();
    assert!(service
        .get_mapper(REALM, &mapper_id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_list_mappers_skips_unknown_providers() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());
    let federation = service.create_federation(&ldap("corp"), true).await.unwrap();
    let federation_id = federation.id.unwrap().as_str().to_string();
    repository.insert_component(
        REALM,
        Component::new(
            "certificate",
            "certificate-ldap-mapper",
            LDAP_MAPPER_PROVIDER_TYPE,
            federation_id.as_str(),
        ),
    );

    let mappers = service.list_mappers(REALM, &federation_id).await.unwrap();

    assert!(mappers.is_empty());
}

#[tokio::test]
async fn test_delete_federation_removes_its_mappers() {
    let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
    let service = LdapFederationService::new(repository.clone());
    let federation = service.create_federation(&ldap("corp"), false).await.unwrap();
    let id = federation.id.unwrap();

    service.delete_federation(REALM, id.as_str()).await.unwrap();

    assert!(repository.state.lock().unwrap().components.is_empty());
}
