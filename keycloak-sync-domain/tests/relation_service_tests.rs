use keycloak_sync_domain::{
    application::{
        ports::DefaultScopeKind,
        services::{
            ClientDefaultScopesService, ClientScopeService, DefaultRolesService,
            IdentityProviderMapperService, LookupRetry, RealmManagementService,
        },
    },
    domain::{entities::*, errors::DomainError},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

mod mocks;
use mocks::MockKeycloakRepository;

const REALM: &str = "test-realm";

fn quick_lookup() -> LookupRetry {
    LookupRetry {
        attempts: 1,
        delay: Duration::from_millis(1),
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

mod realm_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_realm_attaches_default_scopes() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new());
        let service = RealmManagementService::new(repository.clone());
        let mut realm = Realm::new(REALM);
        realm.default_default_client_scopes = names(&["profile", "email"]);

        // Scopes exist before the realm is created in this fake
        repository.add_client_scope(REALM, "profile", "openid-connect");
        repository.add_client_scope(REALM, "email", "openid-connect");

        // Act
        let created = service.create_realm(&realm).await.unwrap();

        // Assert
        let mut attached = created.default_default_client_scopes.clone();
        attached.sort();
        assert_eq!(attached, names(&["email", "profile"]));
        assert!(created.default_optional_client_scopes.is_empty());
        assert!(repository.calls_to("remove_realm_default_scope").is_empty());
    }

    #[tokio::test]
    async fn test_sync_default_scopes_touches_only_the_delta() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let a = repository.add_client_scope(REALM, "a", "openid-connect");
        let b = repository.add_client_scope(REALM, "b", "openid-connect");
        let c = repository.add_client_scope(REALM, "c", "openid-connect");
        let d = repository.add_client_scope(REALM, "d", "openid-connect");
        for id in [&a, &b, &c] {
            repository.attach_realm_default_scope(REALM, DefaultScopeKind::Default, id);
        }
        let service = RealmManagementService::new(repository.clone());

        // Act
        service
            .sync_default_scopes(REALM, DefaultScopeKind::Default, &names(&["b", "c", "d"]))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            repository.calls_to("remove_realm_default_scope"),
            vec![format!("remove_realm_default_scope:{a}")]
        );
        assert_eq!(
            repository.calls_to("add_realm_default_scope"),
            vec![format!("add_realm_default_scope:{d}")]
        );

        // Detach happens before attach
        let calls = repository.calls();
        let detach_at = calls.iter().position(|c| c.starts_with("remove_realm")).unwrap();
        let attach_at = calls.iter().position(|c| c.starts_with("add_realm")).unwrap();
        assert!(detach_at < attach_at);
    }

    #[tokio::test]
    async fn test_sync_default_scopes_with_unknown_scope_fails() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let service = RealmManagementService::new(repository.clone());

        let result = service
            .sync_default_scopes(REALM, DefaultScopeKind::Optional, &names(&["missing"]))
            .await;

        match result {
            Err(DomainError::NotFound {
                entity_type,
                identifier,
            }) => {
                assert_eq!(entity_type, "Client scope");
                assert_eq!(identifier, "missing");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_realm_moves_scope_from_optional_to_default() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let x = repository.add_client_scope(REALM, "x", "openid-connect");
        let y = repository.add_client_scope(REALM, "y", "openid-connect");
        repository.attach_realm_default_scope(REALM, DefaultScopeKind::Optional, &x);
        let service = RealmManagementService::new(repository.clone());

        let mut desired = Realm::new(REALM);
        desired.default_default_client_scopes = names(&["x"]);
        desired.default_optional_client_scopes = names(&["y"]);

        // Act
        let updated = service.update_realm(&desired).await.unwrap();

        // Assert
        assert_eq!(updated.default_default_client_scopes, names(&["x"]));
        assert_eq!(updated.default_optional_client_scopes, names(&["y"]));

        let writes: Vec<String> = repository
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("add_realm_default") || c.starts_with("remove_realm_default"))
            .collect();
        assert_eq!(
            writes,
            vec![
                format!("remove_realm_default_scope:{x}"),
                format!("add_realm_default_scope:{x}"),
                format!("add_realm_default_scope:{y}"),
            ]
        );
    }

    #[tokio::test]
    async fn test_sync_with_unknown_scope_changes_nothing() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let a = repository.add_client_scope(REALM, "a", "openid-connect");
        repository.attach_realm_default_scope(REALM, DefaultScopeKind::Default, &a);
        let service = RealmManagementService::new(repository.clone());

        // Act
        let result = service
            .sync_default_scopes(REALM, DefaultScopeKind::Default, &names(&["missing"]))
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert!(repository.calls_to("remove_realm_default_scope").is_empty());
        assert!(repository.calls_to("add_realm_default_scope").is_empty());
    }

    #[tokio::test]
    async fn test_update_realm_merges_onto_remote_and_keeps_unmanaged_scopes() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let kept = repository.add_client_scope(REALM, "kept", "openid-connect");
        repository.attach_realm_default_scope(REALM, DefaultScopeKind::Default, &kept);
        let service = RealmManagementService::new(repository.clone());

        let mut desired = Realm::new(REALM);
        desired.display_name = Some("Test".to_string());

        // Act
        let updated = service.update_realm(&desired).await.unwrap();

        // Assert
        assert_eq!(updated.display_name.as_deref(), Some("Test"));
        assert!(updated.default_role.is_some());
        assert_eq!(updated.default_default_client_scopes, names(&["kept"]));
    }

    #[tokio::test]
    async fn test_delete_realm_retries_once() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        repository.fail_next(
            "delete_realm",
            DomainError::TransientServerError {
                status: 500,
                message: "boom".to_string(),
            },
        );
        let service = RealmManagementService::new(repository.clone());

        service.delete_realm(REALM).await.unwrap();

        assert_eq!(repository.calls_to("delete_realm").len(), 2);
        assert!(service.get_realm(REALM).await.unwrap_err().is_not_found());
    }
}

mod default_roles_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_default_roles_applies_delta() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let default_role_id = format!("default-role-{REALM}");
        let offline = repository.add_role(REALM, "offline_access");
        let uma = repository.add_role(REALM, "uma_authorization");
        repository.add_role(REALM, "reader");
        repository.add_composite(&default_role_id, offline);
        repository.add_composite(&default_role_id, uma);
        let service = DefaultRolesService::new(repository.clone());

        // Act
        let updated = service
            .update_default_roles(&DefaultRoles::new(REALM, ["offline_access", "reader"]))
            .await
            .unwrap();

        // Assert
        assert_eq!(updated.default_role_id.as_deref(), Some(default_role_id.as_str()));
        assert_eq!(
            repository.calls_to("remove_role_composites"),
            vec!["remove_role_composites:uma_authorization".to_string()]
        );
        assert_eq!(
            repository.calls_to("add_role_composites"),
            vec!["add_role_composites:reader".to_string()]
        );

        let read = service.get_default_roles(REALM).await.unwrap();
        let expected: BTreeSet<String> = ["offline_access", "reader"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(read.roles, expected);
    }

    #[tokio::test]
    async fn test_default_roles_ignore_client_role_composites() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let default_role_id = format!("default-role-{REALM}");
        repository.add_composite(
            &default_role_id,
            RoleRepresentation {
                id: Some("client-role".to_string()),
                name: "view-profile".to_string(),
                description: None,
                composite: false,
                client_role: true,
                container_id: Some("account".to_string()),
            },
        );
        let service = DefaultRolesService::new(repository.clone());

        let read = service.get_default_roles(REALM).await.unwrap();
        assert!(read.roles.is_empty());

        service
            .update_default_roles(&DefaultRoles::new(REALM, Vec::<String>::new()))
            .await
            .unwrap();
        assert!(repository.calls_to("remove_role_composites").is_empty());
    }

    #[tokio::test]
    async fn test_update_default_roles_unknown_role_fails() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let service = DefaultRolesService::new(repository.clone());

        let result = service
            .update_default_roles(&DefaultRoles::new(REALM, ["nope"]))
            .await;

        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_role_leaves_composites_untouched() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let default_role_id = format!("default-role-{REALM}");
        let offline = repository.add_role(REALM, "offline_access");
        repository.add_composite(&default_role_id, offline);
        let service = DefaultRolesService::new(repository.clone());

        let result = service
            .update_default_roles(&DefaultRoles::new(REALM, ["nope"]))
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert!(repository.calls_to("remove_role_composites").is_empty());
        let read = service.get_default_roles(REALM).await.unwrap();
        assert_eq!(read.roles.into_iter().collect::<Vec<_>>(), vec!["offline_access"]);
    }

    #[tokio::test]
    async fn test_delete_default_roles_detaches_only_managed_roles() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let default_role_id = format!("default-role-{REALM}");
        let managed = repository.add_role(REALM, "reader");
        let other = repository.add_role(REALM, "writer");
        repository.add_composite(&default_role_id, managed);
        repository.add_composite(&default_role_id, other);
        let service = DefaultRolesService::new(repository.clone());

        service
            .delete_default_roles(&DefaultRoles::new(REALM, ["reader", "gone"]))
            .await
            .unwrap();

        let read = service.get_default_roles(REALM).await.unwrap();
        assert_eq!(read.roles.into_iter().collect::<Vec<_>>(), vec!["writer"]);
    }
}

mod client_scope_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_scope_adopts_existing_openid_scope() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let existing = repository.add_client_scope(REALM, "api", "openid-connect");
        let service = ClientScopeService::new(repository.clone(), quick_lookup());
        let mut scope = OpenidClientScope::new(REALM, "api");
        scope.description = "adopted".to_string();

        // Act
        let adopted = service.create_scope(&scope).await.unwrap();

        // Assert
        assert_eq!(adopted.id.as_deref(), Some(existing.as_str()));
        let read = service.get_scope(REALM, &existing).await.unwrap();
        assert_eq!(read.description, "adopted");
    }

    #[tokio::test]
    async fn test_create_scope_does_not_adopt_saml_scope() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        repository.add_client_scope(REALM, "role_list", "saml");
        let service = ClientScopeService::new(repository.clone(), quick_lookup());

        let result = service
            .create_scope(&OpenidClientScope::new(REALM, "role_list"))
            .await;

        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_scope_in_use_is_tolerated() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let id = repository.add_client_scope(REALM, "api", "openid-connect");
        repository.attach_client_default_scope(REALM, "client-1", &id);
        let service = ClientScopeService::new(repository.clone(), quick_lookup());

        service.delete_scope(REALM, &id).await.unwrap();

        assert!(service.get_scope(REALM, &id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_scope_propagates_other_errors() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let service = ClientScopeService::new(repository.clone(), quick_lookup());

        let result = service.delete_scope(REALM, "missing").await;

        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_client_default_scopes_delta_and_removal() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let profile = repository.add_client_scope(REALM, "profile", "openid-connect");
        let email = repository.add_client_scope(REALM, "email", "openid-connect");
        let roles = repository.add_client_scope(REALM, "roles", "openid-connect");
        repository.attach_client_default_scope(REALM, "client-1", &profile);
        repository.attach_client_default_scope(REALM, "client-1", &email);
        let service = ClientDefaultScopesService::new(repository.clone());

        // Act
        let desired = ClientDefaultScopes::new(REALM, "client-1", ["profile", "roles"]);
        service.set_default_scopes(&desired).await.unwrap();

        // Assert
        assert_eq!(
            repository.calls_to("remove_client_default_scope"),
            vec![format!("remove_client_default_scope:{email}")]
        );
        assert_eq!(
            repository.calls_to("add_client_default_scope"),
            vec![format!("add_client_default_scope:{roles}")]
        );
        let read = service.get_default_scopes(REALM, "client-1").await.unwrap();
        assert_eq!(read.default_scopes, desired.default_scopes);

        // Removing only detaches what the definition manages
        repository.attach_client_default_scope(REALM, "client-1", &email);
        service.remove_default_scopes(&desired).await.unwrap();
        let left = service.get_default_scopes(REALM, "client-1").await.unwrap();
        assert_eq!(left.default_scopes.into_iter().collect::<Vec<_>>(), vec!["email"]);
    }
    #[tokio::test]
    async fn test_client_default_scopes_unknown_name_changes_nothing() {
        // Arrange
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let a = repository.add_client_scope(REALM, "a", "openid-connect");
        repository.attach_client_default_scope(REALM, "client-1", &a);
        let service = ClientDefaultScopesService::new(repository.clone());

        // Act
        let result = service
            .set_default_scopes(&ClientDefaultScopes::new(REALM, "client-1", ["missing"]))
            .await;

        // Assert
        match result {
            Err(DomainError::NotFound { identifier, .. }) => assert_eq!(identifier, "missing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(repository.calls_to("remove_client_default_scope").is_empty());
        let read = service.get_default_scopes(REALM, "client-1").await.unwrap();
        assert_eq!(read.default_scopes.into_iter().collect::<Vec<_>>(), vec!["a"]);
    }
}

mod identity_provider_mapper_tests {
    use super::*;

    #[tokio::test]
    async fn test_mapper_lifecycle() {
        let repository = Arc::new(MockKeycloakRepository::new().with_realm(REALM));
        let service = IdentityProviderMapperService::new(repository.clone());
        let mut mapper =
            IdentityProviderMapper::new(REALM, "github", "team", "hardcoded-attribute-idp-mapper");
        mapper
            .config
            .insert("attribute".to_string(), "team".to_string());

        let created = service.create_mapper(&mapper).await.unwrap();
        let id = created.id.clone().unwrap();

        let read = service.get_mapper(REALM, "github", &id).await.unwrap();
        assert_eq!(read.config.get("attribute").map(String::as_str), Some("team"));

        service.delete_mapper(REALM, "github", &id).await.unwrap();
        assert!(service
            .get_mapper(REALM, "github", &id)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
