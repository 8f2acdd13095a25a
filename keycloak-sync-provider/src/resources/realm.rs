use async_trait::async_trait;
use keycloak_sync_domain::{
    application::services::RealmManagementService,
    domain::entities::{Realm, SslRequired},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use super::{duration_text, optional_duration, Resource};
use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

fn lifespans(realm: &mut Realm) -> [(&'static str, &mut Option<i64>); 5] {
    [
        ("access_token_lifespan", &mut realm.access_token_lifespan),
        ("access_code_lifespan", &mut realm.access_code_lifespan),
        ("sso_session_idle_timeout", &mut realm.sso_session_idle_timeout),
        ("sso_session_max_lifespan", &mut realm.sso_session_max_lifespan),
        ("offline_session_idle_timeout", &mut realm.offline_session_idle_timeout),
    ]
}

fn flags(realm: &mut Realm) -> [(&'static str, &mut bool); 11] {
    [
        ("enabled", &mut realm.enabled),
        ("user_managed_access", &mut realm.user_managed_access_allowed),
        ("registration_allowed", &mut realm.registration_allowed),
        ("registration_email_as_username", &mut realm.registration_email_as_username),
        ("edit_username_allowed", &mut realm.edit_username_allowed),
        ("reset_password_allowed", &mut realm.reset_password_allowed),
        ("remember_me", &mut realm.remember_me),
        ("verify_email", &mut realm.verify_email),
        ("login_with_email_allowed", &mut realm.login_with_email_allowed),
        ("duplicate_emails_allowed", &mut realm.duplicate_emails_allowed),
        ("revoke_refresh_token", &mut realm.revoke_refresh_token),
    ]
}

fn texts(realm: &mut Realm) -> [(&'static str, &mut Option<String>); 7] {
    [
        ("display_name", &mut realm.display_name),
        ("display_name_html", &mut realm.display_name_html),
        ("login_theme", &mut realm.login_theme),
        ("account_theme", &mut realm.account_theme),
        ("admin_theme", &mut realm.admin_theme),
        ("email_theme", &mut realm.email_theme),
        ("password_policy", &mut realm.password_policy),
    ]
}

/// `keycloak_realm`, identified by the realm name
pub struct RealmResource {
    service: Arc<RealmManagementService>,
}

impl RealmResource {
    pub fn new(service: Arc<RealmManagementService>) -> Self {
        Self { service }
    }
}

fn brute_force_schema() -> Schema {
    Schema::new(vec![
        Attribute::bool("permanent_lockout").default_value(false),
        Attribute::int("max_login_failures").default_value(30),
        Attribute::int("wait_increment_seconds").default_value(60),
        Attribute::int("quick_login_check_milli_seconds").default_value(1000),
        Attribute::int("minimum_quick_login_wait_seconds").default_value(60),
        Attribute::int("max_failure_wait_seconds").default_value(900),
        Attribute::int("failure_reset_time_seconds").default_value(43200),
    ])
}

fn internationalization_schema() -> Schema {
    Schema::new(vec![
        Attribute::set("supported_locales").required(),
        Attribute::string("default_locale").required(),
    ])
}

fn seconds(data: &ResourceData, name: &str) -> ProviderResult<Option<i64>> {
    optional_duration(data, name)?
        .map(|d| {
            i64::try_from(d.as_secs())
                .map_err(|_| ProviderError::invalid_attribute(name, "duration is too long"))
        })
        .transpose()
}

fn seconds_text(value: Option<i64>) -> Option<String> {
    duration_text(value.and_then(|s| u64::try_from(s).ok()).map(Duration::from_secs))
}

fn realm_from(data: &ResourceData) -> ProviderResult<Realm> {
    let mut realm = Realm::new(data.get_string("realm")?);

    for (name, field) in flags(&mut realm) {
        *field = data.get_bool(name)?;
    }
    for (name, field) in texts(&mut realm) {
        *field = data.get_optional_string(name)?;
    }
    for (name, field) in lifespans(&mut realm) {
        *field = seconds(data, name)?;
    }

    let ssl_required = data.get_string("ssl_required")?;
    realm.ssl_required = SslRequired::parse(&ssl_required)
        .ok_or_else(|| ProviderError::invalid_attribute("ssl_required", ssl_required.as_str()))?;
    realm.refresh_token_max_reuse = data.get_int("refresh_token_max_reuse")?;

    if let Some(i18n) = data.get_block("internationalization")? {
        realm.internationalization_enabled = true;
        realm.supported_locales = i18n.get_string_list("supported_locales")?;
        realm.default_locale = i18n.get_optional_string("default_locale")?;
    }

    if let Some(brute_force) = data.get_block("brute_force_detection")? {
        realm.brute_force_protected = true;
        realm.permanent_lockout = brute_force.get_bool("permanent_lockout")?;
        realm.failure_factor = brute_force.get_int("max_login_failures")?;
        realm.wait_increment_seconds = brute_force.get_int("wait_increment_seconds")?;
        realm.quick_login_check_milli_seconds =
            brute_force.get_int("quick_login_check_milli_seconds")?;
        realm.minimum_quick_login_wait_seconds =
            brute_force.get_int("minimum_quick_login_wait_seconds")?;
        realm.max_failure_wait_seconds = brute_force.get_int("max_failure_wait_seconds")?;
        realm.max_delta_time_seconds = brute_force.get_int("failure_reset_time_seconds")?;
    }

    realm.default_default_client_scopes = data.get_string_list("default_default_client_scopes")?;
    realm.default_optional_client_scopes =
        data.get_string_list("default_optional_client_scopes")?;

    Ok(realm)
}

fn write_realm(data: &mut ResourceData, realm: &Realm) {
    let mut realm = realm.clone();

    data.set_id(realm.realm.clone());
    data.set("realm", realm.realm.clone());
    data.set_optional("internal_id", realm.id.clone());

    for (name, field) in flags(&mut realm) {
        data.set(name, *field);
    }
    for (name, field) in texts(&mut realm) {
        data.set_optional(name, field.clone());
    }
    for (name, field) in lifespans(&mut realm) {
        data.set_optional(name, seconds_text(*field));
    }

    data.set("ssl_required", realm.ssl_required.as_str());
    data.set("refresh_token_max_reuse", realm.refresh_token_max_reuse);

    let i18n = realm.internationalization_enabled.then(|| {
        let mut block = ResourceData::new();
        block.set_strings("supported_locales", realm.supported_locales.iter().cloned());
        block.set_optional("default_locale", realm.default_locale.clone());
        block
    });
    data.set_block("internationalization", i18n);

    let brute_force = realm.brute_force_protected.then(|| {
        let mut block = ResourceData::new();
        block.set("permanent_lockout", realm.permanent_lockout);
        block.set("max_login_failures", realm.failure_factor);
        block.set("wait_increment_seconds", realm.wait_increment_seconds);
        block.set(
            "quick_login_check_milli_seconds",
            realm.quick_login_check_milli_seconds,
        );
        block.set(
            "minimum_quick_login_wait_seconds",
            realm.minimum_quick_login_wait_seconds,
        );
        block.set("max_failure_wait_seconds", realm.max_failure_wait_seconds);
        block.set("failure_reset_time_seconds", realm.max_delta_time_seconds);
        block
    });
    data.set_block("brute_force_detection", brute_force);

    data.set_strings(
        "default_default_client_scopes",
        realm.default_default_client_scopes.iter().cloned(),
    );
    data.set_strings(
        "default_optional_client_scopes",
        realm.default_optional_client_scopes.iter().cloned(),
    );
}

#[async_trait]
impl Resource for RealmResource {
    fn type_name(&self) -> &'static str {
        "keycloak_realm"
    }

    fn schema(&self) -> Schema {
        let mut attributes = vec![
            Attribute::string("realm").required().force_new(),
            Attribute::string("internal_id").computed(),
            Attribute::bool("enabled").default_value(true),
            Attribute::bool("login_with_email_allowed").default_value(true),
            Attribute::string("ssl_required")
                .default_value(SslRequired::External.as_str())
                .one_of(SslRequired::names()),
            Attribute::int("refresh_token_max_reuse").default_value(0),
            Attribute::block("internationalization", internationalization_schema()),
            Attribute::block("brute_force_detection", brute_force_schema()),
            Attribute::list("default_default_client_scopes")
                .computed()
                .describe("Realm default client scope names; left alone when empty"),
            Attribute::list("default_optional_client_scopes")
                .computed()
                .describe("Realm optional client scope names; left alone when empty"),
        ];

        let mut template = Realm::new("");
        for (name, _) in flags(&mut template) {
            if !matches!(name, "enabled" | "login_with_email_allowed") {
                attributes.push(Attribute::bool(name).default_value(false));
            }
        }
        for (name, _) in texts(&mut template) {
            attributes.push(Attribute::string(name));
        }
        for (name, _) in lifespans(&mut template) {
            attributes.push(
                Attribute::string(name)
                    .computed()
                    .describe("Duration such as `5m` or `1h30m`"),
            );
        }

        Schema::new(attributes)
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let created = self.service.create_realm(&realm_from(&data)?).await?;
        write_realm(&mut data, &created);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(realm = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let name = data.require_id()?.to_string();
        let realm = self.service.get_realm(&name).await?;
        write_realm(&mut data, &realm);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(realm = ?data.id()))]
    async fn update(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self.service.update_realm(&realm_from(&data)?).await?;
        write_realm(&mut data, &updated);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(realm = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        Ok(self.service.delete_realm(data.require_id()?).await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set_id(parts[0].clone());
        data.set("realm", parts[0].clone());
        Ok(data)
    }
}
