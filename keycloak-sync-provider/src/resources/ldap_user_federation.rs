use async_trait::async_trait;
use keycloak_sync_domain::{
    application::services::LdapFederationService,
    domain::entities::*,
};
use std::sync::Arc;
use tracing::instrument;

use super::{duration_text, optional_duration, Resource, REALM_ID};
use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

const DURATION: &str = "Duration such as `5s` or `1h30m`";

fn kerberos_schema() -> Schema {
    Schema::new(vec![
        Attribute::string("kerberos_realm").required(),
        Attribute::string("server_principal").required(),
        Attribute::string("key_tab").required(),
        Attribute::bool("use_kerberos_for_password_authentication").default_value(false),
    ])
}

fn cache_schema() -> Schema {
    Schema::new(vec![
        Attribute::string("policy")
            .default_value(CachePolicy::Default.as_str())
            .one_of(CachePolicy::names()),
        Attribute::string("max_lifespan").describe(DURATION),
        Attribute::int("eviction_day"),
        Attribute::int("eviction_hour"),
        Attribute::int("eviction_minute"),
    ])
}

fn choice<T>(
    data: &ResourceData,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> ProviderResult<T> {
    let value = data.get_string(name)?;
    parse(&value).ok_or_else(|| ProviderError::invalid_attribute(name, value.as_str()))
}

fn federation_from(data: &ResourceData) -> ProviderResult<LdapUserFederation> {
    let mut ldap = LdapUserFederation::new(
        data.get_string(REALM_ID)?,
        data.get_string("name")?,
        data.get_string("connection_url")?,
        data.get_string("users_dn")?,
    );
    ldap.id = data.id().map(EntityId::from);

    ldap.enabled = data.get_bool("enabled")?;
    ldap.priority = data.get_int("priority")?;
    ldap.import_enabled = data.get_bool("import_enabled")?;
    ldap.edit_mode = choice(data, "edit_mode", EditMode::parse)?;
    ldap.sync_registrations = data.get_bool("sync_registrations")?;

    ldap.vendor = choice(data, "vendor", LdapVendor::parse)?;
    ldap.username_ldap_attribute = data.get_string("username_ldap_attribute")?;
    ldap.rdn_ldap_attribute = data.get_string("rdn_ldap_attribute")?;
    ldap.uuid_ldap_attribute = data.get_string("uuid_ldap_attribute")?;
    ldap.user_object_classes = data.get_string_list("user_object_classes")?;
    ldap.bind_dn = data.get_optional_string("bind_dn")?;
    ldap.bind_credential = data.get_optional_string("bind_credential")?;
    ldap.custom_user_search_filter = data.get_optional_string("custom_user_search_filter")?;
    ldap.search_scope = choice(data, "search_scope", SearchScope::parse)?;

    ldap.validate_password_policy = data.get_bool("validate_password_policy")?;
    ldap.trust_email = data.get_bool("trust_email")?;
    ldap.use_truststore_spi = choice(data, "use_truststore_spi", TruststoreSpi::parse)?;
    ldap.connection_timeout = optional_duration(data, "connection_timeout")?;
    ldap.read_timeout = optional_duration(data, "read_timeout")?;
    ldap.pagination = data.get_bool("pagination")?;

    ldap.connection_pooling = data.get_bool("connection_pooling")?;
    ldap.connection_pool = ConnectionPoolSettings {
        authentication: data.get_optional_string("connection_pooling_authentication")?,
        debug_level: data.get_optional_string("connection_pool_debug_level")?,
        protocol: data.get_optional_string("connection_pool_protocol")?,
        initial_size: data.get_optional_int("connection_pool_initial_size")?,
        maximum_size: data.get_optional_int("connection_pool_maximum_size")?,
        preferred_size: data.get_optional_int("connection_pool_preferred_size")?,
        timeout: data.get_optional_int("connection_pool_timeout")?,
    };

    ldap.batch_size_for_sync = data.get_int("batch_size_for_sync")?;
    ldap.full_sync_period = data.get_int("full_sync_period")?;
    ldap.changed_sync_period = data.get_int("changed_sync_period")?;

    ldap.kerberos = data
        .get_block("kerberos")?
        .map(|block| -> ProviderResult<KerberosSettings> {
            Ok(KerberosSettings {
                kerberos_realm: block.get_string("kerberos_realm")?,
                server_principal: block.get_string("server_principal")?,
                key_tab: block.get_string("key_tab")?,
                use_kerberos_for_password_authentication: block
                    .get_bool("use_kerberos_for_password_authentication")?,
            })
        })
        .transpose()?;

    ldap.cache = data
        .get_block("cache")?
        .map(|block| -> ProviderResult<CacheSettings> {
            Ok(CacheSettings {
                policy: choice(&block, "policy", CachePolicy::parse)?,
                max_lifespan: optional_duration(&block, "max_lifespan")?,
                eviction_day: block.get_optional_int("eviction_day")?,
                eviction_hour: block.get_optional_int("eviction_hour")?,
                eviction_minute: block.get_optional_int("eviction_minute")?,
            })
        })
        .transpose()?;

    Ok(ldap)
}

fn write_federation(data: &mut ResourceData, ldap: &LdapUserFederation) {
    if let Some(id) = &ldap.id {
        data.set_id(id.as_str());
    }
    data.set(REALM_ID, ldap.realm_id.clone());
    data.set("name", ldap.name.clone());

    data.set("enabled", ldap.enabled);
    data.set("priority", ldap.priority);
    data.set("import_enabled", ldap.import_enabled);
    data.set("edit_mode", ldap.edit_mode.as_str());
    data.set("sync_registrations", ldap.sync_registrations);

    data.set("vendor", ldap.vendor.as_str());
    data.set("username_ldap_attribute", ldap.username_ldap_attribute.clone());
    data.set("rdn_ldap_attribute", ldap.rdn_ldap_attribute.clone());
    data.set("uuid_ldap_attribute", ldap.uuid_ldap_attribute.clone());
    data.set_strings("user_object_classes", ldap.user_object_classes.iter().cloned());
    data.set("connection_url", ldap.connection_url.clone());
    data.set("users_dn", ldap.users_dn.clone());
    data.set_optional("bind_dn", ldap.bind_dn.clone());
    data.set_optional("bind_credential", ldap.bind_credential.clone());
    data.set_optional("custom_user_search_filter", ldap.custom_user_search_filter.clone());
    data.set("search_scope", ldap.search_scope.as_str());

    data.set("validate_password_policy", ldap.validate_password_policy);
    data.set("trust_email", ldap.trust_email);
    data.set("use_truststore_spi", ldap.use_truststore_spi.as_str());
    data.set_optional("connection_timeout", duration_text(ldap.connection_timeout));
    data.set_optional("read_timeout", duration_text(ldap.read_timeout));
    data.set("pagination", ldap.pagination);

    let pool = &ldap.connection_pool;
    data.set("connection_pooling", ldap.connection_pooling);
    data.set_optional("connection_pooling_authentication", pool.authentication.clone());
    data.set_optional("connection_pool_debug_level", pool.debug_level.clone());
    data.set_optional("connection_pool_protocol", pool.protocol.clone());
    data.set_optional("connection_pool_initial_size", pool.initial_size);
    data.set_optional("connection_pool_maximum_size", pool.maximum_size);
    data.set_optional("connection_pool_preferred_size", pool.preferred_size);
    data.set_optional("connection_pool_timeout", pool.timeout);

    data.set("batch_size_for_sync", ldap.batch_size_for_sync);
    data.set("full_sync_period", ldap.full_sync_period);
    data.set("changed_sync_period", ldap.changed_sync_period);

    let kerberos = ldap.kerberos.as_ref().map(|kerberos| {
        let mut block = ResourceData::new();
        block.set("kerberos_realm", kerberos.kerberos_realm.clone());
        block.set("server_principal", kerberos.server_principal.clone());
        block.set("key_tab", kerberos.key_tab.clone());
        block.set(
            "use_kerberos_for_password_authentication",
            kerberos.use_kerberos_for_password_authentication,
        );
        block
    });
    data.set_block("kerberos", kerberos);

    let cache = ldap.cache.as_ref().map(|cache| {
        let mut block = ResourceData::new();
        block.set("policy", cache.policy.as_str());
        block.set_optional("max_lifespan", duration_text(cache.max_lifespan));
        block.set_optional("eviction_day", cache.eviction_day);
        block.set_optional("eviction_hour", cache.eviction_hour);
        block.set_optional("eviction_minute", cache.eviction_minute);
        block
    });
    data.set_block("cache", cache);
}

/// `keycloak_ldap_user_federation`.
///
/// Keycloak never returns the bind credential, so reads keep the value
/// already held in state whenever the server answers with the mask.
pub struct LdapUserFederationResource {
    service: Arc<LdapFederationService>,
}

impl LdapUserFederationResource {
    pub fn new(service: Arc<LdapFederationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Resource for LdapUserFederationResource {
    fn type_name(&self) -> &'static str {
        "keycloak_ldap_user_federation"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::string("name").required(),
            Attribute::string(REALM_ID).required().force_new(),
            Attribute::bool("enabled").default_value(true),
            Attribute::int("priority").default_value(0),
            Attribute::bool("import_enabled").default_value(true),
            Attribute::string("edit_mode")
                .default_value(EditMode::ReadOnly.as_str())
                .one_of(EditMode::names()),
            Attribute::bool("sync_registrations").default_value(false),
            Attribute::string("vendor")
                .default_value(LdapVendor::Other.as_str())
                .one_of(LdapVendor::names()),
            Attribute::string("username_ldap_attribute").required(),
            Attribute::string("rdn_ldap_attribute").required(),
            Attribute::string("uuid_ldap_attribute").required(),
            Attribute::list("user_object_classes").required(),
            Attribute::string("connection_url").required(),
            Attribute::string("users_dn").required(),
            Attribute::string("bind_dn"),
            Attribute::string("bind_credential").sensitive(),
            Attribute::string("custom_user_search_filter")
                .describe("Must begin with '(' and end with ')'"),
            Attribute::string("search_scope")
                .default_value(SearchScope::OneLevel.as_str())
                .one_of(SearchScope::names()),
            Attribute::bool("validate_password_policy").default_value(false),
            Attribute::bool("trust_email").default_value(false),
            Attribute::string("use_truststore_spi")
                .default_value(TruststoreSpi::OnlyForLdaps.as_str())
                .one_of(TruststoreSpi::names()),
            Attribute::string("connection_timeout").describe(DURATION),
            Attribute::string("read_timeout").describe(DURATION),
            Attribute::bool("pagination").default_value(true),
            Attribute::bool("connection_pooling").required(),
            Attribute::string("connection_pooling_authentication"),
            Attribute::string("connection_pool_debug_level"),
            Attribute::int("connection_pool_initial_size"),
            Attribute::int("connection_pool_maximum_size"),
            Attribute::int("connection_pool_preferred_size"),
            Attribute::string("connection_pool_protocol"),
            Attribute::int("connection_pool_timeout"),
            Attribute::int("batch_size_for_sync").default_value(1000),
            Attribute::int("full_sync_period")
                .default_value(-1)
                .describe("Seconds; -1 disables periodic full sync"),
            Attribute::int("changed_sync_period")
                .default_value(-1)
                .describe("Seconds; -1 disables periodic changed users sync"),
            Attribute::bool("delete_default_mappers")
                .default_value(false)
                .force_new()
                .describe("Remove the mappers Keycloak provisions with a new LDAP provider"),
            Attribute::block("kerberos", kerberos_schema()),
            Attribute::block("cache", cache_schema()),
        ])
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}/{id}", "{realm}/{id}/{bindCredential}"]
    }

    #[instrument(skip(self, data))]
    async fn create(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let delete_default_mappers = data.get_bool("delete_default_mappers")?;
        let created = self
            .service
            .create_federation(&federation_from(&data)?, delete_default_mappers)
            .await?;
        write_federation(&mut data, &created);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let local_credential = data.get_optional_string("bind_credential")?;
        let federation = self
            .service
            .get_federation(&realm, data.require_id()?, local_credential)
            .await?;
        write_federation(&mut data, &federation);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn update(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self
            .service
            .update_federation(&federation_from(&data)?)
            .await?;
        write_federation(&mut data, &updated);
        Ok(data)
    }

    #[instrument(skip(self, data), fields(id = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        let realm = data.get_string(REALM_ID)?;
        Ok(self
            .service
            .delete_federation(&realm, data.require_id()?)
            .await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set(REALM_ID, parts[0].clone());
        data.set_id(parts[1].clone());
        if let Some(credential) = parts.get(2) {
            data.set("bind_credential", credential.clone());
        }
        Ok(data)
    }
}
