use super::common::{is_masked_secret, EntityId};
use super::component::{Component, USER_STORAGE_PROVIDER_TYPE};
use super::config_schema::{ConfigOption, ConfigReader, ConfigWriter, OptionDefault};
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const LDAP_PROVIDER_ID: &str = "ldap";

/// Sentinel Keycloak uses for "no eviction schedule"
pub const EVICTION_DISABLED: i64 = -1;

mod keys {
    use super::{ConfigOption, OptionDefault};

    pub const ENABLED: ConfigOption = ConfigOption::boolean("enabled");
    pub const PRIORITY: ConfigOption = ConfigOption::int("priority");
    pub const IMPORT_ENABLED: ConfigOption = ConfigOption::boolean("importEnabled");
    pub const EDIT_MODE: ConfigOption = ConfigOption::text("editMode");
    pub const SYNC_REGISTRATIONS: ConfigOption = ConfigOption::boolean("syncRegistrations");
    pub const VENDOR: ConfigOption = ConfigOption::text("vendor");
    pub const USERNAME_ATTRIBUTE: ConfigOption = ConfigOption::text("usernameLDAPAttribute");
    pub const RDN_ATTRIBUTE: ConfigOption = ConfigOption::text("rdnLDAPAttribute");
    pub const UUID_ATTRIBUTE: ConfigOption = ConfigOption::text("uuidLDAPAttribute");
    pub const USER_OBJECT_CLASSES: ConfigOption = ConfigOption::comma_list("userObjectClasses");
    pub const CONNECTION_URL: ConfigOption = ConfigOption::text("connectionUrl");
    pub const USERS_DN: ConfigOption = ConfigOption::text("usersDn");
    pub const AUTH_TYPE: ConfigOption = ConfigOption::text("authType");
    pub const BIND_DN: ConfigOption = ConfigOption::text("bindDn");
    pub const BIND_CREDENTIAL: ConfigOption = ConfigOption::text("bindCredential");
    pub const CUSTOM_USER_SEARCH_FILTER: ConfigOption =
        ConfigOption::text("customUserSearchFilter");
    pub const SEARCH_SCOPE: ConfigOption = ConfigOption::text("searchScope");
    pub const VALIDATE_PASSWORD_POLICY: ConfigOption =
        ConfigOption::boolean("validatePasswordPolicy");
    pub const TRUST_EMAIL: ConfigOption = ConfigOption::boolean("trustEmail");
    pub const USE_TRUSTSTORE_SPI: ConfigOption = ConfigOption::text("useTruststoreSpi");
    pub const CONNECTION_TIMEOUT: ConfigOption = ConfigOption::millis("connectionTimeout");
    pub const READ_TIMEOUT: ConfigOption = ConfigOption::millis("readTimeout");
    pub const PAGINATION: ConfigOption = ConfigOption::boolean("pagination");

    pub const CONNECTION_POOLING: ConfigOption = ConfigOption::boolean("connectionPooling");
    pub const POOL_AUTHENTICATION: ConfigOption =
        ConfigOption::text("connectionPoolingAuthentication");
    pub const POOL_DEBUG: ConfigOption = ConfigOption::text("connectionPoolingDebug");
    pub const POOL_PROTOCOL: ConfigOption = ConfigOption::text("connectionPoolingProtocol");
    pub const POOL_INIT_SIZE: ConfigOption = ConfigOption::int("connectionPoolingInitSize");
    pub const POOL_MAX_SIZE: ConfigOption = ConfigOption::int("connectionPoolingMaxSize");
    pub const POOL_PREF_SIZE: ConfigOption = ConfigOption::int("connectionPoolingPrefSize");
    pub const POOL_TIMEOUT: ConfigOption = ConfigOption::int("connectionPoolingTimeout");

    pub const SERVER_PRINCIPAL: ConfigOption = ConfigOption::text("serverPrincipal");
    pub const USE_KERBEROS_FOR_PASSWORD: ConfigOption =
        ConfigOption::boolean("useKerberosForPasswordAuthentication");
    pub const ALLOW_KERBEROS: ConfigOption = ConfigOption::boolean("allowKerberosAuthentication");
    pub const KEY_TAB: ConfigOption = ConfigOption::text("keyTab");
    pub const KERBEROS_REALM: ConfigOption = ConfigOption::text("kerberosRealm");

    pub const BATCH_SIZE_FOR_SYNC: ConfigOption = ConfigOption::int("batchSizeForSync");
    pub const FULL_SYNC_PERIOD: ConfigOption =
        ConfigOption::int("fullSyncPeriod").with_default(OptionDefault::Int(-1));
    pub const CHANGED_SYNC_PERIOD: ConfigOption =
        ConfigOption::int("changedSyncPeriod").with_default(OptionDefault::Int(-1));

    pub const CACHE_POLICY: ConfigOption = ConfigOption::text("cachePolicy");
    pub const MAX_LIFESPAN: ConfigOption = ConfigOption::millis("maxLifespan");
    pub const EVICTION_DAY: ConfigOption =
        ConfigOption::int("evictionDay").with_default(OptionDefault::Int(super::EVICTION_DISABLED));
    pub const EVICTION_HOUR: ConfigOption =
        ConfigOption::int("evictionHour").with_default(OptionDefault::Int(super::EVICTION_DISABLED));
    pub const EVICTION_MINUTE: ConfigOption = ConfigOption::int("evictionMinute")
        .with_default(OptionDefault::Int(super::EVICTION_DISABLED));
}

wire_enum! {
    pub enum EditMode {
        ReadOnly => "READ_ONLY",
        Writable => "WRITABLE",
        Unsynced => "UNSYNCED",
    }
}

wire_enum! {
    pub enum LdapVendor {
        Other => "OTHER",
        Edirectory => "EDIRECTORY",
        ActiveDirectory => "AD",
        RedHatDirectory => "RHDS",
        Tivoli => "TIVOLI",
    }
}

wire_enum! {
    pub enum SearchScope {
        OneLevel => "ONE_LEVEL",
        Subtree => "SUBTREE",
    }
}

wire_enum! {
    pub enum TruststoreSpi {
        Always => "ALWAYS",
        OnlyForLdaps => "ONLY_FOR_LDAPS",
        Never => "NEVER",
    }
}

wire_enum! {
    pub enum CachePolicy {
        Default => "DEFAULT",
        EvictDaily => "EVICT_DAILY",
        EvictWeekly => "EVICT_WEEKLY",
        MaxLifespan => "MAX_LIFESPAN",
        NoCache => "NO_CACHE",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionPoolSettings {
    pub authentication: Option<String>,
    pub debug_level: Option<String>,
    pub protocol: Option<String>,
    pub initial_size: Option<i64>,
    pub maximum_size: Option<i64>,
    pub preferred_size: Option<i64>,
    pub timeout: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KerberosSettings {
    pub kerberos_realm: String,
    pub server_principal: String,
    pub key_tab: String,
    pub use_kerberos_for_password_authentication: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    pub policy: CachePolicy,
    pub max_lifespan: Option<Duration>,
    pub eviction_day: Option<i64>,
    pub eviction_hour: Option<i64>,
    pub eviction_minute: Option<i64>,
}

impl CacheSettings {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            max_lifespan: None,
            eviction_day: None,
            eviction_hour: None,
            eviction_minute: None,
        }
    }
}

/// LDAP user storage provider, stored by Keycloak as a generic [`Component`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapUserFederation {
    pub id: Option<EntityId>,
    pub name: String,
    pub realm_id: String,

    pub enabled: bool,
    pub priority: i64,

    pub import_enabled: bool,
    pub edit_mode: EditMode,
    pub sync_registrations: bool,

    pub vendor: LdapVendor,
    pub username_ldap_attribute: String,
    pub rdn_ldap_attribute: String,
    pub uuid_ldap_attribute: String,
    pub user_object_classes: Vec<String>,
    pub connection_url: String,
    pub users_dn: String,
    pub bind_dn: Option<String>,
    pub bind_credential: Option<String>,
    pub custom_user_search_filter: Option<String>,
    pub search_scope: SearchScope,

    pub validate_password_policy: bool,
    pub trust_email: bool,
    pub use_truststore_spi: TruststoreSpi,
    pub connection_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub pagination: bool,

    pub connection_pooling: bool,
    pub connection_pool: ConnectionPoolSettings,

    pub kerberos: Option<KerberosSettings>,

    pub batch_size_for_sync: i64,
    /// Seconds, or `-1` when periodic full sync is disabled
    pub full_sync_period: i64,
    /// Seconds, or `-1` when periodic changed-users sync is disabled
    pub changed_sync_period: i64,

    pub cache: Option<CacheSettings>,
}

impl LdapUserFederation {
    pub fn new(
        realm_id: impl Into<String>,
        name: impl Into<String>,
        connection_url: impl Into<String>,
        users_dn: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            realm_id: realm_id.into(),
            enabled: true,
            priority: 0,
            import_enabled: true,
            edit_mode: EditMode::ReadOnly,
            sync_registrations: false,
            vendor: LdapVendor::Other,
            username_ldap_attribute: "uid".to_string(),
            rdn_ldap_attribute: "uid".to_string(),
            uuid_ldap_attribute: "entryUUID".to_string(),
            user_object_classes: vec!["inetOrgPerson".to_string(), "organizationalPerson".to_string()],
            connection_url: connection_url.into(),
            users_dn: users_dn.into(),
            bind_dn: None,
            bind_credential: None,
            custom_user_search_filter: None,
            search_scope: SearchScope::OneLevel,
            validate_password_policy: false,
            trust_email: false,
            use_truststore_spi: TruststoreSpi::OnlyForLdaps,
            connection_timeout: None,
            read_timeout: None,
            pagination: true,
            connection_pooling: true,
            connection_pool: ConnectionPoolSettings::default(),
            kerberos: None,
            batch_size_for_sync: 1000,
            full_sync_period: -1,
            changed_sync_period: -1,
            cache: None,
        }
    }

    /// Local checks run before any request reaches Keycloak
    pub fn validate(&self) -> DomainResult<()> {
        let bind_dn = self.bind_dn.as_deref().filter(|v| !v.is_empty());
        let bind_credential = self.bind_credential.as_deref().filter(|v| !v.is_empty());
        if bind_dn.is_some() != bind_credential.is_some() {
            return Err(DomainError::validation(
                "bind_credential",
                "authentication requires both bind_dn and bind_credential to be set",
            ));
        }

        if let Some(filter) = self.custom_user_search_filter.as_deref() {
            if !(filter.starts_with('(') && filter.ends_with(')')) {
                return Err(DomainError::validation(
                    "custom_user_search_filter",
                    "must start with '(' and end with ')'",
                ));
            }
        }

        if self.user_object_classes.is_empty() {
            return Err(DomainError::validation(
                "user_object_classes",
                "at least one object class is required",
            ));
        }
        if let Some(class) = self
            .user_object_classes
            .iter()
            .find(|class| {
                class.is_empty() || class.trim() != class.as_str() || class.contains(',')
            })
        {
            return Err(DomainError::validation(
                "user_object_classes",
                format!("invalid object class {class:?}"),
            ));
        }

        for (field, period) in [
            ("full_sync_period", self.full_sync_period),
            ("changed_sync_period", self.changed_sync_period),
        ] {
            if period != -1 && period < 1 {
                return Err(DomainError::validation(
                    field,
                    "must be -1 (disabled) or a positive number of seconds",
                ));
            }
        }

        for (field, duration) in [
            ("connection_timeout", self.connection_timeout),
            ("read_timeout", self.read_timeout),
        ] {
            validate_whole_millis(field, duration)?;
        }

        if let Some(cache) = &self.cache {
            validate_cache(cache)?;
        }

        Ok(())
    }

    /// Keep the locally known bind credential when Keycloak echoes the masked placeholder.
    /// A credential Keycloak does not report at all stays unset.
    pub fn keep_local_credential(&mut self, local: Option<String>) {
        let remote_is_masked = self
            .bind_credential
            .as_deref()
            .is_some_and(is_masked_secret);
        if remote_is_masked {
            self.bind_credential = local;
        }
    }

    pub fn to_component(&self) -> DomainResult<Component> {
        let mut w = ConfigWriter::new();

        w.boolean(&keys::ENABLED, self.enabled)?;
        w.int(&keys::PRIORITY, self.priority)?;
        w.boolean(&keys::IMPORT_ENABLED, self.import_enabled)?;
        w.text(&keys::EDIT_MODE, self.edit_mode.as_str())?;
        w.boolean(&keys::SYNC_REGISTRATIONS, self.sync_registrations)?;
        w.text(&keys::VENDOR, self.vendor.as_str().to_lowercase())?;
        w.text(&keys::USERNAME_ATTRIBUTE, &self.username_ldap_attribute)?;
        w.text(&keys::RDN_ATTRIBUTE, &self.rdn_ldap_attribute)?;
        w.text(&keys::UUID_ATTRIBUTE, &self.uuid_ldap_attribute)?;
        w.comma_list(&keys::USER_OBJECT_CLASSES, &self.user_object_classes)?;
        w.text(&keys::CONNECTION_URL, &self.connection_url)?;
        w.text(&keys::USERS_DN, &self.users_dn)?;

        match (self.bind_dn.as_deref(), self.bind_credential.as_deref()) {
            (Some(dn), Some(credential)) if !dn.is_empty() && !credential.is_empty() => {
                w.text(&keys::BIND_DN, dn)?;
                w.text(&keys::BIND_CREDENTIAL, credential)?;
                w.text(&keys::AUTH_TYPE, "simple")?;
            }
            _ => w.text(&keys::AUTH_TYPE, "none")?,
        }

        w.optional_text(
            &keys::CUSTOM_USER_SEARCH_FILTER,
            self.custom_user_search_filter.as_deref(),
        )?;
        w.text(
            &keys::SEARCH_SCOPE,
            match self.search_scope {
                SearchScope::OneLevel => "1",
                SearchScope::Subtree => "2",
            },
        )?;
        w.boolean(&keys::VALIDATE_PASSWORD_POLICY, self.validate_password_policy)?;
        w.boolean(&keys::TRUST_EMAIL, self.trust_email)?;
        w.text(
            &keys::USE_TRUSTSTORE_SPI,
            match self.use_truststore_spi {
                TruststoreSpi::OnlyForLdaps => "ldapsOnly".to_string(),
                other => other.as_str().to_lowercase(),
            },
        )?;
        w.millis(&keys::CONNECTION_TIMEOUT, self.connection_timeout)?;
        w.millis(&keys::READ_TIMEOUT, self.read_timeout)?;
        w.boolean(&keys::PAGINATION, self.pagination)?;

        w.boolean(&keys::CONNECTION_POOLING, self.connection_pooling)?;
        let pool = &self.connection_pool;
        w.optional_text(&keys::POOL_AUTHENTICATION, pool.authentication.as_deref())?;
        w.optional_text(&keys::POOL_DEBUG, pool.debug_level.as_deref())?;
        w.optional_text(&keys::POOL_PROTOCOL, pool.protocol.as_deref())?;
        w.optional_int(&keys::POOL_INIT_SIZE, pool.initial_size)?;
        w.optional_int(&keys::POOL_MAX_SIZE, pool.maximum_size)?;
        w.optional_int(&keys::POOL_PREF_SIZE, pool.preferred_size)?;
        w.optional_int(&keys::POOL_TIMEOUT, pool.timeout)?;

        let kerberos = self.kerberos.as_ref();
        w.boolean(&keys::ALLOW_KERBEROS, kerberos.is_some())?;
        w.text(
            &keys::KERBEROS_REALM,
            kerberos.map(|k| k.kerberos_realm.as_str()).unwrap_or_default(),
        )?;
        w.text(
            &keys::SERVER_PRINCIPAL,
            kerberos.map(|k| k.server_principal.as_str()).unwrap_or_default(),
        )?;
        w.text(
            &keys::KEY_TAB,
            kerberos.map(|k| k.key_tab.as_str()).unwrap_or_default(),
        )?;
        w.boolean(
            &keys::USE_KERBEROS_FOR_PASSWORD,
            kerberos.is_some_and(|k| k.use_kerberos_for_password_authentication),
        )?;

        w.int(&keys::BATCH_SIZE_FOR_SYNC, self.batch_size_for_sync)?;
        w.int(&keys::FULL_SYNC_PERIOD, self.full_sync_period)?;
        w.int(&keys::CHANGED_SYNC_PERIOD, self.changed_sync_period)?;

        // Eviction keys are always sent so a removed schedule is cleared remotely.
        w.clear(&keys::EVICTION_DAY);
        w.clear(&keys::EVICTION_HOUR);
        w.clear(&keys::EVICTION_MINUTE);
        w.clear(&keys::MAX_LIFESPAN);
        match &self.cache {
            Some(cache) => {
                w.text(&keys::CACHE_POLICY, cache.policy.as_str())?;
                w.optional_int(&keys::EVICTION_DAY, cache.eviction_day)?;
                w.optional_int(&keys::EVICTION_HOUR, cache.eviction_hour)?;
                w.optional_int(&keys::EVICTION_MINUTE, cache.eviction_minute)?;
                if cache.max_lifespan.is_some() {
                    w.millis(&keys::MAX_LIFESPAN, cache.max_lifespan)?;
                }
            }
            None => w.clear(&keys::CACHE_POLICY),
        }

        Ok(Component {
            id: self.id.clone(),
            name: self.name.clone(),
            provider_id: LDAP_PROVIDER_ID.to_string(),
            provider_type: USER_STORAGE_PROVIDER_TYPE.to_string(),
            parent_id: self.realm_id.clone(),
            config: w.finish(),
        })
    }

    pub fn from_component(component: &Component) -> DomainResult<Self> {
        let r = ConfigReader::new(component);

        let edit_mode = match r.text(&keys::EDIT_MODE)?.as_str() {
            "" => EditMode::ReadOnly,
            value => EditMode::parse(value).ok_or_else(|| DomainError::malformed("editMode", value))?,
        };
        let vendor = match r.text(&keys::VENDOR)?.as_str() {
            "" => LdapVendor::Other,
            value => LdapVendor::parse(value).ok_or_else(|| DomainError::malformed("vendor", value))?,
        };
        let search_scope = if r.text(&keys::SEARCH_SCOPE)? == "1" {
            SearchScope::OneLevel
        } else {
            SearchScope::Subtree
        };
        let use_truststore_spi = match r.text(&keys::USE_TRUSTSTORE_SPI)?.as_str() {
            "" | "ldapsOnly" => TruststoreSpi::OnlyForLdaps,
            value => TruststoreSpi::parse(value)
                .ok_or_else(|| DomainError::malformed("useTruststoreSpi", value))?,
        };

        let kerberos = if r.boolean(&keys::ALLOW_KERBEROS)? {
            Some(KerberosSettings {
                kerberos_realm: r.text(&keys::KERBEROS_REALM)?,
                server_principal: r.text(&keys::SERVER_PRINCIPAL)?,
                key_tab: r.text(&keys::KEY_TAB)?,
                use_kerberos_for_password_authentication: r
                    .boolean(&keys::USE_KERBEROS_FOR_PASSWORD)?,
            })
        } else {
            None
        };

        let cache = match r.optional_text(&keys::CACHE_POLICY)? {
            Some(policy) => Some(CacheSettings {
                policy: CachePolicy::parse(&policy)
                    .ok_or_else(|| DomainError::malformed("cachePolicy", &policy))?,
                max_lifespan: r.millis(&keys::MAX_LIFESPAN)?,
                eviction_day: eviction(r.int(&keys::EVICTION_DAY)?),
                eviction_hour: eviction(r.int(&keys::EVICTION_HOUR)?),
                eviction_minute: eviction(r.int(&keys::EVICTION_MINUTE)?),
            }),
            None => None,
        };

        Ok(Self {
            id: component.id.clone(),
            name: component.name.clone(),
            realm_id: component.parent_id.clone(),
            enabled: r.boolean(&keys::ENABLED)?,
            priority: r.int(&keys::PRIORITY)?,
            import_enabled: r.boolean(&keys::IMPORT_ENABLED)?,
            edit_mode,
            sync_registrations: r.boolean(&keys::SYNC_REGISTRATIONS)?,
            vendor,
            username_ldap_attribute: r.text(&keys::USERNAME_ATTRIBUTE)?,
            rdn_ldap_attribute: r.text(&keys::RDN_ATTRIBUTE)?,
            uuid_ldap_attribute: r.text(&keys::UUID_ATTRIBUTE)?,
            user_object_classes: r.comma_list(&keys::USER_OBJECT_CLASSES)?,
            connection_url: r.text(&keys::CONNECTION_URL)?,
            users_dn: r.text(&keys::USERS_DN)?,
            bind_dn: r.optional_text(&keys::BIND_DN)?,
            bind_credential: r.optional_text(&keys::BIND_CREDENTIAL)?,
            custom_user_search_filter: r.optional_text(&keys::CUSTOM_USER_SEARCH_FILTER)?,
            search_scope,
            validate_password_policy: r.boolean(&keys::VALIDATE_PASSWORD_POLICY)?,
            trust_email: r.boolean(&keys::TRUST_EMAIL)?,
            use_truststore_spi,
            connection_timeout: r.millis(&keys::CONNECTION_TIMEOUT)?,
            read_timeout: r.millis(&keys::READ_TIMEOUT)?,
            pagination: r.boolean(&keys::PAGINATION)?,
            connection_pooling: r.boolean(&keys::CONNECTION_POOLING)?,
            connection_pool: ConnectionPoolSettings {
                authentication: r.optional_text(&keys::POOL_AUTHENTICATION)?,
                debug_level: r.optional_text(&keys::POOL_DEBUG)?,
                protocol: r.optional_text(&keys::POOL_PROTOCOL)?,
                initial_size: r.optional_int(&keys::POOL_INIT_SIZE)?,
                maximum_size: r.optional_int(&keys::POOL_MAX_SIZE)?,
                preferred_size: r.optional_int(&keys::POOL_PREF_SIZE)?,
                timeout: r.optional_int(&keys::POOL_TIMEOUT)?,
            },
            kerberos,
            batch_size_for_sync: r.int(&keys::BATCH_SIZE_FOR_SYNC)?,
            full_sync_period: r.int(&keys::FULL_SYNC_PERIOD)?,
            changed_sync_period: r.int(&keys::CHANGED_SYNC_PERIOD)?,
            cache,
        })
    }
}

fn eviction(value: i64) -> Option<i64> {
    (value != EVICTION_DISABLED).then_some(value)
}

fn validate_whole_millis(field: &str, duration: Option<Duration>) -> DomainResult<()> {
    match duration {
        Some(d) if d.subsec_nanos() % 1_000_000 != 0 => Err(DomainError::validation(
            field,
            "sub-millisecond precision is not supported",
        )),
        _ => Ok(()),
    }
}

fn validate_cache(cache: &CacheSettings) -> DomainResult<()> {
    for (field, value, max) in [
        ("eviction_day", cache.eviction_day, 6),
        ("eviction_hour", cache.eviction_hour, 23),
        ("eviction_minute", cache.eviction_minute, 59),
    ] {
        if let Some(value) = value {
            if !(0..=max).contains(&value) {
                return Err(DomainError::validation(
                    field,
                    format!("must be between 0 and {max}"),
                ));
            }
        }
    }

    let scheduled = matches!(cache.policy, CachePolicy::EvictDaily | CachePolicy::EvictWeekly);
    if cache.eviction_day.is_some() && cache.policy != CachePolicy::EvictWeekly {
        return Err(DomainError::validation(
            "eviction_day",
            "only valid with cache policy EVICT_WEEKLY",
        ));
    }
    if (cache.eviction_hour.is_some() || cache.eviction_minute.is_some()) && !scheduled {
        return Err(DomainError::validation(
            "eviction_hour",
            "only valid with cache policy EVICT_DAILY or EVICT_WEEKLY",
        ));
    }
    if cache.max_lifespan.is_some() && cache.policy != CachePolicy::MaxLifespan {
        return Err(DomainError::validation(
            "max_lifespan",
            "only valid with cache policy MAX_LIFESPAN",
        ));
    }

    validate_whole_millis("max_lifespan", cache.max_lifespan)
}
