use async_trait::async_trait;
use keycloak_sync_domain::{
    application::services::LdapFederationService,
    domain::entities::{
        FullNameMapping, GroupMapping, LdapMapper, LdapMapperKind, MembershipSettings,
        RoleMapping, UserAttributeMapping,
    },
};
use std::sync::Arc;
use tracing::instrument;

use super::{Resource, REALM_ID};
use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

const FEDERATION_ID: &str = "ldap_user_federation_id";

const MAPPER_MODES: [&str; 3] = ["READ_ONLY", "IMPORT", "LDAP_ONLY"];
const MEMBERSHIP_TYPES: [&str; 2] = ["DN", "UID"];
const GROUP_STRATEGIES: [&str; 3] = [
    "LOAD_GROUPS_BY_MEMBER_ATTRIBUTE",
    "GET_GROUPS_FROM_USER_MEMBEROF_ATTRIBUTE",
    "LOAD_GROUPS_BY_MEMBER_ATTRIBUTE_RECURSIVELY",
];
const ROLE_STRATEGIES: [&str; 3] = [
    "LOAD_ROLES_BY_MEMBER_ATTRIBUTE",
    "GET_ROLES_FROM_USER_MEMBEROF_ATTRIBUTE",
    "LOAD_ROLES_BY_MEMBER_ATTRIBUTE_RECURSIVELY",
];

/// Resource name, Keycloak provider id and attribute mapping of one mapper kind
struct MapperKindSpec {
    type_name: &'static str,
    provider_id: &'static str,
    attributes: fn() -> Vec<Attribute>,
    decode: fn(&ResourceData) -> ProviderResult<LdapMapperKind>,
}

const KINDS: &[MapperKindSpec] = &[
    MapperKindSpec {
        type_name: "keycloak_ldap_full_name_mapper",
        provider_id: "full-name-ldap-mapper",
        attributes: full_name_attributes,
        decode: full_name_from,
    },
    MapperKindSpec {
        type_name: "keycloak_ldap_user_attribute_mapper",
        provider_id: "user-attribute-ldap-mapper",
        attributes: user_attribute_attributes,
        decode: user_attribute_from,
    },
    MapperKindSpec {
        type_name: "keycloak_ldap_group_mapper",
        provider_id: "group-ldap-mapper",
        attributes: group_attributes,
        decode: group_from,
    },
    MapperKindSpec {
        type_name: "keycloak_ldap_role_mapper",
        provider_id: "role-ldap-mapper",
        attributes: role_attributes,
        decode: role_from,
    },
    MapperKindSpec {
        type_name: "keycloak_ldap_hardcoded_group_mapper",
        provider_id: "hardcoded-ldap-group-mapper",
        attributes: || vec![Attribute::string("group").required()],
        decode: |data| {
            Ok(LdapMapperKind::HardcodedGroup {
                group: data.get_string("group")?,
            })
        },
    },
    MapperKindSpec {
        type_name: "keycloak_ldap_hardcoded_role_mapper",
        provider_id: "hardcoded-ldap-role-mapper",
        attributes: || {
            vec![Attribute::string("role")
                .required()
                .describe("Realm role name, or `clientId.roleName` for a client role")]
        },
        decode: |data| {
            Ok(LdapMapperKind::HardcodedRole {
                role: data.get_string("role")?,
            })
        },
    },
    MapperKindSpec {
        type_name: "keycloak_ldap_msad_user_account_control_mapper",
        provider_id: "msad-user-account-control-mapper",
        attributes: || {
            vec![Attribute::bool("ldap_password_policy_hints_enabled").default_value(false)]
        },
        decode: |data| {
            Ok(LdapMapperKind::MsadUserAccountControl {
                ldap_password_policy_hints_enabled: data
                    .get_bool("ldap_password_policy_hints_enabled")?,
            })
        },
    },
    MapperKindSpec {
        type_name: "keycloak_ldap_msad_lds_user_account_control_mapper",
        provider_id: "msad-lds-user-account-control-mapper",
        attributes: Vec::new,
        decode: |_| Ok(LdapMapperKind::MsadLdsUserAccountControl),
    },
];

fn full_name_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("ldap_full_name_attribute").required(),
        Attribute::bool("read_only").default_value(false),
        Attribute::bool("write_only").default_value(false),
    ]
}

fn full_name_from(data: &ResourceData) -> ProviderResult<LdapMapperKind> {
    Ok(LdapMapperKind::FullName(FullNameMapping {
        ldap_full_name_attribute: data.get_string("ldap_full_name_attribute")?,
        read_only: data.get_bool("read_only")?,
        write_only: data.get_bool("write_only")?,
    }))
}

fn user_attribute_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("user_model_attribute").required(),
        Attribute::string("ldap_attribute").required(),
        Attribute::bool("read_only").default_value(false),
        Attribute::bool("always_read_value_from_ldap").default_value(false),
        Attribute::bool("is_mandatory_in_ldap").default_value(false),
        Attribute::string("attribute_default_value"),
    ]
}

fn user_attribute_from(data: &ResourceData) -> ProviderResult<LdapMapperKind> {
    Ok(LdapMapperKind::UserAttribute(UserAttributeMapping {
        user_model_attribute: data.get_string("user_model_attribute")?,
        ldap_attribute: data.get_string("ldap_attribute")?,
        read_only: data.get_bool("read_only")?,
        always_read_value_from_ldap: data.get_bool("always_read_value_from_ldap")?,
        is_mandatory_in_ldap: data.get_bool("is_mandatory_in_ldap")?,
        attribute_default_value: data.get_optional_string("attribute_default_value")?,
    }))
}

fn membership_attributes(strategies: [&'static str; 3]) -> Vec<Attribute> {
    vec![
        Attribute::string("membership_ldap_attribute").required(),
        Attribute::string("membership_attribute_type")
            .default_value("DN")
            .one_of(MEMBERSHIP_TYPES),
        Attribute::string("membership_user_ldap_attribute").required(),
        Attribute::string("mode")
            .default_value("READ_ONLY")
            .one_of(MAPPER_MODES),
        Attribute::string("user_roles_retrieve_strategy")
            .default_value(strategies[0])
            .one_of(strategies),
        Attribute::string("memberof_ldap_attribute"),
    ]
}

fn membership_from(data: &ResourceData) -> ProviderResult<MembershipSettings> {
    Ok(MembershipSettings {
        membership_ldap_attribute: data.get_string("membership_ldap_attribute")?,
        membership_attribute_type: data.get_string("membership_attribute_type")?,
        membership_user_ldap_attribute: data.get_string("membership_user_ldap_attribute")?,
        mode: data.get_string("mode")?,
        user_roles_retrieve_strategy: data.get_string("user_roles_retrieve_strategy")?,
        memberof_ldap_attribute: data.get_optional_string("memberof_ldap_attribute")?,
    })
}

fn group_attributes() -> Vec<Attribute> {
    let mut attributes = vec![
        Attribute::string("ldap_groups_dn").required(),
        Attribute::string("group_name_ldap_attribute").required(),
        Attribute::list("group_object_classes").required(),
        Attribute::bool("preserve_group_inheritance").default_value(true),
        Attribute::bool("ignore_missing_groups").default_value(false),
        Attribute::string("groups_ldap_filter"),
        Attribute::list("mapped_group_attributes"),
        Attribute::bool("drop_non_existing_groups_during_sync").default_value(false),
    ];
    attributes.extend(membership_attributes(GROUP_STRATEGIES));
    attributes
}

fn group_from(data: &ResourceData) -> ProviderResult<LdapMapperKind> {
    Ok(LdapMapperKind::Group(GroupMapping {
        ldap_groups_dn: data.get_string("ldap_groups_dn")?,
        group_name_ldap_attribute: data.get_string("group_name_ldap_attribute")?,
        group_object_classes: data.get_string_list("group_object_classes")?,
        preserve_group_inheritance: data.get_bool("preserve_group_inheritance")?,
        ignore_missing_groups: data.get_bool("ignore_missing_groups")?,
        groups_ldap_filter: data.get_optional_string("groups_ldap_filter")?,
        mapped_group_attributes: data.get_string_list("mapped_group_attributes")?,
        drop_non_existing_groups_during_sync: data
            .get_bool("drop_non_existing_groups_during_sync")?,
        membership: membership_from(data)?,
    }))
}

fn role_attributes() -> Vec<Attribute> {
    let mut attributes = vec![
        Attribute::string("ldap_roles_dn").required(),
        Attribute::string("role_name_ldap_attribute").required(),
        Attribute::list("role_object_classes").required(),
        Attribute::string("roles_ldap_filter"),
        Attribute::bool("use_realm_roles_mapping").default_value(true),
        Attribute::string("client_id")
            .describe("Client whose roles are mapped when realm role mapping is off"),
    ];
    attributes.extend(membership_attributes(ROLE_STRATEGIES));
    attributes
}

fn role_from(data: &ResourceData) -> ProviderResult<LdapMapperKind> {
    Ok(LdapMapperKind::Role(RoleMapping {
        ldap_roles_dn: data.get_string("ldap_roles_dn")?,
        role_name_ldap_attribute: data.get_string("role_name_ldap_attribute")?,
        role_object_classes: data.get_string_list("role_object_classes")?,
        roles_ldap_filter: data.get_optional_string("roles_ldap_filter")?,
        use_realm_roles_mapping: data.get_bool("use_realm_roles_mapping")?,
        client_id: data.get_optional_string("client_id")?,
        membership: membership_from(data)?,
    }))
}

fn write_membership(data: &mut ResourceData, m: &MembershipSettings) {
    data.set("membership_ldap_attribute", m.membership_ldap_attribute.clone());
    data.set("membership_attribute_type", m.membership_attribute_type.clone());
    data.set("membership_user_ldap_attribute", m.membership_user_ldap_attribute.clone());
    data.set("mode", m.mode.clone());
    data.set("user_roles_retrieve_strategy", m.user_roles_retrieve_strategy.clone());
    data.set_optional("memberof_ldap_attribute", m.memberof_ldap_attribute.clone());
}

fn write_kind(data: &mut ResourceData, kind: &LdapMapperKind) {
    match kind {
        LdapMapperKind::FullName(m) => {
            data.set("ldap_full_name_attribute", m.ldap_full_name_attribute.clone());
            data.set("read_only", m.read_only);
            data.set("write_only", m.write_only);
        }
        LdapMapperKind::UserAttribute(m) => {
            data.set("user_model_attribute", m.user_model_attribute.clone());
            data.set("ldap_attribute", m.ldap_attribute.clone());
            data.set("read_only", m.read_only);
            data.set("always_read_value_from_ldap", m.always_read_value_from_ldap);
            data.set("is_mandatory_in_ldap", m.is_mandatory_in_ldap);
            data.set_optional("attribute_default_value", m.attribute_default_value.clone());
        }
        LdapMapperKind::Group(m) => {
            data.set("ldap_groups_dn", m.ldap_groups_dn.clone());
            data.set("group_name_ldap_attribute", m.group_name_ldap_attribute.clone());
            data.set_strings("group_object_classes", m.group_object_classes.iter().cloned());
            data.set("preserve_group_inheritance", m.preserve_group_inheritance);
            data.set("ignore_missing_groups", m.ignore_missing_groups);
            data.set_optional("groups_ldap_filter", m.groups_ldap_filter.clone());
            data.set_strings("mapped_group_attributes", m.mapped_group_attributes.iter().cloned());
            data.set(
                "drop_non_existing_groups_during_sync",
                m.drop_non_existing_groups_during_sync,
            );
            write_membership(data, &m.membership);
        }
        LdapMapperKind::Role(m) => {
            data.set("ldap_roles_dn", m.ldap_roles_dn.clone());
            data.set("role_name_ldap_attribute", m.role_name_ldap_attribute.clone());
            data.set_strings("role_object_classes", m.role_object_classes.iter().cloned());
            data.set_optional("roles_ldap_filter", m.roles_ldap_filter.clone());
            data.set("use_realm_roles_mapping", m.use_realm_roles_mapping);
            data.set_optional("client_id", m.client_id.clone());
            write_membership(data, &m.membership);
        }
        LdapMapperKind::HardcodedGroup { group } => data.set("group", group.clone()),
        LdapMapperKind::HardcodedRole { role } => data.set("role", role.clone()),
        LdapMapperKind::MsadUserAccountControl {
            ldap_password_policy_hints_enabled,
        } => data.set(
            "ldap_password_policy_hints_enabled",
            *ldap_password_policy_hints_enabled,
        ),
        LdapMapperKind::MsadLdsUserAccountControl => {}
    }
}

/// One `keycloak_ldap_*_mapper` resource per mapper kind.
///
/// Every kind is a component under an LDAP user federation; reading an id
/// that belongs to a different kind is rejected rather than rewritten.
pub struct LdapMapperResource {
    kind: &'static MapperKindSpec,
    service: Arc<LdapFederationService>,
}

impl LdapMapperResource {
    pub fn all(service: Arc<LdapFederationService>) -> Vec<Self> {
        KINDS
            .iter()
            .map(|kind| Self {
                kind,
                service: service.clone(),
            })
            .collect()
    }

    fn mapper_from(&self, data: &ResourceData) -> ProviderResult<LdapMapper> {
        Ok(LdapMapper {
            id: data.id().map(str::to_string),
            name: data.get_string("name")?,
            realm_id: data.get_string(REALM_ID)?,
            ldap_user_federation_id: data.get_string(FEDERATION_ID)?,
            kind: (self.kind.decode)(data)?,
        })
    }

    fn write(&self, data: &mut ResourceData, mapper: &LdapMapper) -> ProviderResult<()> {
        let provider_id = mapper.kind.provider_id();
        if provider_id != self.kind.provider_id {
            return Err(ProviderError::invalid_attribute(
                "id",
                format!(
                    "mapper '{}' is a {provider_id}, not a {}",
                    mapper.name, self.kind.provider_id
                ),
            ));
        }

        if let Some(id) = &mapper.id {
            data.set_id(id.clone());
        }
        data.set(REALM_ID, mapper.realm_id.clone());
        data.set(FEDERATION_ID, mapper.ldap_user_federation_id.clone());
        data.set("name", mapper.name.clone());
        write_kind(data, &mapper.kind);
        Ok(())
    }
}

#[async_trait]
impl Resource for LdapMapperResource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name
    }

    fn schema(&self) -> Schema {
        let mut attributes = vec![
            Attribute::string("name").required(),
            Attribute::string(REALM_ID).required().force_new(),
            Attribute::string(FEDERATION_ID).required().force_new(),
        ];
        attributes.extend((self.kind.attributes)());
        Schema::new(attributes)
    }

    fn import_formats(&self) -> &'static [&'static str] {
        &["{realm}/{federationId}/{mapperId}"]
    }

    #[instrument(skip(self, data), fields(kind = %self.kind.provider_id))]
    async fn create(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let created = self.service.create_mapper(&self.mapper_from(&data)?).await?;
        self.write(&mut data, &created)?;
        Ok(data)
    }

    #[instrument(skip(self, data), fields(kind = %self.kind.provider_id, id = ?data.id()))]
    async fn read(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let realm = data.get_string(REALM_ID)?;
        let mapper = self.service.get_mapper(&realm, data.require_id()?).await?;
        self.write(&mut data, &mapper)?;
        Ok(data)
    }

    #[instrument(skip(self, data), fields(kind = %self.kind.provider_id, id = ?data.id()))]
    async fn update(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        let updated = self.service.update_mapper(&self.mapper_from(&data)?).await?;
        self.write(&mut data, &updated)?;
        Ok(data)
    }

    #[instrument(skip(self, data), fields(kind = %self.kind.provider_id, id = ?data.id()))]
    async fn delete(&self, data: ResourceData) -> ProviderResult<()> {
        let realm = data.get_string(REALM_ID)?;
        Ok(self.service.delete_mapper(&realm, data.require_id()?).await?)
    }

    fn import(&self, parts: Vec<String>) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::new();
        data.set(REALM_ID, parts[0].clone());
        data.set(FEDERATION_ID, parts[1].clone());
        data.set_id(parts[2].clone());
        Ok(data)
    }
}
