use super::component::{Component, LDAP_MAPPER_PROVIDER_TYPE};
use super::config_schema::{ConfigOption, ConfigReader, ConfigWriter};
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

const READ_ONLY: ConfigOption = ConfigOption::boolean("read.only");
const WRITE_ONLY: ConfigOption = ConfigOption::boolean("write.only");
const FULL_NAME_ATTRIBUTE: ConfigOption = ConfigOption::text("ldap.full.name.attribute");

const USER_MODEL_ATTRIBUTE: ConfigOption = ConfigOption::text("user.model.attribute");
const LDAP_ATTRIBUTE: ConfigOption = ConfigOption::text("ldap.attribute");
const ALWAYS_READ_FROM_LDAP: ConfigOption = ConfigOption::boolean("always.read.value.from.ldap");
const MANDATORY_IN_LDAP: ConfigOption = ConfigOption::boolean("is.mandatory.in.ldap");
const ATTRIBUTE_DEFAULT_VALUE: ConfigOption = ConfigOption::text("attribute.default.value");

const GROUPS_DN: ConfigOption = ConfigOption::text("groups.dn");
const GROUP_NAME_ATTRIBUTE: ConfigOption = ConfigOption::text("group.name.ldap.attribute");
const GROUP_OBJECT_CLASSES: ConfigOption = ConfigOption::comma_list("group.object.classes");
const PRESERVE_GROUP_INHERITANCE: ConfigOption =
    ConfigOption::boolean("preserve.group.inheritance");
const IGNORE_MISSING_GROUPS: ConfigOption = ConfigOption::boolean("ignore.missing.groups");
const GROUPS_LDAP_FILTER: ConfigOption = ConfigOption::text("groups.ldap.filter");
const MAPPED_GROUP_ATTRIBUTES: ConfigOption = ConfigOption::comma_list("mapped.group.attributes");
const DROP_NON_EXISTING_GROUPS: ConfigOption =
    ConfigOption::boolean("drop.non.existing.groups.during.sync");

const ROLES_DN: ConfigOption = ConfigOption::text("roles.dn");
const ROLE_NAME_ATTRIBUTE: ConfigOption = ConfigOption::text("role.name.ldap.attribute");
const ROLE_OBJECT_CLASSES: ConfigOption = ConfigOption::comma_list("role.object.classes");
const ROLES_LDAP_FILTER: ConfigOption = ConfigOption::text("roles.ldap.filter");
const USE_REALM_ROLES_MAPPING: ConfigOption = ConfigOption::boolean("use.realm.roles.mapping");
const CLIENT_ID: ConfigOption = ConfigOption::text("client.id");

const MEMBERSHIP_ATTRIBUTE: ConfigOption = ConfigOption::text("membership.ldap.attribute");
const MEMBERSHIP_ATTRIBUTE_TYPE: ConfigOption = ConfigOption::text("membership.attribute.type");
const MEMBERSHIP_USER_ATTRIBUTE: ConfigOption =
    ConfigOption::text("membership.user.ldap.attribute");
const MODE: ConfigOption = ConfigOption::text("mode");
const RETRIEVE_STRATEGY: ConfigOption = ConfigOption::text("user.roles.retrieve.strategy");
const MEMBEROF_ATTRIBUTE: ConfigOption = ConfigOption::text("memberof.ldap.attribute");

const HARDCODED_GROUP: ConfigOption = ConfigOption::text("group");
const HARDCODED_ROLE: ConfigOption = ConfigOption::text("role");
const PASSWORD_POLICY_HINTS: ConfigOption =
    ConfigOption::boolean("ldap.password.policy.hints.enabled");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullNameMapping {
    pub ldap_full_name_attribute: String,
    pub read_only: bool,
    pub write_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributeMapping {
    pub user_model_attribute: String,
    pub ldap_attribute: String,
    pub read_only: bool,
    pub always_read_value_from_ldap: bool,
    pub is_mandatory_in_ldap: bool,
    pub attribute_default_value: Option<String>,
}

/// Membership settings shared by group and role mappers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSettings {
    pub membership_ldap_attribute: String,
    pub membership_attribute_type: String,
    pub membership_user_ldap_attribute: String,
    pub mode: String,
    pub user_roles_retrieve_strategy: String,
    pub memberof_ldap_attribute: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMapping {
    pub ldap_groups_dn: String,
    pub group_name_ldap_attribute: String,
    pub group_object_classes: Vec<String>,
    pub preserve_group_inheritance: bool,
    pub ignore_missing_groups: bool,
    pub groups_ldap_filter: Option<String>,
    pub mapped_group_attributes: Vec<String>,
    pub drop_non_existing_groups_during_sync: bool,
    pub membership: MembershipSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub ldap_roles_dn: String,
    pub role_name_ldap_attribute: String,
    pub role_object_classes: Vec<String>,
    pub roles_ldap_filter: Option<String>,
    pub use_realm_roles_mapping: bool,
    pub client_id: Option<String>,
    pub membership: MembershipSettings,
}

/// Typed payload of each LDAP mapper kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LdapMapperKind {
    FullName(FullNameMapping),
    UserAttribute(UserAttributeMapping),
    Group(GroupMapping),
    Role(RoleMapping),
    HardcodedGroup { group: String },
    HardcodedRole { role: String },
    MsadUserAccountControl { ldap_password_policy_hints_enabled: bool },
    MsadLdsUserAccountControl,
}

type MapperDecoder = fn(&ConfigReader<'_>) -> DomainResult<LdapMapperKind>;

/// Provider ids Keycloak uses for LDAP mappers, paired with their decoders
const DISPATCH: &[(&str, MapperDecoder)] = &[
    ("full-name-ldap-mapper", decode_full_name),
    ("user-attribute-ldap-mapper", decode_user_attribute),
    ("group-ldap-mapper", decode_group),
    ("role-ldap-mapper", decode_role),
    ("hardcoded-ldap-group-mapper", decode_hardcoded_group),
    ("hardcoded-ldap-role-mapper", decode_hardcoded_role),
    ("msad-user-account-control-mapper", decode_msad),
    ("msad-lds-user-account-control-mapper", decode_msad_lds),
];

impl LdapMapperKind {
    pub fn provider_id(&self) -> &'static str {
        match self {
            LdapMapperKind::FullName(_) => "full-name-ldap-mapper",
            LdapMapperKind::UserAttribute(_) => "user-attribute-ldap-mapper",
            LdapMapperKind::Group(_) => "group-ldap-mapper",
            LdapMapperKind::Role(_) => "role-ldap-mapper",
            LdapMapperKind::HardcodedGroup { .. } => "hardcoded-ldap-group-mapper",
            LdapMapperKind::HardcodedRole { .. } => "hardcoded-ldap-role-mapper",
            LdapMapperKind::MsadUserAccountControl { .. } => "msad-user-account-control-mapper",
            LdapMapperKind::MsadLdsUserAccountControl => "msad-lds-user-account-control-mapper",
        }
    }

    pub fn is_known_provider(provider_id: &str) -> bool {
        DISPATCH.iter().any(|(id, _)| *id == provider_id)
    }

    fn encode(&self, w: &mut ConfigWriter) -> DomainResult<()> {
        match self {
            LdapMapperKind::FullName(m) => {
                w.text(&FULL_NAME_ATTRIBUTE, &m.ldap_full_name_attribute)?;
                w.boolean(&READ_ONLY, m.read_only)?;
                w.boolean(&WRITE_ONLY, m.write_only)?;
            }
            LdapMapperKind::UserAttribute(m) => {
                w.text(&USER_MODEL_ATTRIBUTE, &m.user_model_attribute)?;
                w.text(&LDAP_ATTRIBUTE, &m.ldap_attribute)?;
                w.boolean(&READ_ONLY, m.read_only)?;
                w.boolean(&ALWAYS_READ_FROM_LDAP, m.always_read_value_from_ldap)?;
                w.boolean(&MANDATORY_IN_LDAP, m.is_mandatory_in_ldap)?;
                w.optional_text(&ATTRIBUTE_DEFAULT_VALUE, m.attribute_default_value.as_deref())?;
            }
            LdapMapperKind::Group(m) => {
                w.text(&GROUPS_DN, &m.ldap_groups_dn)?;
                w.text(&GROUP_NAME_ATTRIBUTE, &m.group_name_ldap_attribute)?;
                w.comma_list(&GROUP_OBJECT_CLASSES, &m.group_object_classes)?;
                w.boolean(&PRESERVE_GROUP_INHERITANCE, m.preserve_group_inheritance)?;
                w.boolean(&IGNORE_MISSING_GROUPS, m.ignore_missing_groups)?;
                w.optional_text(&GROUPS_LDAP_FILTER, m.groups_ldap_filter.as_deref())?;
                w.comma_list(&MAPPED_GROUP_ATTRIBUTES, &m.mapped_group_attributes)?;
                w.boolean(&DROP_NON_EXISTING_GROUPS, m.drop_non_existing_groups_during_sync)?;
                encode_membership(w, &m.membership)?;
            }
            LdapMapperKind::Role(m) => {
                w.text(&ROLES_DN, &m.ldap_roles_dn)?;
                w.text(&ROLE_NAME_ATTRIBUTE, &m.role_name_ldap_attribute)?;
                w.comma_list(&ROLE_OBJECT_CLASSES, &m.role_object_classes)?;
                w.optional_text(&ROLES_LDAP_FILTER, m.roles_ldap_filter.as_deref())?;
                w.boolean(&USE_REALM_ROLES_MAPPING, m.use_realm_roles_mapping)?;
                w.optional_text(&CLIENT_ID, m.client_id.as_deref())?;
                encode_membership(w, &m.membership)?;
            }
            LdapMapperKind::HardcodedGroup { group } => w.text(&HARDCODED_GROUP, group)?,
            LdapMapperKind::HardcodedRole { role } => w.text(&HARDCODED_ROLE, role)?,
            LdapMapperKind::MsadUserAccountControl {
                ldap_password_policy_hints_enabled,
            } => w.boolean(&PASSWORD_POLICY_HINTS, *ldap_password_policy_hints_enabled)?,
            LdapMapperKind::MsadLdsUserAccountControl => {}
        }
        Ok(())
    }
}

/// Mapper component hanging off an LDAP user federation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapMapper {
    pub id: Option<String>,
    pub name: String,
    pub realm_id: String,
    pub ldap_user_federation_id: String,
    pub kind: LdapMapperKind,
}

impl LdapMapper {
    pub fn to_component(&self) -> DomainResult<Component> {
        if self.ldap_user_federation_id.is_empty() {
            return Err(DomainError::validation(
                "ldap_user_federation_id",
                "Mapper must reference an LDAP user federation",
            ));
        }

        let mut writer = ConfigWriter::new();
        self.kind.encode(&mut writer)?;

        let mut component = Component::new(
            &self.name,
            self.kind.provider_id(),
            LDAP_MAPPER_PROVIDER_TYPE,
            &self.ldap_user_federation_id,
        );
        component.id = self.id.clone().map(Into::into);
        component.config = writer.finish();
        Ok(component)
    }

    /// Decode a mapper component; `None` for provider ids outside the known set
    pub fn from_component(realm_id: &str, component: &Component) -> DomainResult<Option<Self>> {
        let Some((_, decode)) = DISPATCH
            .iter()
            .find(|(provider_id, _)| *provider_id == component.provider_id)
        else {
            return Ok(None);
        };

        let kind = decode(&ConfigReader::new(component))?;
        Ok(Some(Self {
            id: component.id.as_ref().map(|id| id.as_str().to_string()),
            name: component.name.clone(),
            realm_id: realm_id.to_string(),
            ldap_user_federation_id: component.parent_id.clone(),
            kind,
        }))
    }
}

fn encode_membership(w: &mut ConfigWriter, m: &MembershipSettings) -> DomainResult<()> {
    w.text(&MEMBERSHIP_ATTRIBUTE, &m.membership_ldap_attribute)?;
    w.text(&MEMBERSHIP_ATTRIBUTE_TYPE, &m.membership_attribute_type)?;
    w.text(&MEMBERSHIP_USER_ATTRIBUTE, &m.membership_user_ldap_attribute)?;
    w.text(&MODE, &m.mode)?;
    w.text(&RETRIEVE_STRATEGY, &m.user_roles_retrieve_strategy)?;
    w.optional_text(&MEMBEROF_ATTRIBUTE, m.memberof_ldap_attribute.as_deref())
}

fn decode_membership(r: &ConfigReader<'_>) -> DomainResult<MembershipSettings> {
    Ok(MembershipSettings {
        membership_ldap_attribute: r.text(&MEMBERSHIP_ATTRIBUTE)?,
        membership_attribute_type: r.text(&MEMBERSHIP_ATTRIBUTE_TYPE)?,
        membership_user_ldap_attribute: r.text(&MEMBERSHIP_USER_ATTRIBUTE)?,
        mode: r.text(&MODE)?,
        user_roles_retrieve_strategy: r.text(&RETRIEVE_STRATEGY)?,
        memberof_ldap_attribute: r.optional_text(&MEMBEROF_ATTRIBUTE)?,
    })
}

fn decode_full_name(r: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::FullName(FullNameMapping {
        ldap_full_name_attribute: r.text(&FULL_NAME_ATTRIBUTE)?,
        read_only: r.boolean(&READ_ONLY)?,
        write_only: r.boolean(&WRITE_ONLY)?,
    }))
}

fn decode_user_attribute(r: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::UserAttribute(UserAttributeMapping {
        user_model_attribute: r.text(&USER_MODEL_ATTRIBUTE)?,
        ldap_attribute: r.text(&LDAP_ATTRIBUTE)?,
        read_only: r.boolean(&READ_ONLY)?,
        always_read_value_from_ldap: r.boolean(&ALWAYS_READ_FROM_LDAP)?,
        is_mandatory_in_ldap: r.boolean(&MANDATORY_IN_LDAP)?,
        attribute_default_value: r.optional_text(&ATTRIBUTE_DEFAULT_VALUE)?,
    }))
}

fn decode_group(r: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::Group(GroupMapping {
        ldap_groups_dn: r.text(&GROUPS_DN)?,
        group_name_ldap_attribute: r.text(&GROUP_NAME_ATTRIBUTE)?,
        group_object_classes: r.comma_list(&GROUP_OBJECT_CLASSES)?,
        preserve_group_inheritance: r.boolean(&PRESERVE_GROUP_INHERITANCE)?,
        ignore_missing_groups: r.boolean(&IGNORE_MISSING_GROUPS)?,
        groups_ldap_filter: r.optional_text(&GROUPS_LDAP_FILTER)?,
        mapped_group_attributes: r.comma_list(&MAPPED_GROUP_ATTRIBUTES)?,
        drop_non_existing_groups_during_sync: r.boolean(&DROP_NON_EXISTING_GROUPS)?,
        membership: decode_membership(r)?,
    }))
}

fn decode_role(r: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::Role(RoleMapping {
        ldap_roles_dn: r.text(&ROLES_DN)?,
        role_name_ldap_attribute: r.text(&ROLE_NAME_ATTRIBUTE)?,
        role_object_classes: r.comma_list(&ROLE_OBJECT_CLASSES)?,
        roles_ldap_filter: r.optional_text(&ROLES_LDAP_FILTER)?,
        use_realm_roles_mapping: r.boolean(&USE_REALM_ROLES_MAPPING)?,
        client_id: r.optional_text(&CLIENT_ID)?,
        membership: decode_membership(r)?,
    }))
}

fn decode_hardcoded_group(r: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::HardcodedGroup {
        group: r.text(&HARDCODED_GROUP)?,
    })
}

fn decode_hardcoded_role(r: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::HardcodedRole {
        role: r.text(&HARDCODED_ROLE)?,
    })
}

fn decode_msad(r: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::MsadUserAccountControl {
        ldap_password_policy_hints_enabled: r.boolean(&PASSWORD_POLICY_HINTS)?,
    })
}

fn decode_msad_lds(_: &ConfigReader<'_>) -> DomainResult<LdapMapperKind> {
    Ok(LdapMapperKind::MsadLdsUserAccountControl)
}
