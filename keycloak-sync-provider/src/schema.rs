//! Attribute schemas the configuration engine validates resource definitions against.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Bool,
    Int,
    /// Unordered collection of unique strings
    Set,
    /// Ordered collection of strings
    List,
    /// String to string map
    Map,
    /// Single nested block with its own attributes
    Block(Schema),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub required: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType) -> Self {
        Self {
            name,
            kind,
            required: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            allowed_values: Vec::new(),
            description: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, AttributeType::Int)
    }

    pub fn set(name: &'static str) -> Self {
        Self::new(name, AttributeType::Set)
    }

    pub fn list(name: &'static str) -> Self {
        Self::new(name, AttributeType::List)
    }

    pub fn map(name: &'static str) -> Self {
        Self::new(name, AttributeType::Map)
    }

    pub fn block(name: &'static str, schema: Schema) -> Self {
        Self::new(name, AttributeType::Block(schema))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, values: impl IntoIterator<Item = &'static str>) -> Self {
        self.allowed_values = values.into_iter().collect();
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    fn check(&self, value: &Value) -> ProviderResult<()> {
        let type_error = |expected: &str| {
            ProviderError::invalid_attribute(self.name, format!("expected {expected}, got {value}"))
        };

        match &self.kind {
            AttributeType::String => {
                let text = value.as_str().ok_or_else(|| type_error("a string"))?;
                self.check_allowed(text)?;
            }
            AttributeType::Bool => {
                value.as_bool().ok_or_else(|| type_error("a boolean"))?;
            }
            AttributeType::Int => {
                value.as_i64().ok_or_else(|| type_error("an integer"))?;
            }
            AttributeType::Set | AttributeType::List => {
                let items = value.as_array().ok_or_else(|| type_error("a list of strings"))?;
                for item in items {
                    let text = item.as_str().ok_or_else(|| type_error("a list of strings"))?;
                    self.check_allowed(text)?;
                }
            }
            AttributeType::Map => {
                let entries = value.as_object().ok_or_else(|| type_error("a map of strings"))?;
                if entries.values().any(|v| !v.is_string()) {
                    return Err(type_error("a map of strings"));
                }
            }
            AttributeType::Block(schema) => {
                let attributes = value.as_object().ok_or_else(|| type_error("a block"))?;
                schema
                    .check_attributes(attributes)
                    .map_err(|e| match e {
                        ProviderError::InvalidAttribute { name, message } => {
                            ProviderError::invalid_attribute(format!("{}.{name}", self.name), message)
                        }
                        other => other,
                    })?;
            }
        }

        Ok(())
    }

    fn check_allowed(&self, value: &str) -> ProviderResult<()> {
        if self.allowed_values.is_empty() || self.allowed_values.contains(&value) {
            return Ok(());
        }
        Err(ProviderError::invalid_attribute(
            self.name,
            format!(
                "`{value}` is not one of: {}",
                self.allowed_values.join(", ")
            ),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Fill absent attributes, including those of present blocks, with their defaults
    pub fn apply_defaults(&self, data: &mut ResourceData) {
        apply_defaults_to(self, &mut data.attributes);
    }

    /// Check required attributes, value types and allowed values.
    ///
    /// Attributes the schema does not know are rejected.
    pub fn validate(&self, data: &ResourceData) -> ProviderResult<()> {
        self.check_attributes(&data.attributes)
    }

    /// Defaults first, then validation
    pub fn prepare(&self, mut data: ResourceData) -> ProviderResult<ResourceData> {
        self.apply_defaults(&mut data);
        self.validate(&data)?;
        Ok(data)
    }

    fn check_attributes(&self, attributes: &Map<String, Value>) -> ProviderResult<()> {
        if let Some(unknown) = attributes.keys().find(|key| self.attribute(key).is_none()) {
            return Err(ProviderError::invalid_attribute(
                unknown.as_str(),
                "not a known attribute",
            ));
        }

        for attribute in &self.attributes {
            match attributes.get(attribute.name) {
                None | Some(Value::Null) => {
                    if attribute.required {
                        return Err(ProviderError::invalid_attribute(
                            attribute.name,
                            "is required",
                        ));
                    }
                }
                Some(value) => attribute.check(value)?,
            }
        }

        Ok(())
    }
}

fn apply_defaults_to(schema: &Schema, attributes: &mut Map<String, Value>) {
    for attribute in &schema.attributes {
        if matches!(attributes.get(attribute.name), None | Some(Value::Null)) {
            if let Some(default) = &attribute.default {
                attributes.insert(attribute.name.to_string(), default.clone());
            }
            continue;
        }

        if let (Some(Value::Object(nested)), AttributeType::Block(block)) =
            (attributes.get_mut(attribute.name), &attribute.kind)
        {
            apply_defaults_to(block, nested);
        }
    }
}
