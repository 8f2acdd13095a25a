use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ProviderError, ProviderResult};

/// Attribute bag exchanged with the configuration engine.
///
/// Getters treat an absent or `null` attribute as the type's zero value and
/// fail on a value of the wrong type. Defaults come from
/// [`Schema::apply_defaults`](crate::schema::Schema::apply_defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn require_id(&self) -> ProviderResult<&str> {
        self.id()
            .ok_or_else(|| ProviderError::invalid_attribute("id", "resource has no id"))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Marks the resource as gone
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Present and not `null`
    pub fn has(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    fn value(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    fn type_error(&self, name: &str, expected: &str) -> ProviderError {
        let got = self.value(name).map(Value::to_string).unwrap_or_default();
        ProviderError::invalid_attribute(name, format!("expected {expected}, got {got}"))
    }

    pub fn get_string(&self, name: &str) -> ProviderResult<String> {
        Ok(self.get_optional_string(name)?.unwrap_or_default())
    }

    /// `None` for absent, `null` and empty strings
    pub fn get_optional_string(&self, name: &str) -> ProviderResult<Option<String>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.type_error(name, "a string")),
        }
    }

    pub fn get_bool(&self, name: &str) -> ProviderResult<bool> {
        match self.value(name) {
            None => Ok(false),
            Some(value) => value.as_bool().ok_or_else(|| self.type_error(name, "a boolean")),
        }
    }

    pub fn get_int(&self, name: &str) -> ProviderResult<i64> {
        Ok(self.get_optional_int(name)?.unwrap_or_default())
    }

    pub fn get_optional_int(&self, name: &str) -> ProviderResult<Option<i64>> {
        match self.value(name) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.type_error(name, "an integer")),
        }
    }

    pub fn get_string_list(&self, name: &str) -> ProviderResult<Vec<String>> {
        match self.value(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.type_error(name, "a list of strings"))
                })
                .collect(),
            Some(_) => Err(self.type_error(name, "a list of strings")),
        }
    }

    pub fn get_string_set(&self, name: &str) -> ProviderResult<BTreeSet<String>> {
        Ok(self.get_string_list(name)?.into_iter().collect())
    }

    pub fn get_string_map(&self, name: &str) -> ProviderResult<BTreeMap<String, String>> {
        match self.value(name) {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(key, value)| {
                    value
                        .as_str()
                        .map(|v| (key.clone(), v.to_string()))
                        .ok_or_else(|| self.type_error(name, "a map of strings"))
                })
                .collect(),
            Some(_) => Err(self.type_error(name, "a map of strings")),
        }
    }

    /// Nested block as its own bag, or `None` when the block is not set
    pub fn get_block(&self, name: &str) -> ProviderResult<Option<ResourceData>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::Object(attributes)) => Ok(Some(Self::from_attributes(attributes.clone()))),
            Some(_) => Err(self.type_error(name, "a block")),
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Writes `null` for `None`
    pub fn set_optional<T: Into<Value>>(&mut self, name: &str, value: Option<T>) {
        let value = value.map(Into::into).unwrap_or(Value::Null);
        self.attributes.insert(name.to_string(), value);
    }

    pub fn set_strings<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
        self.attributes.insert(name.to_string(), Value::Array(values));
    }

    pub fn set_string_map(&mut self, name: &str, values: &BTreeMap<String, String>) {
        let entries: Map<String, Value> = values
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.attributes.insert(name.to_string(), Value::Object(entries));
    }

    pub fn set_block(&mut self, name: &str, block: Option<ResourceData>) {
        let value = block
            .map(|b| Value::Object(b.attributes))
            .unwrap_or(Value::Null);
        self.attributes.insert(name.to_string(), value);
    }
}
