//! Typed access to a [`Component`] configuration bag.
//!
//! Each key a codec touches is declared once as a [`ConfigOption`] carrying its
//! expected kind and default. [`ConfigReader`] and [`ConfigWriter`] are the only
//! way codecs read or write the bag, so a malformed value always surfaces as
//! [`DomainError::MalformedValue`] instead of silently defaulting.

use super::component::{Component, ComponentConfig};
use crate::domain::errors::{DomainError, DomainResult};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Text,
    Bool,
    Int,
    /// Duration stored as a count of milliseconds
    Millis,
    /// Several values joined into a single comma separated string
    CommaList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDefault {
    Zero,
    Int(i64),
    Text(&'static str),
}

/// Descriptor for one key of a component configuration bag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigOption {
    pub key: &'static str,
    pub kind: OptionKind,
    pub default: OptionDefault,
}

impl ConfigOption {
    pub const fn text(key: &'static str) -> Self {
        Self::new(key, OptionKind::Text)
    }

    pub const fn boolean(key: &'static str) -> Self {
        Self::new(key, OptionKind::Bool)
    }

    pub const fn int(key: &'static str) -> Self {
        Self::new(key, OptionKind::Int)
    }

    pub const fn millis(key: &'static str) -> Self {
        Self::new(key, OptionKind::Millis)
    }

    pub const fn comma_list(key: &'static str) -> Self {
        Self::new(key, OptionKind::CommaList)
    }

    pub const fn with_default(self, default: OptionDefault) -> Self {
        Self { default, ..self }
    }

    const fn new(key: &'static str, kind: OptionKind) -> Self {
        Self {
            key,
            kind,
            default: OptionDefault::Zero,
        }
    }
}

fn kind_mismatch(option: &ConfigOption, requested: OptionKind) -> DomainError {
    DomainError::validation(
        option.key,
        format!("option declared as {:?} but accessed as {:?}", option.kind, requested),
    )
}

fn ensure_kind(option: &ConfigOption, requested: OptionKind) -> DomainResult<()> {
    if option.kind == requested {
        Ok(())
    } else {
        Err(kind_mismatch(option, requested))
    }
}

/// Validated read access to a component's configuration
pub struct ConfigReader<'a> {
    component: &'a Component,
}

impl<'a> ConfigReader<'a> {
    pub fn new(component: &'a Component) -> Self {
        Self { component }
    }

    /// Raw first value, `None` when the key is absent or maps to `[]`
    fn raw(&self, option: &ConfigOption) -> Option<&'a str> {
        self.component.get_config_ok(option.key)
    }

    pub fn text(&self, option: &ConfigOption) -> DomainResult<String> {
        ensure_kind(option, OptionKind::Text)?;
        Ok(match (self.raw(option), option.default) {
            (Some(value), _) => value.to_string(),
            (None, OptionDefault::Text(default)) => default.to_string(),
            (None, _) => String::new(),
        })
    }

    /// Text value, `None` when absent, cleared or blank
    pub fn optional_text(&self, option: &ConfigOption) -> DomainResult<Option<String>> {
        ensure_kind(option, OptionKind::Text)?;
        Ok(self
            .raw(option)
            .filter(|value| !value.is_empty())
            .map(str::to_string))
    }

    /// Boolean value; an empty string reads as `false`
    pub fn boolean(&self, option: &ConfigOption) -> DomainResult<bool> {
        ensure_kind(option, OptionKind::Bool)?;
        match self.raw(option).unwrap_or_default() {
            "" | "false" => Ok(false),
            "true" => Ok(true),
            other => Err(DomainError::malformed(option.key, other)),
        }
    }

    pub fn int(&self, option: &ConfigOption) -> DomainResult<i64> {
        let default = match option.default {
            OptionDefault::Int(value) => value,
            _ => 0,
        };
        Ok(self.optional_int(option)?.unwrap_or(default))
    }

    pub fn optional_int(&self, option: &ConfigOption) -> DomainResult<Option<i64>> {
        ensure_kind(option, OptionKind::Int)?;
        match self.raw(option) {
            None | Some("") => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| DomainError::malformed(option.key, value)),
        }
    }

    pub fn millis(&self, option: &ConfigOption) -> DomainResult<Option<Duration>> {
        ensure_kind(option, OptionKind::Millis)?;
        match self.raw(option) {
            None | Some("") => Ok(None),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(|ms| Some(Duration::from_millis(ms)))
                .map_err(|_| DomainError::malformed(option.key, value)),
        }
    }

    pub fn comma_list(&self, option: &ConfigOption) -> DomainResult<Vec<String>> {
        ensure_kind(option, OptionKind::CommaList)?;
        Ok(self
            .raw(option)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Builds a configuration bag from typed values
#[derive(Debug, Default)]
pub struct ConfigWriter {
    config: ComponentConfig,
}

impl ConfigWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&mut self, option: &ConfigOption, value: String) {
        self.config.insert(option.key.to_string(), vec![value]);
    }

    pub fn text(&mut self, option: &ConfigOption, value: impl Into<String>) -> DomainResult<()> {
        ensure_kind(option, OptionKind::Text)?;
        self.put(option, value.into());
        Ok(())
    }

    /// Write the value when set and non-empty; otherwise leave the key absent
    pub fn optional_text(&mut self, option: &ConfigOption, value: Option<&str>) -> DomainResult<()> {
        ensure_kind(option, OptionKind::Text)?;
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            self.put(option, value.to_string());
        }
        Ok(())
    }

    pub fn boolean(&mut self, option: &ConfigOption, value: bool) -> DomainResult<()> {
        ensure_kind(option, OptionKind::Bool)?;
        self.put(option, value.to_string());
        Ok(())
    }

    pub fn int(&mut self, option: &ConfigOption, value: i64) -> DomainResult<()> {
        ensure_kind(option, OptionKind::Int)?;
        self.put(option, value.to_string());
        Ok(())
    }

    /// Write the value when set; otherwise leave the key absent
    pub fn optional_int(&mut self, option: &ConfigOption, value: Option<i64>) -> DomainResult<()> {
        ensure_kind(option, OptionKind::Int)?;
        if let Some(value) = value {
            self.put(option, value.to_string());
        }
        Ok(())
    }

    /// Write milliseconds when set, an explicit clear (`[]`) when not
    pub fn millis(&mut self, option: &ConfigOption, value: Option<Duration>) -> DomainResult<()> {
        ensure_kind(option, OptionKind::Millis)?;
        match value {
            Some(duration) => self.put(option, duration.as_millis().to_string()),
            None => self.clear(option),
        }
        Ok(())
    }

    pub fn comma_list(&mut self, option: &ConfigOption, values: &[String]) -> DomainResult<()> {
        ensure_kind(option, OptionKind::CommaList)?;
        self.put(option, values.join(", "));
        Ok(())
    }

    /// Present the key with an empty list so Keycloak unsets it
    pub fn clear(&mut self, option: &ConfigOption) {
        self.config.insert(option.key.to_string(), Vec::new());
    }

    pub fn finish(self) -> ComponentConfig {
        self.config
    }
}
