use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque identifier assigned by Keycloak
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the id from a `Location` header returned by a create call.
    ///
    /// Keycloak answers `201 Created` with
    /// `Location: {base}/admin/realms/{realm}/{collection}/{id}`.
    pub fn from_location(location: &str) -> DomainResult<Self> {
        let id = location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        if id.is_empty() {
            return Err(DomainError::Serialization {
                message: format!("Location header `{location}` carries no id"),
            });
        }

        Ok(Self(id.to_string()))
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder Keycloak echoes back instead of secret config values.
pub const MASKED_SECRET: &str = "**********";

pub fn is_masked_secret(value: &str) -> bool {
    value == MASKED_SECRET
}

/// Parse a duration such as `1h30m`, `90s` or `250ms`.
///
/// A bare `0` is accepted; any other number needs a unit. Out-of-range
/// values are rejected rather than clamped.
pub fn parse_duration(input: &str) -> DomainResult<Duration> {
    match input.trim() {
        "0" => Ok(Duration::ZERO),
        text => humantime::parse_duration(text).map_err(|e| {
            DomainError::validation("duration", format!("invalid duration `{input}`: {e}"))
        }),
    }
}

/// Render a duration without zero components or separators (`1h30m`, `500ms`).
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration)
        .to_string()
        .replace(' ', "")
}

/// Serde adapter for booleans Keycloak stores as quoted strings in `attributes`.
pub mod bool_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(false),
            Some(Raw::Bool(value)) => Ok(value),
            Some(Raw::Text(text)) => match text.as_str() {
                "" | "false" => Ok(false),
                "true" => Ok(true),
                other => Err(serde::de::Error::custom(format!(
                    "expected a quoted boolean, got {other:?}"
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_header_yields_last_segment() {
        let id = EntityId::from_location(
            "http://localhost:8080/admin/realms/test/components/2f9c1a0e-17a4-4d6b",
        )
        .unwrap();
        assert_eq!(id.as_str(), "2f9c1a0e-17a4-4d6b");
        assert!(EntityId::from_location("").is_err());
    }

    #[test]
    fn durations_parse_go_syntax() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1m1s500ms").unwrap(), Duration::from_millis(61_500));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert!(parse_duration("ten minutes").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert!(parse_duration("99999999999999999999h").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
    }

    #[test]
    fn durations_format_without_zero_components() {
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_millis(61_500)), "1m1s500ms");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
    }
}
