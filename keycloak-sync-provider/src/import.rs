use keycloak_sync_domain::domain::errors::{DomainError, DomainResult};

/// Split a slash-delimited import id against the supported `formats`.
///
/// The id must have as many segments as one of the formats and none of them
/// may be empty.
pub fn parse_import_id(id: &str, formats: &[&str]) -> DomainResult<Vec<String>> {
    let parts: Vec<&str> = id.split('/').collect();
    let matches_a_format = formats
        .iter()
        .any(|format| format.split('/').count() == parts.len());

    if !matches_a_format || parts.iter().any(|part| part.is_empty()) {
        return Err(DomainError::InvalidImportFormat {
            id: id.to_string(),
            formats: formats.join(", "),
        });
    }

    Ok(parts.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUB_FLOW: &[&str] = &["{realm}/{parentFlowAlias}/{subflowId}"];
    const LDAP: &[&str] = &["{realm}/{id}", "{realm}/{id}/{bindCredential}"];

    #[test]
    fn test_parses_sub_flow_id() {
        let parts = parse_import_id("realmA/flowAlias/subId", SUB_FLOW).unwrap();
        assert_eq!(parts, vec!["realmA", "flowAlias", "subId"]);
    }

    #[test]
    fn test_wrong_segment_count_names_formats() {
        let error = parse_import_id("realmA/subId", SUB_FLOW).unwrap_err();

        match error {
            DomainError::InvalidImportFormat { id, formats } => {
                assert_eq!(id, "realmA/subId");
                assert_eq!(formats, "{realm}/{parentFlowAlias}/{subflowId}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_segment_is_rejected() {
        assert!(parse_import_id("realmA//subId", SUB_FLOW).is_err());
        assert!(parse_import_id("", &["{realm}"]).is_err());
    }

    #[test]
    fn test_alternative_formats() {
        assert_eq!(parse_import_id("test/ldap-1", LDAP).unwrap().len(), 2);
        assert_eq!(parse_import_id("test/ldap-1/s3cret", LDAP).unwrap().len(), 3);
        assert!(parse_import_id("test/ldap-1/s3cret/extra", LDAP).is_err());
    }
}
