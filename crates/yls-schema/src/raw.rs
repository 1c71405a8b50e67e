//! Raw schema content parsing.

use serde_json::Value;

/// Parse fetched schema text into a raw JSON value.
///
/// Schema documents are usually JSON, but YAML-authored schemas are
/// accepted too: JSON is tried first (it is also the stricter parse),
/// then YAML. Unknown schema keywords are not rejected here; the
/// resolver simply ignores what it does not understand.
pub fn parse_schema_source(text: &str) -> Result<Value, String> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(text)
            .map_err(|yaml_err| format!("not valid JSON ({json_err}) nor YAML ({yaml_err})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json() {
        let value = parse_schema_source(r#"{"type": "object"}"#).unwrap();
        assert_eq!(value["type"], "object");
    }

    #[test]
    fn falls_back_to_yaml() {
        let value = parse_schema_source("type: object\nrequired:\n  - name\n").unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"][0], "name");
    }

    #[test]
    fn preserves_property_order() {
        let value = parse_schema_source(
            r#"{"properties": {"zeta": {}, "alpha": {}, "mid": {}}}"#,
        )
        .unwrap();
        let keys: Vec<&String> = value["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn rejects_garbage_with_both_errors() {
        let err = parse_schema_source("{ not json\n\t- : : yaml").unwrap_err();
        assert!(err.contains("not valid JSON"));
    }
}
