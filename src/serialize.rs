//! Derived schema → YAML / JSON text.

use crate::error::SerializeError;
use serde_json::Value;

/// Serialize a derived schema to YAML. Key order is preserved.
pub fn to_yaml(schema: &Value) -> Result<String, SerializeError> {
    serde_saphyr::to_string(schema).map_err(|e| SerializeError {
        message: format!("failed to serialize to YAML: {}", e),
    })
}

/// Serialize a derived schema to pretty-printed JSON.
pub fn to_json(schema: &Value) -> Result<String, SerializeError> {
    serde_json::to_string_pretty(schema).map_err(|e| SerializeError {
        message: format!("failed to serialize to JSON: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_keeps_key_order() {
        let schema = json!({"type": "object", "required": ["b", "a"]});
        let yaml = to_yaml(&schema).unwrap();
        let type_at = yaml.find("type").unwrap();
        let required_at = yaml.find("required").unwrap();
        assert!(type_at < required_at);
        let back: Value = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn json_is_pretty() {
        let text = to_json(&json!({"type": "string"})).unwrap();
        assert_eq!(text, "{\n  \"type\": \"string\"\n}");
    }
}
