//! Rendering a compiled schema as a JSON Schema or OpenAPI document.

use crate::error::DeriveError;
use crate::fragment::Fragment;
use crate::node::SchemaNode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Draft referenced by documents rendered with a schema id.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Output dialect. Dialects differ in how unions of booleans, `null` and
/// literals are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Literals as `enum`, one `{type}` per type token.
    #[default]
    #[serde(rename = "default")]
    Default,
    /// Single literals as `const`, type tokens pooled into one `type` array.
    #[serde(rename = "json_schema")]
    JsonSchema,
    /// `null` expressed with `nullable: true`.
    #[serde(rename = "openapi")]
    OpenApi,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSchemaOptions {
    /// When set, the output becomes a standalone document carrying this
    /// `id` and the draft-07 `$schema`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    pub target: Target,
}

impl JsonSchemaOptions {
    pub fn new(target: Target) -> Self {
        Self {
            schema_id: None,
            target,
        }
    }

    pub fn with_schema_id(mut self, schema_id: impl Into<String>) -> Self {
        self.schema_id = Some(schema_id.into());
        self
    }
}

/// Derives the schema of `node`.
///
/// Returns `Ok(None)` when the node says nothing about the values it
/// accepts. With a schema id the result must be an object (an unconstrained
/// schema renders as `{}`), otherwise [`DeriveError::NotAnObject`].
pub fn derive(node: &dyn SchemaNode, options: &JsonSchemaOptions) -> Result<Option<Value>, DeriveError> {
    let fragment = node.json_schema(options.target);
    let Some(schema_id) = &options.schema_id else {
        return Ok(fragment.to_value());
    };
    let mut doc = match fragment {
        Fragment::Everything => Map::new(),
        other => match other.to_value() {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(DeriveError::NotAnObject {
                    schema: node.to_string(),
                });
            }
        },
    };
    doc.insert("id".into(), Value::String(schema_id.clone()));
    doc.insert("$schema".into(), Value::from(DRAFT_07));
    Ok(Some(Value::Object(doc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{Any, Leaf, Wrapper};
    use crate::node::Meta;
    use crate::types::ValueType;
    use serde_json::json;

    #[test]
    fn schema_id_wraps_document() {
        let node = Wrapper::new(Leaf::Type(ValueType::String), Meta::default());
        let options = JsonSchemaOptions::new(Target::JsonSchema).with_schema_id("urn:test");
        assert_eq!(
            derive(&node, &options).unwrap(),
            Some(json!({"type": "string", "id": "urn:test", "$schema": DRAFT_07}))
        );
    }

    #[test]
    fn unconstrained_with_id_is_empty_object() {
        let options = JsonSchemaOptions::default().with_schema_id("urn:any");
        assert_eq!(
            derive(&Any::default(), &options).unwrap(),
            Some(json!({"id": "urn:any", "$schema": DRAFT_07}))
        );
        assert_eq!(
            derive(&Any::default(), &JsonSchemaOptions::default()).unwrap(),
            Some(json!(true))
        );
    }

    #[test]
    fn non_object_with_id_is_an_error() {
        let node = Wrapper::new(
            Leaf::Type(ValueType::String),
            Meta {
                json_schema: Some(json!(false)),
                ..Meta::default()
            },
        );
        let options = JsonSchemaOptions::default().with_schema_id("urn:none");
        assert!(matches!(
            derive(&node, &options),
            Err(DeriveError::NotAnObject { .. })
        ));
    }

    #[test]
    fn target_names() {
        let target: Target = serde_json::from_value(json!("openapi")).unwrap();
        assert_eq!(target, Target::OpenApi);
        assert_eq!(serde_json::to_value(Target::JsonSchema).unwrap(), json!("json_schema"));
    }
}
