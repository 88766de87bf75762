//! Best-effort schema synthesis from a single example payload.

use serde_json::{json, Map, Value};

use crate::node::JsonType;

/// The draft-04 meta-schema URI written into generated documents.
pub const DRAFT4_SCHEMA_URI: &str = "http://json-schema.org/draft-04/schema#";

/// Produces a schema document that the given payload conforms to.
pub trait SchemaGenerator {
    fn generate(&self, locator: &str, payload: &Value) -> Value;
}

/// Infers a draft-04 schema from one example.
///
/// Objects require every key they carry; arrays get an `items` schema
/// inferred from their elements (`anyOf` when elements differ in shape).
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftFourGenerator;

impl SchemaGenerator for DraftFourGenerator {
    fn generate(&self, locator: &str, payload: &Value) -> Value {
        let mut schema = infer(payload);
        if let Value::Object(map) = &mut schema {
            map.insert("$schema".into(), Value::String(DRAFT4_SCHEMA_URI.into()));
            map.insert(
                "description".into(),
                Value::String(format!("Generated from an example payload for {locator}")),
            );
        }
        schema
    }
}

fn infer(value: &Value) -> Value {
    match value {
        Value::Array(list) => {
            let mut variants: Vec<Value> = Vec::new();
            for element in list {
                let schema = infer(element);
                if !variants.contains(&schema) {
                    variants.push(schema);
                }
            }
            let items = match variants.len() {
                0 => json!({}),
                1 => variants.swap_remove(0),
                _ => json!({ "anyOf": variants }),
            };
            json!({ "type": "array", "items": items })
        }
        Value::Object(map) => {
            let properties: Map<String, Value> = map.iter().map(|(k, v)| (k.clone(), infer(v))).collect();
            let mut required: Vec<&String> = map.keys().collect();
            required.sort();
            let mut schema = json!({ "type": "object", "properties": properties });
            if !required.is_empty() {
                schema["required"] = json!(required);
            }
            schema
        }
        other => json!({ "type": JsonType::of(other).as_str() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_carries_meta_schema_and_description() {
        let schema = DraftFourGenerator.generate("user.json", &json!({"name": "x"}));
        assert_eq!(schema["$schema"], DRAFT4_SCHEMA_URI);
        assert!(schema["description"].as_str().unwrap().contains("user.json"));
    }

    #[test]
    fn objects_require_all_keys_sorted() {
        let schema = DraftFourGenerator.generate("s.json", &json!({"b": 1, "a": "x", "c": null}));
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["a", "b", "c"]));
        assert_eq!(schema["properties"]["a"], json!({"type": "string"}));
        assert_eq!(schema["properties"]["b"], json!({"type": "integer"}));
        assert_eq!(schema["properties"]["c"], json!({"type": "null"}));
    }

    #[test]
    fn empty_object_has_no_required_list() {
        let schema = DraftFourGenerator.generate("s.json", &json!({}));
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn numbers_distinguish_integers() {
        assert_eq!(infer(&json!(2)), json!({"type": "integer"}));
        assert_eq!(infer(&json!(2.5)), json!({"type": "number"}));
    }

    #[test]
    fn arrays_merge_element_shapes() {
        assert_eq!(infer(&json!([])), json!({"type": "array", "items": {}}));
        assert_eq!(
            infer(&json!([1, 2])),
            json!({"type": "array", "items": {"type": "integer"}})
        );
        assert_eq!(
            infer(&json!([1, "a", 2])),
            json!({"type": "array", "items": {"anyOf": [{"type": "integer"}, {"type": "string"}]}})
        );
    }
}
