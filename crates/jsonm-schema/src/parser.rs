//! # Schema Parser
//!
//! Turns schema source text into a typed [`SchemaNode`] tree. Every node is
//! stamped with its [`SchemaId`] (document locator + pointer) so that a
//! `$ref` fragment can later be walked to it through the store.
//!
//! Known keywords with the wrong shape are rejected with a
//! [`MalformedSchemaError`] pointing at the keyword. Unknown keywords that
//! hold an object are parsed leniently as addressable children, since a
//! `$ref` may legally point anywhere inside a document; if such a value does
//! not parse as a schema it is skipped.

use std::collections::BTreeMap;

use jsonm_core::{JsonPointer, MalformedSchemaError, SchemaId};
use serde_json::{Map, Value};

use crate::node::{Additional, Bound, Items, JsonType, Pattern, Reference, SchemaNode};

/// Keywords that carry data rather than sub-schemas.
const ANNOTATIONS: &[&str] = &[
    "$schema",
    "id",
    "title",
    "description",
    "default",
    "examples",
    "format",
    "exclusiveMinimum",
    "exclusiveMaximum",
];

/// Parse schema source text for the document at `locator`.
///
/// # Errors
///
/// Returns [`MalformedSchemaError`] if the text is not JSON, the root is not
/// a JSON object, or a known keyword is malformed.
pub fn parse(source_text: &str, locator: &str) -> Result<SchemaNode, MalformedSchemaError> {
    let value: Value = serde_json::from_str(source_text).map_err(|e| {
        MalformedSchemaError::new(locator, JsonPointer::root(), format!("invalid JSON: {e}"))
    })?;
    parse_value(&value, locator)
}

/// Parse an already-decoded schema document.
///
/// # Errors
///
/// Same as [`parse`], minus JSON syntax errors.
pub fn parse_value(value: &Value, locator: &str) -> Result<SchemaNode, MalformedSchemaError> {
    let Value::Object(map) = value else {
        return Err(MalformedSchemaError::new(
            locator,
            JsonPointer::root(),
            format!("schema root must be a JSON object, found {}", JsonType::of(value)),
        ));
    };
    let mut node = parse_object(map, SchemaId::document(locator))?;
    node.alias = map
        .get("id")
        .and_then(Value::as_str)
        .map(|id| id.trim_end_matches('#').to_string())
        .filter(|id| !id.is_empty());
    Ok(node)
}

fn malformed(id: &SchemaId, keyword: &str, reason: impl Into<String>) -> MalformedSchemaError {
    MalformedSchemaError::new(id.locator(), id.pointer().join(keyword), reason)
}

/// Parse a sub-schema position. Booleans are accepted as the `{}` and
/// `{"not": {}}` shorthands.
fn parse_schema(value: &Value, id: SchemaId) -> Result<SchemaNode, MalformedSchemaError> {
    match value {
        Value::Object(map) => parse_object(map, id),
        Value::Bool(true) => Ok(SchemaNode::empty(id)),
        Value::Bool(false) => {
            let not_id = id.child("not");
            let mut node = SchemaNode::empty(id);
            node.not = Some(Box::new(SchemaNode::empty(not_id)));
            Ok(node)
        }
        other => Err(MalformedSchemaError::new(
            id.locator(),
            id.pointer().clone(),
            format!("expected a schema object, found {}", JsonType::of(other)),
        )),
    }
}

fn parse_object(map: &Map<String, Value>, id: SchemaId) -> Result<SchemaNode, MalformedSchemaError> {
    let mut node = SchemaNode::empty(id.clone());

    for (keyword, value) in map {
        match keyword.as_str() {
            "$ref" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| malformed(&id, keyword, "$ref must be a string"))?;
                node.reference = Some(Reference::new(raw));
            }
            "type" => node.types = Some(parse_types(value, &id)?),
            "required" => node.required = string_array(value, &id, keyword)?,
            "properties" => node.properties = schema_map(value, &id, keyword)?,
            "definitions" => node.definitions = schema_map(value, &id, keyword)?,
            "patternProperties" => {
                let members = schema_map(value, &id, keyword)?;
                let mut compiled = Vec::with_capacity(members.len());
                for (source, child) in members {
                    let pattern = Pattern::new(&source).map_err(|e| {
                        malformed(&id, keyword, format!("invalid pattern {source:?}: {e}"))
                    })?;
                    compiled.push((pattern, child));
                }
                node.pattern_properties = compiled;
            }
            "additionalProperties" => {
                node.additional_properties = Some(parse_additional(value, id.child(keyword))?)
            }
            "additionalItems" => node.additional_items = Some(parse_additional(value, id.child(keyword))?),
            "items" => {
                let items_id = id.child(keyword);
                node.items = Some(match value {
                    Value::Array(list) => Items::Tuple(schema_list(list, &items_id)?),
                    other => Items::Single(Box::new(parse_schema(other, items_id)?)),
                });
            }
            "enum" => {
                let list = value
                    .as_array()
                    .ok_or_else(|| malformed(&id, keyword, "enum must be an array"))?;
                node.enumeration = Some(list.clone());
            }
            "pattern" => {
                let source = value
                    .as_str()
                    .ok_or_else(|| malformed(&id, keyword, "pattern must be a string"))?;
                node.pattern = Some(
                    Pattern::new(source)
                        .map_err(|e| malformed(&id, keyword, format!("invalid pattern: {e}")))?,
                );
            }
            "minimum" => {
                node.minimum = Some(parse_bound(map, value, &id, keyword, "exclusiveMinimum")?)
            }
            "maximum" => {
                node.maximum = Some(parse_bound(map, value, &id, keyword, "exclusiveMaximum")?)
            }
            "multipleOf" => {
                let m = number(value, &id, keyword)?;
                if m <= 0.0 {
                    return Err(malformed(&id, keyword, "multipleOf must be greater than 0"));
                }
                node.multiple_of = Some(m);
            }
            "minLength" => node.min_length = Some(count(value, &id, keyword)?),
            "maxLength" => node.max_length = Some(count(value, &id, keyword)?),
            "minItems" => node.min_items = Some(count(value, &id, keyword)?),
            "maxItems" => node.max_items = Some(count(value, &id, keyword)?),
            "minProperties" => node.min_properties = Some(count(value, &id, keyword)?),
            "maxProperties" => node.max_properties = Some(count(value, &id, keyword)?),
            "uniqueItems" => {
                node.unique_items = value
                    .as_bool()
                    .ok_or_else(|| malformed(&id, keyword, "uniqueItems must be a boolean"))?
            }
            "allOf" | "anyOf" | "oneOf" => {
                let list = value
                    .as_array()
                    .ok_or_else(|| malformed(&id, keyword, format!("{keyword} must be an array")))?;
                let members = schema_list(list, &id.child(keyword))?;
                match keyword.as_str() {
                    "allOf" => node.all_of = members,
                    "anyOf" => node.any_of = members,
                    _ => node.one_of = members,
                }
            }
            "not" => node.not = Some(Box::new(parse_schema(value, id.child(keyword))?)),
            k if ANNOTATIONS.contains(&k) => {}
            _ => {
                if let Value::Object(inner) = value {
                    match parse_object(inner, id.child(keyword)) {
                        Ok(child) => {
                            node.extras.insert(keyword.clone(), child);
                        }
                        Err(e) => {
                            tracing::debug!(keyword = %keyword, error = %e, "skipping non-schema keyword value");
                        }
                    }
                }
            }
        }
    }

    // Draft-06 numeric exclusive bounds, applied only where no draft-04
    // `minimum`/`maximum` already claimed the position.
    if node.minimum.is_none() {
        if let Some(v) = map.get("exclusiveMinimum").and_then(Value::as_f64) {
            node.minimum = Some(Bound { value: v, exclusive: true });
        }
    }
    if node.maximum.is_none() {
        if let Some(v) = map.get("exclusiveMaximum").and_then(Value::as_f64) {
            node.maximum = Some(Bound { value: v, exclusive: true });
        }
    }

    Ok(node)
}

fn parse_types(value: &Value, id: &SchemaId) -> Result<Vec<JsonType>, MalformedSchemaError> {
    let names: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(list) => list
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| malformed(id, "type", "type members must be strings"))
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(malformed(id, "type", "type must be a string or an array of strings")),
    };
    names
        .into_iter()
        .map(|name| {
            JsonType::parse(name).ok_or_else(|| malformed(id, "type", format!("unknown type {name:?}")))
        })
        .collect()
}

fn string_array(value: &Value, id: &SchemaId, keyword: &str) -> Result<Vec<String>, MalformedSchemaError> {
    let list = value
        .as_array()
        .ok_or_else(|| malformed(id, keyword, format!("{keyword} must be an array of strings")))?;
    list.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(id, keyword, format!("{keyword} must be an array of strings")))
        })
        .collect()
}

fn schema_map(
    value: &Value,
    id: &SchemaId,
    keyword: &str,
) -> Result<BTreeMap<String, SchemaNode>, MalformedSchemaError> {
    let map = value
        .as_object()
        .ok_or_else(|| malformed(id, keyword, format!("{keyword} must be an object")))?;
    let base = id.child(keyword);
    map.iter()
        .map(|(name, member)| Ok((name.clone(), parse_schema(member, base.child(name.as_str()))?)))
        .collect()
}

fn schema_list(list: &[Value], base: &SchemaId) -> Result<Vec<SchemaNode>, MalformedSchemaError> {
    list.iter()
        .enumerate()
        .map(|(i, member)| parse_schema(member, base.child(i.to_string())))
        .collect()
}

fn parse_additional(value: &Value, id: SchemaId) -> Result<Additional, MalformedSchemaError> {
    match value {
        Value::Bool(b) => Ok(Additional::Allowed(*b)),
        other => Ok(Additional::Schema(Box::new(parse_schema(other, id)?))),
    }
}

fn parse_bound(
    map: &Map<String, Value>,
    value: &Value,
    id: &SchemaId,
    keyword: &str,
    exclusive_keyword: &str,
) -> Result<Bound, MalformedSchemaError> {
    let exclusive = match map.get(exclusive_keyword) {
        None | Some(Value::Number(_)) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(malformed(
                id,
                exclusive_keyword,
                format!("{exclusive_keyword} must be a boolean"),
            ))
        }
    };
    Ok(Bound {
        value: number(value, id, keyword)?,
        exclusive,
    })
}

fn number(value: &Value, id: &SchemaId, keyword: &str) -> Result<f64, MalformedSchemaError> {
    value
        .as_f64()
        .ok_or_else(|| malformed(id, keyword, format!("{keyword} must be a number")))
}

fn count(value: &Value, id: &SchemaId, keyword: &str) -> Result<u64, MalformedSchemaError> {
    value
        .as_u64()
        .ok_or_else(|| malformed(id, keyword, format!("{keyword} must be a non-negative integer")))
}
