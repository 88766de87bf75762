//! # Matcher End-to-End Tests
//!
//! Each test lays out a schema directory in a temporary folder, builds a
//! [`Matcher`] over it through the filesystem source, and checks verdicts
//! and failure messages the way a test suite using the matcher would.

use std::fs;
use std::path::Path;

use jsonm_schema::{Keyword, Matcher, MatcherConfig, MatcherError};
use serde_json::json;

fn write_schema(root: &Path, locator: &str, schema: serde_json::Value) {
    let path = root.join(locator);
    fs::create_dir_all(path.parent().expect("schema path has a parent")).expect("create schema dir");
    fs::write(path, serde_json::to_string_pretty(&schema).expect("serialize")).expect("write schema");
}

fn config_for(root: &Path) -> MatcherConfig {
    MatcherConfig::default().with_schema_root(root)
}

#[test]
fn name_schema_verdicts() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_schema(
        dir.path(),
        "user.json",
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string"}}
        }),
    );
    let mut matcher = Matcher::new("user", &config_for(dir.path())).expect("matcher builds");

    assert!(matcher.matches(&json!({"name": "x"})).expect("verdict"));

    assert!(!matcher.matches(&json!({})).expect("verdict"));
    let errors = matcher.errors().expect("errors cached");
    assert_eq!(errors.len(), 1);
    let missing = errors.first().expect("one error");
    assert_eq!(missing.keyword, Keyword::Required);
    assert_eq!(missing.instance_path.to_string(), "/");
    assert!(missing.message.contains("name"));

    assert!(!matcher.matches(&json!({"name": 5})).expect("verdict"));
    let wrong = matcher.errors().and_then(|e| e.first()).expect("one error");
    assert_eq!(wrong.keyword, Keyword::Type);
    assert_eq!(wrong.instance_path.to_string(), "/name");
}

#[test]
fn cross_document_reference() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_schema(dir.path(), "a.json", json!({"$ref": "b.json#/definitions/point"}));
    write_schema(
        dir.path(),
        "b.json",
        json!({
            "definitions": {
                "point": {
                    "type": "object",
                    "required": ["x", "y"],
                    "properties": {"x": {"type": "number"}, "y": {"type": "number"}}
                }
            }
        }),
    );
    let mut matcher = Matcher::new("a", &config_for(dir.path())).expect("matcher builds");

    assert!(matcher.matches(&json!({"x": 1, "y": 2.5})).expect("verdict"));
    assert!(!matcher.matches(&json!({"y": 1})).expect("verdict"));
    let message = matcher.validation_failure_message().expect("failure message");
    assert!(message.contains("\"x\""), "unexpected message: {message}");
}

#[test]
fn nested_directories_resolve_relative_to_referencing_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_schema(
        dir.path(),
        "api/order.json",
        json!({
            "type": "object",
            "properties": {
                "customer": {"$ref": "customer.json"},
                "currency": {"$ref": "../shared/currency.json"}
            }
        }),
    );
    write_schema(dir.path(), "api/customer.json", json!({"type": "object", "required": ["id"]}));
    write_schema(dir.path(), "shared/currency.json", json!({"enum": ["USD", "EUR"]}));

    let mut matcher = Matcher::new("api/order", &config_for(dir.path())).expect("matcher builds");
    assert!(matcher
        .matches(&json!({"customer": {"id": 1}, "currency": "EUR"}))
        .expect("verdict"));
    assert!(!matcher
        .matches(&json!({"customer": {}, "currency": "GBP"}))
        .expect("verdict"));
    let paths: Vec<String> = matcher
        .errors()
        .expect("errors")
        .iter()
        .map(|e| e.instance_path.to_string())
        .collect();
    assert_eq!(paths, vec!["/currency", "/customer"]);
}

#[cfg(unix)]
#[test]
fn schemas_behind_a_symlinked_directory_are_loaded() {
    use std::os::unix::fs::symlink;

    let root = tempfile::tempdir().expect("tempdir");
    let shared = tempfile::tempdir().expect("tempdir");
    write_schema(shared.path(), "point.json", json!({"required": ["x"]}));
    symlink(shared.path(), root.path().join("shared")).expect("symlink");
    write_schema(root.path(), "shape.json", json!({"$ref": "shared/point.json"}));

    let mut matcher = Matcher::new("shape", &config_for(root.path())).expect("matcher builds");
    assert!(matcher.store().contains("shared/point.json"));
    assert!(!matcher.matches(&json!({})).expect("verdict"));
}

#[test]
fn missing_schema_is_generated_and_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("schemas");
    let mut matcher = Matcher::new("widget", &config_for(&root)).expect("matcher builds");

    assert!(matcher
        .matches(&json!({"id": 7, "tags": ["a", "b"]}))
        .expect("verdict"));
    let written = fs::read_to_string(root.join("widget.json")).expect("schema written");
    let schema: serde_json::Value = serde_json::from_str(&written).expect("schema is JSON");
    assert_eq!(schema["required"], json!(["id", "tags"]));

    let mut fresh = Matcher::new("widget", &config_for(&root)).expect("matcher builds");
    assert!(!fresh.matches(&json!({"id": "seven", "tags": []})).expect("verdict"));
}

#[test]
fn missing_schema_with_generation_disabled() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(dir.path()).with_generate_missing(false);
    let mut matcher = Matcher::new("ghost", &config).expect("matcher builds");
    let err = matcher.matches(&json!({})).expect_err("schema is missing");
    assert!(matches!(err, MatcherError::SchemaNotFound { .. }));
    assert!(!dir.path().join("ghost.json").exists());
}

#[test]
fn recursive_tree_schema_validates_finitely() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_schema(
        dir.path(),
        "tree.json",
        json!({
            "type": "object",
            "required": ["label"],
            "properties": {
                "label": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#"}}
            }
        }),
    );
    let mut matcher = Matcher::new("tree", &config_for(dir.path())).expect("matcher builds");
    let deep = json!({
        "label": "root",
        "children": [{"label": "a", "children": [{"label": "b", "children": []}]}]
    });
    assert!(matcher.matches(&deep).expect("verdict"));

    let broken = json!({"label": "root", "children": [{"children": [{"label": 1}]}]});
    assert!(!matcher.matches(&broken).expect("verdict"));
    let rendered: Vec<String> = matcher
        .errors()
        .expect("errors")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        rendered,
        vec![
            "/children/0: \"label\" is a required property",
            "/children/0/children/0/label: 1 is not of type \"string\"",
        ]
    );
}

#[test]
fn documents_referencing_each_other_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_schema(
        dir.path(),
        "person.json",
        json!({"type": "object", "properties": {"employer": {"$ref": "company.json"}}}),
    );
    write_schema(
        dir.path(),
        "company.json",
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {"staff": {"type": "array", "items": {"$ref": "person.json"}}}
        }),
    );
    let mut matcher = Matcher::new("person", &config_for(dir.path())).expect("matcher builds");
    assert!(matcher
        .matches(&json!({"employer": {"name": "acme", "staff": [{}]}}))
        .expect("verdict"));
    assert!(!matcher
        .matches(&json!({"employer": {"name": "acme", "staff": [{"employer": {}}]}}))
        .expect("verdict"));
}

#[test]
fn any_of_and_one_of_quantifiers() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_schema(
        dir.path(),
        "choice.json",
        json!({
            "properties": {
                "any": {"anyOf": [{"type": "string"}, {"maxLength": 2}]},
                "one": {"oneOf": [{"type": "string"}, {"maxLength": 2}]}
            }
        }),
    );
    let mut matcher = Matcher::new("choice", &config_for(dir.path())).expect("matcher builds");

    // Two passing members: "ab" is a string of length 2.
    assert!(!matcher.matches(&json!({"any": "ab", "one": "ab"})).expect("verdict"));
    let keywords: Vec<Keyword> = matcher.errors().expect("errors").iter().map(|e| e.keyword).collect();
    assert_eq!(keywords, vec![Keyword::OneOf]);

    // One passing member: "abc" is a string but too long.
    assert!(matcher.matches(&json!({"any": "abc", "one": "abc"})).expect("verdict"));

    // maxLength ignores non-strings, so a number passes exactly one member.
    assert!(matcher.matches(&json!({"any": 1, "one": 1})).expect("verdict"));
}

#[test]
fn lookahead_pattern_does_not_break_unrelated_schemas() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_schema(
        dir.path(),
        "user.json",
        json!({"properties": {"name": {"type": "string", "pattern": "^(?!admin).*$"}}}),
    );
    write_schema(dir.path(), "other.json", json!({"type": "integer"}));

    let mut other = Matcher::new("other", &config_for(dir.path())).expect("matcher builds");
    assert!(other.matches(&json!(3)).expect("verdict"));

    let mut user = Matcher::new("user", &config_for(dir.path())).expect("matcher builds");
    assert!(user.matches(&json!({"name": "alice"})).expect("verdict"));
    assert!(!user.matches(&json!({"name": "admin"})).expect("verdict"));
    let error = user.errors().and_then(|e| e.first()).expect("one error");
    assert_eq!(error.keyword, Keyword::Pattern);
    assert_eq!(error.instance_path.to_string(), "/name");
}

#[test]
fn malformed_schema_fails_construction() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("broken.json"), "{\"type\": 12}").expect("write");
    let err = Matcher::new("broken", &config_for(dir.path())).expect_err("malformed");
    assert!(matches!(err, MatcherError::Malformed(_)));
}
