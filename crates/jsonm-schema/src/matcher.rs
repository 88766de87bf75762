//! # Matcher
//!
//! The caller-facing entry point: "does this payload match the schema
//! named `user`?". A matcher loads every document from its source into a
//! [`DocumentStore`], expands references once, and then answers
//! [`matches`](Matcher::matches) calls, keeping the errors of the most
//! recent call for failure messages.
//!
//! When the requested document does not exist and generation is enabled,
//! the first payload seen becomes the example a schema is synthesized from.
//! The new document is written through the source and validated against
//! like any other.

use std::fmt;
use std::path::PathBuf;

use jsonm_core::{MalformedSchemaError, SchemaId, UnresolvableReferenceError};
use serde_json::Value;
use thiserror::Error;

use crate::config::MatcherConfig;
use crate::expand::{expand, expand_all};
use crate::generate::{DraftFourGenerator, SchemaGenerator};
use crate::parser::parse;
use crate::source::{FsSchemaSource, SchemaSourceEnumerator, SourceError};
use crate::store::DocumentStore;
use crate::validate::{ValidationErrors, Validator};

/// Errors that stop a matcher from producing a verdict.
#[derive(Error, Debug)]
pub enum MatcherError {
    /// The requested schema is absent and generation is disabled.
    #[error("schema {locator:?} not found under {root} (generation disabled)")]
    SchemaNotFound { locator: String, root: PathBuf },

    /// The payload text is not JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// A generated schema could not be serialized.
    #[error("cannot serialize generated schema for {locator}: {source}")]
    Generation {
        locator: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Malformed(#[from] MalformedSchemaError),

    #[error(transparent)]
    Unresolvable(#[from] UnresolvableReferenceError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Map a schema name to its document locator (`user` -> `user.json`).
pub fn schema_locator(name: &str) -> String {
    if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.json")
    }
}

/// Parse and register every document from `source`, then expand all
/// references.
///
/// # Errors
///
/// Returns the first source, parse or resolution failure. Any of these
/// leaves the schema set unusable, so nothing is partially returned.
pub fn build_store(source: &dyn SchemaSourceEnumerator) -> Result<DocumentStore, MatcherError> {
    let mut store = DocumentStore::new();
    for document in source.enumerate()? {
        store.add_schema(parse(&document.text, &document.locator)?);
    }
    let report = expand_all(&mut store)?;
    tracing::debug!(
        documents = store.len(),
        references = report.references,
        "schema store ready"
    );
    Ok(store)
}

/// Checks payloads against one named schema.
pub struct Matcher {
    schema_id: SchemaId,
    config: MatcherConfig,
    store: DocumentStore,
    source: Box<dyn SchemaSourceEnumerator>,
    generator: Box<dyn SchemaGenerator>,
    errors: Option<ValidationErrors>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("schema_id", &self.schema_id)
            .field("config", &self.config)
            .field("documents", &self.store.len())
            .field("errors", &self.errors.as_ref().map(ValidationErrors::len))
            .finish()
    }
}

impl Matcher {
    /// A matcher reading schemas from `config.schema_root` and generating
    /// missing ones with [`DraftFourGenerator`].
    ///
    /// # Errors
    ///
    /// See [`build_store`].
    pub fn new(schema_name: &str, config: &MatcherConfig) -> Result<Self, MatcherError> {
        Self::with_collaborators(
            schema_name,
            config,
            FsSchemaSource::new(config.schema_root.clone()),
            DraftFourGenerator,
        )
    }

    /// A matcher with explicit source and generator.
    ///
    /// # Errors
    ///
    /// See [`build_store`].
    pub fn with_collaborators(
        schema_name: &str,
        config: &MatcherConfig,
        source: impl SchemaSourceEnumerator + 'static,
        generator: impl SchemaGenerator + 'static,
    ) -> Result<Self, MatcherError> {
        let store = build_store(&source)?;
        Ok(Self {
            schema_id: SchemaId::document(schema_locator(schema_name)),
            config: config.clone(),
            store,
            source: Box::new(source),
            generator: Box::new(generator),
            errors: None,
        })
    }

    /// Validate `payload` against the schema. Returns `true` when it
    /// conforms; the violations are kept for [`errors`](Self::errors).
    ///
    /// # Errors
    ///
    /// [`MatcherError::SchemaNotFound`] if the schema is missing and
    /// generation is disabled; generation failures otherwise.
    pub fn matches(&mut self, payload: &Value) -> Result<bool, MatcherError> {
        if !self.store.contains(self.schema_id.locator()) {
            if !self.config.generate_missing {
                return Err(MatcherError::SchemaNotFound {
                    locator: self.schema_id.locator().to_string(),
                    root: self.config.schema_root.clone(),
                });
            }
            self.generate_from(payload)?;
        }

        let errors = Validator::new(&self.store).validate_id(payload, &self.schema_id)?;
        let conforms = errors.is_empty();
        tracing::debug!(schema = %self.schema_id, errors = errors.len(), "validated payload");
        self.errors = Some(errors);
        Ok(conforms)
    }

    /// [`matches`](Self::matches) for payload text.
    ///
    /// # Errors
    ///
    /// [`MatcherError::InvalidPayload`] if `text` is not JSON.
    pub fn matches_json(&mut self, text: &str) -> Result<bool, MatcherError> {
        let payload: Value = serde_json::from_str(text).map_err(MatcherError::InvalidPayload)?;
        self.matches(&payload)
    }

    /// The first violation of the last [`matches`](Self::matches) call.
    pub fn validation_failure_message(&self) -> Option<String> {
        self.errors
            .as_ref()
            .and_then(ValidationErrors::first)
            .map(ToString::to_string)
    }

    /// Every violation of the last [`matches`](Self::matches) call.
    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn schema_id(&self) -> &SchemaId {
        &self.schema_id
    }

    fn generate_from(&mut self, payload: &Value) -> Result<(), MatcherError> {
        let locator = self.schema_id.locator().to_string();
        tracing::warn!(locator = %locator, "schema not found; generating it from the payload");

        let schema = self.generator.generate(&locator, payload);
        let text = serde_json::to_string_pretty(&schema).map_err(|source| MatcherError::Generation {
            locator: locator.clone(),
            source,
        })?;
        self.source.persist(&locator, &text)?;
        self.store.add_schema(parse(&text, &locator)?);
        expand(&locator, &mut self.store)?;

        tracing::info!(locator = %locator, "generated schema");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySchemaSource;
    use serde_json::json;

    fn user_source() -> MemorySchemaSource {
        MemorySchemaSource::new().with(
            "user.json",
            r#"{"type":"object","required":["name"],"properties":{"name":{"type":"string"}}}"#,
        )
    }

    fn matcher(source: MemorySchemaSource, config: &MatcherConfig) -> Matcher {
        Matcher::with_collaborators("user", config, source, DraftFourGenerator).unwrap()
    }

    #[test]
    fn schema_name_gains_json_extension_once() {
        assert_eq!(schema_locator("user"), "user.json");
        assert_eq!(schema_locator("api/user.json"), "api/user.json");
    }

    #[test]
    fn verdicts_and_failure_message() {
        let mut m = matcher(user_source(), &MatcherConfig::default());
        assert!(m.validation_failure_message().is_none());

        assert!(m.matches(&json!({"name": "x"})).unwrap());
        assert!(m.validation_failure_message().is_none());

        assert!(!m.matches(&json!({})).unwrap());
        assert_eq!(
            m.validation_failure_message().unwrap(),
            "/: \"name\" is a required property"
        );

        assert!(!m.matches_json(r#"{"name": 5}"#).unwrap());
        let first = m.errors().unwrap().first().unwrap();
        assert_eq!(first.instance_path.to_string(), "/name");
    }

    #[test]
    fn invalid_payload_text_is_an_error() {
        let mut m = matcher(user_source(), &MatcherConfig::default());
        assert!(matches!(
            m.matches_json("{not json").unwrap_err(),
            MatcherError::InvalidPayload(_)
        ));
    }

    #[test]
    fn missing_schema_without_generation_is_an_error() {
        let config = MatcherConfig::default().with_generate_missing(false);
        let mut m = matcher(MemorySchemaSource::new(), &config);
        assert!(matches!(
            m.matches(&json!({})).unwrap_err(),
            MatcherError::SchemaNotFound { .. }
        ));
    }

    #[test]
    fn missing_schema_is_generated_from_first_payload() {
        let mut m = matcher(MemorySchemaSource::new(), &MatcherConfig::default());
        assert!(m.matches(&json!({"name": "x", "age": 3})).unwrap());
        assert!(m.store().contains("user.json"));
        assert!(!m.matches(&json!({"name": "x"})).unwrap());
        assert!(m.validation_failure_message().unwrap().contains("\"age\""));
    }

    #[test]
    fn construction_fails_on_malformed_or_dangling_schemas() {
        let malformed = MemorySchemaSource::new().with("bad.json", "[1, 2]");
        assert!(matches!(
            Matcher::with_collaborators("bad", &MatcherConfig::default(), malformed, DraftFourGenerator)
                .unwrap_err(),
            MatcherError::Malformed(_)
        ));

        let dangling = MemorySchemaSource::new().with("a.json", r#"{"$ref": "missing.json"}"#);
        assert!(matches!(
            Matcher::with_collaborators("a", &MatcherConfig::default(), dangling, DraftFourGenerator)
                .unwrap_err(),
            MatcherError::Unresolvable(_)
        ));
    }
}
