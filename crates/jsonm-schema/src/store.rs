//! # Document Store
//!
//! Owns every parsed schema document, keyed by locator, and resolves `$ref`
//! strings to the schema nodes they name.
//!
//! ## Resolution
//!
//! A reference is split at `#` into a document part and a fragment. An empty
//! document part means the referencing document. Otherwise the document part
//! is tried, in order, as:
//!
//! 1. a registered `id` alias (`http://example.com/schemas/point.json`);
//! 2. a path relative to the referencing document's directory;
//! 3. a path relative to the schema root.
//!
//! The fragment is percent-decoded (`#/definitions/a%20b`), then parsed as
//! a JSON pointer and walked through the target document's node tree.
//!
//! ## Discipline
//!
//! Single writer, many readers: documents are added and expanded through
//! `&mut self` during construction; validation only ever borrows `&self`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use jsonm_core::{JsonPointer, SchemaId, UnresolvableReferenceError};
use percent_encoding::percent_decode_str;

use crate::node::SchemaNode;

/// Registry of parsed schema documents.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    documents: HashMap<String, SchemaNode>,
    aliases: HashMap<String, String>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its locator and return the stored node.
    ///
    /// Registering a locator twice replaces the earlier document
    /// (last write wins) and logs a warning.
    pub fn add_schema(&mut self, node: SchemaNode) -> &SchemaNode {
        let locator = node.id().locator().to_string();
        self.aliases.retain(|_, target| *target != locator);
        if let Some(alias) = node.alias() {
            if let Some(previous) = self.aliases.insert(alias.to_string(), locator.clone()) {
                tracing::warn!(alias, previous = %previous, locator = %locator, "schema id alias reassigned");
            }
        }
        match self.documents.entry(locator) {
            Entry::Occupied(mut slot) => {
                tracing::warn!(locator = %slot.key(), "schema registered twice; replacing earlier document");
                slot.insert(node);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(node),
        }
    }

    /// The root node of a registered document.
    pub fn document(&self, locator: &str) -> Option<&SchemaNode> {
        self.documents.get(locator)
    }

    pub(crate) fn document_mut(&mut self, locator: &str) -> Option<&mut SchemaNode> {
        self.documents.get_mut(locator)
    }

    /// Look up any node by identity.
    pub fn get(&self, id: &SchemaId) -> Option<&SchemaNode> {
        self.document(id.locator())?.descend(id.pointer().tokens())
    }

    /// True if a document is registered under `locator`.
    pub fn contains(&self, locator: &str) -> bool {
        self.documents.contains_key(locator)
    }

    /// All registered locators, sorted.
    pub fn locators(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.documents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True if no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Resolve `reference` as written in the node `relative_to`.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvableReferenceError`] if the document or fragment
    /// does not exist in the store, or the fragment is not a JSON pointer.
    pub fn resolve(
        &self,
        reference: &str,
        relative_to: &SchemaId,
    ) -> Result<&SchemaNode, UnresolvableReferenceError> {
        let target = self.resolve_id(reference, relative_to)?;
        self.get(&target)
            .ok_or_else(|| UnresolvableReferenceError::FragmentNotFound {
                reference: reference.to_string(),
                from: relative_to.clone(),
                target,
            })
    }

    /// Like [`resolve`](Self::resolve), returning the target identity.
    pub fn resolve_id(
        &self,
        reference: &str,
        relative_to: &SchemaId,
    ) -> Result<SchemaId, UnresolvableReferenceError> {
        let (document, fragment) = reference.split_once('#').unwrap_or((reference, ""));

        let locator = if document.is_empty() {
            relative_to.locator().to_string()
        } else {
            self.locate_document(document, relative_to.locator())
                .ok_or_else(|| UnresolvableReferenceError::DocumentNotFound {
                    reference: reference.to_string(),
                    from: relative_to.clone(),
                    document: document.to_string(),
                })?
        };

        let unsupported = |reason: String| UnresolvableReferenceError::UnsupportedFragment {
            reference: reference.to_string(),
            from: relative_to.clone(),
            reason,
        };
        let decoded = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|e| unsupported(format!("fragment is not UTF-8 once decoded: {e}")))?;
        let pointer = JsonPointer::parse(&decoded).map_err(|e| unsupported(e.to_string()))?;

        let target = SchemaId::new(locator, pointer);
        if self.get(&target).is_none() {
            return Err(UnresolvableReferenceError::FragmentNotFound {
                reference: reference.to_string(),
                from: relative_to.clone(),
                target,
            });
        }
        Ok(target)
    }

    fn locate_document(&self, document: &str, from_locator: &str) -> Option<String> {
        if let Some(locator) = self.aliases.get(document) {
            return Some(locator.clone());
        }
        if document.contains("://") {
            return None;
        }
        [
            join_locator(parent_dir(from_locator), document),
            join_locator("", document),
        ]
        .into_iter()
        .find(|candidate| self.documents.contains_key(candidate))
    }
}

fn parent_dir(locator: &str) -> &str {
    locator.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Join `relative` onto `base_dir`, normalising `.` and `..` segments.
/// A leading `/` makes `relative` root-anchored.
pub(crate) fn join_locator(base_dir: &str, relative: &str) -> String {
    let mut parts: Vec<&str> = if relative.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
