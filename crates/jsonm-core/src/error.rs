//! # Error Types: Setup-Time Failures
//!
//! Errors that abort construction of a matcher. All use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - A broken schema corpus is unrecoverable: parse and resolution errors
//!   propagate immediately and carry the locator and pointer involved.
//! - Payload violations are not errors in this sense; they are collected as
//!   data by the validator and never appear in this module.

use thiserror::Error;

use crate::identity::SchemaId;
use crate::pointer::JsonPointer;

/// A JSON pointer string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// Non-empty pointers must start with `/`.
    #[error("JSON pointer must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    /// A `~` was not followed by `0` or `1`.
    #[error("invalid '~' escape in JSON pointer: {0:?}")]
    InvalidEscape(String),
}

/// A schema source failed to parse into a schema tree.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed schema {locator} at {pointer}: {reason}")]
pub struct MalformedSchemaError {
    /// Locator of the document being parsed.
    pub locator: String,
    /// Pointer of the offending keyword within the document.
    pub pointer: JsonPointer,
    /// Human-readable reason.
    pub reason: String,
}

impl MalformedSchemaError {
    /// Build an error for `locator` at `pointer`.
    pub fn new(locator: impl Into<String>, pointer: JsonPointer, reason: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            pointer,
            reason: reason.into(),
        }
    }
}

/// A `$ref` could not be resolved against the document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnresolvableReferenceError {
    /// The document part of the reference matches no registered document.
    #[error("reference {reference:?} from {from}: no document registered for {document:?}")]
    DocumentNotFound {
        /// The raw `$ref` string.
        reference: String,
        /// The node holding the reference.
        from: SchemaId,
        /// The document part that failed to resolve.
        document: String,
    },

    /// The document exists but holds no schema node at the fragment.
    #[error("reference {reference:?} from {from}: no schema at {target}")]
    FragmentNotFound {
        /// The raw `$ref` string.
        reference: String,
        /// The node holding the reference.
        from: SchemaId,
        /// The identity the fragment pointed at.
        target: SchemaId,
    },

    /// The fragment is neither empty nor a JSON pointer (e.g. `#foo`).
    #[error("reference {reference:?} from {from}: unsupported fragment: {reason}")]
    UnsupportedFragment {
        /// The raw `$ref` string.
        reference: String,
        /// The node holding the reference.
        from: SchemaId,
        /// Why the fragment was rejected.
        reason: String,
    },

    /// A chain of `$ref`-only nodes leads back to itself.
    #[error("reference cycle without intervening schema: {}", format_chain(.chain))]
    Cycle {
        /// The identities visited, ending with the repeated one.
        chain: Vec<SchemaId>,
    },
}

fn format_chain(chain: &[SchemaId]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
