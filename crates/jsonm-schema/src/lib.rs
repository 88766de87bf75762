//! # jsonm-schema: Schema Store, Reference Expansion & Validation
//!
//! Answers one question: does a payload structurally conform to a named
//! JSON Schema document, given a directory of documents that reference one
//! another through `$ref`?
//!
//! ## Pipeline
//!
//! 1. [`source`] enumerates documents (filesystem or memory).
//! 2. [`parser`] turns each into a typed [`SchemaNode`] tree.
//! 3. [`DocumentStore`] registers them by locator and resolves references.
//! 4. [`expand`](mod@expand) links every `$ref` to its target identity, rejecting
//!    dangling references and `$ref`-only cycles.
//! 5. [`Validator`] walks payload and schema together and collects every
//!    violation, in order, into [`ValidationErrors`].
//!
//! [`Matcher`] wires these together and adds schema generation for
//! missing documents ([`generate`]).
//!
//! ## Crate Policy
//!
//! - Depends only on `jsonm-core` internally.
//! - Setup failures (malformed schemas, unresolvable references) are
//!   errors; payload violations are data and never returned as `Err`.
//! - The store is mutated only while building; validation borrows it
//!   immutably.

pub mod config;
pub mod expand;
pub mod generate;
pub mod matcher;
pub mod node;
pub mod parser;
pub mod source;
pub mod store;
pub mod validate;

pub use config::{ConfigError, MatcherConfig, DEFAULT_SCHEMA_ROOT};
pub use expand::{expand, expand_all, ExpansionReport};
pub use generate::{DraftFourGenerator, SchemaGenerator, DRAFT4_SCHEMA_URI};
pub use matcher::{build_store, schema_locator, Matcher, MatcherError};
pub use node::{JsonType, SchemaNode};
pub use parser::{parse, parse_value};
pub use source::{FsSchemaSource, MemorySchemaSource, SchemaSource, SchemaSourceEnumerator, SourceError};
pub use store::DocumentStore;
pub use validate::{Keyword, ValidationError, ValidationErrors, Validator};
