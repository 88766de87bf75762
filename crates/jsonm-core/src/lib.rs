//! # jsonm-core: Foundational Types for jsonm
//!
//! The leaf crate of the workspace. It defines the identity and addressing
//! primitives that the document store, the reference expander and the
//! validator all share, plus the setup-time error taxonomy.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for addresses.** A schema node is named by a
//!    [`SchemaId`] (document locator + fragment pointer), a location inside a
//!    payload by a [`JsonPointer`]. No bare strings for either.
//!
//! 2. **Setup errors are types, violations are data.** Parse and resolution
//!    failures are [`MalformedSchemaError`] and [`UnresolvableReferenceError`];
//!    payload violations never appear here and are never returned as `Err`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsonm-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod pointer;

// Re-export primary types for ergonomic imports.
pub use error::{MalformedSchemaError, PointerError, UnresolvableReferenceError};
pub use identity::SchemaId;
pub use pointer::JsonPointer;
