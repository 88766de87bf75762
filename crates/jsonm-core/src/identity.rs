//! # Schema Identity
//!
//! Every schema node, from a document root down to a nested `properties`
//! member, is named by a [`SchemaId`]: the locator of the document that
//! holds it plus the JSON pointer of the node inside that document.
//!
//! Locators are schema-root relative paths with `/` separators
//! (`api/user.json`). They are opaque to this crate; only the document store
//! gives them meaning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PointerError;
use crate::pointer::JsonPointer;

/// Canonical identity of a schema node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId {
    locator: String,
    pointer: JsonPointer,
}

impl SchemaId {
    /// Identity of the root node of a document.
    pub fn document(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            pointer: JsonPointer::root(),
        }
    }

    /// Identity of the node at `pointer` inside document `locator`.
    pub fn new(locator: impl Into<String>, pointer: JsonPointer) -> Self {
        Self {
            locator: locator.into(),
            pointer,
        }
    }

    /// The document locator.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// The fragment pointer inside the document.
    pub fn pointer(&self) -> &JsonPointer {
        &self.pointer
    }

    /// True if this names a document root.
    pub fn is_document_root(&self) -> bool {
        self.pointer.is_root()
    }

    /// Identity of the root of the same document.
    pub fn document_root(&self) -> Self {
        Self::document(self.locator.clone())
    }

    /// Identity of a child node one token below this one.
    pub fn child(&self, token: impl Into<String>) -> Self {
        Self {
            locator: self.locator.clone(),
            pointer: self.pointer.join(token),
        }
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_root() {
            f.write_str(&self.locator)
        } else {
            write!(f, "{}#{}", self.locator, self.pointer)
        }
    }
}

impl FromStr for SchemaId {
    type Err = PointerError;

    /// Parse `locator` or `locator#/pointer`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('#') {
            Some((locator, fragment)) => Ok(Self::new(locator, JsonPointer::parse(fragment)?)),
            None => Ok(Self::document(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_root_fragment() {
        let id = SchemaId::document("api/user.json");
        assert_eq!(id.to_string(), "api/user.json");
        assert!(id.is_document_root());
    }

    #[test]
    fn child_extends_pointer() {
        let id = SchemaId::document("b.json").child("definitions").child("point");
        assert_eq!(id.to_string(), "b.json#/definitions/point");
        assert_eq!(id.locator(), "b.json");
        assert_eq!(id.document_root(), SchemaId::document("b.json"));
    }

    #[test]
    fn parse_with_and_without_fragment() {
        let id: SchemaId = "b.json#/definitions/point".parse().unwrap();
        assert_eq!(id, SchemaId::document("b.json").child("definitions").child("point"));
        let root: SchemaId = "a.json".parse().unwrap();
        assert!(root.is_document_root());
        let hash_only: SchemaId = "a.json#".parse().unwrap();
        assert_eq!(hash_only, root);
    }

    #[test]
    fn parse_rejects_bad_fragment() {
        assert!("a.json#definitions".parse::<SchemaId>().is_err());
    }
}
