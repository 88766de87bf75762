//! # JSON Pointers
//!
//! RFC 6901 pointers, stored as a list of unescaped reference tokens.
//!
//! The same type addresses two different trees: locations inside a payload
//! (the `instance_path` of a validation error) and locations inside a schema
//! document (the fragment of a [`SchemaId`](crate::SchemaId)).
//!
//! ## Rendering
//!
//! The root pointer renders as `/` rather than the empty string, so that a
//! violation on the payload root reads as `/: "name" is a required property`.
//! For the same reason both `""` and `"/"` parse to the root. RFC 6901
//! reads `"/"` as the single empty-string key; that one location is not
//! addressable here. Empty keys anywhere below the root (`/a/`, `//x`) are
//! kept as empty tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PointerError;

/// A JSON pointer into a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    /// The pointer to the whole document.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse an escaped pointer such as `/definitions/a~1b`.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::MissingLeadingSlash`] for non-empty input that
    /// does not start with `/`, and [`PointerError::InvalidEscape`] for a `~`
    /// not followed by `0` or `1`.
    pub fn parse(input: &str) -> Result<Self, PointerError> {
        if input.is_empty() || input == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = input.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(input.to_string()));
        };
        rest.split('/')
            .map(|token| unescape(token).ok_or_else(|| PointerError::InvalidEscape(input.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Append one unescaped token in place.
    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    /// Return a new pointer extended by one unescaped token.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(token);
        next
    }

    /// The pointer one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    /// The unescaped reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// True for the whole-document pointer.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of reference tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Same as [`is_root`](Self::is_root); provided for `len` symmetry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for token in &self.0 {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<JsonPointer> for String {
    fn from(pointer: JsonPointer) -> Self {
        pointer.to_string()
    }
}

impl TryFrom<String> for JsonPointer {
    type Error = PointerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<S: Into<String>> FromIterator<S> for JsonPointer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Rendering then parsing recovers the exact tokens, including
        /// tokens that contain `~` and `/`.
        #[test]
        fn display_parse_recovers_tokens(tokens in prop::collection::vec("[a-z~/]{1,6}", 1..5)) {
            let p: JsonPointer = tokens.clone().into_iter().collect();
            let parsed = JsonPointer::parse(&p.to_string()).unwrap();
            prop_assert_eq!(parsed.tokens(), tokens.as_slice());
        }
    }
}
