//! # Schema Nodes
//!
//! The typed form of a JSON Schema (draft-04 subset). A [`SchemaNode`] owns
//! its nested sub-schemas; a `$ref` is held as a [`Reference`] whose link is
//! a [`SchemaId`] looked up in the document store, never an owned node. The
//! store therefore owns every node exactly once, and cyclic `$ref` graphs
//! never become ownership cycles.

use std::collections::BTreeMap;
use std::fmt;

use fancy_regex::Regex;
use jsonm_core::SchemaId;
use serde_json::Value;

/// The seven JSON Schema primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    /// Parse a `type` keyword member.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// The keyword spelling of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// The runtime kind of a payload value. Integral numbers, including
    /// floats with a zero fractional part, report [`JsonType::Integer`].
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => Self::Integer,
                _ => Self::Number,
            },
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// True if a value of runtime kind `kind` satisfies this declared type.
    pub fn admits(self, kind: JsonType) -> bool {
        self == kind || (self == Self::Number && kind == Self::Integer)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled `pattern` or `patternProperties` key.
///
/// Compiled with a backtracking engine so ECMA-262 look-around and
/// backreferences are accepted.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source`; the match is an unanchored search.
    pub fn new(source: &str) -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    /// The pattern as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern matches anywhere in `text`. A match that aborts
    /// (backtrack limit exceeded) counts as no match.
    pub fn is_match(&self, text: &str) -> bool {
        match self.regex.is_match(text) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(pattern = %self.source, error = %e, "pattern match aborted; treating as no match");
                false
            }
        }
    }
}

/// The `items` keyword.
#[derive(Debug, Clone)]
pub enum Items {
    /// One schema for every element.
    Single(Box<SchemaNode>),
    /// Positional schemas for the leading elements.
    Tuple(Vec<SchemaNode>),
}

/// `additionalProperties` / `additionalItems`.
#[derive(Debug, Clone)]
pub enum Additional {
    /// `true` allows anything, `false` forbids any extra member.
    Allowed(bool),
    /// Extra members must validate against this schema.
    Schema(Box<SchemaNode>),
}

/// A `$ref` placeholder and, once expanded, its link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    raw: String,
    target: Option<SchemaId>,
}

impl Reference {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            target: None,
        }
    }

    /// The reference string as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The linked node identity, once expanded.
    pub fn target(&self) -> Option<&SchemaId> {
        self.target.as_ref()
    }

    /// True once expansion has linked this reference.
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    pub(crate) fn link(&mut self, target: SchemaId) {
        self.target = Some(target);
    }
}

/// Inclusive or exclusive numeric bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub exclusive: bool,
}

/// One schema document or sub-schema.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) id: SchemaId,
    pub(crate) alias: Option<String>,
    pub(crate) reference: Option<Reference>,
    pub(crate) types: Option<Vec<JsonType>>,
    pub(crate) required: Vec<String>,
    pub(crate) properties: BTreeMap<String, SchemaNode>,
    pub(crate) pattern_properties: Vec<(Pattern, SchemaNode)>,
    pub(crate) additional_properties: Option<Additional>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) items: Option<Items>,
    pub(crate) additional_items: Option<Additional>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,
    pub(crate) enumeration: Option<Vec<Value>>,
    pub(crate) pattern: Option<Pattern>,
    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) minimum: Option<Bound>,
    pub(crate) maximum: Option<Bound>,
    pub(crate) multiple_of: Option<f64>,
    pub(crate) all_of: Vec<SchemaNode>,
    pub(crate) any_of: Vec<SchemaNode>,
    pub(crate) one_of: Vec<SchemaNode>,
    pub(crate) not: Option<Box<SchemaNode>>,
    pub(crate) definitions: BTreeMap<String, SchemaNode>,
    pub(crate) extras: BTreeMap<String, SchemaNode>,
}

impl SchemaNode {
    /// An unconstrained node (`{}`) at `id`.
    pub fn empty(id: SchemaId) -> Self {
        Self {
            id,
            alias: None,
            reference: None,
            types: None,
            required: Vec::new(),
            properties: BTreeMap::new(),
            pattern_properties: Vec::new(),
            additional_properties: None,
            min_properties: None,
            max_properties: None,
            items: None,
            additional_items: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            enumeration: None,
            pattern: None,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            multiple_of: None,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            not: None,
            definitions: BTreeMap::new(),
            extras: BTreeMap::new(),
        }
    }

    /// This node's identity.
    pub fn id(&self) -> &SchemaId {
        &self.id
    }

    /// The document-level `id` URI, if the document declared one.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The `$ref` held by this node, if any.
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    /// The declared `type` set, if any.
    pub fn types(&self) -> Option<&[JsonType]> {
        self.types.as_deref()
    }

    /// The `required` keys in declaration order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// A `properties` member by name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties.get(name)
    }

    /// Follow reference tokens (already unescaped) from this node.
    ///
    /// Tokens name keyword positions the way a `$ref` fragment does:
    /// `properties/<name>`, `items` or `items/<index>`, `allOf/<index>`,
    /// `not`, `definitions/<name>`, and any unknown keyword that held an
    /// object.
    pub fn descend(&self, tokens: &[String]) -> Option<&SchemaNode> {
        let Some((head, rest)) = tokens.split_first() else {
            return Some(self);
        };
        let (next, consumed) = match head.as_str() {
            "properties" => keyed(&self.properties, rest)?,
            "definitions" => keyed(&self.definitions, rest)?,
            "patternProperties" => {
                let key = rest.first()?;
                let (_, node) = self.pattern_properties.iter().find(|(p, _)| p.as_str() == key)?;
                (node, 1)
            }
            "items" => match self.items.as_ref()? {
                Items::Single(node) => (node.as_ref(), 0),
                Items::Tuple(list) => indexed(list, rest)?,
            },
            "additionalProperties" => match self.additional_properties.as_ref()? {
                Additional::Schema(node) => (node.as_ref(), 0),
                Additional::Allowed(_) => return None,
            },
            "additionalItems" => match self.additional_items.as_ref()? {
                Additional::Schema(node) => (node.as_ref(), 0),
                Additional::Allowed(_) => return None,
            },
            "allOf" => indexed(&self.all_of, rest)?,
            "anyOf" => indexed(&self.any_of, rest)?,
            "oneOf" => indexed(&self.one_of, rest)?,
            "not" => (self.not.as_deref()?, 0),
            other => (self.extras.get(other)?, 0),
        };
        next.descend(&rest[consumed..])
    }

    /// Direct sub-schemas, in keyword order.
    pub fn children(&self) -> Vec<&SchemaNode> {
        let mut out: Vec<&SchemaNode> = Vec::new();
        out.extend(self.properties.values());
        out.extend(self.pattern_properties.iter().map(|(_, n)| n));
        if let Some(Additional::Schema(n)) = &self.additional_properties {
            out.push(n);
        }
        match &self.items {
            Some(Items::Single(n)) => out.push(n),
            Some(Items::Tuple(list)) => out.extend(list),
            None => {}
        }
        if let Some(Additional::Schema(n)) = &self.additional_items {
            out.push(n);
        }
        out.extend(&self.all_of);
        out.extend(&self.any_of);
        out.extend(&self.one_of);
        if let Some(n) = &self.not {
            out.push(n);
        }
        out.extend(self.definitions.values());
        out.extend(self.extras.values());
        out
    }

    /// Mutable counterpart of [`children`](Self::children).
    pub(crate) fn children_mut(&mut self) -> Vec<&mut SchemaNode> {
        let mut out: Vec<&mut SchemaNode> = Vec::new();
        out.extend(self.properties.values_mut());
        out.extend(self.pattern_properties.iter_mut().map(|(_, n)| n));
        if let Some(Additional::Schema(n)) = &mut self.additional_properties {
            out.push(n);
        }
        match &mut self.items {
            Some(Items::Single(n)) => out.push(n),
            Some(Items::Tuple(list)) => out.extend(list.iter_mut()),
            None => {}
        }
        if let Some(Additional::Schema(n)) = &mut self.additional_items {
            out.push(n);
        }
        out.extend(self.all_of.iter_mut());
        out.extend(self.any_of.iter_mut());
        out.extend(self.one_of.iter_mut());
        if let Some(n) = &mut self.not {
            out.push(n);
        }
        out.extend(self.definitions.values_mut());
        out.extend(self.extras.values_mut());
        out
    }

    /// Visit this node and every descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SchemaNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub(crate) fn walk_mut(&mut self, visit: &mut impl FnMut(&mut SchemaNode)) {
        visit(self);
        for child in self.children_mut() {
            child.walk_mut(visit);
        }
    }
}

fn keyed<'a>(map: &'a BTreeMap<String, SchemaNode>, rest: &[String]) -> Option<(&'a SchemaNode, usize)> {
    rest.first().and_then(|k| map.get(k)).map(|n| (n, 1))
}

fn indexed<'a>(list: &'a [SchemaNode], rest: &[String]) -> Option<(&'a SchemaNode, usize)> {
    rest.first()
        .and_then(|i| i.parse::<usize>().ok())
        .and_then(|i| list.get(i))
        .map(|n| (n, 1))
}
