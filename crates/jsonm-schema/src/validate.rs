//! # Structural Validation
//!
//! Checks a payload against an expanded schema node and collects every
//! violation, in a fixed order, into [`ValidationErrors`].
//!
//! ## Ordering
//!
//! For each schema node the checks run as: `$ref`, `type`, object keywords
//! (`required`, `properties`, `patternProperties`, `additionalProperties`,
//! property counts), array keywords (`items`, `additionalItems`, item
//! counts, `uniqueItems`), `enum`, string keywords (`pattern`, lengths),
//! numeric keywords (`minimum`, `maximum`, `multipleOf`), and finally the
//! combinators. Recursion into children happens in place, so the list is
//! depth first in schema order and identical for identical inputs. Callers
//! that show a single headline failure show the first entry.
//!
//! ## Type mismatch
//!
//! A failed `type` check emits one error and skips the kind-specific checks
//! for that node; `enum` and the combinators still run.
//!
//! ## Termination
//!
//! Recursion through `$ref` links is bounded by payload depth. A link
//! re-entered for the same payload location while still in progress is a
//! cycle that never descends. On the main walk it contributes no errors, so
//! an `allOf` loop reports only its other members. Inside an `anyOf`,
//! `oneOf` or `not` member the re-entry counts as a failure, so a
//! combinator can never be satisfied by the loop alone.

use std::collections::HashSet;
use std::fmt;

use jsonm_core::{JsonPointer, SchemaId, UnresolvableReferenceError};
use serde_json::{Map, Value};

use crate::node::{Additional, Items, JsonType, SchemaNode};
use crate::store::DocumentStore;

/// The schema rule a violation was reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Ref,
    Type,
    Required,
    AdditionalProperties,
    MinProperties,
    MaxProperties,
    AdditionalItems,
    MinItems,
    MaxItems,
    UniqueItems,
    Enum,
    Pattern,
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
    MultipleOf,
    AnyOf,
    OneOf,
    Not,
}

impl Keyword {
    /// The keyword as spelled in a schema.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ref => "$ref",
            Self::Type => "type",
            Self::Required => "required",
            Self::AdditionalProperties => "additionalProperties",
            Self::MinProperties => "minProperties",
            Self::MaxProperties => "maxProperties",
            Self::AdditionalItems => "additionalItems",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::UniqueItems => "uniqueItems",
            Self::Enum => "enum",
            Self::Pattern => "pattern",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::MultipleOf => "multipleOf",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conformance violation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// JSON pointer to the violating value in the payload.
    pub instance_path: JsonPointer,
    /// The rule that was violated.
    pub keyword: Keyword,
    /// The schema node holding the rule.
    pub schema_id: SchemaId,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.instance_path, self.message)
    }
}

/// Ordered collection of violations. Empty means the payload conforms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The headline violation.
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Iterate in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns a slice of all violations.
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Validates payloads against nodes of an expanded [`DocumentStore`].
///
/// Borrows the store read-only; any number of validators may share one.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'s> {
    store: &'s DocumentStore,
}

impl<'s> Validator<'s> {
    /// Create a validator over `store`.
    pub fn new(store: &'s DocumentStore) -> Self {
        Self { store }
    }

    /// Validate `payload` against `schema`, collecting every violation.
    pub fn validate(&self, payload: &Value, schema: &SchemaNode) -> ValidationErrors {
        let mut walk = Walk {
            store: self.store,
            active: HashSet::new(),
            speculative: 0,
        };
        let mut errors = Vec::new();
        walk.check(payload, schema, &JsonPointer::root(), &mut errors);
        ValidationErrors { errors }
    }

    /// Validate `payload` against the node registered as `id`.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvableReferenceError::DocumentNotFound`] or
    /// [`UnresolvableReferenceError::FragmentNotFound`] if no node has that
    /// identity.
    pub fn validate_id(
        &self,
        payload: &Value,
        id: &SchemaId,
    ) -> Result<ValidationErrors, UnresolvableReferenceError> {
        if !self.store.contains(id.locator()) {
            return Err(UnresolvableReferenceError::DocumentNotFound {
                reference: id.to_string(),
                from: id.clone(),
                document: id.locator().to_string(),
            });
        }
        let schema = self
            .store
            .get(id)
            .ok_or_else(|| UnresolvableReferenceError::FragmentNotFound {
                reference: id.to_string(),
                from: id.clone(),
                target: id.clone(),
            })?;
        Ok(self.validate(payload, schema))
    }

    /// True if `payload` conforms to `schema`.
    pub fn is_valid(&self, payload: &Value, schema: &SchemaNode) -> bool {
        self.validate(payload, schema).is_empty()
    }
}

struct Walk<'s> {
    store: &'s DocumentStore,
    active: HashSet<(SchemaId, JsonPointer)>,
    /// Depth of nested `passes` calls; nonzero while a combinator member is
    /// being tried.
    speculative: usize,
}

fn violation(node: &SchemaNode, path: &JsonPointer, keyword: Keyword, message: String) -> ValidationError {
    ValidationError {
        instance_path: path.clone(),
        keyword,
        schema_id: node.id().clone(),
        message,
    }
}

impl<'s> Walk<'s> {
    fn check(&mut self, value: &Value, node: &SchemaNode, path: &JsonPointer, out: &mut Vec<ValidationError>) {
        if let Some(reference) = node.reference() {
            let target = match reference.target() {
                Some(id) => self.store.get(id).ok_or_else(|| format!("no schema at {id}")),
                None => self
                    .store
                    .resolve(reference.raw(), node.id())
                    .map_err(|e| e.to_string()),
            };
            match target {
                Ok(target) => {
                    let key = (target.id().clone(), path.clone());
                    if self.active.insert(key.clone()) {
                        self.check(value, target, path, out);
                        self.active.remove(&key);
                    } else if self.speculative > 0 {
                        out.push(violation(
                            node,
                            path,
                            Keyword::Ref,
                            format!("circular reference to {} makes no progress", target.id()),
                        ));
                    }
                }
                Err(reason) => out.push(violation(
                    node,
                    path,
                    Keyword::Ref,
                    format!("unresolvable reference {:?}: {reason}", reference.raw()),
                )),
            }
            return;
        }

        let kind = JsonType::of(value);
        let type_ok = match node.types() {
            Some(allowed) if !allowed.iter().any(|t| t.admits(kind)) => {
                out.push(violation(node, path, Keyword::Type, type_message(value, allowed)));
                false
            }
            _ => true,
        };

        if type_ok {
            match value {
                Value::Object(map) => self.check_object(map, value, node, path, out),
                Value::Array(list) => self.check_array(list, value, node, path, out),
                _ => {}
            }
        }

        if let Some(options) = &node.enumeration {
            if !options.iter().any(|option| json_equal(option, value)) {
                out.push(violation(
                    node,
                    path,
                    Keyword::Enum,
                    format!("{value} is not one of {}", Value::Array(options.clone())),
                ));
            }
        }

        if type_ok {
            match value {
                Value::String(s) => check_string(s, node, path, out),
                Value::Number(n) => {
                    if let Some(f) = n.as_f64() {
                        check_number(f, value, node, path, out);
                    }
                }
                _ => {}
            }
        }

        self.check_combinators(value, node, path, out);
    }

    fn check_object(
        &mut self,
        map: &Map<String, Value>,
        value: &Value,
        node: &SchemaNode,
        path: &JsonPointer,
        out: &mut Vec<ValidationError>,
    ) {
        for key in node.required() {
            if !map.contains_key(key) {
                out.push(violation(
                    node,
                    path,
                    Keyword::Required,
                    format!("{} is a required property", Value::String(key.clone())),
                ));
            }
        }

        for (key, child) in &node.properties {
            if let Some(member) = map.get(key) {
                self.check(member, child, &path.join(key.as_str()), out);
            }
        }

        for (pattern, child) in &node.pattern_properties {
            for (key, member) in map {
                if pattern.is_match(key) {
                    self.check(member, child, &path.join(key.as_str()), out);
                }
            }
        }

        if let Some(additional) = &node.additional_properties {
            let extras = map.iter().filter(|(key, _)| {
                !node.properties.contains_key(key.as_str())
                    && !node.pattern_properties.iter().any(|(p, _)| p.is_match(key))
            });
            match additional {
                Additional::Allowed(true) => {}
                Additional::Allowed(false) => {
                    for (key, _) in extras {
                        out.push(violation(
                            node,
                            path,
                            Keyword::AdditionalProperties,
                            format!(
                                "Additional properties are not allowed ({} was unexpected)",
                                Value::String(key.clone())
                            ),
                        ));
                    }
                }
                Additional::Schema(child) => {
                    for (key, member) in extras {
                        self.check(member, child, &path.join(key.as_str()), out);
                    }
                }
            }
        }

        let count = map.len() as u64;
        if let Some(min) = node.min_properties {
            if count < min {
                out.push(violation(
                    node,
                    path,
                    Keyword::MinProperties,
                    format!("{value} has less than {min} properties"),
                ));
            }
        }
        if let Some(max) = node.max_properties {
            if count > max {
                out.push(violation(
                    node,
                    path,
                    Keyword::MaxProperties,
                    format!("{value} has more than {max} properties"),
                ));
            }
        }
    }

    fn check_array(
        &mut self,
        list: &[Value],
        value: &Value,
        node: &SchemaNode,
        path: &JsonPointer,
        out: &mut Vec<ValidationError>,
    ) {
        match &node.items {
            Some(Items::Single(child)) => {
                for (i, element) in list.iter().enumerate() {
                    self.check(element, child, &path.join(i.to_string()), out);
                }
            }
            Some(Items::Tuple(children)) => {
                for (i, (element, child)) in list.iter().zip(children).enumerate() {
                    self.check(element, child, &path.join(i.to_string()), out);
                }
                if list.len() > children.len() {
                    match &node.additional_items {
                        Some(Additional::Allowed(false)) => out.push(violation(
                            node,
                            path,
                            Keyword::AdditionalItems,
                            format!(
                                "Additional items are not allowed ({} items, {} allowed)",
                                list.len(),
                                children.len()
                            ),
                        )),
                        Some(Additional::Schema(child)) => {
                            for (i, element) in list.iter().enumerate().skip(children.len()) {
                                self.check(element, child, &path.join(i.to_string()), out);
                            }
                        }
                        Some(Additional::Allowed(true)) | None => {}
                    }
                }
            }
            None => {}
        }

        let count = list.len() as u64;
        if let Some(min) = node.min_items {
            if count < min {
                out.push(violation(
                    node,
                    path,
                    Keyword::MinItems,
                    format!("{value} has less than {min} items"),
                ));
            }
        }
        if let Some(max) = node.max_items {
            if count > max {
                out.push(violation(
                    node,
                    path,
                    Keyword::MaxItems,
                    format!("{value} has more than {max} items"),
                ));
            }
        }
        if node.unique_items && has_duplicates(list) {
            out.push(violation(
                node,
                path,
                Keyword::UniqueItems,
                format!("{value} has non-unique elements"),
            ));
        }
    }

    fn check_combinators(
        &mut self,
        value: &Value,
        node: &SchemaNode,
        path: &JsonPointer,
        out: &mut Vec<ValidationError>,
    ) {
        for member in &node.all_of {
            self.check(value, member, path, out);
        }

        if !node.any_of.is_empty() && self.count_passing(value, &node.any_of, path) == 0 {
            out.push(violation(
                node,
                path,
                Keyword::AnyOf,
                format!("{value} is not valid under any of the given schemas"),
            ));
        }

        if !node.one_of.is_empty() {
            match self.count_passing(value, &node.one_of, path) {
                1 => {}
                0 => out.push(violation(
                    node,
                    path,
                    Keyword::OneOf,
                    format!("{value} is not valid under any of the given schemas"),
                )),
                _ => out.push(violation(
                    node,
                    path,
                    Keyword::OneOf,
                    format!("{value} is valid under more than one of the given schemas"),
                )),
            }
        }

        if let Some(negated) = &node.not {
            if self.passes(value, negated, path) {
                out.push(violation(
                    node,
                    path,
                    Keyword::Not,
                    format!("{value} is not allowed for {}", negated.id()),
                ));
            }
        }
    }

    fn passes(&mut self, value: &Value, node: &SchemaNode, path: &JsonPointer) -> bool {
        let mut scratch = Vec::new();
        self.speculative += 1;
        self.check(value, node, path, &mut scratch);
        self.speculative -= 1;
        scratch.is_empty()
    }

    fn count_passing(&mut self, value: &Value, members: &[SchemaNode], path: &JsonPointer) -> usize {
        members
            .iter()
            .filter(|member| self.passes(value, member, path))
            .count()
    }
}

fn check_string(s: &str, node: &SchemaNode, path: &JsonPointer, out: &mut Vec<ValidationError>) {
    if let Some(pattern) = &node.pattern {
        if !pattern.is_match(s) {
            out.push(violation(
                node,
                path,
                Keyword::Pattern,
                format!("{:?} does not match {:?}", s, pattern.as_str()),
            ));
        }
    }
    let length = s.chars().count() as u64;
    if let Some(min) = node.min_length {
        if length < min {
            out.push(violation(
                node,
                path,
                Keyword::MinLength,
                format!("{s:?} is shorter than {min} characters"),
            ));
        }
    }
    if let Some(max) = node.max_length {
        if length > max {
            out.push(violation(
                node,
                path,
                Keyword::MaxLength,
                format!("{s:?} is longer than {max} characters"),
            ));
        }
    }
}

fn check_number(n: f64, value: &Value, node: &SchemaNode, path: &JsonPointer, out: &mut Vec<ValidationError>) {
    if let Some(bound) = node.minimum {
        let (violated, relation) = if bound.exclusive {
            (n <= bound.value, "less than or equal to")
        } else {
            (n < bound.value, "less than")
        };
        if violated {
            out.push(violation(
                node,
                path,
                Keyword::Minimum,
                format!("{value} is {relation} the minimum of {}", bound.value),
            ));
        }
    }
    if let Some(bound) = node.maximum {
        let (violated, relation) = if bound.exclusive {
            (n >= bound.value, "greater than or equal to")
        } else {
            (n > bound.value, "greater than")
        };
        if violated {
            out.push(violation(
                node,
                path,
                Keyword::Maximum,
                format!("{value} is {relation} the maximum of {}", bound.value),
            ));
        }
    }
    if let Some(step) = node.multiple_of {
        let quotient = n / step;
        if (quotient - quotient.round()).abs() > f64::EPSILON * quotient.abs().max(1.0) {
            out.push(violation(
                node,
                path,
                Keyword::MultipleOf,
                format!("{value} is not a multiple of {step}"),
            ));
        }
    }
}

fn type_message(value: &Value, allowed: &[JsonType]) -> String {
    let names: Vec<String> = allowed.iter().map(|t| format!("{:?}", t.as_str())).collect();
    if names.len() == 1 {
        format!("{value} is not of type {}", names[0])
    } else {
        format!("{value} is not of types {}", names.join(", "))
    }
}

/// JSON equality with numbers compared by value (`1` equals `1.0`).
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

fn has_duplicates(list: &[Value]) -> bool {
    list.iter()
        .enumerate()
        .any(|(i, x)| list[i + 1..].iter().any(|y| json_equal(x, y)))
}
