// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative event patterns and the pure matcher
//!
//! A pattern is a tree of field predicates written in JSON form, mirroring
//! the shape of the event attributes it is matched against:
//!
//! ```json
//! {
//!   "source": ["app"],
//!   "detail_type": [{"prefix": "order:"}],
//!   "payload": {
//!     "account": ["123", "456"],
//!     "total": [{"numeric": [">=", 100]}]
//!   }
//! }
//! ```
//!
//! Semantics: AND across fields, OR within a field's predicate list. A bare
//! value is an exact-match predicate; `{"prefix": s}`, `{"numeric": [...]}`
//! and `{"exists": bool}` select the other predicate kinds. An absent field
//! never matches unless the predicate list contains `{"exists": false}`.
//! Array values in the event match if any element satisfies the predicate.
//!
//! Matching is deterministic and performs no I/O. Unknown predicate kinds
//! are rejected at construction time, so a malformed pattern surfaces as a
//! configuration error instead of silently matching nothing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised when constructing a pattern from its JSON form
#[derive(Debug, Error, PartialEq)]
pub enum PatternError {
    #[error("pattern must be a JSON object")]
    NotAnObject,
    #[error("pattern has no fields")]
    Empty,
    #[error("field `{0}`: expected an array of predicates or a nested object")]
    InvalidField(String),
    #[error("field `{0}`: predicate list is empty")]
    EmptyValueSet(String),
    #[error("field `{field}`: unknown predicate kind `{kind}`")]
    UnknownPredicate { field: String, kind: String },
    #[error("field `{0}`: malformed predicate")]
    MalformedPredicate(String),
}

/// Comparison operators accepted by numeric range predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl NumericOp {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            "=" => Some(Self::Eq),
            ">=" => Some(Self::Ge),
            ">" => Some(Self::Gt),
            _ => None,
        }
    }

    fn holds(self, value: f64, bound: f64) -> bool {
        match self {
            Self::Lt => value < bound,
            Self::Le => value <= bound,
            Self::Eq => value == bound,
            Self::Ge => value >= bound,
            Self::Gt => value > bound,
        }
    }
}

/// A single predicate over one field value
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    /// Exact-value match (numbers compare numerically)
    Equals(Value),
    /// String prefix match
    Prefix(String),
    /// Conjunction of numeric comparisons, e.g. `[">", 0, "<=", 10]`
    Numeric(Vec<(NumericOp, f64)>),
    /// Field presence or absence
    Exists(bool),
}

impl Predicate {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => values_equal(expected, value),
            Self::Prefix(prefix) => value.as_str().is_some_and(|s| s.starts_with(prefix)),
            Self::Numeric(ops) => value
                .as_f64()
                .is_some_and(|n| ops.iter().all(|(op, bound)| op.holds(n, *bound))),
            // The field is present if we got here at all
            Self::Exists(wanted) => *wanted,
        }
    }
}

/// Exact-value comparison; numbers compare by value so `1` matches `1.0`
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// A node in the parsed predicate tree
#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// Nested object: descend structurally
    Object(BTreeMap<String, Node>),
    /// Leaf: OR over the predicate list
    AnyOf(Vec<Predicate>),
}

/// A compiled event pattern
///
/// Construction validates the JSON form; the original form is kept for
/// serialization so patterns round-trip through the durable operation log
/// byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    source: Value,
    root: BTreeMap<String, Node>,
}

impl Pattern {
    /// Compile a pattern from its JSON form
    pub fn from_json(value: Value) -> Result<Self, PatternError> {
        let Value::Object(map) = &value else {
            return Err(PatternError::NotAnObject);
        };
        if map.is_empty() {
            return Err(PatternError::Empty);
        }
        let root = parse_fields(map, "")?;
        Ok(Self {
            source: value,
            root,
        })
    }

    /// Compile a pattern from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, PatternError> {
        let value: Value =
            serde_json::from_str(text).map_err(|_| PatternError::NotAnObject)?;
        Self::from_json(value)
    }

    /// Evaluate the pattern against an event attribute tree.
    ///
    /// Pure and deterministic: repeated evaluation of the same inputs always
    /// yields the same result.
    pub fn matches(&self, attributes: &Value) -> bool {
        match_fields(&self.root, attributes)
    }

    /// The canonical JSON form the pattern was compiled from
    pub fn canonical(&self) -> &Value {
        &self.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.source.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(serde::de::Error::custom)
    }
}

fn field_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn parse_fields(
    map: &serde_json::Map<String, Value>,
    prefix: &str,
) -> Result<BTreeMap<String, Node>, PatternError> {
    let mut fields = BTreeMap::new();
    for (name, value) in map {
        let path = field_path(prefix, name);
        let node = match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(PatternError::EmptyValueSet(path));
                }
                let predicates = items
                    .iter()
                    .map(|item| parse_predicate(item, &path))
                    .collect::<Result<Vec<_>, _>>()?;
                Node::AnyOf(predicates)
            }
            Value::Object(nested) => {
                if nested.is_empty() {
                    return Err(PatternError::EmptyValueSet(path));
                }
                Node::Object(parse_fields(nested, &path)?)
            }
            _ => return Err(PatternError::InvalidField(path)),
        };
        fields.insert(name.clone(), node);
    }
    Ok(fields)
}

fn parse_predicate(item: &Value, path: &str) -> Result<Predicate, PatternError> {
    match item {
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {
            Ok(Predicate::Equals(item.clone()))
        }
        Value::Object(map) => {
            let mut entries = map.iter();
            let (kind, arg) = entries
                .next()
                .ok_or_else(|| PatternError::MalformedPredicate(path.to_string()))?;
            if entries.next().is_some() {
                return Err(PatternError::MalformedPredicate(path.to_string()));
            }
            match kind.as_str() {
                "prefix" => arg
                    .as_str()
                    .map(|s| Predicate::Prefix(s.to_string()))
                    .ok_or_else(|| PatternError::MalformedPredicate(path.to_string())),
                "exists" => arg
                    .as_bool()
                    .map(Predicate::Exists)
                    .ok_or_else(|| PatternError::MalformedPredicate(path.to_string())),
                "numeric" => parse_numeric(arg, path),
                other => Err(PatternError::UnknownPredicate {
                    field: path.to_string(),
                    kind: other.to_string(),
                }),
            }
        }
        _ => Err(PatternError::MalformedPredicate(path.to_string())),
    }
}

fn parse_numeric(arg: &Value, path: &str) -> Result<Predicate, PatternError> {
    let items = arg
        .as_array()
        .ok_or_else(|| PatternError::MalformedPredicate(path.to_string()))?;
    if items.is_empty() || items.len() % 2 != 0 {
        return Err(PatternError::MalformedPredicate(path.to_string()));
    }
    let mut ops = Vec::with_capacity(items.len() / 2);
    for pair in items.chunks(2) {
        let op = pair[0]
            .as_str()
            .and_then(NumericOp::parse)
            .ok_or_else(|| PatternError::MalformedPredicate(path.to_string()))?;
        let bound = pair[1]
            .as_f64()
            .ok_or_else(|| PatternError::MalformedPredicate(path.to_string()))?;
        ops.push((op, bound));
    }
    Ok(Predicate::Numeric(ops))
}

fn match_fields(fields: &BTreeMap<String, Node>, value: &Value) -> bool {
    fields.iter().all(|(name, node)| {
        let field = value.as_object().and_then(|map| map.get(name));
        match_node(node, field)
    })
}

fn match_node(node: &Node, value: Option<&Value>) -> bool {
    match node {
        Node::AnyOf(predicates) => match value {
            // Absence matches only an explicit {"exists": false}
            None => predicates
                .iter()
                .any(|p| matches!(p, Predicate::Exists(false))),
            Some(Value::Array(items)) => predicates.iter().any(|p| match p {
                Predicate::Exists(wanted) => *wanted,
                _ => items.iter().any(|item| p.matches(item)),
            }),
            Some(single) => predicates.iter().any(|p| p.matches(single)),
        },
        Node::Object(fields) => match value {
            Some(object @ Value::Object(_)) => match_fields(fields, object),
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| item.is_object() && match_fields(fields, item)),
            _ => false,
        },
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
