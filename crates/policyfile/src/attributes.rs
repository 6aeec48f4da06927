//! Attribute tree.
//!
//! `default['a']['b'] = value` assignments build an explicit tree of
//! [`AttributeValue`] nodes keyed by path segments. Lookups never panic; a
//! miss is reported as `None` or [`Error::UnknownAttributePath`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A node in the attribute tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// `nil`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String or symbol literal.
    String(String),
    /// Array literal.
    List(Vec<AttributeValue>),
    /// Hash literal or an intermediate path node.
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the child map, if this is a map node.
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns true for non-map values.
    pub const fn is_leaf(&self) -> bool {
        !matches!(self, Self::Map(_))
    }

    /// Name of the variant, for error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "nil",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&AttributeValue> for serde_json::Value {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Null => Self::Null,
            AttributeValue::Bool(b) => Self::Bool(*b),
            AttributeValue::Integer(n) => Self::from(*n),
            AttributeValue::Float(f) => Self::from(*f),
            AttributeValue::String(s) => Self::String(s.clone()),
            AttributeValue::List(items) => Self::Array(items.iter().map(Self::from).collect()),
            AttributeValue::Map(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// A segmented key path into the attribute tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    segments: Vec<String>,
}

impl AttributePath {
    /// Builds a path from explicit segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a path by splitting a dotted string (`"mcs.org.name"`).
    pub fn dotted(path: &str) -> Self {
        Self::from_segments(path.split('.'))
    }

    /// Path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self {
        Self::dotted(path)
    }
}

impl From<&[&str]> for AttributePath {
    fn from(segments: &[&str]) -> Self {
        Self::from_segments(segments.iter().copied())
    }
}

impl From<Vec<String>> for AttributePath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

/// Root of an attribute tree (`default` or `override`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTree {
    root: BTreeMap<String, AttributeValue>,
}

impl AttributeTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no attribute has been assigned.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Top-level entries.
    pub const fn root(&self) -> &BTreeMap<String, AttributeValue> {
        &self.root
    }

    /// Assigns `value` at `path`, creating intermediate map nodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] if the path is empty, if the exact
    /// path was already assigned, or if an intermediate segment holds a
    /// non-map value.
    pub fn insert(&mut self, path: &AttributePath, value: AttributeValue) -> Result<()> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(Error::malformed_document("empty attribute path"));
        };

        let mut node = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let child = node
                .entry(segment.clone())
                .or_insert_with(|| AttributeValue::Map(BTreeMap::new()));
            node = match child {
                AttributeValue::Map(map) => map,
                other => {
                    let prefix = AttributePath::from_segments(path.segments()[..=depth].iter().cloned());
                    return Err(Error::malformed_document(format!(
                        "cannot assign '{path}': '{prefix}' already holds a {} value",
                        other.kind()
                    )));
                }
            };
        }

        if node.contains_key(last) {
            return Err(Error::malformed_document(format!(
                "attribute '{path}' is assigned more than once"
            )));
        }
        node.insert(last.clone(), value);
        Ok(())
    }

    /// Looks up the value at `path`.
    pub fn get(&self, path: &AttributePath) -> Option<&AttributeValue> {
        let (first, rest) = path.segments().split_first()?;
        let mut value = self.root.get(first)?;
        for segment in rest {
            value = value.as_map()?.get(segment)?;
        }
        Some(value)
    }

    /// Looks up the value at `path`, reporting a miss as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAttributePath`] if nothing is stored at `path`.
    pub fn lookup(&self, path: &AttributePath) -> Result<&AttributeValue> {
        self.get(path).ok_or_else(|| Error::UnknownAttributePath {
            path: path.to_string(),
        })
    }

    /// Flattens the tree into `(dotted path, leaf)` pairs in key order.
    ///
    /// Lists and empty maps count as leaves.
    pub fn flatten(&self) -> Vec<(String, &AttributeValue)> {
        let mut out = Vec::new();
        for (key, value) in &self.root {
            flatten_into(key.clone(), value, &mut out);
        }
        out
    }

    /// Flattens into segment paths rather than dotted strings.
    pub fn leaves(&self) -> Vec<(AttributePath, &AttributeValue)> {
        let mut out = Vec::new();
        for (key, value) in &self.root {
            leaves_into(vec![key.clone()], value, &mut out);
        }
        out
    }

    /// Checks that no two leaves flatten to the same dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] naming the colliding key.
    pub fn check_unique_paths(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (key, _) in self.flatten() {
            if !seen.insert(key.clone()) {
                return Err(Error::malformed_document(format!(
                    "attribute paths collide after flattening: '{key}'"
                )));
            }
        }
        Ok(())
    }
}

fn flatten_into<'a>(prefix: String, value: &'a AttributeValue, out: &mut Vec<(String, &'a AttributeValue)>) {
    match value {
        AttributeValue::Map(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(format!("{prefix}.{key}"), child, out);
            }
        }
        leaf => out.push((prefix, leaf)),
    }
}

fn leaves_into<'a>(
    prefix: Vec<String>,
    value: &'a AttributeValue,
    out: &mut Vec<(AttributePath, &'a AttributeValue)>,
) {
    match value {
        AttributeValue::Map(map) if !map.is_empty() => {
            for (key, child) in map {
                let mut path = prefix.clone();
                path.push(key.clone());
                leaves_into(path, child, out);
            }
        }
        leaf => out.push((AttributePath::from(prefix), leaf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> AttributeTree {
        let mut tree = AttributeTree::new();
        tree.insert(&"chef-server.accept_license".into(), true.into())
            .unwrap();
        tree.insert(&"mcs.org.name".into(), "example".into()).unwrap();
        tree.insert(&"mcs.org.full_name".into(), "Example Org".into())
            .unwrap();
        tree
    }

    #[test]
    fn lookup_by_dotted_path() {
        let tree = tree();
        assert_eq!(
            tree.get(&"chef-server.accept_license".into()),
            Some(&AttributeValue::Bool(true))
        );
        assert_eq!(
            tree.get(&"mcs.org.name".into()).and_then(AttributeValue::as_str),
            Some("example")
        );
        assert!(tree.get(&"mcs.org".into()).unwrap().as_map().is_some());
    }

    #[test]
    fn lookup_miss_is_not_found() {
        let tree = tree();
        assert!(tree.get(&"mcs.org.missing".into()).is_none());
        assert!(tree.get(&"mcs.org.name.deeper".into()).is_none());
        assert!(tree.get(&AttributePath::from_segments(Vec::<String>::new())).is_none());
        assert_eq!(
            tree.lookup(&"nope".into()).unwrap_err(),
            Error::UnknownAttributePath {
                path: "nope".to_string()
            }
        );
    }

    #[test]
    fn segments_may_contain_dots() {
        let mut tree = AttributeTree::new();
        let path = AttributePath::from_segments(["a.b", "c"]);
        tree.insert(&path, 1_i64.into()).unwrap();
        assert_eq!(tree.get(&path), Some(&AttributeValue::Integer(1)));
        assert!(tree.get(&"a.b.c".into()).is_none());
    }

    #[test]
    fn reassignment_is_rejected() {
        let mut tree = tree();
        let err = tree
            .insert(&"mcs.org.name".into(), "other".into())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn assigning_below_a_scalar_is_rejected() {
        let mut tree = tree();
        let err = tree
            .insert(&"mcs.org.name.first".into(), "x".into())
            .unwrap_err();
        assert!(err.to_string().contains("'mcs.org.name' already holds a string"));
    }

    #[test]
    fn flatten_lists_leaves_in_key_order() {
        let tree = tree();
        let keys: Vec<_> = tree.flatten().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "chef-server.accept_license",
                "mcs.org.full_name",
                "mcs.org.name"
            ]
        );
    }

    #[test]
    fn colliding_flattened_paths_are_detected() {
        let mut tree = AttributeTree::new();
        tree.insert(&AttributePath::from_segments(["a.b"]), 1_i64.into())
            .unwrap();
        tree.insert(&AttributePath::from_segments(["a", "b"]), 2_i64.into())
            .unwrap();
        assert!(tree.check_unique_paths().is_err());
        assert!(self::tree().check_unique_paths().is_ok());
    }

    #[test]
    fn converts_to_json() {
        let value = serde_json::Value::from(tree().get(&"mcs".into()).unwrap());
        assert_eq!(
            value,
            serde_json::json!({"org": {"full_name": "Example Org", "name": "example"}})
        );
    }
}
