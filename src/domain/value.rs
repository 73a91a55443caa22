// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration value types.
//!
//! This module provides `Value`, the node type stored in a `DataTree`, and
//! `Mapping`, a map whose keys are always held in canonical upper case.

use crate::domain::config_key::canonical_segment;
use crate::domain::directive::MergeDirective;
use crate::domain::lazy::LazyValue;
use serde::ser::{Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// A configuration value.
///
/// Leaves are scalars or lazy values; `Sequence` and `Mapping` are the two
/// container duals. `Directive` only ever appears in incoming data: the merge
/// engine consumes it and never stores it.
///
/// # Examples
///
/// ```
/// use layercfg::domain::Value;
///
/// let value = Value::from(42);
/// assert_eq!(value.as_i64(), Some(42));
/// assert_eq!(value.to_string(), "42");
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// An explicit null.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    Sequence(Vec<Value>),
    /// A case-insensitive mapping.
    Mapping(Mapping),
    /// A value computed at read time.
    Lazy(LazyValue),
    /// A value tagged with a merge directive.
    Directive(MergeDirective, Box<Value>),
}

impl Value {
    /// Returns a short name for the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Lazy(_) => "lazy",
            Value::Directive(_, _) => "directive",
        }
    }

    /// Returns `true` for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for `Value::Lazy`.
    pub fn is_lazy(&self) -> bool {
        matches!(self, Value::Lazy(_))
    }

    /// Returns the string slice of a `Value::String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean of a `Value::Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer of a `Value::Integer`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns a float for `Value::Float` and `Value::Integer`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the items of a `Value::Sequence`.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping of a `Value::Mapping`.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the mutable mapping of a `Value::Mapping`.
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the lazy value of a `Value::Lazy`.
    pub fn as_lazy(&self) -> Option<&LazyValue> {
        match self {
            Value::Lazy(lazy) => Some(lazy),
            _ => None,
        }
    }

    /// Returns `true` if this value or anything nested in it is lazy.
    pub fn contains_lazy(&self) -> bool {
        match self {
            Value::Lazy(_) => true,
            Value::Sequence(items) => items.iter().any(Value::contains_lazy),
            Value::Mapping(map) => map.values().any(Value::contains_lazy),
            Value::Directive(_, inner) => inner.contains_lazy(),
            _ => false,
        }
    }

    /// Converts the value into a `serde_json::Value`.
    ///
    /// Lazy values become their marker string; non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Lazy(lazy) => serde_json::Value::String(lazy.to_string()),
            Value::Directive(_, inner) => inner.to_json(),
        }
    }

    /// Builds a value from a `serde_json::Value`, canonicalizing mapping keys.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    /// Formats the value the way interpolation embeds it in a string.
    ///
    /// Scalars render as plain text, containers as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Lazy(lazy) => write!(f, "{}", lazy),
            Value::Directive(_, inner) => write!(f, "{}", inner),
            Value::Sequence(_) | Value::Mapping(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Mapping(map) => map.serialize(serializer),
            Value::Lazy(lazy) => serializer.serialize_str(&lazy.to_string()),
            Value::Directive(_, inner) => inner.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<LazyValue> for Value {
    fn from(lazy: LazyValue) -> Self {
        Value::Lazy(lazy)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A mapping whose keys are stored in canonical upper case.
///
/// Every key-taking method canonicalizes its argument, so lookups are
/// case-insensitive. Keys are single segments: dots are not interpreted here.
///
/// # Examples
///
/// ```
/// use layercfg::domain::{Mapping, Value};
///
/// let mut map = Mapping::new();
/// map.insert("host", Value::from("localhost"));
/// assert_eq!(map.get("HOST"), Some(&Value::from("localhost")));
/// assert_eq!(map.keys().collect::<Vec<_>>(), vec!["HOST"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping(BTreeMap<String, Value>);

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Mapping(BTreeMap::new())
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value for `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(&canonical_segment(key))
    }

    /// Returns the mutable value for `key`, compared case-insensitively.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(&canonical_segment(key))
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&canonical_segment(key))
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl AsRef<str>, value: Value) -> Option<Value> {
        self.0.insert(canonical_segment(key.as_ref()), value)
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(&canonical_segment(key))
    }

    /// Returns the entry for `key` for in-place manipulation.
    pub fn entry(&mut self, key: &str) -> btree_map::Entry<'_, String, Value> {
        self.0.entry(canonical_segment(key))
    }

    /// Iterates over canonical keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over values in key order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates mutably over entries in key order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Keeps only the entries for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&str, &mut Value) -> bool) {
        self.0.retain(|k, v| f(k, v));
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lazy::LazyKind;

    #[test]
    fn test_mapping_keys_are_canonical() {
        let mut map = Mapping::new();
        map.insert("Host", Value::from("a"));
        map.insert("HOST", Value::from("b"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("host"), Some(&Value::from("b")));
        assert!(map.contains_key("hOsT"));
    }

    #[test]
    fn test_mapping_remove_case_insensitive() {
        let mut map: Mapping = vec![("port", Value::from(1))].into_iter().collect();
        assert_eq!(map.remove("PORT"), Some(Value::from(1)));
        assert!(map.is_empty());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(3).as_f64(), Some(3.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from("x").as_i64(), None);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(
            Value::Sequence(vec![Value::from(1), Value::from("a")]).to_string(),
            r#"[1,"a"]"#
        );
    }

    #[test]
    fn test_value_json_conversion_canonicalizes_keys() {
        let json = serde_json::json!({"db": {"host": "localhost", "ports": [1, 2]}});
        let value = Value::from_json(json);
        let db = value.as_mapping().unwrap().get("DB").unwrap();
        assert_eq!(
            db.as_mapping().unwrap().get("HOST"),
            Some(&Value::from("localhost"))
        );
        assert_eq!(
            value.to_json(),
            serde_json::json!({"DB": {"HOST": "localhost", "PORTS": [1, 2]}})
        );
    }

    #[test]
    fn test_contains_lazy() {
        let lazy = LazyValue::new(LazyKind::Format, "{this.A}");
        let nested = Value::Sequence(vec![Value::from(1), Value::Lazy(lazy)]);
        assert!(nested.contains_lazy());
        assert!(!Value::from("plain").contains_lazy());
    }

    #[test]
    fn test_lazy_value_serializes_as_marker() {
        let lazy = LazyValue::new(LazyKind::Format, "{this.A}");
        let json = serde_json::to_string(&Value::Lazy(lazy)).unwrap();
        assert_eq!(json, r#""@format {this.A}""#);
    }
}
