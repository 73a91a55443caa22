// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marker-tagged value conversion.
//!
//! A string beginning with a registered marker such as `@int` or `@format` is
//! converted before it is stored. Markers chain from right to left:
//! `@int @format {this.PORT}` becomes a lazy value whose rendered result is
//! cast to an integer.

use crate::domain::directive::MergeDirective;
use crate::domain::errors::{ConfigError, Result};
use crate::domain::lazy::{LazyKind, LazyValue};
use crate::domain::value::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A conversion applied to an already-parsed value.
pub type CastFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// What a marker does to the text that follows it.
#[derive(Clone)]
pub enum Converter {
    /// Converts the value immediately, or after evaluation when it wraps a
    /// lazy value.
    Cast(CastFn),
    /// Defers the remaining text as a lazy expression.
    Lazy(LazyKind),
    /// Tags the value with a merge directive.
    Directive(MergeDirective),
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converter::Cast(_) => write!(f, "Cast"),
            Converter::Lazy(kind) => write!(f, "Lazy({:?})", kind),
            Converter::Directive(directive) => write!(f, "Directive({:?})", directive),
        }
    }
}

/// Maps marker names to converters.
///
/// # Examples
///
/// ```
/// use layercfg::domain::{ConverterRegistry, MergeDirective, Value};
///
/// let registry = ConverterRegistry::new();
/// assert_eq!(registry.parse("@int 42"), Value::from(42));
/// assert_eq!(registry.parse("@unknown 42"), Value::from("@unknown 42"));
/// assert!(matches!(
///     registry.parse("@merge [1, 2]"),
///     Value::Directive(MergeDirective::MergeAppend, _)
/// ));
/// ```
#[derive(Clone, Debug)]
pub struct ConverterRegistry {
    converters: BTreeMap<String, Converter>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// Creates a registry holding the built-in markers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_cast("int", cast_int);
        registry.register_cast("float", cast_float);
        registry.register_cast("bool", cast_bool);
        registry.register_cast("json", cast_json);
        registry.register_cast("str", |value| Ok(Value::String(value.to_string())));
        registry.register_cast("none", |_| Ok(Value::Null));
        registry.register("format", Converter::Lazy(LazyKind::Format));
        registry.register("jinja", Converter::Lazy(LazyKind::Template));
        registry.register("get", Converter::Lazy(LazyKind::Reference));
        registry.register("merge", Converter::Directive(MergeDirective::MergeAppend));
        registry.register(
            "merge_unique",
            Converter::Directive(MergeDirective::MergeUniqueAppend),
        );
        registry.register("reset", Converter::Directive(MergeDirective::Reset));
        registry.register("replace", Converter::Directive(MergeDirective::Replace));
        registry.register("del", Converter::Directive(MergeDirective::Delete));
        registry
    }

    /// Creates a registry with no markers.
    pub fn empty() -> Self {
        Self {
            converters: BTreeMap::new(),
        }
    }

    /// Registers `converter` under `marker`, replacing any previous one.
    ///
    /// The marker is given without its `@` and matched case-insensitively.
    pub fn register(&mut self, marker: impl AsRef<str>, converter: Converter) {
        self.converters.insert(normalize_marker(marker.as_ref()), converter);
    }

    /// Registers a cast function under `marker`.
    pub fn register_cast<F>(&mut self, marker: impl AsRef<str>, cast: F)
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(marker, Converter::Cast(Arc::new(cast)));
    }

    /// Returns `true` if `marker` is registered.
    pub fn contains(&self, marker: &str) -> bool {
        self.converters.contains_key(&normalize_marker(marker))
    }

    /// Returns the registered marker names in order.
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }

    /// Converts a raw string.
    ///
    /// Strings without a registered leading marker are returned unchanged. A
    /// cast that fails leaves the original string in place and logs the failure;
    /// use `try_parse` to observe the error.
    pub fn parse(&self, raw: &str) -> Value {
        match self.try_parse(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(value = raw, error = %err, "converter failed, keeping raw string");
                Value::String(raw.to_string())
            }
        }
    }

    /// Converts a raw string, reporting cast failures.
    pub fn try_parse(&self, raw: &str) -> Result<Value> {
        let Some((marker, rest)) = split_marker(raw) else {
            return Ok(Value::String(raw.to_string()));
        };
        let Some(converter) = self.converters.get(&marker) else {
            return Ok(Value::String(raw.to_string()));
        };
        match converter {
            Converter::Lazy(kind) => Ok(Value::Lazy(LazyValue::new(*kind, rest))),
            Converter::Directive(directive) => {
                let inner = match self.try_parse(rest)? {
                    Value::String(text) => directive_argument(&text),
                    other => other,
                };
                Ok(Value::Directive(*directive, Box::new(inner)))
            }
            Converter::Cast(cast) => match self.try_parse(rest)? {
                Value::Lazy(lazy) => Ok(Value::Lazy(lazy.with_cast(marker))),
                Value::Directive(directive, inner) => {
                    let converted = self.apply(&marker, cast, *inner)?;
                    Ok(Value::Directive(directive, Box::new(converted)))
                }
                other => self.apply(&marker, cast, other),
            },
        }
    }

    /// Converts every string leaf of `value`.
    pub fn parse_value(&self, value: Value) -> Value {
        match value {
            Value::String(raw) => self.parse(&raw),
            Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(|v| self.parse_value(v)).collect())
            }
            Value::Mapping(map) => Value::Mapping(self.parse_mapping(map)),
            Value::Directive(directive, inner) => {
                Value::Directive(directive, Box::new(self.parse_value(*inner)))
            }
            other => other,
        }
    }

    /// Converts every string leaf of `map`.
    pub fn parse_mapping(&self, map: Mapping) -> Mapping {
        map.into_iter()
            .map(|(key, value)| (key, self.parse_value(value)))
            .collect()
    }

    /// Applies the cast registered under `marker` to an evaluated value.
    pub fn cast(&self, marker: &str, value: Value) -> Result<Value> {
        let marker = normalize_marker(marker);
        match self.converters.get(&marker) {
            Some(Converter::Cast(cast)) => self.apply(&marker, cast, value),
            Some(_) => Err(ConfigError::conversion(
                marker,
                value.to_string(),
                "marker is not a cast",
            )),
            None => Err(ConfigError::conversion(
                marker,
                value.to_string(),
                "no such converter",
            )),
        }
    }

    fn apply(&self, marker: &str, cast: &CastFn, value: Value) -> Result<Value> {
        let shown = value.to_string();
        cast(value).map_err(|err| match err {
            ConfigError::Conversion { message, .. } => {
                ConfigError::conversion(marker, shown, message)
            }
            other => other,
        })
    }
}

fn normalize_marker(marker: &str) -> String {
    marker.trim().trim_start_matches('@').to_lowercase()
}

/// Splits `@marker rest` into the normalized marker and the remaining text.
fn split_marker(raw: &str) -> Option<(String, &str)> {
    let trimmed = raw.trim_start();
    if !trimmed.starts_with('@') {
        return None;
    }
    let (marker, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((marker, rest)) => (marker, rest.trim()),
        None => (trimmed, ""),
    };
    Some((normalize_marker(marker), rest))
}

fn directive_argument(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    match infer_literal(text) {
        Value::String(s) if s.contains(',') => Value::Sequence(
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(infer_literal)
                .collect(),
        ),
        other => other,
    }
}

/// Infers a typed value from unmarked text.
///
/// Recognizes booleans, integers, floats, JSON arrays and objects and quoted
/// strings; anything else stays a string.
///
/// ```
/// use layercfg::domain::converters::infer_literal;
/// use layercfg::domain::Value;
///
/// assert_eq!(infer_literal("8080"), Value::from(8080));
/// assert_eq!(infer_literal("True"), Value::from(true));
/// assert_eq!(infer_literal("'8080'"), Value::from("8080"));
/// assert_eq!(infer_literal("hello"), Value::from("hello"));
/// ```
pub fn infer_literal(text: &str) -> Value {
    let trimmed = text.trim();
    match trimmed.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Integer(i);
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
    }
    if (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'))
    {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            return Value::from_json(json);
        }
    }
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return Value::String(trimmed[1..trimmed.len() - 1].to_string());
        }
    }
    Value::String(text.to_string())
}

fn cast_int(value: Value) -> Result<Value> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(i)),
        Value::Float(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Value::Integer(f as i64))
        }
        Value::Float(f) => Err(ConfigError::conversion(
            "int",
            f.to_string(),
            "float is not finite or out of integer range",
        )),
        Value::Bool(b) => Ok(Value::Integer(i64::from(b))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| ConfigError::conversion("int", s.clone(), e.to_string())),
        other => Err(ConfigError::conversion(
            "int",
            other.to_string(),
            format!("cannot convert {} to int", other.type_name()),
        )),
    }
}

fn cast_float(value: Value) -> Result<Value> {
    match value {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Integer(i) => Ok(Value::Float(i as f64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ConfigError::conversion("float", s.clone(), e.to_string())),
        other => Err(ConfigError::conversion(
            "float",
            other.to_string(),
            format!("cannot convert {} to float", other.type_name()),
        )),
    }
}

fn cast_bool(value: Value) -> Result<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Integer(i) => Ok(Value::Bool(i != 0)),
        Value::Null => Ok(Value::Bool(false)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err(ConfigError::conversion("bool", s.clone(), "not a boolean")),
        },
        other => Err(ConfigError::conversion(
            "bool",
            other.to_string(),
            format!("cannot convert {} to bool", other.type_name()),
        )),
    }
}

fn cast_json(value: Value) -> Result<Value> {
    match value {
        Value::String(s) => serde_json::from_str::<serde_json::Value>(&s)
            .map(Value::from_json)
            .map_err(|e| ConfigError::conversion("json", s.clone(), e.to_string())),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_casts() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.parse("@int 42"), Value::from(42));
        assert_eq!(registry.parse("@float 1.5"), Value::from(1.5));
        assert_eq!(registry.parse("@bool off"), Value::from(false));
        assert_eq!(registry.parse("@str 42"), Value::from("42"));
        assert_eq!(registry.parse("@none"), Value::Null);
        assert_eq!(
            registry.parse(r#"@json {"a": [1, 2]}"#),
            Value::Mapping(
                vec![("a", Value::Sequence(vec![Value::from(1), Value::from(2)]))]
                    .into_iter()
                    .collect()
            )
        );
    }

    #[test]
    fn test_int_cast_rejects_non_finite_floats() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.cast("@int", Value::Float(2.9)).unwrap(), Value::from(2));
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e300] {
            assert!(matches!(
                registry.cast("@int", Value::Float(f)),
                Err(ConfigError::Conversion { .. })
            ));
        }
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.parse("@INT 7"), Value::from(7));
        assert!(registry.contains("@Format"));
    }

    #[test]
    fn test_unmarked_and_unknown_strings_untouched() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.parse("plain"), Value::from("plain"));
        assert_eq!(registry.parse("user@host"), Value::from("user@host"));
        assert_eq!(registry.parse("@handle rest"), Value::from("@handle rest"));
    }

    #[test]
    fn test_failed_cast_keeps_raw_string() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.parse("@int abc"), Value::from("@int abc"));
        let err = registry.try_parse("@int abc").unwrap_err();
        assert!(matches!(err, ConfigError::Conversion { ref marker, .. } if marker == "int"));
    }

    #[test]
    fn test_lazy_markers() {
        let registry = ConverterRegistry::new();
        match registry.parse("@format {this.A}-x") {
            Value::Lazy(lazy) => {
                assert_eq!(lazy.kind(), LazyKind::Format);
                assert_eq!(lazy.expression(), "{this.A}-x");
            }
            other => panic!("expected lazy value, got {:?}", other),
        }
    }

    #[test]
    fn test_cast_over_lazy_chains() {
        let registry = ConverterRegistry::new();
        match registry.parse("@int @format {this.PORT}") {
            Value::Lazy(lazy) => assert_eq!(lazy.casts(), &["int".to_string()]),
            other => panic!("expected lazy value, got {:?}", other),
        }
    }

    #[test]
    fn test_directive_markers() {
        let registry = ConverterRegistry::new();
        assert_eq!(
            registry.parse("@merge a, b,3"),
            Value::Directive(
                MergeDirective::MergeAppend,
                Box::new(Value::Sequence(vec![
                    Value::from("a"),
                    Value::from("b"),
                    Value::from(3)
                ]))
            )
        );
        assert_eq!(
            registry.parse("@del"),
            Value::Directive(MergeDirective::Delete, Box::new(Value::Null))
        );
        assert_eq!(
            registry.parse("@merge_unique [1]"),
            Value::Directive(
                MergeDirective::MergeUniqueAppend,
                Box::new(Value::Sequence(vec![Value::from(1)]))
            )
        );
    }

    #[test]
    fn test_custom_cast() {
        let mut registry = ConverterRegistry::new();
        registry.register_cast("upper", |value| Ok(Value::String(value.to_string().to_uppercase())));
        assert_eq!(registry.parse("@upper abc"), Value::from("ABC"));
        assert_eq!(registry.cast("upper", Value::from("x")).unwrap(), Value::from("X"));
        assert!(registry.cast("format", Value::from("x")).is_err());
    }

    #[test]
    fn test_parse_value_recurses() {
        let registry = ConverterRegistry::new();
        let value = Value::Mapping(
            vec![(
                "outer",
                Value::Sequence(vec![Value::from("@int 1"), Value::from("two")]),
            )]
            .into_iter()
            .collect(),
        );
        let parsed = registry.parse_value(value);
        let items = parsed
            .as_mapping()
            .and_then(|m| m.get("outer"))
            .and_then(Value::as_sequence)
            .unwrap();
        assert_eq!(items, &[Value::from(1), Value::from("two")]);
    }

    #[test]
    fn test_infer_literal() {
        assert_eq!(infer_literal("-3"), Value::from(-3));
        assert_eq!(infer_literal("2.5"), Value::from(2.5));
        assert_eq!(infer_literal("false"), Value::from(false));
        assert_eq!(infer_literal("inf"), Value::from("inf"));
        assert_eq!(
            infer_literal("[1, \"a\"]"),
            Value::Sequence(vec![Value::from(1), Value::from("a")])
        );
        assert_eq!(infer_literal("\"quoted\""), Value::from("quoted"));
        assert_eq!(infer_literal("[not json"), Value::from("[not json"));
    }
}
