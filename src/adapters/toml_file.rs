// SPDX-License-Identifier: MIT OR Apache-2.0

//! TOML document parser.

use crate::domain::{ConfigError, Mapping, Result, Value};
use crate::ports::ConfigParser;

/// Parser for TOML configuration documents.
///
/// Datetimes are kept as their string form. TOML has no null, so null values
/// are left out when dumping.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::TomlParser;
/// use layercfg::domain::Value;
/// use layercfg::ports::ConfigParser;
///
/// let parsed = TomlParser::new().parse("[server]\nport = 8080\n").unwrap();
/// let server = parsed.get("server").and_then(Value::as_mapping).unwrap();
/// assert_eq!(server.get("PORT"), Some(&Value::from(8080)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlParser;

impl TomlParser {
    /// Creates a new TOML parser.
    pub fn new() -> Self {
        TomlParser
    }

    fn convert(value: toml::Value) -> Value {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Self::convert).collect())
            }
            toml::Value::Table(table) => Value::Mapping(Self::convert_table(table)),
        }
    }

    fn convert_table(table: toml::Table) -> Mapping {
        table
            .into_iter()
            .map(|(key, value)| (key, Self::convert(value)))
            .collect()
    }
}

fn without_nulls(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Sequence(items) => Some(Value::Sequence(
            items.iter().filter_map(without_nulls).collect(),
        )),
        Value::Mapping(map) => Some(Value::Mapping(
            map.iter()
                .filter_map(|(k, v)| without_nulls(v).map(|v| (k, v)))
                .collect(),
        )),
        other => Some(other.clone()),
    }
}

impl ConfigParser for TomlParser {
    fn format_id(&self) -> &str {
        "toml"
    }

    fn parse(&self, content: &str) -> Result<Mapping> {
        let table: toml::Table = content
            .parse()
            .map_err(|e| ConfigError::decode("toml", "<content>", e))?;
        Ok(Self::convert_table(table))
    }

    fn dump(&self, data: &Mapping) -> Result<String> {
        let cleaned = without_nulls(&Value::Mapping(data.clone())).unwrap_or_default();
        toml::to_string(&cleaned).map_err(|e| ConfigError::decode("toml", "<dump>", e))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["toml"]
    }
}
