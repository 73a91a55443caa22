// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML document parser.
//!
//! This module provides the `YamlParser`, which decodes YAML documents into a
//! nested `Mapping` and encodes mappings back into YAML.

use crate::domain::{ConfigError, Mapping, Result, Value};
use crate::ports::ConfigParser;

/// Parser for YAML configuration documents.
///
/// An empty document parses to an empty mapping. Non-string mapping keys
/// (numbers, booleans) are stringified; YAML tags are ignored and the tagged
/// value is kept.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::YamlParser;
/// use layercfg::domain::Value;
/// use layercfg::ports::ConfigParser;
///
/// let parser = YamlParser::new();
/// let parsed = parser.parse("database:\n  host: localhost\n  port: 5432\n").unwrap();
/// let database = parsed.get("DATABASE").and_then(Value::as_mapping).unwrap();
/// assert_eq!(database.get("port"), Some(&Value::from(5432)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct YamlParser;

impl YamlParser {
    /// Creates a new YAML parser.
    pub fn new() -> Self {
        YamlParser
    }

    fn convert(value: serde_yaml::Value) -> Value {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::convert).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Mapping(Self::convert_mapping(map)),
            serde_yaml::Value::Tagged(tagged) => Self::convert(tagged.value),
        }
    }

    fn convert_mapping(map: serde_yaml::Mapping) -> Mapping {
        let mut result = Mapping::new();
        for (key, value) in map {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                other => {
                    tracing::debug!(key = ?other, "skipping YAML entry with a non-scalar key");
                    continue;
                }
            };
            result.insert(key, Self::convert(value));
        }
        result
    }
}

impl ConfigParser for YamlParser {
    fn format_id(&self) -> &str {
        "yaml"
    }

    fn parse(&self, content: &str) -> Result<Mapping> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::decode("yaml", "<content>", e))?;

        match value {
            serde_yaml::Value::Null => Ok(Mapping::new()),
            serde_yaml::Value::Mapping(map) => Ok(Self::convert_mapping(map)),
            other => Err(ConfigError::Decode {
                format: "yaml".to_string(),
                origin: "<content>".to_string(),
                message: format!(
                    "top-level value must be a mapping, found {}",
                    Self::convert(other).type_name()
                ),
                source: None,
            }),
        }
    }

    fn dump(&self, data: &Mapping) -> Result<String> {
        serde_yaml::to_string(data).map_err(|e| ConfigError::decode("yaml", "<dump>", e))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}
