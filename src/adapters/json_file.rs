// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON document parser.

use crate::domain::{ConfigError, Mapping, Result, Value};
use crate::ports::ConfigParser;

/// Parser for JSON configuration documents. The top level must be an object.
#[derive(Debug, Clone, Default)]
pub struct JsonParser;

impl JsonParser {
    /// Creates a new JSON parser.
    pub fn new() -> Self {
        JsonParser
    }
}

impl ConfigParser for JsonParser {
    fn format_id(&self) -> &str {
        "json"
    }

    fn parse(&self, content: &str) -> Result<Mapping> {
        if content.trim().is_empty() {
            return Ok(Mapping::new());
        }
        let json: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| ConfigError::decode("json", "<content>", e))?;
        match Value::from_json(json) {
            Value::Mapping(map) => Ok(map),
            other => Err(ConfigError::Decode {
                format: "json".to_string(),
                origin: "<content>".to_string(),
                message: format!("top-level value must be an object, found {}", other.type_name()),
                source: None,
            }),
        }
    }

    fn dump(&self, data: &Mapping) -> Result<String> {
        serde_json::to_string_pretty(data).map_err(|e| ConfigError::decode("json", "<dump>", e))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_parser_object() {
        let parser = JsonParser::new();
        let result = parser.parse(r#"{"db": {"port": 5432, "tags": ["x"]}}"#).unwrap();
        let db = result.get("DB").and_then(Value::as_mapping).unwrap();
        assert_eq!(db.get("port"), Some(&Value::from(5432)));
    }

    #[test]
    fn test_json_parser_rejects_array() {
        let parser = JsonParser::new();
        assert!(matches!(
            parser.parse("[1, 2]"),
            Err(ConfigError::Decode { .. })
        ));
    }

    #[test]
    fn test_json_dump_parses_back() {
        let parser = JsonParser::new();
        let original = parser.parse(r#"{"a": 1, "b": {"c": [true, null]}}"#).unwrap();
        let dumped = parser.dump(&original).unwrap();
        assert_eq!(parser.parse(&dumped).unwrap(), original);
    }
}
