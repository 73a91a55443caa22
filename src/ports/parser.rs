// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! This module defines the `ConfigParser` trait, which provides an interface for
//! decoding configuration documents in different formats (YAML, TOML, JSON, etc.)
//! into a nested `Mapping`, and for encoding a mapping back into text.

use crate::domain::{Mapping, Result};

/// A trait for parsing configuration documents.
///
/// Parsers keep the document's structure: nested tables become nested
/// mappings and arrays become sequences. Keys are canonicalized by `Mapping`
/// itself. Strings are returned exactly as written; converter markers are
/// interpreted later by the store.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{Mapping, Result, Value};
/// use layercfg::ports::ConfigParser;
///
/// struct LineParser;
///
/// impl ConfigParser for LineParser {
///     fn format_id(&self) -> &str {
///         "lines"
///     }
///
///     fn parse(&self, content: &str) -> Result<Mapping> {
///         Ok(content
///             .lines()
///             .filter_map(|line| line.split_once('='))
///             .map(|(k, v)| (k, Value::from(v.trim())))
///             .collect())
///     }
///
///     fn dump(&self, data: &Mapping) -> Result<String> {
///         Ok(data.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["lines"]
///     }
/// }
///
/// let parsed = LineParser.parse("host = localhost").unwrap();
/// assert_eq!(parsed.get("HOST"), Some(&Value::from("localhost")));
/// ```
pub trait ConfigParser: Send + Sync {
    /// Returns the format identifier recorded in contribution history.
    fn format_id(&self) -> &str;

    /// Decodes `content` into a mapping.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Decode` for malformed content, or when the
    /// document's top level is not a mapping.
    fn parse(&self, content: &str) -> Result<Mapping>;

    /// Encodes `data` as text in this format.
    ///
    /// Lazy values are written as their marker strings, so a dumped document
    /// parses back to the same settings.
    fn dump(&self, data: &Mapping) -> Result<String>;

    /// Returns the file extensions (without the leading dot) this parser reads.
    fn supported_extensions(&self) -> &[&str];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;

    struct FixedParser;

    impl ConfigParser for FixedParser {
        fn format_id(&self) -> &str {
            "fixed"
        }

        fn parse(&self, _content: &str) -> Result<Mapping> {
            let mut database = Mapping::new();
            database.insert("host", Value::from("localhost"));
            database.insert("port", Value::from(5432));
            let mut map = Mapping::new();
            map.insert("database", Value::Mapping(database));
            Ok(map)
        }

        fn dump(&self, data: &Mapping) -> Result<String> {
            Ok(format!("{} keys", data.len()))
        }

        fn supported_extensions(&self) -> &[&str] {
            &["fixed", "fx"]
        }
    }

    #[test]
    fn test_parser_keeps_nesting() {
        let result = FixedParser.parse("").unwrap();
        let database = result.get("database").and_then(Value::as_mapping).unwrap();
        assert_eq!(database.get("PORT"), Some(&Value::from(5432)));
    }

    #[test]
    fn test_parser_supported_extensions() {
        assert_eq!(FixedParser.supported_extensions(), &["fixed", "fx"]);
    }

    #[test]
    fn test_parser_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ConfigParser>();
    }
}
