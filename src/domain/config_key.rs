// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration key newtype for case-insensitive dotted paths.
//!
//! This module provides the `ConfigKey` type, a newtype around the canonical form
//! of a dotted path. Every segment is stored upper-cased, so two keys that differ
//! only in casing compare, hash and display identically.

use std::fmt;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Returns the canonical storage form of a single key segment.
///
/// # Examples
///
/// ```
/// use layercfg::domain::config_key::canonical_segment;
///
/// assert_eq!(canonical_segment(" Host "), "HOST");
/// ```
pub fn canonical_segment(segment: &str) -> String {
    segment.trim().to_uppercase()
}

/// A case-insensitive, dotted configuration path.
///
/// Empty segments are dropped, so `"db..host"` and `"db.host"` name the same key.
///
/// # Examples
///
/// ```
/// use layercfg::domain::config_key::ConfigKey;
///
/// let key = ConfigKey::from("database.host");
/// assert_eq!(key.as_str(), "DATABASE.HOST");
/// assert_eq!(key, ConfigKey::from("Database.HOST"));
/// assert_eq!(key.segments().collect::<Vec<_>>(), vec!["DATABASE", "HOST"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Creates a new `ConfigKey`, normalizing it to canonical form.
    pub fn new(key: impl AsRef<str>) -> Self {
        let canonical = key
            .as_ref()
            .split(PATH_SEPARATOR)
            .map(canonical_segment)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(".");
        ConfigKey(canonical)
    }

    /// Returns the canonical key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the `ConfigKey` into its canonical `String`.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns `true` when the key has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the canonical path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Returns the first segment, which addresses a root-level key.
    pub fn root(&self) -> Option<&str> {
        self.segments().next()
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns the key with one more segment appended.
    pub fn child(&self, segment: &str) -> Self {
        if self.is_empty() {
            ConfigKey::new(segment)
        } else {
            ConfigKey::new(format!("{}.{}", self.0, segment))
        }
    }

    /// Returns every ancestor path including the key itself, shortest first.
    ///
    /// ```
    /// use layercfg::domain::config_key::ConfigKey;
    ///
    /// let prefixes: Vec<_> = ConfigKey::from("a.b.c")
    ///     .prefixes()
    ///     .map(|k| k.into_string())
    ///     .collect();
    /// assert_eq!(prefixes, vec!["A", "A.B", "A.B.C"]);
    /// ```
    pub fn prefixes(&self) -> impl Iterator<Item = ConfigKey> + '_ {
        let segments: Vec<&str> = self.segments().collect();
        (1..=segments.len()).map(move |n| ConfigKey(segments[..n].join(".")))
    }
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        ConfigKey::new(s)
    }
}

impl From<&str> for ConfigKey {
    fn from(s: &str) -> Self {
        ConfigKey::new(s)
    }
}

impl From<&ConfigKey> for ConfigKey {
    fn from(key: &ConfigKey) -> Self {
        key.clone()
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_key_new_is_canonical() {
        let key = ConfigKey::new("database.host");
        assert_eq!(key.as_str(), "DATABASE.HOST");
    }

    #[test]
    fn test_config_key_case_insensitive_equality() {
        assert_eq!(ConfigKey::from("foo"), ConfigKey::from("FOO"));
        assert_eq!(ConfigKey::from("Foo.Bar"), ConfigKey::from("fOO.bAR"));
        assert_ne!(ConfigKey::from("foo"), ConfigKey::from("foo.bar"));
    }

    #[test]
    fn test_config_key_hash_case_insensitive() {
        let mut map = HashMap::new();
        map.insert(ConfigKey::from("db.host"), "value1");
        assert_eq!(map.get(&ConfigKey::from("DB.HOST")), Some(&"value1"));
        assert_eq!(map.get(&ConfigKey::from("db.port")), None);
    }

    #[test]
    fn test_config_key_drops_empty_segments() {
        assert_eq!(ConfigKey::from("a..b.").as_str(), "A.B");
        assert!(ConfigKey::from("").is_empty());
        assert!(ConfigKey::from("...").is_empty());
    }

    #[test]
    fn test_config_key_segments_and_root() {
        let key = ConfigKey::from("a.b.c");
        assert_eq!(key.root(), Some("A"));
        assert_eq!(key.depth(), 3);
        assert_eq!(ConfigKey::from("").root(), None);
    }

    #[test]
    fn test_config_key_child() {
        assert_eq!(ConfigKey::from("db").child("host").as_str(), "DB.HOST");
        assert_eq!(ConfigKey::from("").child("host").as_str(), "HOST");
    }

    #[test]
    fn test_config_key_display() {
        let key = ConfigKey::from("test.key");
        assert_eq!(format!("{}", key), "TEST.KEY");
    }

    #[test]
    fn test_string_from_config_key() {
        let s: String = ConfigKey::from("test.key").into();
        assert_eq!(s, "TEST.KEY");
    }
}
