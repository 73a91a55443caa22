// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable configuration source adapter.
//!
//! This module provides an adapter that reads settings from prefixed
//! environment variables. `APP_NAME` sets `NAME`; a double underscore nests, so
//! `APP_DATABASE__HOST` sets `DATABASE.HOST`.

use crate::domain::converters::infer_literal;
use crate::domain::{DataTree, MergeEngine, Result, Value};
use crate::ports::{ConfigSource, LayerData, LoadRequest};
use std::collections::{BTreeMap, HashMap};
use std::env;

/// Maximum length for environment variable keys (512 bytes).
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (1MB).
const MAX_ENV_VALUE_LEN: usize = 1048576;

/// Default variable prefix.
pub const DEFAULT_PREFIX: &str = "APP";

/// Separator for nested keys.
pub const NESTING_SEPARATOR: &str = "__";

/// Configuration source that reads from environment variables.
///
/// Unmarked values are typed by `infer_literal`: `APP_PORT=8080` is an integer
/// and `APP_HOSTS=["a","b"]` a sequence. Values beginning with a converter
/// marker are left as strings for the store's converters.
///
/// The variables are read on every load. All data goes to the request's
/// target layer, which is applied last.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::EnvVarSource;
/// use layercfg::domain::Value;
/// use layercfg::ports::{ConfigSource, LoadRequest};
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("APP_DATABASE__PORT".to_string(), "5432".to_string());
/// let source = EnvVarSource::with_values(vars);
///
/// let layers = vec!["main".to_string()];
/// let loaded = source.load(&LoadRequest::new(&layers, false)).unwrap();
/// let database = loaded[0].data.get("DATABASE").and_then(Value::as_mapping).unwrap();
/// assert_eq!(database.get("PORT"), Some(&Value::from(5432)));
/// ```
#[derive(Debug, Clone)]
pub struct EnvVarSource {
    prefix: String,
    origin: String,
    ignored: Vec<String>,
    values: Option<HashMap<String, String>>,
}

impl EnvVarSource {
    /// Creates a source for variables prefixed with `APP_`.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Creates a source for variables prefixed with `{prefix}_`.
    ///
    /// An empty prefix reads every variable.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim().trim_end_matches('_').to_uppercase();
        Self {
            origin: format!("env:{}", prefix),
            prefix,
            ignored: Vec::new(),
            values: None,
        }
    }

    /// Creates a source that reads from `values` instead of the process
    /// environment. Useful for testing.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        let mut source = Self::new();
        source.values = Some(values);
        source
    }

    /// Replaces the variables read by this source with `values`.
    pub fn values(mut self, values: HashMap<String, String>) -> Self {
        self.values = Some(values);
        self
    }

    /// Skips the variable `name`, such as the environment switcher.
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.push(name.into().to_uppercase());
        self
    }

    /// Returns the variable prefix, without the trailing underscore.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key_for(&self, name: &str) -> Option<String> {
        if self.ignored.iter().any(|ignored| ignored == &name.to_uppercase()) {
            return None;
        }
        let stripped = if self.prefix.is_empty() {
            name
        } else {
            let rest = name.strip_prefix(self.prefix.as_str())?;
            rest.strip_prefix('_')?
        };
        let key = stripped
            .split(NESTING_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(".");
        (!key.is_empty()).then_some(key)
    }

    fn collect(&self) -> BTreeMap<String, String> {
        let vars: Box<dyn Iterator<Item = (String, String)>> = match &self.values {
            Some(values) => Box::new(values.clone().into_iter()),
            None => Box::new(env::vars()),
        };

        let mut collected = BTreeMap::new();
        for (name, value) in vars {
            // Validate input sizes to prevent DoS
            if name.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::debug!(
                    "Skipping oversized environment variable: key_len={}, value_len={} (max key={}, max value={})",
                    name.len(),
                    value.len(),
                    MAX_ENV_KEY_LEN,
                    MAX_ENV_VALUE_LEN
                );
                continue;
            }
            if let Some(key) = self.key_for(&name) {
                collected.insert(key, value);
            }
        }
        collected
    }
}

impl Default for EnvVarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvVarSource {
    fn format_id(&self) -> &str {
        "env"
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Vec<LayerData>> {
        let vars = self.collect();
        tracing::debug!(
            "Loaded {} environment variables (prefix={:?})",
            vars.len(),
            self.prefix
        );
        if vars.is_empty() {
            return Ok(Vec::new());
        }

        // Shorter keys first so `A__B` nests inside an earlier `A` mapping.
        let mut tree = DataTree::new(MergeEngine::default());
        for (key, raw) in vars {
            let value = if raw.trim_start().starts_with('@') {
                Value::String(raw)
            } else {
                infer_literal(&raw)
            };
            tree.set(key.as_str(), value, false);
        }
        Ok(vec![LayerData::new(request.target_layer(), tree.into_mapping())])
    }
}
