// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builder for `Settings`.

use crate::adapters::{FileSource, MapSource, PlaceholderRenderer};
use crate::domain::{
    ConfigError, ConfigKey, Converter, ConverterRegistry, DataTree, Evaluator, Mapping,
    MergeEngine, Result, Value,
};
use crate::ports::{ConfigSource, TemplateRenderer};
use crate::service::options::SettingsOptions;
use crate::service::settings::Settings;
use std::path::Path;
use std::sync::Arc;

/// Builder for creating a `Settings` store.
///
/// Sources are applied in the order they are added, except environment
/// variables, which always come last.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{Mapping, Value};
/// use layercfg::service::SettingsBuilder;
///
/// let mut production = Mapping::new();
/// production.insert("debug", Value::from(false));
/// let mut document = Mapping::new();
/// document.insert("default", Value::Mapping(
///     vec![("debug", Value::from(true))].into_iter().collect(),
/// ));
/// document.insert("production", Value::Mapping(production));
///
/// let settings = SettingsBuilder::new()
///     .environments(true)
///     .env("production")
///     .with_map("inline", document)
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.layers(), vec!["default", "production", "global"]);
/// assert_eq!(settings.get("debug").unwrap(), Some(Value::from(false)));
/// ```
pub struct SettingsBuilder {
    options: SettingsOptions,
    sources: Vec<Arc<dyn ConfigSource>>,
    defaults: DataTree,
    renderer: Arc<dyn TemplateRenderer>,
    converters: ConverterRegistry,
    env_vars: bool,
}

impl SettingsBuilder {
    /// Creates a builder with default options and no sources.
    pub fn new() -> Self {
        Self {
            options: SettingsOptions::default(),
            sources: Vec::new(),
            defaults: DataTree::new(MergeEngine::default()),
            renderer: Arc::new(PlaceholderRenderer::new()),
            converters: ConverterRegistry::new(),
            env_vars: false,
        }
    }

    /// Replaces every option.
    pub fn options(mut self, options: SettingsOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables or disables environment sections.
    pub fn environments(mut self, enabled: bool) -> Self {
        self.options.environments = enabled;
        self
    }

    /// Selects the environment, overriding the switcher variable.
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.options.env = Some(env.into());
        self
    }

    /// Sets the process variable that selects the environment.
    pub fn env_switcher(mut self, name: impl Into<String>) -> Self {
        self.options.env_switcher = name.into();
        self
    }

    /// Sets the layer applied beneath every environment.
    pub fn default_env(mut self, name: impl Into<String>) -> Self {
        self.options.default_env = name.into();
        self
    }

    /// Sets the legacy alias layer applied after the default layer.
    pub fn legacy_env(mut self, name: impl Into<String>) -> Self {
        self.options.legacy_env = Some(name.into());
        self
    }

    /// Sets the environment used when none is requested.
    pub fn fallback_env(mut self, name: impl Into<String>) -> Self {
        self.options.fallback_env = name.into();
        self
    }

    /// Makes nested values merge instead of replace by default.
    pub fn merge_enabled(mut self, enabled: bool) -> Self {
        self.options.merge_enabled = enabled;
        self
    }

    /// Controls whether failing sources are skipped or abort loading.
    pub fn silent_errors(mut self, enabled: bool) -> Self {
        self.options.silent_errors = enabled;
        self
    }

    /// Sets the prefix of environment variables read by `with_env_vars`.
    pub fn envvar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.envvar_prefix = prefix.into();
        self
    }

    /// Marks keys that are reloaded from the sources on every read.
    pub fn fresh_vars<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.fresh_vars.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Reloads every key on every read.
    pub fn fresh_all(mut self, enabled: bool) -> Self {
        self.options.fresh_all = enabled;
        self
    }

    /// Adds a source.
    pub fn with_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(Arc::from(source));
        self
    }

    /// Adds a settings file, choosing the parser from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if no parser handles the file's extension. A missing
    /// file is not an error.
    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let source = FileSource::new(path)?;
        Ok(self.with_source(Box::new(source)))
    }

    /// Adds an in-memory document.
    pub fn with_map(self, origin: impl Into<String>, document: Mapping) -> Self {
        self.with_source(Box::new(MapSource::new(origin, document)))
    }

    /// Reads prefixed environment variables after every other source.
    #[cfg(feature = "env")]
    pub fn with_env_vars(mut self) -> Self {
        self.env_vars = true;
        self
    }

    /// Reads environment variables prefixed with `prefix`.
    #[cfg(feature = "env")]
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        self.envvar_prefix(prefix).with_env_vars()
    }

    /// Sets a default value. Defaults sit beneath every source and survive
    /// `clean`.
    pub fn with_default(mut self, key: impl Into<ConfigKey>, value: impl Into<Value>) -> Self {
        self.defaults.set(key, value.into(), false);
        self
    }

    /// Replaces the renderer used for `@jinja` values.
    pub fn renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Registers a converter marker.
    pub fn converter(mut self, marker: impl AsRef<str>, converter: Converter) -> Self {
        self.converters.register(marker, converter);
        self
    }

    /// Registers a cast marker.
    pub fn cast<F>(mut self, marker: impl AsRef<str>, cast: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.converters.register_cast(marker, cast);
        self
    }

    /// Builds the store. Sources are not read until first use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` when environments are enabled without
    /// a default layer name.
    pub fn build(self) -> Result<Settings> {
        if self.options.environments && self.options.default_env.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "default_env must not be empty when environments are enabled"
                    .to_string(),
            });
        }

        let mut sources = self.sources;
        #[cfg(feature = "env")]
        if self.env_vars {
            use crate::adapters::EnvVarSource;
            let source = EnvVarSource::with_prefix(self.options.envvar_prefix.clone())
                .ignore(self.options.env_switcher.clone());
            sources.push(Arc::new(source));
        }

        let converters = Arc::new(self.converters);
        let defaults = converters.parse_mapping(self.defaults.into_mapping());
        let evaluator = Evaluator::new(converters).with_renderer(self.renderer);
        tracing::debug!(
            sources = sources.len(),
            defaults = defaults.len(),
            environments = self.options.environments,
            "building settings"
        );
        Ok(Settings::from_parts(self.options, sources, defaults, evaluator))
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
