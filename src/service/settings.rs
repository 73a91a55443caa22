// SPDX-License-Identifier: MIT OR Apache-2.0

//! The settings store.
//!
//! `Settings` owns the data tree and drives its sources: for every layer the
//! environment resolver names, each source (in registration order) contributes
//! a mapping which is converted and folded into the tree. Reads evaluate lazy
//! values against the tree on every access.

use crate::domain::contribution::SET_METHOD_FORMAT;
use crate::domain::{
    ConfigError, ConfigKey, ConfigurationService, Contribution, DataTree, EnvironmentResolver,
    Evaluator, Mapping, MergeDirective, MergeEngine, Result, Value, MAIN_LAYER,
};
use crate::ports::{ConfigParser, ConfigSource, LayerData, LoadRequest, Validator};
use crate::service::builder::SettingsBuilder;
use crate::service::options::SettingsOptions;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lifecycle of a store.
///
/// A store starts `Uninitialized`, is `Loading` while its sources run and
/// `Ready` afterwards. Reloading passes through `Loading` again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// No source has run yet.
    Uninitialized,
    /// Sources are being applied.
    Loading,
    /// Sources have been applied.
    Ready,
}

#[derive(Clone, Debug)]
struct StoreState {
    tree: DataTree,
    history: Vec<Contribution>,
    deleted: BTreeSet<ConfigKey>,
    env: String,
    layers: Vec<String>,
    phase: LoadState,
}

/// A layered settings store.
///
/// All methods take `&self`; state lives behind a `RwLock`, so a store can be
/// shared between threads. Cloning a store deep-copies its data while sharing
/// its sources, converters and renderer.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{Mapping, Value};
/// use layercfg::service::Settings;
///
/// let mut data = Mapping::new();
/// data.insert("host", Value::from("localhost"));
/// data.insert("url", Value::from("@format http://{this.HOST}:{this.PORT}"));
///
/// let settings = Settings::builder()
///     .with_map("inline", data)
///     .with_default("port", Value::from(8080))
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     settings.get("URL").unwrap(),
///     Some(Value::from("http://localhost:8080"))
/// );
/// ```
pub struct Settings {
    options: SettingsOptions,
    sources: Vec<Arc<dyn ConfigSource>>,
    defaults: Mapping,
    fresh: BTreeSet<ConfigKey>,
    evaluator: Evaluator,
    resolver: EnvironmentResolver,
    state: RwLock<StoreState>,
}

impl Settings {
    /// Returns a builder.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Creates a store reading environment variables and the first of
    /// `settings.toml`, `settings.yaml` or `settings.json` found in the
    /// platform's configuration directory for the application.
    pub fn with_defaults(app_name: &str, qualifier: &str) -> Result<Self> {
        use crate::adapters::FileSource;

        let mut builder = Self::builder();
        for filename in ["settings.toml", "settings.yaml", "settings.json"] {
            if let Ok(source) = FileSource::from_default_location(app_name, qualifier, filename) {
                if source.path().exists() {
                    builder = builder.with_source(Box::new(source));
                    break;
                }
            }
        }

        // Always add environment variables
        #[cfg(feature = "env")]
        {
            builder = builder.with_env_vars();
        }

        builder.build()
    }

    pub(crate) fn from_parts(
        options: SettingsOptions,
        sources: Vec<Arc<dyn ConfigSource>>,
        defaults: Mapping,
        evaluator: Evaluator,
    ) -> Self {
        let resolver = EnvironmentResolver::new(options.fallback_env.clone());
        let fresh = options.fresh_vars.iter().map(ConfigKey::new).collect();
        let env = resolver.active_env(options.requested_env().as_deref());
        let mut settings = Self {
            options,
            sources,
            defaults,
            fresh,
            evaluator,
            resolver,
            state: RwLock::new(StoreState {
                tree: DataTree::default(),
                history: Vec::new(),
                deleted: BTreeSet::new(),
                env: String::new(),
                layers: Vec::new(),
                phase: LoadState::Uninitialized,
            }),
        };
        let layers = settings.layers_for(&env);
        let tree = settings.base_tree();
        let state = settings
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if !settings.defaults.is_empty() {
            let layer = layers.first().cloned().unwrap_or_default();
            state.history.push(Contribution::new(
                "defaults",
                "defaults",
                layer,
                settings.defaults.clone(),
                false,
            ));
        }
        state.tree = tree;
        state.env = env;
        state.layers = layers;
        settings
    }

    /// Returns the options this store was built with.
    pub fn options(&self) -> &SettingsOptions {
        &self.options
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn engine(&self) -> MergeEngine {
        MergeEngine::new(self.options.merge_enabled)
    }

    fn base_tree(&self) -> DataTree {
        let mut tree = DataTree::new(self.engine());
        tree.merge_contribution(self.defaults.clone());
        tree
    }

    fn layers_for(&self, env: &str) -> Vec<String> {
        if self.options.environments {
            self.resolver.resolve(
                Some(env),
                &self.options.default_env,
                self.options.legacy_env.as_deref(),
            )
        } else {
            vec![MAIN_LAYER.to_string()]
        }
    }

    fn is_fresh(&self, key: &ConfigKey) -> bool {
        self.options.fresh_all || key.prefixes().any(|prefix| self.fresh.contains(&prefix))
    }

    /// Runs every source and folds its data into `state`.
    ///
    /// With `only`, data outside that root key is discarded before merging.
    /// Contributions are added to the history only when `record` is set.
    fn load_into(
        &self,
        state: &mut StoreState,
        only: Option<&ConfigKey>,
        record: bool,
    ) -> Result<()> {
        state.phase = LoadState::Loading;
        let layers = state.layers.clone();
        let request = LoadRequest::new(&layers, self.options.environments);
        tracing::debug!(env = %state.env, layers = ?layers, only = ?only, "executing loaders");

        let result = self.run_sources(state, &request, only, record);

        for key in &state.deleted {
            state.tree.delete(key);
        }
        state.phase = LoadState::Ready;
        result
    }

    fn run_sources(
        &self,
        state: &mut StoreState,
        request: &LoadRequest<'_>,
        only: Option<&ConfigKey>,
        record: bool,
    ) -> Result<()> {
        for source in &self.sources {
            match source.load(request) {
                Ok(loaded) => {
                    for layer_data in loaded {
                        self.apply(state, source.as_ref(), layer_data, only, record);
                    }
                }
                Err(err) if self.options.silent_errors && err.is_recoverable() => {
                    tracing::warn!(
                        source = source.origin(),
                        format = source.format_id(),
                        error = %err,
                        "skipping configuration source that failed to load"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn apply(
        &self,
        state: &mut StoreState,
        source: &dyn ConfigSource,
        layer_data: LayerData,
        only: Option<&ConfigKey>,
        record: bool,
    ) {
        let LayerData { layer, data } = layer_data;
        let mut data = self.evaluator.converters().parse_mapping(data);
        if let Some(root) = only.and_then(ConfigKey::root) {
            data = match data.remove(root) {
                Some(value) => std::iter::once((root, value)).collect(),
                None => return,
            };
        }

        let directive = state.tree.merge_contribution(data.clone());
        let merge_flag = directive
            .map(MergeDirective::is_merge)
            .unwrap_or(self.options.merge_enabled);
        tracing::debug!(
            source = source.origin(),
            format = source.format_id(),
            layer = %layer,
            keys = data.len(),
            merge = merge_flag,
            "applied contribution"
        );
        if record {
            state.history.push(Contribution::new(
                source.format_id(),
                source.origin(),
                layer,
                data,
                merge_flag,
            ));
        }
    }

    fn ensure_loaded(&self) -> Result<()> {
        let phase = self.read_state().phase;
        if phase == LoadState::Uninitialized {
            let mut state = self.write_state();
            if state.phase == LoadState::Uninitialized {
                self.load_into(&mut state, None, true)?;
            }
        }
        Ok(())
    }

    /// Loads on first use and reloads fresh keys.
    fn prepare(&self, key: Option<&ConfigKey>) -> Result<()> {
        self.ensure_loaded()?;
        match key {
            Some(key) if self.is_fresh(key) => {
                let mut state = self.write_state();
                self.refresh_key(&mut state, key)
            }
            None if self.options.fresh_all => {
                let mut state = self.write_state();
                state.tree = self.base_tree();
                self.load_into(&mut state, None, false)
            }
            _ => Ok(()),
        }
    }

    fn refresh_key(&self, state: &mut StoreState, key: &ConfigKey) -> Result<()> {
        let Some(root) = key.root() else {
            return Ok(());
        };
        let root_key = ConfigKey::new(root);
        tracing::debug!(key = %root_key, "reloading fresh key");
        state.tree.delete(&root_key);
        if let Some(default) = self.defaults.get(root) {
            state.tree.set(&root_key, default.clone(), false);
        }
        self.load_into(state, Some(&root_key), false)
    }

    /// Returns the evaluated value at `key`, or `None` when it is absent.
    ///
    /// The first read of a new store runs its sources.
    ///
    /// # Errors
    ///
    /// Returns an error when loading fails (with silent errors disabled) or a
    /// lazy value cannot be evaluated.
    pub fn get(&self, key: impl Into<ConfigKey>) -> Result<Option<Value>> {
        let key = key.into();
        self.prepare(Some(&key))?;
        let state = self.read_state();
        if is_hidden(&state.deleted, &key) {
            return Ok(None);
        }
        state.tree.resolve(&key, &self.evaluator)
    }

    /// Returns the evaluated value at `key`, or `default` when it is absent.
    pub fn get_or(&self, key: impl Into<ConfigKey>, default: impl Into<Value>) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or_else(|| default.into()))
    }

    /// Returns the stored value at `key` without evaluating lazy values.
    pub fn get_raw(&self, key: impl Into<ConfigKey>) -> Result<Option<Value>> {
        let key = key.into();
        self.prepare(Some(&key))?;
        let state = self.read_state();
        if is_hidden(&state.deleted, &key) {
            return Ok(None);
        }
        Ok(state.tree.get(&key).cloned())
    }

    /// Deserializes the evaluated value at `key` into `T`.
    ///
    /// Mapping keys are presented to `T` in lower case, matching Rust field
    /// names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TypeConversion` when the value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: impl Into<ConfigKey>) -> Result<Option<T>> {
        let key = key.into();
        let Some(value) = self.get(&key)? else {
            return Ok(None);
        };
        serde_json::from_value(lowercase_keys(value.to_json()))
            .map(Some)
            .map_err(|e| ConfigError::TypeConversion {
                key: key.to_string(),
                target_type: std::any::type_name::<T>().to_string(),
                source: Box::new(e),
            })
    }

    /// Reloads `key` from the sources, then returns its evaluated value.
    ///
    /// The root of `key` is reset to its default first, so values set through
    /// the store API under that root are discarded.
    pub fn get_fresh(&self, key: impl Into<ConfigKey>) -> Result<Option<Value>> {
        let key = key.into();
        self.ensure_loaded()?;
        let mut state = self.write_state();
        self.refresh_key(&mut state, &key)?;
        if is_hidden(&state.deleted, &key) {
            return Ok(None);
        }
        state.tree.resolve(&key, &self.evaluator)
    }

    /// Returns `true` if `key` exists. Lazy values are not evaluated.
    pub fn contains(&self, key: impl Into<ConfigKey>) -> Result<bool> {
        let key = key.into();
        self.prepare(Some(&key))?;
        let state = self.read_state();
        Ok(!is_hidden(&state.deleted, &key) && state.tree.contains(&key))
    }

    /// Returns the canonical root-level keys.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.prepare(None)?;
        Ok(self.read_state().tree.keys().map(str::to_string).collect())
    }

    /// Returns a fully evaluated copy of every setting.
    pub fn as_mapping(&self) -> Result<Mapping> {
        self.prepare(None)?;
        let state = self.read_state();
        let root = Value::Mapping(state.tree.root().clone());
        match self.evaluator.evaluate(&root, &state.tree)? {
            Value::Mapping(map) => Ok(map),
            _ => Ok(Mapping::new()),
        }
    }

    /// Encodes the stored settings with `parser`. Lazy values are written as
    /// their marker strings.
    pub fn dump(&self, parser: &dyn ConfigParser) -> Result<String> {
        self.prepare(None)?;
        parser.dump(self.read_state().tree.root())
    }

    fn write_value(&self, key: ConfigKey, value: Value, merge: bool) -> Result<()> {
        self.ensure_loaded()?;
        let value = self.evaluator.converters().parse_value(value);
        let mut state = self.write_state();
        if !state.tree.set(&key, value.clone(), merge) {
            tracing::debug!(key = %key, "set stored nothing");
        }
        clear_tombstones(&mut state.deleted, &key);

        let mut recorded = DataTree::new(MergeEngine::default());
        recorded.set(&key, value, false);
        let layer = state.layers.last().cloned().unwrap_or_default();
        state.history.push(Contribution::new(
            SET_METHOD_FORMAT,
            SET_METHOD_FORMAT,
            layer,
            recorded.into_mapping(),
            merge,
        ));
        Ok(())
    }

    /// Stores `value` at `key`, replacing what is there, and makes a deleted
    /// key visible again.
    ///
    /// String values go through the converters, so `"@int 5"` stores `5`.
    pub fn set(&self, key: impl Into<ConfigKey>, value: impl Into<Value>) -> Result<()> {
        self.write_value(key.into(), value.into(), false)
    }

    /// Merges `value` into what is stored at `key`.
    pub fn set_merged(&self, key: impl Into<ConfigKey>, value: impl Into<Value>) -> Result<()> {
        self.write_value(key.into(), value.into(), true)
    }

    /// Folds `data` into the settings the way a source contribution is folded:
    /// root keys are always kept, nested values follow the merge rules.
    pub fn update(&self, data: Mapping) -> Result<()> {
        self.ensure_loaded()?;
        let data = self.evaluator.converters().parse_mapping(data);
        let mut state = self.write_state();
        for key in data.keys() {
            clear_tombstones(&mut state.deleted, &ConfigKey::new(key));
        }
        let directive = state.tree.merge_contribution(data.clone());
        let merge_flag = directive
            .map(MergeDirective::is_merge)
            .unwrap_or(self.options.merge_enabled);
        let layer = state.layers.last().cloned().unwrap_or_default();
        state.history.push(Contribution::new(
            SET_METHOD_FORMAT,
            SET_METHOD_FORMAT,
            layer,
            data,
            merge_flag,
        ));
        Ok(())
    }

    /// Removes `key` and hides it, along with everything nested under it, from
    /// reads, including after reloads, until it or an ancestor is set again.
    pub fn unset(&self, key: impl Into<ConfigKey>) -> Result<Option<Value>> {
        let key = key.into();
        self.ensure_loaded()?;
        let mut state = self.write_state();
        let removed = state.tree.delete(&key);
        tracing::debug!(key = %key, existed = removed.is_some(), "unset key");
        state.deleted.insert(key);
        Ok(removed)
    }

    /// Runs every source again, folding their data over the current settings.
    pub fn execute_loaders(&self) -> Result<()> {
        let mut state = self.write_state();
        self.load_into(&mut state, None, true)
    }

    /// Resets the settings to their defaults and runs every source again.
    ///
    /// Deleted keys stay hidden.
    pub fn reload(&self) -> Result<()> {
        let mut state = self.write_state();
        state.tree = self.base_tree();
        self.load_into(&mut state, None, true)
    }

    /// Removes every setting except the defaults and forgets deleted keys.
    pub fn clean(&self) {
        let mut state = self.write_state();
        state.tree = self.base_tree();
        state.deleted.clear();
    }

    /// Switches to environment `env` and reloads from the defaults.
    ///
    /// `None` selects the environment the options name.
    pub fn setenv(&self, env: Option<&str>) -> Result<()> {
        let requested = env.map(str::to_string).or_else(|| self.options.requested_env());
        let env = self.resolver.active_env(requested.as_deref());
        let layers = self.layers_for(&env);
        tracing::debug!(env = %env, "switching environment");

        let mut state = self.write_state();
        state.env = env;
        state.layers = layers;
        state.tree = self.base_tree();
        self.load_into(&mut state, None, true)
    }

    /// Returns a deep copy of this store switched to environment `env`.
    pub fn from_env(&self, env: &str) -> Result<Settings> {
        let settings = self.clone();
        settings.setenv(Some(env))?;
        Ok(settings)
    }

    /// Returns every contribution applied so far, oldest first.
    pub fn history(&self) -> Vec<Contribution> {
        self.read_state().history.clone()
    }

    /// Returns the contributions that carried a value for `key`.
    pub fn key_history(&self, key: impl Into<ConfigKey>) -> Vec<Contribution> {
        let key = key.into();
        self.read_state()
            .history
            .iter()
            .filter(|contribution| contribution.contains(&key))
            .cloned()
            .collect()
    }

    /// Returns the keys currently hidden by `unset`.
    pub fn deleted_keys(&self) -> Vec<ConfigKey> {
        self.read_state().deleted.iter().cloned().collect()
    }

    /// Returns the active environment name.
    pub fn current_env(&self) -> String {
        self.read_state().env.clone()
    }

    /// Returns the layers applied for the active environment, in order.
    pub fn layers(&self) -> Vec<String> {
        self.read_state().layers.clone()
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> LoadState {
        self.read_state().phase
    }

    /// Runs `validators` in order, stopping at the first failure.
    pub fn validate(&self, validators: &[&dyn Validator]) -> Result<()> {
        self.ensure_loaded()?;
        for validator in validators {
            validator.validate(self)?;
        }
        Ok(())
    }
}

/// A key is hidden when it or any of its ancestors was unset.
fn is_hidden(deleted: &BTreeSet<ConfigKey>, key: &ConfigKey) -> bool {
    key.prefixes().any(|prefix| deleted.contains(&prefix))
}

/// Forgets the tombstones for `key`, its ancestors and its descendants.
fn clear_tombstones(deleted: &mut BTreeSet<ConfigKey>, key: &ConfigKey) {
    let nested = format!("{}.", key.as_str());
    deleted.retain(|tombstone| {
        !(tombstone.as_str().starts_with(&nested) || key.prefixes().any(|p| p == *tombstone))
    });
}

fn lowercase_keys(json: serde_json::Value) -> serde_json::Value {
    match json {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(lowercase_keys).collect())
        }
        other => other,
    }
}

impl Clone for Settings {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            sources: self.sources.clone(),
            defaults: self.defaults.clone(),
            fresh: self.fresh.clone(),
            evaluator: self.evaluator.clone(),
            resolver: self.resolver.clone(),
            state: RwLock::new(self.read_state().clone()),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("Settings")
            .field("env", &state.env)
            .field("layers", &state.layers)
            .field("state", &state.phase)
            .field("keys", &state.tree.len())
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl ConfigurationService for Settings {
    fn get(&self, key: &ConfigKey) -> Result<Option<Value>> {
        Settings::get(self, key)
    }

    fn contains(&self, key: &ConfigKey) -> bool {
        match Settings::contains(self, key) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "contains failed to load settings");
                false
            }
        }
    }

    fn set(&self, key: &ConfigKey, value: Value) -> Result<()> {
        Settings::set(self, key, value)
    }

    fn delete(&self, key: &ConfigKey) -> Result<()> {
        self.unset(key).map(|_| ())
    }

    fn reload(&self) -> Result<()> {
        Settings::reload(self)
    }
}
