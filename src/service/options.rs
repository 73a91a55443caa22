// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store options.

use crate::domain::environment::DEFAULT_FALLBACK_ENV;
use serde::Deserialize;

/// Options controlling how a `Settings` store loads and merges data.
///
/// Options are explicit: nothing is read from process-wide globals except the
/// environment switcher variable. The struct deserializes with every field
/// optional, so options can themselves be kept in a settings file.
///
/// # Examples
///
/// ```rust
/// use layercfg::service::SettingsOptions;
///
/// let options: SettingsOptions =
///     serde_json::from_str(r#"{"environments": true, "envvar_prefix": "MYAPP"}"#).unwrap();
/// assert!(options.environments);
/// assert_eq!(options.envvar_prefix, "MYAPP");
/// assert_eq!(options.default_env, "default");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettingsOptions {
    /// Environment to activate. Takes precedence over the switcher variable.
    pub env: Option<String>,
    /// Process variable naming the environment when `env` is unset.
    pub env_switcher: String,
    /// Layer applied first, beneath every environment.
    pub default_env: String,
    /// Legacy alias layer applied after `default_env`.
    pub legacy_env: Option<String>,
    /// Environment used when none is requested.
    pub fallback_env: String,
    /// Divide documents into environment sections.
    pub environments: bool,
    /// Merge nested values by default instead of replacing them.
    pub merge_enabled: bool,
    /// Log and skip sources that fail to read or decode.
    pub silent_errors: bool,
    /// Prefix of the environment variables read by the env source.
    pub envvar_prefix: String,
    /// Keys reloaded from the sources on every read.
    pub fresh_vars: Vec<String>,
    /// Reload every key on every read.
    pub fresh_all: bool,
}

impl Default for SettingsOptions {
    fn default() -> Self {
        Self {
            env: None,
            env_switcher: "APP_ENV".to_string(),
            default_env: "default".to_string(),
            legacy_env: None,
            fallback_env: DEFAULT_FALLBACK_ENV.to_string(),
            environments: false,
            merge_enabled: false,
            silent_errors: true,
            envvar_prefix: "APP".to_string(),
            fresh_vars: Vec::new(),
            fresh_all: false,
        }
    }
}

impl SettingsOptions {
    /// Returns the explicitly requested environment: `env`, else the value of
    /// the switcher variable.
    pub fn requested_env(&self) -> Option<String> {
        self.env
            .clone()
            .or_else(|| std::env::var(&self.env_switcher).ok())
            .filter(|env| !env.trim().is_empty())
    }
}
