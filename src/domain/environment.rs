// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment layer ordering.

/// Layer applied last, on top of every environment.
pub const GLOBAL_LAYER: &str = "global";

/// The single layer used when environments are disabled.
pub const MAIN_LAYER: &str = "main";

/// Environment used when none is requested.
pub const DEFAULT_FALLBACK_ENV: &str = "development";

/// Computes the ordered list of layers to apply for a requested environment.
///
/// The order is `default`, then the legacy alias, then the requested
/// environment, then `global`. Names are lower-cased and de-duplicated
/// case-insensitively, keeping the first occurrence; `global` always appears
/// exactly once, last.
///
/// # Examples
///
/// ```
/// use layercfg::domain::EnvironmentResolver;
///
/// let resolver = EnvironmentResolver::default();
/// assert_eq!(
///     resolver.resolve(Some("production"), "default", Some("dynaconf")),
///     vec!["default", "dynaconf", "production", "global"]
/// );
/// assert_eq!(
///     resolver.resolve(None, "DEFAULT", None),
///     vec!["default", "development", "global"]
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentResolver {
    fallback_env: String,
}

impl Default for EnvironmentResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_ENV)
    }
}

impl EnvironmentResolver {
    /// Creates a resolver that uses `fallback_env` when no environment is requested.
    pub fn new(fallback_env: impl Into<String>) -> Self {
        Self {
            fallback_env: fallback_env.into().trim().to_lowercase(),
        }
    }

    /// Returns the environment used when none is requested.
    pub fn fallback_env(&self) -> &str {
        &self.fallback_env
    }

    /// Returns the environment name `requested` selects.
    pub fn active_env(&self, requested: Option<&str>) -> String {
        requested
            .map(|env| env.trim().to_lowercase())
            .filter(|env| !env.is_empty())
            .unwrap_or_else(|| self.fallback_env.clone())
    }

    /// Returns the ordered, de-duplicated layer names.
    pub fn resolve(
        &self,
        requested: Option<&str>,
        default_layer: &str,
        legacy_alias: Option<&str>,
    ) -> Vec<String> {
        let requested = self.active_env(requested);
        let candidates = [Some(default_layer), legacy_alias, Some(requested.as_str())];

        let mut layers: Vec<String> = Vec::with_capacity(4);
        for name in candidates.into_iter().flatten() {
            let name = name.trim().to_lowercase();
            if name.is_empty() || name == GLOBAL_LAYER || layers.contains(&name) {
                continue;
            }
            layers.push(name);
        }
        layers.push(GLOBAL_LAYER.to_string());
        layers
    }
}
