// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validator trait definition.

use crate::domain::{ConfigError, ConfigurationService, Result};

/// Checks finished settings.
///
/// Validators only see the public read API of the store.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{ConfigError, ConfigKey, ConfigurationService, Result};
/// use layercfg::ports::Validator;
///
/// struct RequiresPort;
///
/// impl Validator for RequiresPort {
///     fn validate(&self, settings: &dyn ConfigurationService) -> Result<()> {
///         if settings.contains(&ConfigKey::from("port")) {
///             Ok(())
///         } else {
///             Err(ConfigError::Validation {
///                 message: "PORT is required".to_string(),
///             })
///         }
///     }
/// }
/// ```
pub trait Validator: Send + Sync {
    /// Returns `Ok(())` when the settings are acceptable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first problem found.
    fn validate(&self, settings: &dyn ConfigurationService) -> Result<()>;
}

/// A validator built from a closure.
pub struct FnValidator<F>(pub F);

impl<F> Validator for FnValidator<F>
where
    F: Fn(&dyn ConfigurationService) -> Result<()> + Send + Sync,
{
    fn validate(&self, settings: &dyn ConfigurationService) -> Result<()> {
        (self.0)(settings)
    }
}

/// Requires every key in the list to be present.
#[derive(Clone, Debug)]
pub struct RequiredKeys(pub Vec<String>);

impl Validator for RequiredKeys {
    fn validate(&self, settings: &dyn ConfigurationService) -> Result<()> {
        let missing: Vec<&str> = self
            .0
            .iter()
            .map(String::as_str)
            .filter(|key| !settings.contains(&(*key).into()))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation {
                message: format!("missing required keys: {}", missing.join(", ")),
            })
        }
    }
}
