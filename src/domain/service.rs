// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration service trait definition.
//!
//! This module defines the `ConfigurationService` trait, the read/write
//! interface consumed by validators and framework adapters. Missing keys are
//! reported as `None`, never as errors.

use crate::domain::{ConfigKey, Result, Value};

/// The main configuration service trait.
///
/// All methods take `&self`: implementations keep their state behind interior
/// mutability so a service can be shared between threads.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{ConfigKey, ConfigurationService, Value};
/// use layercfg::service::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().build().unwrap();
/// let service: &dyn ConfigurationService = &settings;
///
/// let key = ConfigKey::from("app.name");
/// service.set(&key, Value::from("demo")).unwrap();
/// assert_eq!(service.get(&ConfigKey::from("APP.NAME")).unwrap(), Some(Value::from("demo")));
///
/// service.delete(&key).unwrap();
/// assert!(!service.contains(&key));
/// assert_eq!(service.get_or(&key, Value::from(1)).unwrap(), Value::from(1));
/// ```
pub trait ConfigurationService {
    /// Retrieves the evaluated value for `key`.
    ///
    /// Returns `Ok(None)` when the key is absent or deleted. Errors come from
    /// loading the sources or evaluating lazy values.
    fn get(&self, key: &ConfigKey) -> Result<Option<Value>>;

    /// Retrieves the evaluated value for `key`, or `default` when it is absent.
    fn get_or(&self, key: &ConfigKey, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Checks if `key` exists without evaluating it.
    fn contains(&self, key: &ConfigKey) -> bool;

    /// Stores `value` at `key`, replacing what is there.
    fn set(&self, key: &ConfigKey, value: Value) -> Result<()>;

    /// Removes `key` and hides it from reads until it is set again.
    fn delete(&self, key: &ConfigKey) -> Result<()>;

    /// Re-reads every source.
    fn reload(&self) -> Result<()>;
}
