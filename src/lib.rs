// SPDX-License-Identifier: MIT OR Apache-2.0

//! A layered runtime settings resolver.
//!
//! This crate builds one case-insensitive tree of settings out of many
//! sources: settings files (TOML, YAML, JSON), in-memory documents and
//! prefixed environment variables. Sources are folded in order, optionally
//! split into environment sections, with per-key merge directives deciding
//! whether nested values merge or replace. Values can be lazy: `@format`,
//! `@jinja` and `@get` strings are evaluated against the finished tree on
//! every read.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: The data tree, merge engine, lazy evaluator and
//!   environment resolver (`DataTree`, `MergeEngine`, `Evaluator`)
//! - **Ports**: Trait definitions for the outside world (`ConfigSource`,
//!   `ConfigParser`, `TemplateRenderer`, `Validator`)
//! - **Adapters**: File parsers, the file, map and environment sources and the
//!   default template renderer
//! - **Service**: The `Settings` store that orchestrates everything
//!
//! # Features
//!
//! - **Layered Sources**: Later sources override earlier ones, environment
//!   variables come last
//! - **Environments**: `default`, the active environment and `global` sections
//!   applied in that order
//! - **Merge Directives**: `dynaconf_merge`, `@merge`, `@merge_unique`,
//!   `@reset` and friends control merging per key
//! - **Lazy Values**: Interpolation and templates evaluated at read time, with
//!   cycle detection
//! - **Fresh Keys**: Keys re-read from the sources on every access
//!
//! # Feature Flags
//!
//! - `yaml`: Enable YAML file support (default)
//! - `toml`: Enable TOML file support (default)
//! - `env`: Enable environment variable support (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use layercfg::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut data = Mapping::new();
//! data.insert("name", Value::from("demo"));
//! data.insert("greeting", Value::from("@format hello {this.NAME}"));
//!
//! let settings = Settings::builder().with_map("inline", data).build()?;
//!
//! assert_eq!(settings.get("greeting")?, Some(Value::from("hello demo")));
//! assert_eq!(settings.get("GREETING")?, settings.get("Greeting")?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfigError, ConfigKey, ConfigurationService, Mapping, MergeDirective, Result, Value,
    };
    pub use crate::ports::{
        ConfigParser, ConfigSource, LayerData, LoadRequest, TemplateRenderer, Validator,
    };
    pub use crate::service::{Settings, SettingsBuilder, SettingsOptions};

    pub use crate::adapters::{FileSource, JsonParser, MapSource, PlaceholderRenderer};
    // Re-export adapters based on feature flags
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvVarSource;
    #[cfg(feature = "toml")]
    pub use crate::adapters::TomlParser;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::YamlParser;
}
