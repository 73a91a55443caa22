// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing parser, source and renderer implementations.
//!
//! This module contains concrete implementations of the traits defined in the
//! ports layer: document parsers, the file, environment and in-memory sources,
//! and the default template renderer.

#[cfg(feature = "env")]
pub mod env_var;
pub mod file;
pub mod json_file;
pub mod map;
pub mod template;
#[cfg(feature = "toml")]
pub mod toml_file;
#[cfg(feature = "yaml")]
pub mod yaml_file;

// Re-export adapters based on feature flags
#[cfg(feature = "env")]
pub use env_var::EnvVarSource;
pub use file::FileSource;
pub use json_file::JsonParser;
pub use map::MapSource;
pub use template::PlaceholderRenderer;
#[cfg(feature = "toml")]
pub use toml_file::TomlParser;
#[cfg(feature = "yaml")]
pub use yaml_file::YamlParser;
