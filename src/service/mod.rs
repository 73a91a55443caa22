// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the settings store.
//!
//! This module contains `Settings`, the implementation of the
//! `ConfigurationService` trait, together with its builder and options.

pub mod builder;
pub mod options;
pub mod settings;

// Re-export commonly used types
pub use builder::SettingsBuilder;
pub use options::SettingsOptions;
pub use settings::{LoadState, Settings};
