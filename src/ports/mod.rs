// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the store and the outside world. These traits are implemented by
//! adapters in the adapters layer, or by applications directly.

pub mod parser;
pub mod renderer;
pub mod source;
pub mod validator;

// Re-export commonly used types
pub use parser::ConfigParser;
pub use renderer::TemplateRenderer;
pub use source::{ConfigSource, LayerData, LoadRequest};
pub use validator::{FnValidator, RequiredKeys, Validator};
