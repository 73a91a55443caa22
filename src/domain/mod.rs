// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core business logic and types.
//!
//! This module holds the settings tree, the merge engine, lazy evaluation and
//! environment layering. It performs no I/O; sources and parsers live in the
//! adapters layer and are reached through the ports.

pub mod config_key;
pub mod contribution;
pub mod converters;
pub mod directive;
pub mod environment;
pub mod errors;
pub mod evaluator;
pub mod lazy;
pub mod merge;
pub mod service;
pub mod tree;
pub mod value;

// Re-export commonly used types
pub use config_key::ConfigKey;
pub use contribution::Contribution;
pub use converters::{Converter, ConverterRegistry};
pub use directive::{strip_directives, take_directive, MergeDirective};
pub use environment::{EnvironmentResolver, GLOBAL_LAYER, MAIN_LAYER};
pub use errors::{ConfigError, Result};
pub use evaluator::{EvalContext, Evaluator};
pub use lazy::{LazyKind, LazyValue};
pub use merge::MergeEngine;
pub use service::ConfigurationService;
pub use tree::DataTree;
pub use value::{Mapping, Value};
