// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source trait definition.
//!
//! This module defines the `ConfigSource` trait, the primary port for feeding
//! data into a store. A source is asked for one mapping per environment layer
//! every time the store loads; it never merges anything itself.

use crate::domain::{Mapping, Result, Value};

/// What a store asks of its sources during one load.
#[derive(Clone, Copy, Debug)]
pub struct LoadRequest<'a> {
    layers: &'a [String],
    environments: bool,
}

impl<'a> LoadRequest<'a> {
    /// Creates a request for `layers`, in application order.
    pub fn new(layers: &'a [String], environments: bool) -> Self {
        Self {
            layers,
            environments,
        }
    }

    /// Returns the layers to load, in application order.
    pub fn layers(&self) -> &'a [String] {
        self.layers
    }

    /// Returns `true` when documents are divided into environment sections.
    pub fn environments(&self) -> bool {
        self.environments
    }

    /// Returns the layer flat sources (such as environment variables) write to.
    pub fn target_layer(&self) -> &'a str {
        self.layers.last().map(String::as_str).unwrap_or_default()
    }

    /// Divides a whole document into per-layer data.
    ///
    /// With environments enabled, each top-level section named after a
    /// requested layer becomes that layer's data, and other top-level keys are
    /// ignored. Otherwise the whole document is the data of the target layer.
    pub fn select(&self, mut document: Mapping) -> Vec<LayerData> {
        if !self.environments {
            return vec![LayerData::new(self.target_layer(), document)];
        }
        let mut selected = Vec::new();
        for layer in self.layers {
            match document.remove(layer) {
                Some(Value::Mapping(data)) => selected.push(LayerData::new(layer.clone(), data)),
                Some(other) => tracing::debug!(
                    layer = %layer,
                    found = other.type_name(),
                    "ignoring environment section that is not a mapping"
                ),
                None => {}
            }
        }
        if !document.is_empty() {
            tracing::debug!(
                keys = ?document.keys().collect::<Vec<_>>(),
                "ignoring top-level keys outside the requested environments"
            );
        }
        selected
    }
}

/// The data one source contributes to one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerData {
    /// Layer name, lower case.
    pub layer: String,
    /// The raw, unconverted data.
    pub data: Mapping,
}

impl LayerData {
    /// Creates layer data.
    pub fn new(layer: impl Into<String>, data: Mapping) -> Self {
        Self {
            layer: layer.into().to_lowercase(),
            data,
        }
    }
}

/// A source of configuration data.
///
/// Sources must be thread-safe (`Send + Sync`): a store shares them between
/// its clones.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{Mapping, Result, Value};
/// use layercfg::ports::{ConfigSource, LayerData, LoadRequest};
///
/// struct Constant;
///
/// impl ConfigSource for Constant {
///     fn format_id(&self) -> &str {
///         "constant"
///     }
///
///     fn origin(&self) -> &str {
///         "constant"
///     }
///
///     fn load(&self, request: &LoadRequest<'_>) -> Result<Vec<LayerData>> {
///         let mut data = Mapping::new();
///         data.insert("answer", Value::from(42));
///         Ok(vec![LayerData::new(request.target_layer(), data)])
///     }
/// }
///
/// let layers = vec!["main".to_string()];
/// let loaded = Constant.load(&LoadRequest::new(&layers, false)).unwrap();
/// assert_eq!(loaded[0].layer, "main");
/// ```
pub trait ConfigSource: Send + Sync {
    /// Returns the format identifier recorded in contribution history.
    fn format_id(&self) -> &str;

    /// Returns the origin identifier (a file path or a synthetic name).
    fn origin(&self) -> &str;

    /// Reads the source and returns its data for the requested layers, in
    /// layer order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceRead` or `ConfigError::Decode` when the
    /// source cannot be read. The store decides whether to silence them.
    fn load(&self, request: &LoadRequest<'_>) -> Result<Vec<LayerData>>;
}
