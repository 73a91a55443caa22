// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory configuration source.

use crate::domain::{Mapping, Result};
use crate::ports::{ConfigSource, LayerData, LoadRequest};

/// A source serving a fixed document.
///
/// The document is divided into layers exactly like a settings file: with
/// environments enabled its top-level keys are environment names.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::MapSource;
/// use layercfg::domain::{Mapping, Value};
/// use layercfg::ports::{ConfigSource, LoadRequest};
///
/// let mut data = Mapping::new();
/// data.insert("debug", Value::from(true));
/// let source = MapSource::new("inline", data);
///
/// let layers = vec!["main".to_string()];
/// let loaded = source.load(&LoadRequest::new(&layers, false)).unwrap();
/// assert_eq!(loaded[0].data.get("DEBUG"), Some(&Value::from(true)));
/// ```
#[derive(Debug, Clone)]
pub struct MapSource {
    origin: String,
    document: Mapping,
}

impl MapSource {
    /// Creates a source named `origin` serving `document`.
    pub fn new(origin: impl Into<String>, document: Mapping) -> Self {
        Self {
            origin: origin.into(),
            document,
        }
    }

    /// Returns the served document.
    pub fn document(&self) -> &Mapping {
        &self.document
    }
}

impl ConfigSource for MapSource {
    fn format_id(&self) -> &str {
        "map"
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Vec<LayerData>> {
        Ok(request.select(self.document.clone()))
    }
}
