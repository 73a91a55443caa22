// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records of data applied to a store.

use crate::domain::config_key::ConfigKey;
use crate::domain::tree::descend;
use crate::domain::value::Mapping;

/// Format identifier recorded for values written through the store API.
pub const SET_METHOD_FORMAT: &str = "set_method";

/// One application of data to a store, kept for introspection.
#[derive(Clone, Debug, PartialEq)]
pub struct Contribution {
    format_id: String,
    origin_id: String,
    layer_name: String,
    data: Mapping,
    merge_flag: bool,
}

impl Contribution {
    /// Creates a contribution record.
    pub fn new(
        format_id: impl Into<String>,
        origin_id: impl Into<String>,
        layer_name: impl Into<String>,
        data: Mapping,
        merge_flag: bool,
    ) -> Self {
        Self {
            format_id: format_id.into(),
            origin_id: origin_id.into(),
            layer_name: layer_name.into(),
            data,
            merge_flag,
        }
    }

    /// Format of the data, such as `yaml`, `env` or `set_method`.
    pub fn format_id(&self) -> &str {
        &self.format_id
    }

    /// Where the data came from.
    pub fn origin_id(&self) -> &str {
        &self.origin_id
    }

    /// The environment layer the data was applied under.
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// The data as it was applied, after conversion.
    pub fn data(&self) -> &Mapping {
        &self.data
    }

    /// Whether nested values of this contribution merged rather than replaced.
    pub fn merge_flag(&self) -> bool {
        self.merge_flag
    }

    /// Returns `true` if the contribution carried a value for `key`.
    pub fn contains(&self, key: &ConfigKey) -> bool {
        descend(&self.data, key).is_some()
    }
}
