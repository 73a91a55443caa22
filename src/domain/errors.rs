// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines the errors that can occur while loading sources, converting
//! tagged values and evaluating lazy values. All errors use `thiserror` for proper
//! error handling and conversion.

use thiserror::Error;

/// The main error type for configuration operations.
///
/// A missing key is never an error: reads return `Option` or the caller-supplied
/// default. It is marked as `#[non_exhaustive]` to allow for future additions
/// without breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use layercfg::domain::errors::ConfigError;
///
/// let error = ConfigError::CircularReference {
///     expression: "{this.A}".to_string(),
/// };
/// assert!(error.to_string().contains("{this.A}"));
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A configuration source could not be read.
    #[error("Failed to read configuration source '{origin}': {message}")]
    SourceRead {
        /// Origin identifier of the source (file path or synthetic name)
        origin: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration source contained malformed content.
    #[error("Failed to decode {format} content from '{origin}': {message}")]
    Decode {
        /// Format identifier of the decoder
        format: String,
        /// Origin identifier of the source
        origin: String,
        /// The error message
        message: String,
        /// The underlying decoding error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tagged value could not be converted by its marker's converter.
    #[error("Converter '@{marker}' failed for value '{value}': {message}")]
    Conversion {
        /// The converter marker without the leading `@`
        marker: String,
        /// The raw value handed to the converter
        value: String,
        /// The error message
        message: String,
    },

    /// A lazy value referenced itself, directly or through other lazy values.
    #[error("Circular reference detected while evaluating '{expression}'")]
    CircularReference {
        /// The expression that was re-entered
        expression: String,
    },

    /// An interpolation expression could not be resolved.
    #[error("Failed to interpolate '{expression}': {message}")]
    Interpolation {
        /// The expression being interpolated
        expression: String,
        /// The error message
        message: String,
    },

    /// The template renderer failed.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// The template being rendered
        template: String,
        /// The error message
        message: String,
    },

    /// A validator rejected the settings.
    #[error("Validation failed: {message}")]
    Validation {
        /// The error message
        message: String,
    },

    /// Failed to convert a configuration value to the requested type.
    #[error("Failed to convert configuration value for key '{key}' to type {target_type}: {source}")]
    TypeConversion {
        /// The key being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates a `SourceRead` error from an I/O failure.
    pub fn source_read(origin: impl Into<String>, err: std::io::Error) -> Self {
        ConfigError::SourceRead {
            origin: origin.into(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Creates a `Decode` error for a format and origin.
    pub fn decode<E>(format: impl Into<String>, origin: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::Decode {
            format: format.into(),
            origin: origin.into(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Creates a `Conversion` error.
    pub fn conversion(
        marker: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigError::Conversion {
            marker: marker.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors a loader may swallow when silent errors are enabled.
    ///
    /// Evaluation failures (circular references, interpolation and template errors)
    /// are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConfigError::SourceRead { .. }
                | ConfigError::Decode { .. }
                | ConfigError::Conversion { .. }
                | ConfigError::Io(_)
        )
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
