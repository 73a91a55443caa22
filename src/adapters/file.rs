// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings file source adapter.
//!
//! This module provides `FileSource`, which reads a settings file with the
//! parser matching its extension. The file is read again on every load, so a
//! reload observes edits made since the previous one.

use crate::adapters::JsonParser;
#[cfg(feature = "toml")]
use crate::adapters::TomlParser;
#[cfg(feature = "yaml")]
use crate::adapters::YamlParser;
use crate::domain::{ConfigError, Result};
use crate::ports::{ConfigParser, ConfigSource, LayerData, LoadRequest};
use directories::ProjectDirs;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum settings file size (10 MiB).
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Returns the built-in parser for a file extension, if any.
///
/// ```rust
/// use layercfg::adapters::file::parser_for_extension;
///
/// assert_eq!(parser_for_extension("JSON").map(|p| p.format_id().to_string()), Some("json".to_string()));
/// assert!(parser_for_extension("ini").is_none());
/// ```
pub fn parser_for_extension(extension: &str) -> Option<Arc<dyn ConfigParser>> {
    match extension.to_lowercase().as_str() {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Some(Arc::new(YamlParser::new())),
        #[cfg(feature = "toml")]
        "toml" => Some(Arc::new(TomlParser::new())),
        "json" => Some(Arc::new(JsonParser::new())),
        _ => None,
    }
}

/// A configuration source backed by a settings file.
///
/// A missing file contributes nothing unless the source is marked required.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::FileSource;
/// use layercfg::ports::{ConfigSource, LoadRequest};
/// use std::io::Write;
///
/// let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
/// write!(file, r#"{{"name": "app"}}"#).unwrap();
///
/// let source = FileSource::new(file.path()).unwrap();
/// let layers = vec!["main".to_string()];
/// let loaded = source.load(&LoadRequest::new(&layers, false)).unwrap();
/// assert_eq!(loaded[0].data.get("NAME").and_then(|v| v.as_str()), Some("app"));
/// ```
#[derive(Clone)]
pub struct FileSource {
    path: PathBuf,
    origin: String,
    parser: Arc<dyn ConfigParser>,
    required: bool,
}

impl FileSource {
    /// Creates a source for `path`, choosing the parser from its extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceRead` if no parser handles the extension.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let origin = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let parser = parser_for_extension(extension).ok_or_else(|| ConfigError::SourceRead {
            origin: origin.clone(),
            message: format!("no parser for file extension '{}'", extension),
            source: None,
        })?;
        Ok(Self::with_parser(path, parser))
    }

    /// Creates a source for `path` that always uses `parser`.
    pub fn with_parser<P: AsRef<Path>>(path: P, parser: Arc<dyn ConfigParser>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            origin: path.display().to_string(),
            path,
            parser,
            required: false,
        }
    }

    /// Creates a source for `filename` in the platform's configuration
    /// directory for the application.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceRead` if the directory cannot be determined or
    /// no parser handles the file's extension.
    pub fn from_default_location(app_name: &str, qualifier: &str, filename: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| ConfigError::SourceRead {
                origin: app_name.to_string(),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;
        Self::new(proj_dirs.config_dir().join(filename))
    }

    /// Makes a missing file an error instead of an empty contribution.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Returns the path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !self.required => {
                tracing::debug!(path = %self.origin, "settings file not found, skipping");
                return Ok(None);
            }
            Err(e) => return Err(ConfigError::source_read(&self.origin, e)),
        };

        if metadata.len() > MAX_FILE_SIZE {
            return Err(ConfigError::SourceRead {
                origin: self.origin.clone(),
                message: format!(
                    "Configuration file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_FILE_SIZE
                ),
                source: None,
            });
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| ConfigError::source_read(&self.origin, e))
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("path", &self.path)
            .field("format", &self.parser.format_id())
            .field("required", &self.required)
            .finish()
    }
}

impl ConfigSource for FileSource {
    fn format_id(&self) -> &str {
        self.parser.format_id()
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Vec<LayerData>> {
        let Some(content) = self.read()? else {
            return Ok(Vec::new());
        };
        let document = self.parser.parse(&content).map_err(|err| match err {
            ConfigError::Decode {
                format,
                message,
                source,
                ..
            } => ConfigError::Decode {
                format,
                origin: self.origin.clone(),
                message,
                source,
            },
            other => other,
        })?;
        tracing::debug!(
            path = %self.origin,
            format = self.parser.format_id(),
            keys = document.len(),
            "read settings file"
        );
        Ok(request.select(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn main_layer() -> Vec<String> {
        vec!["main".to_string()]
    }

    #[test]
    fn test_unknown_extension() {
        let result = FileSource::new("/tmp/settings.ini");
        assert!(matches!(result, Err(ConfigError::SourceRead { .. })));
    }

    #[test]
    fn test_missing_optional_file_is_empty() {
        let source = FileSource::new("/nonexistent/dir/settings.json").unwrap();
        let layers = main_layer();
        assert!(source.load(&LoadRequest::new(&layers, false)).unwrap().is_empty());
    }

    #[test]
    fn test_missing_required_file_fails() {
        let source = FileSource::new("/nonexistent/dir/settings.json")
            .unwrap()
            .required(true);
        let layers = main_layer();
        let err = source.load(&LoadRequest::new(&layers, false)).unwrap_err();
        assert!(matches!(err, ConfigError::SourceRead { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_decode_error_carries_path() {
        let file = temp_file(".json", "{ not json");
        let source = FileSource::new(file.path()).unwrap();
        let layers = main_layer();
        match source.load(&LoadRequest::new(&layers, false)) {
            Err(ConfigError::Decode { origin, .. }) => {
                assert_eq!(origin, file.path().display().to_string())
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_file_on_every_load() {
        let mut file = temp_file(".json", r#"{"version": 1}"#);
        let source = FileSource::new(file.path()).unwrap();
        let layers = main_layer();
        let request = LoadRequest::new(&layers, false);
        assert_eq!(
            source.load(&request).unwrap()[0].data.get("version"),
            Some(&Value::from(1))
        );

        file.as_file_mut().set_len(0).unwrap();
        std::fs::write(file.path(), r#"{"version": 2}"#).unwrap();
        assert_eq!(
            source.load(&request).unwrap()[0].data.get("version"),
            Some(&Value::from(2))
        );
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_environment_sections() {
        let file = temp_file(
            ".yaml",
            "default:\n  name: base\nproduction:\n  name: prod\ndevelopment:\n  name: dev\n",
        );
        let source = FileSource::new(file.path()).unwrap();
        assert_eq!(source.format_id(), "yaml");
        let layers = vec![
            "default".to_string(),
            "production".to_string(),
            "global".to_string(),
        ];
        let loaded = source.load(&LoadRequest::new(&layers, true)).unwrap();
        let names: Vec<_> = loaded.iter().map(|l| l.layer.as_str()).collect();
        assert_eq!(names, vec!["default", "production"]);
    }

    #[test]
    fn test_file_too_large() {
        let file = NamedTempFile::new().unwrap();
        file.as_file().set_len(MAX_FILE_SIZE + 1).unwrap();
        let source = FileSource::with_parser(file.path(), Arc::new(JsonParser::new()));
        let layers = main_layer();
        let err = source.load(&LoadRequest::new(&layers, false)).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
