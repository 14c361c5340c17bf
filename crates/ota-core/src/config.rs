//! Optional `ota.toml` configuration file.
//!
//! ```toml
//! [app]
//! name = "App"
//! work_root = "/srv/ota"
//! limit = 10
//!
//! [github]
//! repo = "owner/repo"
//! token = "ghp_..."
//! api_url = "https://api.github.com"
//! upload_url = "https://uploads.github.com"
//! ```
//!
//! Every field is optional. Values given on the command line or through the
//! environment take precedence over the file; the file takes precedence over
//! the built-in defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Number of recent releases downloaded when no limit is configured.
pub const DEFAULT_LIMIT: usize = 10;

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or has fields of the wrong type.
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        /// Configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}

/// Parsed contents of `ota.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `[app]` section.
    #[serde(default)]
    pub app: AppSection,
    /// `[github]` section.
    #[serde(default)]
    pub github: GithubSection,
}

/// `[app]` section of `ota.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    /// Application name used in artifact filenames.
    pub name: Option<String>,
    /// Working root.
    pub work_root: Option<PathBuf>,
    /// Number of recent releases to download.
    pub limit: Option<usize>,
}

/// `[github]` section of `ota.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubSection {
    /// Repository as `owner/name`.
    pub repo: Option<String>,
    /// Access token.
    pub token: Option<String>,
    /// REST API base URL.
    pub api_url: Option<String>,
    /// Asset upload base URL.
    pub upload_url: Option<String>,
}

impl FileConfig {
    /// Read and parse the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if it exists, otherwise return an empty configuration.
    ///
    /// # Errors
    ///
    /// Same as [`FileConfig::load`], except that a missing file is not an error.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// The configured limit, or [`DEFAULT_LIMIT`].
    pub fn limit_or_default(&self) -> usize {
        self.app.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_full_file() {
        let config: FileConfig = toml::from_str(
            r#"
            [app]
            name = "App"
            work_root = "/srv/ota"
            limit = 3

            [github]
            repo = "acme/app"
            token = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.app.name.as_deref(), Some("App"));
        assert_eq!(config.app.work_root, Some(PathBuf::from("/srv/ota")));
        assert_eq!(config.limit_or_default(), 3);
        assert_eq!(config.github.repo.as_deref(), Some("acme/app"));
        assert_eq!(config.github.api_url, None);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.limit_or_default(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ota.toml");
        fs::write(&path, "[app]\nnmae = \"typo\"\n").unwrap();

        let err = FileConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            FileConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(FileConfig::load_optional(&path).unwrap(), FileConfig::default());
    }
}
