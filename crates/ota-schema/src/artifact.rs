//! Release artifact records and the filename parser that produces them.
//!
//! Published releases carry one archive per platform, named
//! `<Name>-<os>-<arch>-<version>.zip`. The version may itself contain dots
//! and hyphens, so parsing is anchored on the known application name and
//! splits the remainder on the first two hyphens only.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ZIP_EXTENSION;

/// Errors returned when a filename does not follow the artifact pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The filename does not end in `.zip`.
    #[error("not a zip archive: {0}")]
    NotZip(String),

    /// The filename does not start with `<Name>-`.
    #[error("expected prefix '{expected}-' in {name}")]
    WrongPrefix {
        /// Application name the pattern was built for.
        expected: String,
        /// Offending filename.
        name: String,
    },

    /// One of the os, arch, or version segments is empty or absent.
    #[error("missing {field} segment in {name}")]
    MissingField {
        /// Which segment was missing.
        field: &'static str,
        /// Offending filename.
        name: String,
    },

    /// The version contains `..`, which would make delta names ambiguous.
    #[error("version '{0}' contains '..'")]
    AmbiguousVersion(String),
}

/// Operating system and architecture pair that deltas are computed within.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system segment, e.g. `win`.
    pub os: String,
    /// Architecture segment, e.g. `x64`.
    pub arch: String,
}

impl Platform {
    /// Create a platform key from its two segments.
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// A downloaded full-release archive for one platform and version.
///
/// Records are created once per downloaded file and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    /// Operating system segment of the filename.
    pub os: String,
    /// Architecture segment of the filename.
    pub arch: String,
    /// Version segment of the filename (may contain dots and hyphens).
    pub version: String,
    /// Location of the archive on disk.
    pub path: PathBuf,
}

impl ReleaseArtifact {
    /// The platform key of this artifact.
    pub fn platform(&self) -> Platform {
        Platform::new(&self.os, &self.arch)
    }

    /// Whether `other` targets the same os and architecture.
    pub fn same_platform(&self, other: &ReleaseArtifact) -> bool {
        self.os == other.os && self.arch == other.arch
    }
}

/// The segments extracted from an artifact filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName<'a> {
    /// Operating system segment.
    pub os: &'a str,
    /// Architecture segment.
    pub arch: &'a str,
    /// Version segment.
    pub version: &'a str,
}

/// Parser for `<Name>-<os>-<arch>-<version>.zip` filenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPattern {
    app_name: String,
}

impl ArtifactPattern {
    /// Build a parser for the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// The application name this pattern expects as the filename prefix.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Split a filename into its os, arch and version segments.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first rule the name violates.
    pub fn parse<'a>(&self, file_name: &'a str) -> Result<ParsedName<'a>, ParseError> {
        let stem = file_name
            .strip_suffix(ZIP_EXTENSION)
            .ok_or_else(|| ParseError::NotZip(file_name.to_string()))?;

        let rest = stem
            .strip_prefix(self.app_name.as_str())
            .and_then(|r| r.strip_prefix('-'))
            .ok_or_else(|| ParseError::WrongPrefix {
                expected: self.app_name.clone(),
                name: file_name.to_string(),
            })?;

        let mut parts = rest.splitn(3, '-');
        let missing = |field| ParseError::MissingField {
            field,
            name: file_name.to_string(),
        };
        let os = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| missing("os"))?;
        let arch = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("arch"))?;
        let version = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("version"))?;

        if version.contains("..") {
            return Err(ParseError::AmbiguousVersion(version.to_string()));
        }

        Ok(ParsedName { os, arch, version })
    }

    /// Parse the final component of `path` into a [`ReleaseArtifact`].
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the path has no UTF-8 filename or the
    /// filename does not match the pattern.
    pub fn parse_path(&self, path: &Path) -> Result<ReleaseArtifact, ParseError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ParseError::NotZip(path.display().to_string()))?;
        let parsed = self.parse(file_name)?;

        Ok(ReleaseArtifact {
            os: parsed.os.to_string(),
            arch: parsed.arch.to_string(),
            version: parsed.version.to_string(),
            path: path.to_path_buf(),
        })
    }
}
