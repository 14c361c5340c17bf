//! Output package filenames.
//!
//! - Full package: `<Name>_FULL-<os>-<arch>-<version>.zip`
//! - Delta package: `<Name>_OTA-<os>-<arch>-<from>..<to>.zip`
//!
//! Distinct inputs always map to distinct names as long as os and arch carry
//! no hyphen and versions carry no `..`, which [`ArtifactPattern`] enforces
//! for everything read from disk.
//!
//! [`ArtifactPattern`]: crate::ArtifactPattern

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ZIP_EXTENSION;

/// Which kind of package a name refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// A complete copy of one version.
    Full,
    /// Changed and added files going from `from` to the target version.
    Delta {
        /// Version the delta applies on top of.
        from: String,
    },
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Delta { from } => write!(f, "delta from {from}"),
        }
    }
}

/// Deterministic filename generator for full and delta packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNaming {
    app_name: String,
}

impl PackageNaming {
    /// Tag inserted after the application name of full packages.
    pub const FULL_TAG: &'static str = "_FULL";
    /// Tag inserted after the application name of delta packages.
    pub const DELTA_TAG: &'static str = "_OTA";

    /// Create a naming scheme for the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Filename of the full package for `version` on `os`/`arch`.
    pub fn full_name(&self, version: &str, os: &str, arch: &str) -> String {
        format!(
            "{}{}-{os}-{arch}-{version}{ZIP_EXTENSION}",
            self.app_name,
            Self::FULL_TAG
        )
    }

    /// Filename of the delta package taking `os`/`arch` from `from_version`
    /// to `to_version`.
    pub fn delta_name(&self, from_version: &str, to_version: &str, os: &str, arch: &str) -> String {
        format!(
            "{}{}-{os}-{arch}-{from_version}..{to_version}{ZIP_EXTENSION}",
            self.app_name,
            Self::DELTA_TAG
        )
    }
}
