//! Working directory locations.

use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Returns the default working root, or None if the user's home cannot be resolved.
pub fn try_ota_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("OTA_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".ota"))
}

/// Fixed directory layout under a working root.
///
/// ```text
/// <root>/
/// ├── downloads/
/// ├── extract/new/
/// ├── extract/old/
/// ├── delta/
/// └── release/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Working root every other directory lives under.
    pub root: PathBuf,
    /// Downloaded release archives: `<root>/downloads`
    pub downloads: PathBuf,
    /// Extracted target tree: `<root>/extract/new`
    pub baseline: PathBuf,
    /// Extracted comparison tree: `<root>/extract/old`
    pub comparison: PathBuf,
    /// Staged delta payload: `<root>/delta`
    pub staging: PathBuf,
    /// Packaged outputs: `<root>/release`
    pub output: PathBuf,
}

impl Layout {
    /// Compute the layout rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            downloads: root.join("downloads"),
            baseline: root.join("extract").join("new"),
            comparison: root.join("extract").join("old"),
            staging: root.join("delta"),
            output: root.join("release"),
        }
    }
}
