//! The release catalog: every downloaded artifact whose filename parsed.
//!
//! Entries keep discovery order. Scanning a directory sorts by filename
//! first so repeated runs over the same downloads iterate identically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ota_schema::{ArtifactPattern, ParseError, ReleaseArtifact, version};

/// A file that was found but did not match the artifact pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// Location of the file.
    pub path: PathBuf,
    /// Why the name was rejected.
    pub reason: ParseError,
}

/// Ordered collection of known release artifacts.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    artifacts: Vec<ReleaseArtifact>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every path against `pattern`, keeping matches in order.
    ///
    /// Non-matching paths are logged and returned alongside the catalog.
    pub fn from_paths<I, P>(pattern: &ArtifactPattern, paths: I) -> (Self, Vec<Rejected>)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut catalog = Self::new();
        let mut rejected = Vec::new();

        for path in paths {
            let path = path.as_ref();
            match pattern.parse_path(path) {
                Ok(artifact) => catalog.push(artifact),
                Err(reason) => {
                    tracing::warn!(path = %path.display(), "skipping artifact: {reason}");
                    rejected.push(Rejected {
                        path: path.to_path_buf(),
                        reason,
                    });
                }
            }
        }

        (catalog, rejected)
    }

    /// Scan the regular files directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `dir` cannot be listed.
    pub fn scan(dir: &Path, pattern: &ArtifactPattern) -> io::Result<(Self, Vec<Rejected>)> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(Self::from_paths(pattern, paths))
    }

    /// Append an artifact.
    pub fn push(&mut self, artifact: ReleaseArtifact) {
        self.artifacts.push(artifact);
    }

    /// Number of artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the catalog has no artifacts.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ReleaseArtifact> {
        self.artifacts.iter()
    }

    /// Artifacts whose version equals `version`.
    pub fn for_version<'a>(&'a self, version: &'a str) -> impl Iterator<Item = &'a ReleaseArtifact> {
        self.artifacts.iter().filter(move |a| a.version == version)
    }

    /// Artifacts for the same os/arch as `target` but a different version.
    pub fn comparisons<'a>(
        &'a self,
        target: &'a ReleaseArtifact,
    ) -> impl Iterator<Item = &'a ReleaseArtifact> {
        self.artifacts
            .iter()
            .filter(move |a| a.same_platform(target) && a.version != target.version)
    }

    /// The newest version present, by semver where possible.
    pub fn latest_version(&self) -> Option<&str> {
        version::latest(self.artifacts.iter().map(|a| a.version.as_str()))
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ReleaseArtifact;
    type IntoIter = std::slice::Iter<'a, ReleaseArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}
