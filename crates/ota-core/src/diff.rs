//! Content-addressed comparison of two extracted release trees.
//!
//! The comparison is driven by the new tree: every regular file under the
//! new root is looked up at the same relative path under the old root and
//! classified as added, modified, or unchanged. Files that exist only in the
//! old tree are not reported.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::checksum::file_checksum;
use crate::io::archive::copy_tree_subset;

/// Errors raised while comparing two trees.
#[derive(Error, Debug)]
pub enum DiffError {
    /// A file could not be inspected or read.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The new tree could not be traversed.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A path is a directory in one tree and a file in the other.
    #[error("{} is a file in one tree and a directory in the other", .path.display())]
    TypeMismatch {
        /// Relative path of the conflicting entry.
        path: PathBuf,
        /// Whether the new tree holds a directory at `path`.
        new_is_dir: bool,
    },
}

/// Why a file is part of a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The file does not exist in the old tree.
    Added,
    /// The file exists in both trees with different content.
    Modified,
}

/// The files that must ship in a delta, keyed by path relative to the tree
/// root and ordered lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaFileSet {
    entries: BTreeMap<PathBuf, ChangeKind>,
    unchanged: usize,
}

impl DeltaFileSet {
    /// Number of files in the delta.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the delta carries no files.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` (relative to the tree root) is part of the delta.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.contains_key(path.as_ref())
    }

    /// The change recorded for `path`, if it is part of the delta.
    pub fn kind(&self, path: impl AsRef<Path>) -> Option<ChangeKind> {
        self.entries.get(path.as_ref()).copied()
    }

    /// Iterate over `(relative path, change)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, ChangeKind)> {
        self.entries.iter().map(|(p, k)| (p.as_path(), *k))
    }

    /// Iterate over relative paths in path order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Number of files that were compared and found identical.
    pub fn unchanged(&self) -> usize {
        self.unchanged
    }

    /// Number of files of the given kind.
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.entries.values().filter(|k| **k == kind).count()
    }

    /// Copy every file in the delta from `new_root` into `staging_root`,
    /// preserving relative paths.
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be copied.
    pub fn stage(&self, new_root: &Path, staging_root: &Path) -> io::Result<usize> {
        copy_tree_subset(new_root, staging_root, self.paths())
    }

    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        self.entries.insert(path, kind);
    }
}

/// Compare `old_root` against `new_root` and collect the files that were
/// added or modified in the new tree.
///
/// # Errors
///
/// Returns [`DiffError::TypeMismatch`] when a path is a file in one tree and
/// a directory in the other, and [`DiffError::Io`] when a file cannot be
/// inspected or checksummed.
pub fn diff_trees(old_root: &Path, new_root: &Path) -> Result<DeltaFileSet, DiffError> {
    let mut delta = DeltaFileSet::default();

    for entry in WalkDir::new(new_root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(new_root)
            .map_err(|_| DiffError::Io {
                path: entry.path().to_path_buf(),
                source: io::Error::other("entry outside of tree root"),
            })?
            .to_path_buf();
        let old_path = old_root.join(&relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if probe(&old_path)?.is_some_and(|m| !m.is_dir()) {
                return Err(DiffError::TypeMismatch {
                    path: relative,
                    new_is_dir: true,
                });
            }
            continue;
        }

        if !file_type.is_file() {
            tracing::debug!(path = %relative.display(), "skipping non-regular file");
            continue;
        }

        match probe(&old_path)? {
            None => {
                tracing::debug!(path = %relative.display(), "added");
                delta.record(relative, ChangeKind::Added);
            }
            Some(meta) if meta.is_dir() => {
                return Err(DiffError::TypeMismatch {
                    path: relative,
                    new_is_dir: false,
                });
            }
            Some(_) => {
                let new_sum = checksum_at(entry.path())?;
                let old_sum = checksum_at(&old_path)?;
                if new_sum == old_sum {
                    delta.unchanged += 1;
                } else {
                    tracing::debug!(
                        path = %relative.display(),
                        old = %old_sum,
                        new = %new_sum,
                        "modified"
                    );
                    delta.record(relative, ChangeKind::Modified);
                }
            }
        }
    }

    Ok(delta)
}

fn probe(path: &Path) -> Result<Option<fs::Metadata>, DiffError> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DiffError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn checksum_at(path: &Path) -> Result<ota_schema::Checksum, DiffError> {
    file_checksum(path).map_err(|source| DiffError::Io {
        path: path.to_path_buf(),
        source,
    })
}
