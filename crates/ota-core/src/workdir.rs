//! Scratch directories reused across diff iterations.
//!
//! A [`ScratchDir`] is a fixed location on disk. Using it requires
//! [`ScratchDir::acquire`], which empties the directory and hands out a
//! [`ScratchGuard`] borrowing the handle mutably. The guard empties the
//! directory again when dropped, so stale files never survive into the next
//! use, whether the previous use finished, failed, or panicked.

use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths::Layout;

/// Fatal error raised while preparing the working directories.
#[derive(Error, Debug)]
#[error("failed to prepare {}: {source}", .path.display())]
pub struct WorkspaceError {
    /// Directory that could not be created.
    pub path: PathBuf,
    /// Underlying error.
    #[source]
    pub source: io::Error,
}

/// A reusable scratch directory.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create (if needed) the directory at `path` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkspaceError`] if the directory cannot be created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let path = path.into();
        ensure_dir(&path)?;
        Ok(Self { path })
    }

    /// Location of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty the directory and take exclusive use of it until the returned
    /// guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the old contents cannot be removed or the
    /// directory cannot be recreated.
    pub fn acquire(&mut self) -> io::Result<ScratchGuard<'_>> {
        reset_dir(&self.path)?;
        Ok(ScratchGuard { dir: self })
    }
}

/// Exclusive use of a [`ScratchDir`]; the directory is emptied on drop.
#[derive(Debug)]
pub struct ScratchGuard<'a> {
    dir: &'a mut ScratchDir,
}

impl ScratchGuard<'_> {
    /// Location of the directory.
    pub fn path(&self) -> &Path {
        &self.dir.path
    }
}

impl Deref for ScratchGuard<'_> {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.dir.path
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = reset_dir(&self.dir.path) {
            tracing::warn!(dir = %self.dir.path.display(), "failed to clear scratch directory: {e}");
        }
    }
}

/// Remove everything inside `path`, leaving an empty directory behind.
fn reset_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(path)
}

fn ensure_dir(path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path).map_err(|source| WorkspaceError {
        path: path.to_path_buf(),
        source,
    })
}

/// The full set of working directories for one generation run.
///
/// `downloads` and `output` persist between runs; the three scratch
/// directories are emptied on every acquisition.
#[derive(Debug)]
pub struct Workspace {
    /// Downloaded release archives.
    pub downloads: PathBuf,
    /// Extracted target ("new") tree.
    pub baseline: ScratchDir,
    /// Extracted comparison ("old") tree.
    pub comparison: ScratchDir,
    /// Staged delta payload.
    pub staging: ScratchDir,
    /// Packaged outputs awaiting upload.
    pub output: PathBuf,
}

impl Workspace {
    /// Create every directory of `layout` that does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkspaceError`] naming the first directory that could
    /// not be created. This is fatal for a run.
    pub fn create(layout: &Layout) -> Result<Self, WorkspaceError> {
        ensure_dir(&layout.downloads)?;
        ensure_dir(&layout.output)?;

        Ok(Self {
            downloads: layout.downloads.clone(),
            baseline: ScratchDir::create(&layout.baseline)?,
            comparison: ScratchDir::create(&layout.comparison)?,
            staging: ScratchDir::create(&layout.staging)?,
            output: layout.output.clone(),
        })
    }
}
