//! Diff command

use anyhow::{Context, Result, bail};
use ota_core::io::archive::extract_zip;
use ota_core::{ChangeKind, diff_trees};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A tree on disk: either a directory given directly, or a zip archive
/// extracted into a temporary directory that lives as long as this value.
struct Tree {
    root: PathBuf,
    _scratch: Option<TempDir>,
}

impl Tree {
    fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(Self {
                root: path.to_path_buf(),
                _scratch: None,
            });
        }
        if !path.is_file() {
            bail!("{} does not exist", path.display());
        }

        let scratch = TempDir::new().context("Failed to create temporary directory")?;
        extract_zip(path, scratch.path())
            .with_context(|| format!("Failed to extract {}", path.display()))?;
        Ok(Self {
            root: scratch.path().to_path_buf(),
            _scratch: Some(scratch),
        })
    }
}

/// Print the files added (`A`) or modified (`M`) going from `old` to `new`
pub fn diff(old: &Path, new: &Path) -> Result<()> {
    let old_tree = Tree::open(old)?;
    let new_tree = Tree::open(new)?;

    let delta = diff_trees(&old_tree.root, &new_tree.root)
        .with_context(|| format!("Failed to compare {} and {}", old.display(), new.display()))?;

    for (path, kind) in delta.iter() {
        let marker = match kind {
            ChangeKind::Added => 'A',
            ChangeKind::Modified => 'M',
        };
        println!("{marker} {}", path.display());
    }

    println!(
        "{} added, {} modified, {} unchanged",
        delta.count(ChangeKind::Added),
        delta.count(ChangeKind::Modified),
        delta.unchanged()
    );
    Ok(())
}
