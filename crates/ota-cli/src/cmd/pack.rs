//! Pack command

use anyhow::{Context, Result, bail};
use ota_core::io::archive::pack_dir;
use std::path::Path;

/// Pack every regular file under `dir` into `archive`
pub fn pack(dir: &Path, archive: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let count = pack_dir(dir, archive)
        .with_context(|| format!("Failed to pack {} into {}", dir.display(), archive.display()))?;

    println!(
        "Packed {count} file{} into {}",
        if count == 1 { "" } else { "s" },
        archive.display()
    );
    Ok(())
}
