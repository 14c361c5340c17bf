//! Checksum command

use anyhow::{Context, Result};
use ota_core::file_checksum;
use std::path::PathBuf;

/// Print `<checksum>  <path>` for each file, in argument order
pub fn checksum(files: &[PathBuf]) -> Result<()> {
    for path in files {
        let sum = file_checksum(path)
            .with_context(|| format!("Failed to checksum {}", path.display()))?;
        println!("{sum}  {}", path.display());
    }
    Ok(())
}
