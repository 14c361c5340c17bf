//! Zip archive primitives.
//!
//! [`extract_zip`] unpacks a release archive into a directory and
//! [`pack_dir`] writes a directory tree back out as a zip whose entry names
//! are forward-slash paths relative to the packed root.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::write::SimpleFileOptions;

/// Errors raised while reading or writing zip archives.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Filesystem failure on the archive or the tree being packed/extracted.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive is malformed or could not be encoded.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The source tree could not be traversed.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// An entry name would land outside the target directory.
    #[error("Invalid path in archive: {0}")]
    UnsafePath(String),
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
}

/// Extract a zip archive into `dest_dir`, preserving its directory structure.
///
/// # Errors
///
/// Fails if the archive is malformed, an entry would escape `dest_dir`, or
/// the destination is not writable.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<ExtractedFile>, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative_path = match entry.enclosed_name() {
            Some(path) => path.to_owned(),
            None => return Err(ArchiveError::UnsafePath(entry.name().to_string())),
        };

        let absolute_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }

        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
        }

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
        });
    }

    tracing::debug!(
        archive = %archive_path.display(),
        files = extracted_files.len(),
        "extracted"
    );
    Ok(extracted_files)
}

/// Archive entry name for a path relative to the packed root.
///
/// Components are joined with `/` regardless of the host separator.
///
/// # Errors
///
/// Rejects absolute paths, `..` components, and non-UTF-8 names.
pub fn entry_name(relative_path: &Path) -> Result<String, ArchiveError> {
    let mut parts = Vec::new();
    for component in relative_path.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| ArchiveError::UnsafePath(relative_path.display().to_string()))?,
            ),
            Component::CurDir => {}
            _ => return Err(ArchiveError::UnsafePath(relative_path.display().to_string())),
        }
    }
    Ok(parts.join("/"))
}

/// Pack every regular file under `source_dir` into a new zip at `archive_path`.
///
/// Entries are written in lexicographic path order with a fixed timestamp,
/// so packing the same contents twice yields the same entries. An empty
/// directory produces a valid archive with no entries. The archive is
/// written next to its destination and renamed into place once complete.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// Fails if `source_dir` cannot be walked, a file cannot be read, or the
/// archive cannot be written.
pub fn pack_dir(source_dir: &Path, archive_path: &Path) -> Result<usize, ArchiveError> {
    let parent = archive_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let tmp = tempfile::Builder::new()
        .prefix(".pack-")
        .suffix(".zip.part")
        .tempfile_in(parent)?;
    let mut zip = zip::ZipWriter::new(tmp);

    let base_options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .large_file(false);

    let mut count = 0;
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative_path = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| ArchiveError::UnsafePath(entry.path().display().to_string()))?;
        let name = entry_name(relative_path)?;

        let metadata = entry.metadata()?;
        let options = file_options(base_options, &metadata);

        zip.start_file(name, options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut zip)?;
        count += 1;
    }

    let tmp = zip.finish()?;
    tmp.persist(archive_path).map_err(|e| ArchiveError::Io(e.error))?;

    tracing::debug!(archive = %archive_path.display(), entries = count, "packed");
    Ok(count)
}

fn file_options(base: SimpleFileOptions, metadata: &fs::Metadata) -> SimpleFileOptions {
    let options = base.large_file(metadata.len() >= u64::from(u32::MAX));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode() & 0o7777)
    }
    #[cfg(not(unix))]
    {
        options
    }
}

/// List the entry names of a zip archive, in archive order.
///
/// # Errors
///
/// Fails if the archive cannot be opened or parsed.
pub fn list_entries(archive_path: &Path) -> Result<Vec<String>, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        names.push(archive.by_index_raw(i)?.name().to_string());
    }
    Ok(names)
}

/// Copy `relative_paths` from `src_root` into `dest_root`, creating
/// intermediate directories as needed.
///
/// # Errors
///
/// Fails on the first file that cannot be copied.
pub fn copy_tree_subset<'a, I>(src_root: &Path, dest_root: &Path, relative_paths: I) -> io::Result<usize>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut count = 0;
    for rel in relative_paths {
        let dest = dest_root.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src_root.join(rel), &dest)?;
        count += 1;
    }
    Ok(count)
}

/// Copy `src` to `dest` through a temporary file in `dest`'s directory, so
/// `dest` is either absent or complete.
///
/// # Errors
///
/// Fails if `src` cannot be read or `dest` cannot be written.
pub fn copy_file_atomic(src: &Path, dest: &Path) -> io::Result<u64> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".copy-")
        .suffix(".part")
        .tempfile_in(parent)?;
    let mut input = File::open(src)?;
    let bytes = io::copy(&mut input, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(bytes)
}
