//! Release hosting collaborator.
//!
//! [`ReleaseSource`] lists and downloads published full-release archives;
//! [`ReleasePublisher`] uploads generated packages to a release. The GitHub
//! implementation lives in [`github`] behind the `network` feature.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ota_schema::ArtifactPattern;
use thiserror::Error;

use crate::reporter::Reporter;

#[cfg(feature = "network")]
pub mod github;

/// Errors raised by a release source or publisher.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Transport-level HTTP failure.
    #[cfg(feature = "network")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local filesystem failure while downloading or uploading.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The token was rejected.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// The release or asset does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A download ended with a different byte count than the release lists.
    #[error("incomplete download of {name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Asset name.
        name: String,
        /// Size reported by the release.
        expected: u64,
        /// Bytes actually written.
        actual: u64,
    },

    /// Any other non-success API response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message reported by the API.
        message: String,
    },
}

/// A published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release tag; also the version of the artifacts it carries.
    pub tag_name: String,
    /// Attached files.
    pub assets: Vec<AssetInfo>,
}

/// A file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Platform-assigned asset id.
    pub id: u64,
    /// Asset filename.
    pub name: String,
    /// Size in bytes, or 0 when unknown.
    pub size: u64,
}

/// A remote source of published releases (e.g. GitHub).
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Identifier for this source (e.g. "github:owner/repo").
    fn key(&self) -> String;

    /// Authenticate and return the login name.
    async fn verify(&self) -> Result<String, ReleaseError>;

    /// Tag of the most recent published release.
    async fn latest_tag(&self) -> Result<String, ReleaseError>;

    /// The `limit` most recent releases, newest first.
    async fn list_releases(&self, limit: usize) -> Result<Vec<ReleaseInfo>, ReleaseError>;

    /// Download `asset` to `dest`, returning the number of bytes written.
    async fn download_asset(&self, asset: &AssetInfo, dest: &Path) -> Result<u64, ReleaseError>;
}

/// What happened to one file handed to [`ReleasePublisher::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// Uploaded as a new asset.
    Uploaded,
    /// An asset with the same name was deleted and the file uploaded again.
    Replaced,
    /// An asset with the same name already exists and was kept.
    Skipped,
}

/// Result of publishing one file.
#[derive(Debug)]
pub struct PublishOutcome {
    /// Asset name.
    pub name: String,
    /// Status on success, or the error for this file.
    pub result: Result<UploadStatus, ReleaseError>,
}

/// A destination that accepts generated packages.
#[async_trait]
pub trait ReleasePublisher: Send + Sync {
    /// Attach `files` to the release tagged `tag`.
    ///
    /// Files whose name already exists on the release are skipped unless
    /// `replace` is set. Per-file failures are returned in the outcomes;
    /// failing to find the release is an error for the whole call.
    async fn publish(
        &self,
        tag: &str,
        files: &[PathBuf],
        replace: bool,
    ) -> Result<Vec<PublishOutcome>, ReleaseError>;
}

/// Files produced by [`download_releases`].
#[derive(Debug, Default)]
pub struct DownloadSummary {
    /// Assets fetched by this call.
    pub downloaded: Vec<PathBuf>,
    /// Assets already present and reused.
    pub reused: Vec<PathBuf>,
    /// Assets that could not be fetched, with the reason.
    pub failed: Vec<(String, String)>,
}

impl DownloadSummary {
    /// Every archive now available locally.
    pub fn available(&self) -> impl Iterator<Item = &Path> {
        self.downloaded
            .iter()
            .chain(&self.reused)
            .map(PathBuf::as_path)
    }
}

/// Download the release artifacts of `releases` into `dest_dir`.
///
/// Only assets whose name `pattern` accepts are fetched, so packages
/// published by earlier runs are left on the server. Files already present
/// are reused unless `force` is set. Each download is written to a `.part`
/// file and renamed once complete. A failed asset is reported and skipped;
/// the remaining assets are still fetched.
///
/// # Errors
///
/// Returns an I/O error only if `dest_dir` cannot be created.
pub async fn download_releases<S, R>(
    source: &S,
    releases: &[ReleaseInfo],
    pattern: &ArtifactPattern,
    dest_dir: &Path,
    force: bool,
    reporter: &R,
) -> Result<DownloadSummary, ReleaseError>
where
    S: ReleaseSource + ?Sized,
    R: Reporter + ?Sized,
{
    tokio::fs::create_dir_all(dest_dir).await?;
    let mut summary = DownloadSummary::default();

    for release in releases {
        for asset in &release.assets {
            if let Err(e) = pattern.parse(&asset.name) {
                tracing::debug!(asset = %asset.name, reason = %e, "not a release artifact");
                continue;
            }
            let Some(dest) = asset_destination(dest_dir, &asset.name) else {
                reporter.warning(&format!("ignoring asset with unsafe name: {}", asset.name));
                continue;
            };

            if !force && tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                tracing::debug!(asset = %asset.name, "already downloaded");
                summary.reused.push(dest);
                continue;
            }

            reporter.info(&format!("Downloading {} ({})", asset.name, release.tag_name));
            let part = dest_dir.join(format!("{}.part", asset.name));
            let result = match source.download_asset(asset, &part).await {
                Ok(bytes) if asset.size != 0 && bytes != asset.size => {
                    Err(ReleaseError::SizeMismatch {
                        name: asset.name.clone(),
                        expected: asset.size,
                        actual: bytes,
                    })
                }
                Ok(bytes) => tokio::fs::rename(&part, &dest)
                    .await
                    .map(|()| bytes)
                    .map_err(ReleaseError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(bytes) => {
                    tracing::debug!(asset = %asset.name, bytes, "downloaded");
                    summary.downloaded.push(dest);
                }
                Err(e) => {
                    tokio::fs::remove_file(&part).await.ok();
                    reporter.warning(&format!("failed to download {}: {e}", asset.name));
                    summary.failed.push((asset.name.clone(), e.to_string()));
                }
            }
        }
    }

    Ok(summary)
}

/// `dest_dir/name`, provided `name` is a plain filename.
fn asset_destination(dest_dir: &Path, name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Some(dest_dir.join(path)),
        _ => None,
    }
}
