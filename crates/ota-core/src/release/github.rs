//! GitHub Releases over the REST API.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use super::{
    AssetInfo, PublishOutcome, ReleaseError, ReleaseInfo, ReleasePublisher, ReleaseSource,
    UploadStatus,
};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Public GitHub asset upload endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.github.com";

const API_VERSION: &str = "2022-11-28";
const MAX_PER_PAGE: usize = 100;

/// Connection settings for one repository.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubConfig {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Access token sent as a bearer token.
    pub token: String,
    /// REST API base URL.
    pub api_url: String,
    /// Asset upload base URL.
    pub upload_url: String,
}

impl GithubConfig {
    /// Settings for the public GitHub endpoints.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
        }
    }

    /// Parse an `owner/repo` slug.
    pub fn from_slug(slug: &str, token: impl Into<String>) -> Option<Self> {
        let (owner, repo) = slug.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self::new(owner, repo, token))
    }

    /// Point both the API and upload URLs at `base` (used for mock servers
    /// and GitHub Enterprise installs that serve both from one host).
    pub fn with_base_url(mut self, base: &str) -> Self {
        self.api_url = base.trim_end_matches('/').to_string();
        self.upload_url = self.api_url.clone();
        self
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    id: u64,
    tag_name: String,
    #[serde(default)]
    assets: Vec<GhAsset>,
}

#[derive(Debug, Deserialize)]
struct GhAsset {
    id: u64,
    name: String,
    #[serde(default)]
    size: u64,
}

impl From<GhAsset> for AssetInfo {
    fn from(a: GhAsset) -> Self {
        Self {
            id: a.id,
            name: a.name,
            size: a.size,
        }
    }
}

impl From<GhRelease> for ReleaseInfo {
    fn from(r: GhRelease) -> Self {
        Self {
            tag_name: r.tag_name,
            assets: r.assets.into_iter().map(AssetInfo::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhErrorBody {
    message: String,
}

/// Client for one GitHub repository's releases.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    config: GithubConfig,
}

impl GithubClient {
    /// Create a client.
    pub fn new(config: GithubConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.request_accepting(method, url, "application/vnd.github+json")
    }

    fn request_accepting(&self, method: Method, url: &str, accept: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(header::USER_AGENT, crate::USER_AGENT)
            .header(header::ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(&self.config.token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ReleaseError> {
        let resp = self.request(Method::GET, url).send().await?;
        Ok(check(resp, url).await?.json().await?)
    }

    async fn release_by_tag(&self, tag: &str) -> Result<GhRelease, ReleaseError> {
        let url = format!("{}/releases/tags/{tag}", self.config.repo_url());
        self.get_json(&url).await
    }

    async fn delete_asset(&self, id: u64) -> Result<(), ReleaseError> {
        let url = format!("{}/releases/assets/{id}", self.config.repo_url());
        let resp = self.request(Method::DELETE, &url).send().await?;
        check(resp, &url).await?;
        Ok(())
    }

    async fn upload_asset(&self, release_id: u64, name: &str, path: &Path) -> Result<(), ReleaseError> {
        let url = format!(
            "{}/repos/{}/{}/releases/{release_id}/assets",
            self.config.upload_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo
        );

        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let resp = self
            .request(Method::POST, &url)
            .query(&[("name", name)])
            .header(header::CONTENT_TYPE, "application/zip")
            .header(header::CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;
        check(resp, &url).await?;

        tracing::debug!(asset = name, bytes = len, "uploaded");
        Ok(())
    }
}

/// Pass successful responses through; map failures to [`ReleaseError`]
/// using the API's `message` field when present.
async fn check(resp: Response, what: &str) -> Result<Response, ReleaseError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GhErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReleaseError::Unauthorized(message),
        StatusCode::NOT_FOUND => ReleaseError::NotFound(what.to_string()),
        _ => ReleaseError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl ReleaseSource for GithubClient {
    fn key(&self) -> String {
        format!("github:{}/{}", self.config.owner, self.config.repo)
    }

    async fn verify(&self) -> Result<String, ReleaseError> {
        let url = format!("{}/user", self.config.api_url.trim_end_matches('/'));
        let user: GhUser = self.get_json(&url).await?;
        Ok(user.login)
    }

    async fn latest_tag(&self) -> Result<String, ReleaseError> {
        let url = format!("{}/releases/latest", self.config.repo_url());
        let release: GhRelease = self.get_json(&url).await?;
        Ok(release.tag_name)
    }

    async fn list_releases(&self, limit: usize) -> Result<Vec<ReleaseInfo>, ReleaseError> {
        let per_page = limit.clamp(1, MAX_PER_PAGE);
        let url = format!("{}/releases", self.config.repo_url());
        let mut releases = Vec::new();
        let mut page = 1usize;

        while releases.len() < limit {
            let resp = self
                .request(Method::GET, &url)
                .query(&[("per_page", per_page), ("page", page)])
                .send()
                .await?;
            let batch: Vec<GhRelease> = check(resp, &url).await?.json().await?;
            let exhausted = batch.len() < per_page;
            releases.extend(batch.into_iter().map(ReleaseInfo::from));
            if exhausted {
                break;
            }
            page += 1;
        }

        releases.truncate(limit);
        Ok(releases)
    }

    async fn download_asset(&self, asset: &AssetInfo, dest: &Path) -> Result<u64, ReleaseError> {
        let url = format!("{}/releases/assets/{}", self.config.repo_url(), asset.id);
        let resp = self
            .request_accepting(Method::GET, &url, "application/octet-stream")
            .send()
            .await?;
        let resp = check(resp, &url).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl ReleasePublisher for GithubClient {
    async fn publish(
        &self,
        tag: &str,
        files: &[PathBuf],
        replace: bool,
    ) -> Result<Vec<PublishOutcome>, ReleaseError> {
        let release = self.release_by_tag(tag).await?;
        let mut outcomes = Vec::with_capacity(files.len());

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let existing = release.assets.iter().find(|a| a.name == name);

            let result = match existing {
                Some(_) if !replace => Ok(UploadStatus::Skipped),
                Some(asset) => match self.delete_asset(asset.id).await {
                    Ok(()) => self
                        .upload_asset(release.id, &name, path)
                        .await
                        .map(|()| UploadStatus::Replaced),
                    Err(e) => Err(e),
                },
                None => self
                    .upload_asset(release.id, &name, path)
                    .await
                    .map(|()| UploadStatus::Uploaded),
            };

            outcomes.push(PublishOutcome { name, result });
        }

        Ok(outcomes)
    }
}
