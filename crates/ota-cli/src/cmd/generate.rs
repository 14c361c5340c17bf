//! Generate command: the end-to-end OTA pipeline
//!
//! verify login → resolve target → download → catalog → generate → publish → summary

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use ota_core::config::FileConfig;
use ota_core::paths::try_ota_home;
use ota_core::release::github::{GithubClient, GithubConfig};
use ota_core::release::{
    PublishOutcome, ReleasePublisher, ReleaseSource, download_releases,
};
use ota_core::{Catalog, Generator, GeneratorConfig, Workspace};
use ota_schema::ArtifactPattern;

use crate::GenerateArgs;
use crate::ui::LogReporter;
use crate::ui::summary::print_summary;

/// Config file picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "ota.toml";

/// Everything a run needs, merged from flags, environment, config file, and defaults.
#[derive(Debug)]
pub struct Settings {
    pub generator: GeneratorConfig,
    pub limit: usize,
    pub tag: Option<String>,
    pub publish: bool,
    /// `None` in offline mode.
    pub github: Option<GithubConfig>,
}

impl Settings {
    /// Merge `args` (flags and environment, already resolved by clap) over `file`.
    pub fn resolve(args: &GenerateArgs, file: &FileConfig) -> Result<Self> {
        let app_name = args
            .app_name
            .clone()
            .or_else(|| file.app.name.clone())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow!("No application name configured (use --app-name or OTA_APP_NAME)"))?;

        let work_root = args
            .work_root
            .clone()
            .or_else(|| file.app.work_root.clone())
            .or_else(try_ota_home)
            .ok_or_else(|| anyhow!("Could not determine a working directory (use --work-root or OTA_HOME)"))?;

        let github = if args.offline {
            None
        } else {
            Some(github_config(args, file)?)
        };

        Ok(Self {
            generator: GeneratorConfig {
                app_name,
                work_root,
                force_regenerate: args.force_regenerate,
            },
            limit: args.limit.unwrap_or_else(|| file.limit_or_default()),
            tag: args.tag.clone(),
            publish: !args.offline && !args.no_publish,
            github,
        })
    }
}

fn github_config(args: &GenerateArgs, file: &FileConfig) -> Result<GithubConfig> {
    let token = args
        .access_token
        .clone()
        .or_else(|| file.github.token.clone())
        .ok_or_else(|| anyhow!("No GitHub token configured (use --access-token or GITHUB_TOKEN)"))?;

    let slug = args
        .repo
        .clone()
        .or_else(|| file.github.repo.clone())
        .ok_or_else(|| anyhow!("No repository configured (use --repo or OTA_REPO)"))?;

    let mut config = GithubConfig::from_slug(&slug, token)
        .ok_or_else(|| anyhow!("Invalid repository '{slug}', expected owner/name"))?;
    if let Some(url) = &file.github.api_url {
        config.api_url.clone_from(url);
    }
    if let Some(url) = &file.github.upload_url {
        config.upload_url.clone_from(url);
    }
    Ok(config)
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => FileConfig::load(path).context("Failed to load configuration"),
        None => FileConfig::load_optional(Path::new(DEFAULT_CONFIG_FILE))
            .context("Failed to load configuration"),
    }
}

/// Run the full pipeline. Exits with failure if any package or upload failed.
pub async fn generate(args: &GenerateArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let file = load_file_config(config_path)?;
    let settings = Settings::resolve(args, &file)?;
    let reporter = LogReporter;

    let workspace = Workspace::create(&settings.generator.layout())
        .context("Failed to prepare working directories")?;
    tracing::debug!(root = %settings.generator.work_root.display(), "workspace ready");

    let client = settings.github.clone().map(GithubClient::new);
    let pattern = ArtifactPattern::new(&settings.generator.app_name);

    let mut target = settings.tag.clone();
    if let Some(client) = &client {
        let login = client.verify().await.context("GitHub login failed")?;
        tracing::info!("Logged in as {login}");

        if target.is_none() {
            target = Some(
                client
                    .latest_tag()
                    .await
                    .context("Failed to resolve the latest release")?,
            );
        }

        let releases = client
            .list_releases(settings.limit)
            .await
            .with_context(|| format!("Failed to list releases of {}", client.key()))?;
        tracing::info!("Found {} release(s)", releases.len());

        let downloads = download_releases(
            client,
            &releases,
            &pattern,
            &workspace.downloads,
            settings.generator.force_regenerate,
            &reporter,
        )
        .await
        .context("Failed to download releases")?;
        tracing::info!(
            "{} downloaded, {} reused, {} failed",
            downloads.downloaded.len(),
            downloads.reused.len(),
            downloads.failed.len()
        );
    }

    let (catalog, rejected) = Catalog::scan(&workspace.downloads, &pattern)
        .with_context(|| format!("Failed to scan {}", workspace.downloads.display()))?;
    tracing::info!(
        "Catalog: {} artifact(s), {} ignored",
        catalog.len(),
        rejected.len()
    );

    let target = match target.or_else(|| catalog.latest_version().map(str::to_string)) {
        Some(t) => t,
        None => bail!("No release artifacts found in {}", workspace.downloads.display()),
    };

    let generator_config = settings.generator.clone();
    let run_target = artifact_version(&catalog, &target);
    let report = tokio::task::spawn_blocking(move || {
        let mut workspace = workspace;
        Generator::new(&generator_config, &mut workspace, &reporter).run(&catalog, &run_target)
    })
    .await
    .context("Generation task panicked")??;

    let mut published: Vec<PublishOutcome> = Vec::new();
    if let (Some(client), true) = (&client, settings.publish) {
        let files: Vec<PathBuf> = report
            .publishable()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();
        if !files.is_empty() {
            tracing::info!("Publishing {} package(s) to {target}", files.len());
            published = client
                .publish(&target, &files, settings.generator.force_regenerate)
                .await
                .with_context(|| format!("Failed to publish to release {target}"))?;
        }
    }

    print_summary(&report, &published).context("Failed to write summary")?;

    let uploads_ok = published.iter().all(|p| p.result.is_ok());
    Ok(if report.is_complete() && uploads_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Version string the artifacts of release `tag` carry in their filenames.
///
/// Tags such as `v1.2.3` commonly label artifacts named `...-1.2.3.zip`; the
/// prefix is dropped only when the catalog has artifacts under the bare
/// version and none under the tag itself.
fn artifact_version(catalog: &Catalog, tag: &str) -> String {
    let bare = tag.trim_start_matches('v');
    if bare != tag
        && catalog.for_version(tag).next().is_none()
        && catalog.for_version(bare).next().is_some()
    {
        bare.to_string()
    } else {
        tag.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_core::config::{AppSection, GithubSection};
    use ota_schema::ReleaseArtifact;

    #[test]
    fn test_artifact_version_strips_v_prefix() {
        let mut catalog = Catalog::new();
        catalog.push(ReleaseArtifact {
            os: "win".to_string(),
            arch: "x64".to_string(),
            version: "1.2.3".to_string(),
            path: PathBuf::from("App-win-x64-1.2.3.zip"),
        });

        assert_eq!(artifact_version(&catalog, "v1.2.3"), "1.2.3");
        assert_eq!(artifact_version(&catalog, "1.2.3"), "1.2.3");
        assert_eq!(artifact_version(&catalog, "v9.9.9"), "v9.9.9");
    }

    fn args() -> GenerateArgs {
        GenerateArgs {
            access_token: None,
            repo: None,
            app_name: None,
            work_root: Some(PathBuf::from("/work")),
            limit: None,
            tag: None,
            force_regenerate: false,
            offline: true,
            no_publish: false,
        }
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            app: AppSection {
                name: Some("FromFile".to_string()),
                work_root: Some(PathBuf::from("/file")),
                limit: Some(3),
            },
            github: GithubSection::default(),
        };
        let mut args = args();
        args.app_name = Some("FromFlag".to_string());

        let settings = Settings::resolve(&args, &file).unwrap();
        assert_eq!(settings.generator.app_name, "FromFlag");
        assert_eq!(settings.generator.work_root, PathBuf::from("/work"));
        assert_eq!(settings.limit, 3);
        assert!(settings.github.is_none());
        assert!(!settings.publish);
    }

    #[test]
    fn test_defaults() {
        let mut args = args();
        args.app_name = Some("App".to_string());

        let settings = Settings::resolve(&args, &FileConfig::default()).unwrap();
        assert_eq!(settings.limit, ota_core::config::DEFAULT_LIMIT);
    }

    #[test]
    fn test_missing_app_name() {
        assert!(Settings::resolve(&args(), &FileConfig::default()).is_err());
    }

    #[test]
    fn test_online_requires_token_and_repo() {
        let mut args = args();
        args.app_name = Some("App".to_string());
        args.offline = false;
        assert!(Settings::resolve(&args, &FileConfig::default()).is_err());

        args.access_token = Some("t".to_string());
        args.repo = Some("acme/app".to_string());
        let settings = Settings::resolve(&args, &FileConfig::default()).unwrap();
        let github = settings.github.unwrap();
        assert_eq!(github.owner, "acme");
        assert_eq!(github.repo, "app");
        assert!(settings.publish);
    }

    #[test]
    fn test_file_overrides_api_urls() {
        let mut args = args();
        args.app_name = Some("App".to_string());
        args.offline = false;
        let file = FileConfig {
            app: AppSection::default(),
            github: GithubSection {
                repo: Some("acme/app".to_string()),
                token: Some("t".to_string()),
                api_url: Some("https://ghe.example.com/api/v3".to_string()),
                upload_url: None,
            },
        };

        let github = Settings::resolve(&args, &file).unwrap().github.unwrap();
        assert_eq!(github.api_url, "https://ghe.example.com/api/v3");
    }
}
