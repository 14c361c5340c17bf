//! ota-gen - OTA package generator
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Downloads the most recent full-release archives of an application from
//! GitHub, builds a full package and one delta package per older version for
//! the target release, and uploads them back to that release.
//!
//! # Pipeline
//!
//! verify login → resolve target → download → catalog → generate → publish → summary
//!
//! With `--offline`, the network steps are skipped and the archives already
//! present in `<work_root>/downloads` are used.

pub mod cmd;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ota-gen")]
#[command(author, version = env!("OTA_VERSION"), about = "Build full and incremental update packages")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML with [app] and [github] sections)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate full and delta packages for a release
    Generate(GenerateArgs),
    /// Show files added or modified between two trees (directories or zip archives)
    Diff {
        /// Older tree
        old: PathBuf,
        /// Newer tree
        new: PathBuf,
    },
    /// Pack a directory into a zip archive
    Pack {
        /// Directory to pack
        dir: PathBuf,
        /// Archive to write
        archive: PathBuf,
    },
    /// Print the checksum of one or more files
    Checksum {
        /// Files to checksum
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// GitHub access token
    #[arg(short = 'a', long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// GitHub repository (owner/name)
    #[arg(short, long, env = "OTA_REPO")]
    pub repo: Option<String>,

    /// Application name used in artifact filenames (Name-<os>-<arch>-<version>.zip)
    #[arg(short = 'n', long, env = "OTA_APP_NAME")]
    pub app_name: Option<String>,

    /// Working directory root
    #[arg(short, long, env = "OTA_HOME", value_name = "DIR")]
    pub work_root: Option<PathBuf>,

    /// Number of recent releases to download
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Target release tag (defaults to the latest release)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Rebuild existing packages and replace published assets
    #[arg(short, long)]
    pub force_regenerate: bool,

    /// Use only the archives already in the downloads directory; do not contact GitHub
    #[arg(long)]
    pub offline: bool,

    /// Generate packages but do not upload them
    #[arg(long)]
    pub no_publish: bool,
}
