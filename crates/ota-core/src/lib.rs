//! Core library for ota-gen.
//!
//! Builds incremental ("OTA") update packages from previously published
//! full-release archives. Given the extracted trees of two versions for the
//! same os/arch, the [`diff`] module computes the files that changed or were
//! added, and the [`generate`] module packs them into a delta archive next to
//! a full archive of the target version.
//!
//! # Directory Layout
//!
//! ```text
//! <work_root>/
//! ├── downloads/     # Release archives fetched from the hosting platform
//! ├── extract/new/   # Extracted target ("new") tree
//! ├── extract/old/   # Extracted comparison ("old") tree
//! ├── delta/         # Staged delta payload
//! └── release/       # Packaged outputs, ready to publish
//! ```

pub mod catalog;
pub mod checksum;
#[cfg(feature = "parsing")]
pub mod config;
pub mod diff;
pub mod generate;
pub mod io;
pub mod paths;
pub mod release;
pub mod reporter;
pub mod workdir;

pub use catalog::Catalog;
pub use checksum::file_checksum;
pub use diff::{ChangeKind, DeltaFileSet, diff_trees};
pub use generate::{
    GenerateError, Generator, GeneratorConfig, PackageOutcome, PackageStatus, RunReport,
};
pub use reporter::{NullReporter, Reporter};
pub use workdir::{ScratchDir, ScratchGuard, Workspace, WorkspaceError};

/// User Agent string for outbound HTTP requests
pub const USER_AGENT: &str = concat!("ota-gen/", env!("CARGO_PKG_VERSION"));
