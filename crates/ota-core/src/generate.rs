//! OTA package generation.
//!
//! For a fixed target version `T`, every catalog artifact at `T` yields:
//!
//! 1. a full package: a verbatim copy of the artifact under its full name;
//! 2. one delta package per other version of the same os/arch, holding the
//!    files that were added or modified going from that version to `T`.
//!
//! The target tree is extracted once per target artifact and reused for all
//! of its comparisons; the comparison tree and the delta payload are
//! extracted/staged fresh for every pair. Each package is an independent
//! unit: a failure is recorded in its [`PackageOutcome`] and the run moves on
//! to the next unit.

use std::io;
use std::path::{Path, PathBuf};

use ota_schema::{PackageKind, PackageNaming, Platform, ReleaseArtifact};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::diff::{DiffError, diff_trees};
use crate::io::archive::{ArchiveError, copy_file_atomic, extract_zip, pack_dir};
use crate::paths::Layout;
use crate::reporter::Reporter;
use crate::workdir::{ScratchDir, Workspace};

/// Errors produced while generating packages.
///
/// [`GenerateError::NoTargetArtifacts`] aborts a run; every other variant is
/// attached to the single package it affected.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The catalog holds no artifact for the target version.
    #[error("no artifacts found for target version {0}")]
    NoTargetArtifacts(String),

    /// A release archive could not be extracted.
    #[error("failed to extract {}: {source}", .path.display())]
    Extract {
        /// Archive being extracted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ArchiveError,
    },

    /// The target tree could not be extracted, so no delta against it can be built.
    #[error("target {version} unavailable: {reason}")]
    BaselineUnavailable {
        /// Target version.
        version: String,
        /// Why extraction failed.
        reason: String,
    },

    /// The two trees could not be compared.
    #[error("failed to diff {from} against target: {source}")]
    Diff {
        /// Comparison version.
        from: String,
        /// Underlying error.
        #[source]
        source: DiffError,
    },

    /// Changed files could not be copied into the staging directory.
    #[error("failed to stage delta payload: {0}")]
    Stage(#[source] io::Error),

    /// The output archive could not be written.
    #[error("failed to pack {}: {source}", .path.display())]
    Pack {
        /// Archive being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ArchiveError,
    },

    /// The full package could not be copied into the output directory.
    #[error("failed to copy {}: {source}", .path.display())]
    Copy {
        /// Destination of the copy.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A scratch directory could not be cleared.
    #[error("working directory unavailable: {0}")]
    Scratch(#[source] io::Error),
}

/// Settings for a generation run, built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Application name used in artifact and package filenames.
    pub app_name: String,
    /// Root of the working directory layout.
    pub work_root: PathBuf,
    /// Rebuild packages whose output file already exists.
    pub force_regenerate: bool,
}

impl GeneratorConfig {
    /// Directory layout under [`GeneratorConfig::work_root`].
    pub fn layout(&self) -> Layout {
        Layout::new(&self.work_root)
    }
}

/// What happened to a package that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    /// The package was written by this run. Delta packages report the
    /// number of files they carry.
    Built {
        /// Number of files in a delta package; `None` for full packages.
        files: Option<usize>,
    },
    /// The output already existed and regeneration was not forced.
    Existing,
}

/// Result of one package unit.
#[derive(Debug)]
pub struct PackageOutcome {
    /// Platform of the package.
    pub platform: Platform,
    /// Full or delta (with its source version).
    pub kind: PackageKind,
    /// Target version.
    pub version: String,
    /// Output filename.
    pub file_name: String,
    /// Output location.
    pub path: PathBuf,
    /// Status on success, or the error that aborted this unit.
    pub result: Result<PackageStatus, GenerateError>,
}

impl PackageOutcome {
    /// Whether the package is available in the output directory.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every package outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    /// Target version of the run.
    pub target: String,
    /// One entry per full or delta package, in processing order.
    pub outcomes: Vec<PackageOutcome>,
}

impl RunReport {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            outcomes: Vec::new(),
        }
    }

    /// Outcomes that produced (or kept) a package.
    pub fn succeeded(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes.iter().filter(|o| o.is_ok())
    }

    /// Outcomes that failed.
    pub fn failed(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// Whether every unit succeeded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(PackageOutcome::is_ok)
    }

    /// Paths of every package available for publishing.
    pub fn publishable(&self) -> Vec<&Path> {
        self.succeeded().map(|o| o.path.as_path()).collect()
    }
}

/// Drives extraction, diffing, and packaging for one target version.
pub struct Generator<'a, R: Reporter + ?Sized> {
    config: &'a GeneratorConfig,
    naming: PackageNaming,
    workspace: &'a mut Workspace,
    reporter: &'a R,
}

impl<R: Reporter + ?Sized> std::fmt::Debug for Generator<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

impl<'a, R: Reporter + ?Sized> Generator<'a, R> {
    /// Create a generator writing through `workspace`.
    pub fn new(config: &'a GeneratorConfig, workspace: &'a mut Workspace, reporter: &'a R) -> Self {
        Self {
            config,
            naming: PackageNaming::new(&config.app_name),
            workspace,
            reporter,
        }
    }

    /// Produce the full and delta packages for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::NoTargetArtifacts`] if the catalog has no
    /// artifact at `target`. Failures of individual packages are reported in
    /// the returned [`RunReport`] instead.
    pub fn run(&mut self, catalog: &Catalog, target: &str) -> Result<RunReport, GenerateError> {
        let targets: Vec<&ReleaseArtifact> = catalog.for_version(target).collect();
        if targets.is_empty() {
            return Err(GenerateError::NoTargetArtifacts(target.to_string()));
        }

        self.reporter.section(&format!(
            "Generating packages for {target} ({} platform{})",
            targets.len(),
            if targets.len() == 1 { "" } else { "s" }
        ));

        let mut report = RunReport::new(target);
        for item in targets {
            let full = self.full_package(item);
            self.record(&mut report, full);
            self.delta_packages(catalog, item, &mut report);
        }

        Ok(report)
    }

    fn full_package(&self, item: &ReleaseArtifact) -> PackageOutcome {
        let file_name = self.naming.full_name(&item.version, &item.os, &item.arch);
        let path = self.workspace.output.join(&file_name);

        let result = if path.exists() && !self.config.force_regenerate {
            Ok(PackageStatus::Existing)
        } else {
            copy_file_atomic(&item.path, &path)
                .map(|_| PackageStatus::Built { files: None })
                .map_err(|source| GenerateError::Copy {
                    path: path.clone(),
                    source,
                })
        };

        PackageOutcome {
            platform: item.platform(),
            kind: PackageKind::Full,
            version: item.version.clone(),
            file_name,
            path,
            result,
        }
    }

    fn delta_packages(&mut self, catalog: &Catalog, item: &ReleaseArtifact, report: &mut RunReport) {
        let mut pending = Vec::new();
        for other in catalog.comparisons(item) {
            let outcome = self.delta_outcome(item, other);
            if outcome.path.exists() && !self.config.force_regenerate {
                self.record(report, PackageOutcome {
                    result: Ok(PackageStatus::Existing),
                    ..outcome
                });
            } else {
                pending.push((other, outcome));
            }
        }

        if pending.is_empty() {
            return;
        }

        let reporter = self.reporter;
        let Workspace {
            baseline,
            comparison,
            staging,
            ..
        } = &mut *self.workspace;

        reporter.extracting(item);
        let new_tree = match baseline.acquire() {
            Ok(guard) => match extract_zip(&item.path, &guard) {
                Ok(_) => Ok(guard),
                Err(e) => Err(e.to_string()),
            },
            Err(e) => Err(e.to_string()),
        };

        for (other, mut outcome) in pending {
            outcome.result = match &new_tree {
                Ok(new_root) => {
                    reporter.diffing(&outcome.platform, &other.version, &item.version);
                    reporter.extracting(other);
                    build_delta(new_root, other, comparison, staging, &outcome.path)
                }
                Err(reason) => Err(GenerateError::BaselineUnavailable {
                    version: item.version.clone(),
                    reason: reason.clone(),
                }),
            };
            record_outcome(reporter, report, outcome);
        }
    }

    fn delta_outcome(&self, item: &ReleaseArtifact, other: &ReleaseArtifact) -> PackageOutcome {
        let file_name = self
            .naming
            .delta_name(&other.version, &item.version, &item.os, &item.arch);
        PackageOutcome {
            platform: item.platform(),
            kind: PackageKind::Delta {
                from: other.version.clone(),
            },
            version: item.version.clone(),
            path: self.workspace.output.join(&file_name),
            file_name,
            result: Ok(PackageStatus::Existing),
        }
    }

    fn record(&self, report: &mut RunReport, outcome: PackageOutcome) {
        record_outcome(self.reporter, report, outcome);
    }
}

/// Extract `other`, diff it against the already-extracted target tree, and
/// pack the changed files into `archive_path`.
fn build_delta(
    new_root: &Path,
    other: &ReleaseArtifact,
    comparison: &mut ScratchDir,
    staging: &mut ScratchDir,
    archive_path: &Path,
) -> Result<PackageStatus, GenerateError> {
    let old_tree = comparison.acquire().map_err(GenerateError::Scratch)?;
    let payload = staging.acquire().map_err(GenerateError::Scratch)?;

    extract_zip(&other.path, &old_tree).map_err(|source| GenerateError::Extract {
        path: other.path.clone(),
        source,
    })?;

    let delta = diff_trees(&old_tree, new_root).map_err(|source| GenerateError::Diff {
        from: other.version.clone(),
        source,
    })?;
    tracing::debug!(
        from = %other.version,
        changed = delta.len(),
        unchanged = delta.unchanged(),
        "computed delta"
    );

    delta
        .stage(new_root, &payload)
        .map_err(GenerateError::Stage)?;

    let files = pack_dir(&payload, archive_path).map_err(|source| GenerateError::Pack {
        path: archive_path.to_path_buf(),
        source,
    })?;

    Ok(PackageStatus::Built { files: Some(files) })
}

fn record_outcome<R: Reporter + ?Sized>(reporter: &R, report: &mut RunReport, outcome: PackageOutcome) {
    match &outcome.result {
        Ok(PackageStatus::Built { files: Some(n) }) => {
            reporter.done(&outcome.file_name, &format!("{n} file{}", if *n == 1 { "" } else { "s" }));
        }
        Ok(PackageStatus::Built { files: None }) => {
            reporter.done(&outcome.file_name, "full copy");
        }
        Ok(PackageStatus::Existing) => {
            reporter.skipped(&outcome.file_name, "already exists");
        }
        Err(e) => {
            reporter.failed(&outcome.file_name, &e.to_string());
        }
    }
    report.outcomes.push(outcome);
}
