//! End-to-end package generation over real zip archives.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use ota_core::io::archive::list_entries;
use ota_core::{
    Catalog, GenerateError, Generator, GeneratorConfig, NullReporter, PackageStatus, RunReport,
    Workspace,
};
use ota_schema::{ArtifactPattern, PackageKind};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

struct Fixture {
    _root: TempDir,
    config: GeneratorConfig,
    workspace: Workspace,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = GeneratorConfig {
            app_name: "App".to_string(),
            work_root: root.path().join("work"),
            force_regenerate: false,
        };
        let workspace = Workspace::create(&config.layout()).unwrap();
        Self {
            _root: root,
            config,
            workspace,
        }
    }

    /// Write a release archive named `App-<os>-<arch>-<version>.zip` into downloads.
    fn release(&self, os: &str, arch: &str, version: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = self
            .workspace
            .downloads
            .join(format!("App-{os}-{arch}-{version}.zip"));
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        for (name, contents) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn corrupt(&self, os: &str, arch: &str, version: &str) {
        let path = self
            .workspace
            .downloads
            .join(format!("App-{os}-{arch}-{version}.zip"));
        fs::write(path, b"this is not a zip archive").unwrap();
    }

    fn catalog(&self) -> Catalog {
        let (catalog, _) =
            Catalog::scan(&self.workspace.downloads, &ArtifactPattern::new("App")).unwrap();
        catalog
    }

    fn run(&mut self, target: &str) -> Result<RunReport, GenerateError> {
        let catalog = self.catalog();
        Generator::new(&self.config, &mut self.workspace, &NullReporter).run(&catalog, target)
    }

    fn output(&self, name: &str) -> PathBuf {
        self.workspace.output.join(name)
    }
}

fn entries(path: &Path) -> BTreeSet<String> {
    list_entries(path).unwrap().into_iter().collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn test_full_and_delta_packages_for_target() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.2.0", &[("a.txt", "1"), ("b.txt", "x")]);
    fx.release("win", "x64", "1.2.2", &[("a.txt", "1"), ("b.txt", "x2")]);
    let target = fx.release(
        "win",
        "x64",
        "1.2.3",
        &[("a.txt", "1"), ("b.txt", "y"), ("data/c.txt", "z")],
    );

    let report = fx.run("1.2.3").unwrap();

    assert!(report.is_complete());
    assert_eq!(report.outcomes.len(), 3);

    let full = fx.output("App_FULL-win-x64-1.2.3.zip");
    assert_eq!(fs::read(&full).unwrap(), fs::read(&target).unwrap());

    let from_120 = fx.output("App_OTA-win-x64-1.2.0..1.2.3.zip");
    let from_122 = fx.output("App_OTA-win-x64-1.2.2..1.2.3.zip");
    assert_eq!(entries(&from_120), set(&["b.txt", "data/c.txt"]));
    assert_eq!(entries(&from_122), set(&["b.txt", "data/c.txt"]));

    let kinds: Vec<_> = report.outcomes.iter().map(|o| o.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            PackageKind::Full,
            PackageKind::Delta {
                from: "1.2.0".to_string()
            },
            PackageKind::Delta {
                from: "1.2.2".to_string()
            },
        ]
    );

    assert!(dir_is_empty(fx.workspace.baseline.path()));
    assert!(dir_is_empty(fx.workspace.comparison.path()));
    assert!(dir_is_empty(fx.workspace.staging.path()));
}

#[test]
fn test_platforms_are_independent() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.0.0", &[("app.exe", "old")]);
    fx.release("win", "x64", "1.1.0", &[("app.exe", "new")]);
    fx.release("mac", "arm64", "1.1.0", &[("app", "mac")]);

    let report = fx.run("1.1.0").unwrap();

    let names: BTreeSet<_> = report.outcomes.iter().map(|o| o.file_name.clone()).collect();
    assert_eq!(
        names,
        set(&[
            "App_FULL-mac-arm64-1.1.0.zip",
            "App_FULL-win-x64-1.1.0.zip",
            "App_OTA-win-x64-1.0.0..1.1.0.zip",
        ])
    );
}

#[test]
fn test_identical_versions_yield_empty_delta() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.0.0", &[("a.txt", "same")]);
    fx.release("win", "x64", "1.0.1", &[("a.txt", "same")]);

    let report = fx.run("1.0.1").unwrap();

    let delta = report
        .outcomes
        .iter()
        .find(|o| matches!(o.kind, PackageKind::Delta { .. }))
        .unwrap();
    assert!(matches!(
        delta.result,
        Ok(PackageStatus::Built { files: Some(0) })
    ));
    assert!(list_entries(&delta.path).unwrap().is_empty());
}

#[test]
fn test_corrupt_comparison_fails_only_its_pair() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.2.0", &[("a.txt", "1")]);
    fx.corrupt("win", "x64", "1.2.1");
    fx.release("win", "x64", "1.2.3", &[("a.txt", "2")]);

    let report = fx.run("1.2.3").unwrap();

    assert!(!report.is_complete());
    let failed: Vec<_> = report.failed().map(|o| o.file_name.as_str()).collect();
    assert_eq!(failed, vec!["App_OTA-win-x64-1.2.1..1.2.3.zip"]);
    assert!(matches!(
        report.failed().next().unwrap().result,
        Err(GenerateError::Extract { .. })
    ));

    assert!(fx.output("App_OTA-win-x64-1.2.0..1.2.3.zip").exists());
    assert!(!fx.output("App_OTA-win-x64-1.2.1..1.2.3.zip").exists());
    assert!(dir_is_empty(fx.workspace.comparison.path()));
}

#[test]
fn test_corrupt_target_fails_its_deltas() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.0.0", &[("a.txt", "1")]);
    fx.corrupt("win", "x64", "1.1.0");

    let report = fx.run("1.1.0").unwrap();

    let full = &report.outcomes[0];
    assert!(matches!(full.kind, PackageKind::Full));
    assert!(full.is_ok());

    let delta = &report.outcomes[1];
    assert!(matches!(
        delta.result,
        Err(GenerateError::BaselineUnavailable { ref version, .. }) if version == "1.1.0"
    ));
}

#[test]
fn test_type_mismatch_fails_pair() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.0.0", &[("plugins", "was a file")]);
    fx.release("win", "x64", "1.1.0", &[("plugins/x.dll", "now a dir")]);

    let report = fx.run("1.1.0").unwrap();

    let delta = &report.outcomes[1];
    assert!(matches!(delta.result, Err(GenerateError::Diff { .. })));
}

#[test]
fn test_existing_outputs_kept_unless_forced() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.0.0", &[("a.txt", "1")]);
    fx.release("win", "x64", "1.1.0", &[("a.txt", "2")]);

    fx.run("1.1.0").unwrap();
    let delta = fx.output("App_OTA-win-x64-1.0.0..1.1.0.zip");
    fs::write(&delta, b"stale").unwrap();

    let second = fx.run("1.1.0").unwrap();
    assert!(
        second
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Ok(PackageStatus::Existing)))
    );
    assert_eq!(fs::read(&delta).unwrap(), b"stale");

    fx.config.force_regenerate = true;
    let third = fx.run("1.1.0").unwrap();
    assert!(third.is_complete());
    assert_eq!(entries(&delta), set(&["a.txt"]));
}

#[test]
fn test_unknown_target_is_fatal() {
    let mut fx = Fixture::new();
    fx.release("win", "x64", "1.0.0", &[("a.txt", "1")]);

    let err = fx.run("2.0.0").unwrap_err();
    assert!(matches!(err, GenerateError::NoTargetArtifacts(ref v) if v == "2.0.0"));
}
