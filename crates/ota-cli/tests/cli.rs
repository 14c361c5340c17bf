//! Runs the compiled `ota-gen` binary.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Test context with an isolated working root
struct TestContext {
    temp_dir: TempDir,
    ota_home: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let ota_home = temp_dir.path().join(".ota");
        Self { temp_dir, ota_home }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ota-gen"));
        cmd.current_dir(self.temp_dir.path());
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("OTA_HOME", &self.ota_home);
        cmd.env("NO_COLOR", "1");
        for var in ["GITHUB_TOKEN", "OTA_REPO", "OTA_APP_NAME", "RUST_LOG"] {
            cmd.env_remove(var);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.cmd().args(args).output().expect("failed to run ota-gen")
    }

    fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn release(&self, name: &str, files: &[(&str, &str)]) {
        let downloads = self.ota_home.join("downloads");
        fs::create_dir_all(&downloads).unwrap();
        let mut zip = zip::ZipWriter::new(File::create(downloads.join(name)).unwrap());
        for (entry, contents) in files {
            zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn output_dir(&self) -> PathBuf {
        self.ota_home.join("release")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("generate"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_checksum_command() {
    let ctx = TestContext::new();
    let file = ctx.write("check.txt", "123456789");

    let output = ctx.run(&["checksum", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("CBF43926  "));
}

#[test]
fn test_checksum_missing_file_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["checksum", "does-not-exist.bin"]);
    assert!(!output.status.success());
}

#[test]
fn test_diff_command() {
    let ctx = TestContext::new();
    ctx.write("old/a.txt", "1");
    ctx.write("old/b.txt", "x");
    ctx.write("new/a.txt", "1");
    ctx.write("new/b.txt", "y");
    ctx.write("new/c.txt", "z");

    let old = ctx.temp_dir.path().join("old");
    let new = ctx.temp_dir.path().join("new");
    let output = ctx.run(&["diff", old.to_str().unwrap(), new.to_str().unwrap()]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("M b.txt"));
    assert!(text.contains("A c.txt"));
    assert!(!text.contains("a.txt\n"));
    assert!(text.contains("1 added, 1 modified, 1 unchanged"));
}

#[test]
fn test_pack_command() {
    let ctx = TestContext::new();
    ctx.write("payload/one.txt", "1");
    ctx.write("payload/sub/two.txt", "2");

    let dir = ctx.temp_dir.path().join("payload");
    let archive = ctx.temp_dir.path().join("payload.zip");
    let output = ctx.run(&["pack", dir.to_str().unwrap(), archive.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Packed 2 files"));
    assert!(archive.is_file());
}

#[test]
fn test_offline_generate() {
    let ctx = TestContext::new();
    ctx.release("App-win-x64-1.2.0.zip", &[("a.txt", "1"), ("b.txt", "x")]);
    ctx.release("App-win-x64-1.2.2.zip", &[("a.txt", "1"), ("b.txt", "x2")]);
    ctx.release(
        "App-win-x64-1.2.3.zip",
        &[("a.txt", "1"), ("b.txt", "y"), ("c.txt", "z")],
    );
    ctx.release("unrelated.zip", &[("x", "y")]);

    let output = ctx.run(&["generate", "--offline", "--app-name", "App"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let out = ctx.output_dir();
    assert!(exists(&out, "App_FULL-win-x64-1.2.3.zip"));
    assert!(exists(&out, "App_OTA-win-x64-1.2.0..1.2.3.zip"));
    assert!(exists(&out, "App_OTA-win-x64-1.2.2..1.2.3.zip"));
    assert!(stdout(&output).contains("3 built, 0 existing, "));
}

#[test]
fn test_offline_generate_with_explicit_tag() {
    let ctx = TestContext::new();
    ctx.release("App-win-x64-1.0.0.zip", &[("a.txt", "1")]);
    ctx.release("App-win-x64-1.1.0.zip", &[("a.txt", "2")]);
    ctx.release("App-win-x64-2.0.0.zip", &[("a.txt", "3")]);

    let output = ctx.run(&["generate", "--offline", "--app-name", "App", "--tag", "1.1.0"]);

    assert!(output.status.success());
    let out = ctx.output_dir();
    assert!(exists(&out, "App_FULL-win-x64-1.1.0.zip"));
    assert!(exists(&out, "App_OTA-win-x64-1.0.0..1.1.0.zip"));
    assert!(exists(&out, "App_OTA-win-x64-2.0.0..1.1.0.zip"));
    assert!(!exists(&out, "App_FULL-win-x64-2.0.0.zip"));
}

#[test]
fn test_offline_generate_reports_failures() {
    let ctx = TestContext::new();
    ctx.release("App-win-x64-1.0.0.zip", &[("a.txt", "1")]);
    ctx.release("App-win-x64-1.1.0.zip", &[("a.txt", "2")]);
    fs::write(
        ctx.ota_home.join("downloads/App-win-x64-1.0.5.zip"),
        "not a zip",
    )
    .unwrap();

    let output = ctx.run(&["generate", "--offline", "--app-name", "App", "--tag", "1.1.0"]);

    assert!(!output.status.success());
    let out = ctx.output_dir();
    assert!(exists(&out, "App_OTA-win-x64-1.0.0..1.1.0.zip"));
    assert!(!exists(&out, "App_OTA-win-x64-1.0.5..1.1.0.zip"));
}

#[test]
fn test_generate_without_app_name_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["generate", "--offline"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_file_supplies_app_name() {
    let ctx = TestContext::new();
    ctx.release("Tool-linux-x64-0.1.0.zip", &[("bin", "1")]);
    let config = ctx.write("ota.toml", "[app]\nname = \"Tool\"\n");

    let output = ctx.run(&["generate", "--offline", "--config", config.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(!exists(&ctx.output_dir(), "App_FULL-linux-x64-0.1.0.zip"));
    assert!(exists(&ctx.output_dir(), "Tool_FULL-linux-x64-0.1.0.zip"));
}
