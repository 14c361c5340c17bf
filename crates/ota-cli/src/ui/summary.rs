//! Final run summary

use std::io::{self, Write};

use crossterm::style::Stylize;
use ota_core::release::{PublishOutcome, UploadStatus};
use ota_core::{PackageStatus, RunReport};

use super::Theme;

/// Counts of package outcomes in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub built: usize,
    pub existing: usize,
    pub failed: usize,
}

impl Tally {
    pub fn of(report: &RunReport) -> Self {
        let mut tally = Self::default();
        for outcome in &report.outcomes {
            match outcome.result {
                Ok(PackageStatus::Built { .. }) => tally.built += 1,
                Ok(PackageStatus::Existing) => tally.existing += 1,
                Err(_) => tally.failed += 1,
            }
        }
        tally
    }
}

/// Write the package table, the upload table (if anything was published),
/// and a one-line tally.
pub fn write_summary<W: Write>(
    out: &mut W,
    report: &RunReport,
    published: &[PublishOutcome],
    theme: &Theme,
) -> io::Result<()> {
    let width = report
        .outcomes
        .iter()
        .map(|o| o.file_name.len())
        .chain(published.iter().map(|p| p.name.len()))
        .max()
        .unwrap_or(0);

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("Packages for {}", report.target)
            .with(theme.colors.header)
            .bold()
    )?;

    for outcome in &report.outcomes {
        let (icon, color, detail) = match &outcome.result {
            Ok(PackageStatus::Built { files: Some(n) }) => (
                theme.icons.success,
                theme.colors.success,
                format!("{n} file{}", if *n == 1 { "" } else { "s" }),
            ),
            Ok(PackageStatus::Built { files: None }) => {
                (theme.icons.success, theme.colors.success, "full copy".to_string())
            }
            Ok(PackageStatus::Existing) => {
                (theme.icons.existing, theme.colors.existing, "existing".to_string())
            }
            Err(e) => (theme.icons.error, theme.colors.error, e.to_string()),
        };
        writeln!(
            out,
            "  {} {}  {}",
            icon.with(color),
            format!("{:<width$}", outcome.file_name).with(theme.colors.package_name),
            detail.with(theme.colors.secondary)
        )?;
    }

    if !published.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Uploads".with(theme.colors.header).bold())?;
        for item in published {
            let (icon, color, detail) = match &item.result {
                Ok(UploadStatus::Uploaded) => {
                    (theme.icons.success, theme.colors.success, "uploaded".to_string())
                }
                Ok(UploadStatus::Replaced) => {
                    (theme.icons.success, theme.colors.success, "replaced".to_string())
                }
                Ok(UploadStatus::Skipped) => (
                    theme.icons.existing,
                    theme.colors.existing,
                    "already published".to_string(),
                ),
                Err(e) => (theme.icons.error, theme.colors.error, e.to_string()),
            };
            writeln!(
                out,
                "  {} {}  {}",
                icon.with(color),
                format!("{:<width$}", item.name).with(theme.colors.package_name),
                detail.with(theme.colors.secondary)
            )?;
        }
    }

    let tally = Tally::of(report);
    writeln!(out)?;
    writeln!(
        out,
        "{} built, {} existing, {} failed",
        tally.built,
        tally.existing,
        if tally.failed == 0 {
            tally.failed.to_string().with(theme.colors.secondary)
        } else {
            tally.failed.to_string().with(theme.colors.error)
        }
    )?;
    Ok(())
}

/// Print the summary to stdout
pub fn print_summary(report: &RunReport, published: &[PublishOutcome]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_summary(&mut lock, report, published, &Theme::default())?;
    lock.flush()
}
