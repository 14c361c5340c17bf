//! Reporter that forwards generation progress to `tracing`.

use ota_core::Reporter;
use ota_schema::{Platform, ReleaseArtifact};

/// Logs every progress event through the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn section(&self, title: &str) {
        tracing::info!("{title}");
    }

    fn extracting(&self, artifact: &ReleaseArtifact) {
        tracing::debug!(artifact = %artifact.path.display(), "extracting");
    }

    fn diffing(&self, platform: &Platform, from: &str, to: &str) {
        tracing::info!("Diffing {platform} {from} -> {to}");
    }

    fn done(&self, file_name: &str, detail: &str) {
        tracing::info!("Built {file_name} ({detail})");
    }

    fn skipped(&self, file_name: &str, reason: &str) {
        tracing::info!("Skipped {file_name}: {reason}");
    }

    fn failed(&self, file_name: &str, reason: &str) {
        tracing::error!("Failed {file_name}: {reason}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
}
