//! Reporter trait for dependency injection
//!
//! This trait allows the generator to report progress and status without
//! being coupled to a specific terminal or logging implementation.

use ota_schema::{Platform, ReleaseArtifact};

/// Receives progress events from a generation run.
pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Generating 1.2.3").
    fn section(&self, title: &str);

    /// An artifact is being extracted into a working directory.
    fn extracting(&self, artifact: &ReleaseArtifact);

    /// A delta between two versions is being computed.
    fn diffing(&self, platform: &Platform, from: &str, to: &str);

    /// A package was written.
    fn done(&self, file_name: &str, detail: &str);

    /// A package already existed and was left untouched.
    fn skipped(&self, file_name: &str, reason: &str);

    /// A package could not be produced.
    fn failed(&self, file_name: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn extracting(&self, artifact: &ReleaseArtifact) {
        (**self).extracting(artifact);
    }
    fn diffing(&self, platform: &Platform, from: &str, to: &str) {
        (**self).diffing(platform, from, to);
    }
    fn done(&self, file_name: &str, detail: &str) {
        (**self).done(file_name, detail);
    }
    fn skipped(&self, file_name: &str, reason: &str) {
        (**self).skipped(file_name, reason);
    }
    fn failed(&self, file_name: &str, reason: &str) {
        (**self).failed(file_name, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn extracting(&self, _: &ReleaseArtifact) {}
    fn diffing(&self, _: &Platform, _: &str, _: &str) {}
    fn done(&self, _: &str, _: &str) {}
    fn skipped(&self, _: &str, _: &str) {}
    fn failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}
