//! Shared types for ota-gen.
//!
//! Everything in this crate is pure: no filesystem or network access. The
//! core crate builds on these types to scan downloads, diff release trees,
//! and name the packages it produces.

pub mod artifact;
pub mod checksum;
pub mod naming;
pub mod version;

// Re-exports
pub use artifact::{ArtifactPattern, ParseError, ParsedName, Platform, ReleaseArtifact};
pub use checksum::Checksum;
pub use naming::{PackageKind, PackageNaming};

/// File extension shared by release artifacts and generated packages.
pub const ZIP_EXTENSION: &str = ".zip";
