//! Subcommand implementations.

pub mod checksum;
pub mod diff;
pub mod generate;
pub mod pack;
