//! Content fingerprint newtype.

use serde::{Deserialize, Serialize};

/// Fixed-width uppercase hex fingerprint of a file's contents.
///
/// Only ever compared for equality; the value is never published.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Width of the hex representation of a 32-bit checksum.
    pub const WIDTH: usize = 8;

    /// Format a 32-bit checksum value as eight uppercase hex digits.
    pub fn from_u32(value: u32) -> Self {
        Self(format!("{value:08X}"))
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Checksum {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
