//! Streaming content checksums.
//!
//! Files in a release tree can run to tens of megabytes, so they are hashed
//! through a fixed buffer rather than read into memory.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use ota_schema::Checksum;

const BUFFER_SIZE: usize = 64 * 1024;

/// Compute the CRC32 checksum of the file at `path`.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
/// An unreadable file is never treated as unchanged.
pub fn file_checksum(path: &Path) -> io::Result<Checksum> {
    let file = File::open(path)?;
    checksum_reader(BufReader::with_capacity(BUFFER_SIZE, file))
}

/// Compute the CRC32 checksum of everything `reader` yields.
///
/// # Errors
///
/// Returns the first read error other than [`io::ErrorKind::Interrupted`].
pub fn checksum_reader<R: Read>(mut reader: R) -> io::Result<Checksum> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }

    Ok(Checksum::from_u32(hasher.finalize()))
}
