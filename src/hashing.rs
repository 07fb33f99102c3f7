//! Hashing & Naming - SHA-256 for Packages
//!
//! The digest covers the finished archive bytes so hosts can detect
//! corruption or tampering after generation.

use chrono::{DateTime, FixedOffset};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

pub const ARCHIVE_EXTENSION: &str = "zip";

/// Characters that are removed from names before they become file names
const INVALID_FILE_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Stream a file through SHA-256
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Spaces become underscores, path and shell metacharacters are dropped.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_FILE_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// `{name}_v{version}_{YYYYMMDD_HHMMSS}.zip`
pub fn archive_file_name(name: &str, version: &str, at: &DateTime<FixedOffset>) -> String {
    format!(
        "{}_v{}_{}.{}",
        sanitize_file_name(name),
        sanitize_file_name(version),
        at.format("%Y%m%d_%H%M%S"),
        ARCHIVE_EXTENSION
    )
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
