use std::fs;
use std::path::Path;

use crate::AutoSplitError;

/// Bytes per mebibyte; sizes are reported in MiB.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Default ceiling, matching the common 8 MB attachment cap.
pub const DEFAULT_LIMIT_BYTES: u64 = 8 * BYTES_PER_MB;

/// Outcome of comparing a file's size against a ceiling.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SizeCheck {
    pub needs_split: bool,
    pub size_bytes: u64,
    pub size_mb: f64,
}

impl SizeCheck {
    /// Size in MiB rounded to two decimals for display.
    pub fn size_mb_rounded(&self) -> f64 {
        (self.size_mb * 100.0).round() / 100.0
    }
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// Stat `path` and decide whether it is strictly larger than `limit_bytes`.
pub fn needs_split(path: &Path, limit_bytes: u64) -> Result<SizeCheck, AutoSplitError> {
    let metadata = fs::metadata(path).map_err(|err| AutoSplitError::not_found(path, err))?;
    if !metadata.is_file() {
        return Err(AutoSplitError::not_found(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let size_bytes = metadata.len();
    Ok(SizeCheck {
        needs_split: size_bytes > limit_bytes,
        size_bytes,
        size_mb: bytes_to_mb(size_bytes),
    })
}
