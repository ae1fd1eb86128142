use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::info;

use crate::AutoSplitError;

/// Program looked up on `PATH` when no explicit location is configured.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Proof that the external encoder was found and answered `-version`.
#[derive(Clone, Debug)]
pub struct Toolchain {
    ffmpeg: PathBuf,
    version: String,
}

impl Toolchain {
    /// Check once that `program` is runnable.
    pub fn detect<P: Into<PathBuf>>(program: P) -> Result<Self, AutoSplitError> {
        let ffmpeg = program.into();
        let missing = |reason: String| AutoSplitError::EnvironmentMissing {
            program: ffmpeg.display().to_string(),
            reason,
        };

        let output = Command::new(&ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|err| missing(err.to_string()))?;
        if !output.status.success() {
            return Err(missing(format!("'-version' exited with {}", output.status)));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_owned();
        info!("found {version}");

        Ok(Self { ffmpeg, version })
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
