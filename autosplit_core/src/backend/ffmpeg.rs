use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use super::{probe_duration_ms, AudioBackend, DecodedAudio};
use crate::{AutoSplitError, ChunkRange, Toolchain};

/// MP3 bitrate used when none is configured.
pub const DEFAULT_BITRATE: &str = "128k";

/// Encoder settings passed to ffmpeg.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegOptions {
    /// Target MP3 bitrate in ffmpeg notation, such as `128k`.
    pub bitrate: String,
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self {
            bitrate: String::from(DEFAULT_BITRATE),
        }
    }
}

/// Backend that measures with symphonia and encodes with an ffmpeg process.
///
/// Construction requires a detected [`Toolchain`], so no export can start
/// before the environment check has passed.
#[derive(Clone, Debug)]
pub struct FfmpegBackend {
    program: PathBuf,
    options: FfmpegOptions,
}

impl FfmpegBackend {
    pub fn new(toolchain: &Toolchain) -> Self {
        Self::with_options(toolchain, FfmpegOptions::default())
    }

    pub fn with_options(toolchain: &Toolchain, options: FfmpegOptions) -> Self {
        Self {
            program: toolchain.ffmpeg().to_path_buf(),
            options,
        }
    }

    /// Command-line arguments that encode `input` (optionally only `window`)
    /// into `output`.
    ///
    /// The final window of a plan gets no `-t`, so ffmpeg encodes through
    /// the true end of the source instead of the millisecond-truncated one.
    fn encode_args(
        &self,
        input: &Path,
        window: Option<ChunkRange>,
        output: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> =
            ["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"]
                .map(OsString::from)
                .into();
        args.push(input.into());
        if let Some(range) = window {
            args.push("-ss".into());
            args.push(seconds(range.start_ms).into());
            if !range.last {
                args.push("-t".into());
                args.push(seconds(range.duration_ms()).into());
            }
        }
        args.extend(["-vn", "-codec:a", "libmp3lame", "-b:a"].map(OsString::from));
        args.push(self.options.bitrate.clone().into());
        args.push(output.into());
        args
    }

    /// Run ffmpeg with [`Self::encode_args`].
    ///
    /// Returns ffmpeg's stderr on failure. A partially written output is
    /// removed.
    fn encode(
        &self,
        input: &Path,
        window: Option<ChunkRange>,
        output: &Path,
    ) -> Result<(), String> {
        let mut command = Command::new(&self.program);
        command
            .args(self.encode_args(input, window, output))
            .stdin(Stdio::null());

        debug!("running {command:?}");
        let result = command.output();

        let failure = match result {
            Ok(out) if out.status.success() => return Ok(()),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                format!("ffmpeg exited with {}: {}", out.status, stderr.trim())
            }
            Err(err) => format!("failed to execute {}: {err}", self.program.display()),
        };

        let _ = fs::remove_file(output);
        Err(failure)
    }
}

impl AudioBackend for FfmpegBackend {
    type Audio = FfmpegAudio;

    fn load(&self, path: &Path) -> Result<Self::Audio, AutoSplitError> {
        let duration_ms = probe_duration_ms(path)?;
        Ok(FfmpegAudio {
            backend: self.clone(),
            path: path.to_path_buf(),
            duration_ms,
        })
    }

    fn convert_to_mp3(&self, source: &Path, destination: &Path) -> Result<(), AutoSplitError> {
        self.encode(source, None, destination)
            .map_err(|reason| AutoSplitError::Decode {
                path: source.to_path_buf(),
                reason,
            })
    }
}

/// A measured source whose slices are cut by ffmpeg on demand.
#[derive(Clone, Debug)]
pub struct FfmpegAudio {
    backend: FfmpegBackend,
    path: PathBuf,
    duration_ms: u64,
}

impl DecodedAudio for FfmpegAudio {
    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn export_slice(&self, range: ChunkRange, destination: &Path) -> Result<(), AutoSplitError> {
        self.backend
            .encode(&self.path, Some(range), destination)
            .map_err(|reason| AutoSplitError::Encode {
                path: destination.to_path_buf(),
                reason,
            })
    }
}

/// Format milliseconds as ffmpeg's `seconds.millis` time notation.
fn seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1_000, ms % 1_000)
}
