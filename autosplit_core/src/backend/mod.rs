//! Capability interface over the external audio decode/encode service.
//!
//! The splitter only needs millisecond-addressable slicing of a loaded source
//! and MP3 output; everything about codecs and containers lives behind these
//! traits.

mod ffmpeg;
mod probe;

use std::path::Path;

use crate::{AutoSplitError, ChunkRange};

pub use ffmpeg::{FfmpegAudio, FfmpegBackend, FfmpegOptions, DEFAULT_BITRATE};
pub use probe::probe_duration_ms;

/// A source that has been opened and measured by a backend.
pub trait DecodedAudio {
    /// Total length of the source in milliseconds.
    fn duration_ms(&self) -> u64;

    /// Encode the `[start_ms, end_ms)` window of the source to an MP3 file.
    fn export_slice(&self, range: ChunkRange, destination: &Path) -> Result<(), AutoSplitError>;
}

pub trait AudioBackend {
    type Audio: DecodedAudio;

    /// Open `path` and measure its duration.
    fn load(&self, path: &Path) -> Result<Self::Audio, AutoSplitError>;

    /// Re-encode a whole file to MP3 at `destination`.
    fn convert_to_mp3(&self, source: &Path, destination: &Path) -> Result<(), AutoSplitError>;
}
