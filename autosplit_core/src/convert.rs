use std::path::{Path, PathBuf};

use log::info;

use crate::backend::AudioBackend;
use crate::AutoSplitError;

/// Input formats the splitter accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Mp3,
    Wav,
    M4a,
}

impl SourceFormat {
    /// Classify `path` by its extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, AutoSplitError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "mp3" => Ok(SourceFormat::Mp3),
            "wav" => Ok(SourceFormat::Wav),
            "m4a" => Ok(SourceFormat::M4a),
            _ => Err(AutoSplitError::UnsupportedFormat { extension }),
        }
    }

    pub fn needs_conversion(self) -> bool {
        self != SourceFormat::Mp3
    }
}

/// Sibling path with the extension replaced by `mp3`.
pub fn mp3_sibling(path: &Path) -> PathBuf {
    path.with_extension("mp3")
}

/// Produce an MP3 for `source`, converting through `backend` when needed.
///
/// MP3 input is returned as is. Other formats are re-encoded next to the
/// source; an existing sibling is only replaced when `overwrite` is set.
pub fn convert<B: AudioBackend>(
    backend: &B,
    source: &Path,
    format: SourceFormat,
    overwrite: bool,
) -> Result<PathBuf, AutoSplitError> {
    if !format.needs_conversion() {
        return Ok(source.to_path_buf());
    }

    let destination = mp3_sibling(source);
    if !overwrite && destination.exists() {
        return Err(AutoSplitError::OutputExists(destination));
    }

    info!(
        "converting {:?} '{}' to '{}'",
        format,
        source.display(),
        destination.display()
    );
    backend.convert_to_mp3(source, &destination)?;

    Ok(destination)
}
