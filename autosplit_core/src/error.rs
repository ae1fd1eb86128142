use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while converting, planning or exporting audio chunks.
#[derive(Debug, Error)]
pub enum AutoSplitError {
    /// The source file is missing or cannot be read.
    #[error("input file does not exist or is unreadable: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A size or duration parameter was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend could not parse or decode the source.
    #[error("failed to decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// The backend could not write an output file.
    #[error("failed to encode '{}': {reason}", path.display())]
    Encode { path: PathBuf, reason: String },

    /// The external encoding toolchain is not installed or not runnable.
    #[error(
        "'{program}' is not available ({reason}); install ffmpeg and make sure it is on PATH, or pass its location with --ffmpeg"
    )]
    EnvironmentMissing { program: String, reason: String },

    /// The file extension does not name a format the splitter accepts.
    #[error("unsupported audio format '{extension}'; supported: mp3, wav, m4a")]
    UnsupportedFormat { extension: String },

    /// An output file already exists and overwriting was not requested.
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// The plan would produce more chunks than the splitter allows.
    #[error("split would produce {requested} chunks, more than the limit of {limit}")]
    ChunkLimitExceeded { requested: u64, limit: u64 },

    /// Wrapper around IO errors encountered while renaming or inspecting files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`AutoSplitError`] for presentation layers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Decode,
    Encode,
    EnvironmentMissing,
    Io,
}

impl AutoSplitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AutoSplitError::NotFound { .. } => ErrorKind::NotFound,
            AutoSplitError::InvalidArgument(_)
            | AutoSplitError::UnsupportedFormat { .. }
            | AutoSplitError::ChunkLimitExceeded { .. } => ErrorKind::InvalidArgument,
            AutoSplitError::Decode { .. } => ErrorKind::Decode,
            AutoSplitError::Encode { .. } => ErrorKind::Encode,
            AutoSplitError::EnvironmentMissing { .. } => ErrorKind::EnvironmentMissing,
            AutoSplitError::OutputExists(_) | AutoSplitError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn not_found(path: &Path, source: std::io::Error) -> Self {
        AutoSplitError::NotFound {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Decode => "decode error",
            ErrorKind::Encode => "encode error",
            ErrorKind::EnvironmentMissing => "environment missing",
            ErrorKind::Io => "io error",
        };
        f.write_str(label)
    }
}

/// A split that stopped part way.
///
/// Files listed in `written` were created before the failure and are left on
/// disk. The operation is never reported as a success once this is returned.
#[derive(Debug, Error)]
#[error("failed to split '{}'", source_path.display())]
pub struct SplitFailure {
    pub source_path: PathBuf,
    #[source]
    pub error: AutoSplitError,
    pub written: Vec<PathBuf>,
    pub source_renamed: bool,
}

impl SplitFailure {
    pub(crate) fn untouched(source_path: &Path, error: AutoSplitError) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            error,
            written: Vec::new(),
            source_renamed: false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Whether the run stopped before producing any file or moving the source.
    pub fn is_retry_safe(&self) -> bool {
        self.written.is_empty() && !self.source_renamed
    }
}
