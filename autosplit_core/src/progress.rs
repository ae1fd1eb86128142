use std::path::PathBuf;
use std::time::Duration;

use crate::ChunkRange;

/// Events emitted while a split runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A non-MP3 source is being converted before sizing.
    Converting { from: PathBuf, to: PathBuf },
    /// Export is about to begin.
    Start {
        chunks: usize,
        total_duration: Duration,
    },
    /// A chunk has been written to `path`.
    ChunkWritten { range: ChunkRange, path: PathBuf },
    /// All work is complete.
    Finish,
}

/// Receiver for [`ProgressEvent`]s. The default implementation ignores them.
pub trait ProgressReporter {
    fn report(&mut self, _event: ProgressEvent) {}
}

impl<F> ProgressReporter for F
where
    F: FnMut(ProgressEvent),
{
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}
