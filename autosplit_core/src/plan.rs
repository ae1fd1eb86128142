//! Uniform duration partitioning.
//!
//! The number of chunks comes from the size ratio, the cut points from the
//! duration. Sizes of the exported chunks are therefore only approximately
//! balanced: a variable bitrate source can still produce a chunk above the
//! target.

use crate::AutoSplitError;

/// Upper bound on the number of chunks a single plan may contain.
pub const MAX_CHUNKS: u64 = 10_000;

/// Half-open millisecond range `[start_ms, end_ms)` of one chunk.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChunkRange {
    /// Zero-based position in the plan.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Final chunk of its plan. Encoders should run it to the end of the
    /// source rather than stop at `end_ms`, which is truncated to whole
    /// milliseconds.
    pub last: bool,
}

impl ChunkRange {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// One-based sequence number used in output names.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end_ms <= self.start_ms
    }
}

/// Even partition of a source's timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    num_chunks: usize,
    chunk_duration_ms: f64,
    total_duration_ms: u64,
}

impl SplitPlan {
    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    pub fn chunk_duration_ms(&self) -> f64 {
        self.chunk_duration_ms
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }

    /// Range of the chunk at `index`, or `None` past the end of the plan.
    ///
    /// Boundaries are truncated to whole milliseconds and the last chunk
    /// always ends at the source's total duration.
    pub fn range(&self, index: usize) -> Option<ChunkRange> {
        if index >= self.num_chunks {
            return None;
        }

        let start_ms = self.boundary(index);
        let last = index + 1 == self.num_chunks;
        let end_ms = if last {
            self.total_duration_ms
        } else {
            self.boundary(index + 1)
        };

        Some(ChunkRange {
            index,
            start_ms,
            end_ms,
            last,
        })
    }

    pub fn ranges(&self) -> impl Iterator<Item = ChunkRange> + '_ {
        (0..self.num_chunks).filter_map(move |index| self.range(index))
    }

    fn boundary(&self, index: usize) -> u64 {
        let raw = (index as f64 * self.chunk_duration_ms).floor() as u64;
        raw.min(self.total_duration_ms)
    }
}

/// Compute how many chunks are needed and how long each one is.
///
/// Only meaningful once a split is known to be necessary; a size at or below
/// the target yields a single chunk covering the whole source.
pub fn plan(
    total_duration_ms: u64,
    total_size_mb: f64,
    target_size_mb: f64,
) -> Result<SplitPlan, AutoSplitError> {
    if !target_size_mb.is_finite() || target_size_mb <= 0.0 {
        return Err(AutoSplitError::InvalidArgument(format!(
            "target size must be a positive number of MB, got {target_size_mb}"
        )));
    }
    if !total_size_mb.is_finite() || total_size_mb < 0.0 {
        return Err(AutoSplitError::InvalidArgument(format!(
            "total size must be a non-negative number of MB, got {total_size_mb}"
        )));
    }

    let ratio = (total_size_mb / target_size_mb).ceil();
    let requested = ratio.min(u64::MAX as f64) as u64;
    with_chunk_count(total_duration_ms, requested)
}

/// Same as [`plan`], but counts chunks in exact integer bytes.
///
/// Agrees with the `size > limit` decision of [`crate::needs_split`] for any
/// limit, where the MB ratio loses precision on very large values.
pub fn plan_for_bytes(
    total_duration_ms: u64,
    size_bytes: u64,
    limit_bytes: u64,
) -> Result<SplitPlan, AutoSplitError> {
    if limit_bytes == 0 {
        return Err(AutoSplitError::InvalidArgument(
            "size limit must be greater than zero bytes".into(),
        ));
    }
    with_chunk_count(total_duration_ms, size_bytes.div_ceil(limit_bytes))
}

fn with_chunk_count(total_duration_ms: u64, requested: u64) -> Result<SplitPlan, AutoSplitError> {
    if total_duration_ms == 0 {
        return Err(AutoSplitError::InvalidArgument(
            "total duration must be greater than zero milliseconds".into(),
        ));
    }
    if requested > MAX_CHUNKS {
        return Err(AutoSplitError::ChunkLimitExceeded {
            requested,
            limit: MAX_CHUNKS,
        });
    }
    let num_chunks = requested.max(1) as usize;

    Ok(SplitPlan {
        num_chunks,
        chunk_duration_ms: total_duration_ms as f64 / num_chunks as f64,
        total_duration_ms,
    })
}
