use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::backend::DecodedAudio;
use crate::{AutoSplitError, NamingPolicy, ProgressEvent, ProgressReporter, SplitFailure, SplitPlan};

/// Options controlling how chunks land on disk.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub policy: NamingPolicy,
    pub overwrite: bool,
}

/// Every path a split of `source` will leave behind, in result order.
pub fn output_paths(policy: NamingPolicy, source: &Path, plan: &SplitPlan) -> Vec<PathBuf> {
    policy
        .preserved_source_path(source)
        .into_iter()
        .chain(plan.ranges().map(|range| policy.chunk_path(source, range.number())))
        .collect()
}

/// Slice `audio` along `plan` and write each chunk through the backend.
///
/// Targets are checked before anything is written. Under
/// [`NamingPolicy::PreserveAndRenumber`] the source is moved to its `_part1`
/// name only after every chunk was exported. A failure leaves the chunks
/// written so far on disk and lists them in the returned [`SplitFailure`].
pub fn export<A, P>(
    audio: &A,
    source: &Path,
    plan: &SplitPlan,
    options: ExportOptions,
    progress: &mut P,
) -> Result<Vec<PathBuf>, SplitFailure>
where
    A: DecodedAudio,
    P: ProgressReporter + ?Sized,
{
    let untouched = |error: AutoSplitError| SplitFailure::untouched(source, error);

    if plan.total_duration_ms() != audio.duration_ms() {
        return Err(untouched(AutoSplitError::InvalidArgument(format!(
            "plan covers {} ms but the source is {} ms long",
            plan.total_duration_ms(),
            audio.duration_ms()
        ))));
    }
    if let Some(range) = plan.ranges().find(|range| range.is_empty()) {
        return Err(untouched(AutoSplitError::InvalidArgument(format!(
            "chunk {} of {} would be empty; the source is too short for this limit",
            range.number(),
            plan.num_chunks()
        ))));
    }

    let preserved = options.policy.preserved_source_path(source);
    if !options.overwrite {
        if let Some(existing) = output_paths(options.policy, source, plan)
            .into_iter()
            .find(|path| path.exists())
        {
            return Err(untouched(AutoSplitError::OutputExists(existing)));
        }
    }

    progress.report(ProgressEvent::Start {
        chunks: plan.num_chunks(),
        total_duration: Duration::from_millis(plan.total_duration_ms()),
    });

    let mut written = Vec::with_capacity(plan.num_chunks() + 1);
    for range in plan.ranges() {
        let path = options.policy.chunk_path(source, range.number());
        if let Err(error) = audio.export_slice(range, &path) {
            return Err(SplitFailure {
                source_path: source.to_path_buf(),
                error,
                written,
                source_renamed: false,
            });
        }

        info!(
            "exported chunk {}/{} [{} ms, {} ms) to '{}'",
            range.number(),
            plan.num_chunks(),
            range.start_ms,
            range.end_ms,
            path.display()
        );
        written.push(path.clone());
        progress.report(ProgressEvent::ChunkWritten { range, path });
    }

    if let Some(preserved) = preserved {
        if let Err(err) = fs::rename(source, &preserved) {
            return Err(SplitFailure {
                source_path: source.to_path_buf(),
                error: AutoSplitError::Io(err),
                written,
                source_renamed: false,
            });
        }
        info!("moved '{}' to '{}'", source.display(), preserved.display());
        written.insert(0, preserved);
    }

    Ok(written)
}
