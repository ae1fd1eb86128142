//! Split audio files into MP3 chunks that fit under an upload size cap.
//!
//! The number of chunks is derived from the file size, the cut points from
//! the decoded duration. WAV and M4A input is converted to MP3 first.

pub mod backend;
mod convert;
mod error;
mod export;
mod naming;
mod plan;
mod progress;
mod size;
mod toolchain;

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::backend::{AudioBackend, DecodedAudio};

pub use convert::{convert, mp3_sibling, SourceFormat};
pub use error::{AutoSplitError, ErrorKind, SplitFailure};
pub use export::{export, output_paths, ExportOptions};
pub use naming::NamingPolicy;
pub use plan::{plan, plan_for_bytes, ChunkRange, SplitPlan, MAX_CHUNKS};
pub use progress::{NoProgress, ProgressEvent, ProgressReporter};
pub use size::{bytes_to_mb, needs_split, SizeCheck, BYTES_PER_MB, DEFAULT_LIMIT_BYTES};
pub use toolchain::{Toolchain, DEFAULT_FFMPEG};

/// Configuration for one split operation.
#[derive(Clone, Debug)]
pub struct Config {
    /// Path of the source file to split.
    pub input_path: PathBuf,
    /// Size ceiling in bytes; files strictly larger are split.
    pub limit_bytes: u64,
    /// How the chunk files are named.
    pub naming: NamingPolicy,
    /// Replace existing output files instead of failing.
    pub overwrite: bool,
}

impl Config {
    /// Construct a [`Config`] with the default 8 MiB limit and suffix naming.
    pub fn new<P: AsRef<Path>>(input: P) -> Result<Self, AutoSplitError> {
        Self::builder(input).build()
    }

    pub fn builder<P: AsRef<Path>>(input: P) -> ConfigBuilder {
        ConfigBuilder {
            input_path: input.as_ref().to_path_buf(),
            limit_bytes: DEFAULT_LIMIT_BYTES,
            naming: NamingPolicy::default(),
            overwrite: false,
        }
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            policy: self.naming,
            overwrite: self.overwrite,
        }
    }
}

/// Builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    input_path: PathBuf,
    limit_bytes: u64,
    naming: NamingPolicy,
    overwrite: bool,
}

impl ConfigBuilder {
    pub fn limit_bytes(mut self, limit_bytes: u64) -> Self {
        self.limit_bytes = limit_bytes;
        self
    }

    pub fn naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn build(self) -> Result<Config, AutoSplitError> {
        if self.limit_bytes == 0 {
            return Err(AutoSplitError::InvalidArgument(
                "size limit must be greater than zero bytes".into(),
            ));
        }

        Ok(Config {
            input_path: self.input_path,
            limit_bytes: self.limit_bytes,
            naming: self.naming,
            overwrite: self.overwrite,
        })
    }
}

/// Files produced by a successful run, in chunk order.
#[derive(Clone, Debug)]
pub struct SplitResult {
    pub files: Vec<PathBuf>,
    /// `false` when the (converted) source was already within the limit.
    pub split: bool,
    pub size: SizeCheck,
    /// Original path when a WAV or M4A source was converted first.
    pub converted_from: Option<PathBuf>,
    pub plan: Option<SplitPlan>,
}

impl SplitResult {
    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }
}

/// What [`run`] would do, computed without writing anything.
#[derive(Clone, Debug)]
pub enum SplitPreview {
    /// The source must be converted first; sizing depends on the result.
    Convert { from: PathBuf, to: PathBuf },
    /// The source is within the limit and would be returned as is.
    Unchanged { path: PathBuf, size: SizeCheck },
    Split {
        size: SizeCheck,
        plan: SplitPlan,
        outputs: Vec<PathBuf>,
    },
}

/// Convert, size, plan and export `config.input_path`.
///
/// Errors are never retried. Files written before a failure are reported in
/// the [`SplitFailure`] and left on disk.
pub fn run<B, P>(config: &Config, backend: &B, progress: &mut P) -> Result<SplitResult, SplitFailure>
where
    B: AudioBackend,
    P: ProgressReporter + ?Sized,
{
    let input = config.input_path.as_path();
    let untouched = |error: AutoSplitError| SplitFailure::untouched(input, error);

    fs::metadata(input).map_err(|err| untouched(AutoSplitError::not_found(input, err)))?;
    let format = SourceFormat::from_path(input).map_err(untouched)?;

    let (mp3_path, converted_from) = if format.needs_conversion() {
        progress.report(ProgressEvent::Converting {
            from: input.to_path_buf(),
            to: mp3_sibling(input),
        });
        let mp3 = convert(backend, input, format, config.overwrite).map_err(untouched)?;
        (mp3, Some(input.to_path_buf()))
    } else {
        (input.to_path_buf(), None)
    };

    let converted: Vec<PathBuf> = converted_from.iter().map(|_| mp3_path.clone()).collect();
    let after_conversion = |error: AutoSplitError| SplitFailure {
        source_path: input.to_path_buf(),
        error,
        written: converted.clone(),
        source_renamed: false,
    };

    let size = needs_split(&mp3_path, config.limit_bytes).map_err(after_conversion)?;
    if !size.needs_split {
        info!(
            "'{}' is {:.2} MB, within the {:.2} MB limit; nothing to split",
            mp3_path.display(),
            size.size_mb_rounded(),
            bytes_to_mb(config.limit_bytes)
        );
        progress.report(ProgressEvent::Finish);
        return Ok(SplitResult {
            files: vec![mp3_path],
            split: false,
            size,
            converted_from,
            plan: None,
        });
    }

    let audio = backend.load(&mp3_path).map_err(after_conversion)?;
    let plan = plan_for_bytes(audio.duration_ms(), size.size_bytes, config.limit_bytes)
        .map_err(after_conversion)?;
    info!(
        "splitting '{}' ({:.2} MB, {} ms) into {} chunks of ~{:.0} ms",
        mp3_path.display(),
        size.size_mb_rounded(),
        plan.total_duration_ms(),
        plan.num_chunks(),
        plan.chunk_duration_ms()
    );

    let files = export(&audio, &mp3_path, &plan, config.export_options(), progress).map_err(
        |mut failure| {
            failure.source_path = input.to_path_buf();
            failure.written.splice(0..0, converted.iter().cloned());
            failure
        },
    )?;

    progress.report(ProgressEvent::Finish);
    Ok(SplitResult {
        files,
        split: true,
        size,
        converted_from,
        plan: Some(plan),
    })
}

/// Dry-run counterpart of [`run`]: reports the decision and target paths.
///
/// Needs no encoder; MP3 sources are measured with the built-in decoder.
pub fn plan_split(config: &Config) -> Result<SplitPreview, AutoSplitError> {
    let input = config.input_path.as_path();
    fs::metadata(input).map_err(|err| AutoSplitError::not_found(input, err))?;

    let format = SourceFormat::from_path(input)?;
    if format.needs_conversion() {
        return Ok(SplitPreview::Convert {
            from: input.to_path_buf(),
            to: mp3_sibling(input),
        });
    }

    let size = needs_split(input, config.limit_bytes)?;
    if !size.needs_split {
        return Ok(SplitPreview::Unchanged {
            path: input.to_path_buf(),
            size,
        });
    }

    let duration_ms = backend::probe_duration_ms(input)?;
    let plan = plan_for_bytes(duration_ms, size.size_bytes, config.limit_bytes)?;
    let outputs = output_paths(config.naming, input, &plan);

    Ok(SplitPreview::Split {
        size,
        plan,
        outputs,
    })
}
