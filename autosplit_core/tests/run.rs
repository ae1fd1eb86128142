mod common;

use autosplit_core::backend::{probe_duration_ms, AudioBackend, DecodedAudio};
use autosplit_core::{
    plan_split, run, AutoSplitError, ChunkRange, Config, ErrorKind, NamingPolicy, NoProgress,
    ProgressEvent, ProgressReporter, SplitPreview, BYTES_PER_MB,
};
use std::cell::RefCell;
use std::error::Error;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::tempdir;

use common::{frames, write_tone};

/// Create a sparse file of `len` bytes.
fn sized_file(path: &Path, len: u64) -> Result<(), Box<dyn Error>> {
    File::create(path)?.set_len(len)?;
    Ok(())
}

/// Backend double that records slices and writes their bounds as file content.
#[derive(Default)]
struct FakeBackend {
    duration_ms: u64,
    fail_on_chunk: Option<usize>,
    fail_convert: bool,
    fail_load: bool,
    converted_len: u64,
    slices: Rc<RefCell<Vec<ChunkRange>>>,
}

struct FakeAudio {
    duration_ms: u64,
    fail_on_chunk: Option<usize>,
    slices: Rc<RefCell<Vec<ChunkRange>>>,
}

impl AudioBackend for FakeBackend {
    type Audio = FakeAudio;

    fn load(&self, path: &Path) -> Result<FakeAudio, AutoSplitError> {
        assert!(path.exists(), "load of missing file {}", path.display());
        if self.fail_load {
            return Err(AutoSplitError::Decode {
                path: path.to_path_buf(),
                reason: "no audio stream".into(),
            });
        }
        Ok(FakeAudio {
            duration_ms: self.duration_ms,
            fail_on_chunk: self.fail_on_chunk,
            slices: Rc::clone(&self.slices),
        })
    }

    fn convert_to_mp3(&self, source: &Path, destination: &Path) -> Result<(), AutoSplitError> {
        if self.fail_convert {
            return Err(AutoSplitError::Decode {
                path: source.to_path_buf(),
                reason: "truncated RIFF header".into(),
            });
        }
        File::create(destination)?.set_len(self.converted_len)?;
        Ok(())
    }
}

impl DecodedAudio for FakeAudio {
    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn export_slice(&self, range: ChunkRange, destination: &Path) -> Result<(), AutoSplitError> {
        self.slices.borrow_mut().push(range);
        if self.fail_on_chunk == Some(range.number()) {
            return Err(AutoSplitError::Encode {
                path: destination.to_path_buf(),
                reason: "permission denied".into(),
            });
        }
        fs::write(destination, format!("{}..{}", range.start_ms, range.end_ms))?;
        Ok(())
    }
}

fn mb(value: f64) -> u64 {
    (value * BYTES_PER_MB as f64) as u64
}

#[test]
fn run_splits_twenty_mb_into_three_balanced_chunks() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("episode.mp3");
    sized_file(&input, mb(20.0))?;

    let backend = FakeBackend {
        duration_ms: 1_200_001,
        ..FakeBackend::default()
    };
    let result = run(&Config::new(&input)?, &backend, &mut NoProgress)?;

    assert!(result.split);
    let expected: Vec<PathBuf> = (1..=3)
        .map(|n| dir.path().join(format!("episode.mp3_part{n}.mp3")))
        .collect();
    assert_eq!(result.paths(), expected.as_slice());
    assert!(input.exists(), "append-suffix naming must keep the source");

    let slices = backend.slices.borrow();
    assert_eq!(slices.len(), 3);
    assert_eq!(slices[0].start_ms, 0);
    assert_eq!(slices[2].end_ms, 1_200_001);
    let total: u64 = slices.iter().map(ChunkRange::duration_ms).sum();
    assert_eq!(total, 1_200_001);
    Ok(())
}

#[test]
fn run_returns_source_when_exactly_at_limit() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("exact.mp3");
    sized_file(&input, mb(8.0))?;

    let backend = FakeBackend::default();
    let result = run(&Config::new(&input)?, &backend, &mut NoProgress)?;

    assert!(!result.split);
    assert_eq!(result.files, vec![input.clone()]);
    assert_eq!(result.size.size_mb_rounded(), 8.0);
    assert!(backend.slices.borrow().is_empty());
    Ok(())
}

#[test]
fn run_returns_source_when_under_limit() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("short.mp3");
    sized_file(&input, mb(7.99))?;

    let result = run(&Config::new(&input)?, &FakeBackend::default(), &mut NoProgress)?;
    assert!(!result.split);
    assert_eq!(result.files, vec![input]);
    Ok(())
}

#[test]
fn run_converts_wav_before_sizing() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("take.wav");
    // The WAV itself is small; only the converted MP3 size matters.
    sized_file(&input, 1_024)?;

    let backend = FakeBackend {
        duration_ms: 600_000,
        converted_len: mb(17.0),
        ..FakeBackend::default()
    };
    let result = run(&Config::new(&input)?, &backend, &mut NoProgress)?;

    assert_eq!(result.converted_from.as_deref(), Some(input.as_path()));
    assert_eq!(result.files.len(), 3);
    for path in &result.files {
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("take.mp3_part"), "unexpected output {name}");
        assert!(!name.contains(".wav"));
    }
    Ok(())
}

#[test]
fn run_converts_small_m4a_and_returns_the_mp3() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("memo.m4a");
    sized_file(&input, 2_048)?;

    let backend = FakeBackend {
        converted_len: 4_096,
        ..FakeBackend::default()
    };
    let result = run(&Config::new(&input)?, &backend, &mut NoProgress)?;

    assert!(!result.split);
    assert_eq!(result.files, vec![dir.path().join("memo.mp3")]);
    Ok(())
}

#[test]
fn run_reports_failure_after_partial_export() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("long.mp3");
    sized_file(&input, mb(20.0))?;

    let backend = FakeBackend {
        duration_ms: 90_000,
        fail_on_chunk: Some(2),
        ..FakeBackend::default()
    };
    let failure = run(&Config::new(&input)?, &backend, &mut NoProgress)
        .expect_err("encode failure on chunk 2 must not be reported as success");

    assert_eq!(failure.kind(), ErrorKind::Encode);
    assert_eq!(failure.written, vec![dir.path().join("long.mp3_part1.mp3")]);
    assert!(!failure.is_retry_safe());
    assert!(dir.path().join("long.mp3_part1.mp3").exists());
    assert!(!dir.path().join("long.mp3_part3.mp3").exists());
    Ok(())
}

#[test]
fn run_lists_converted_file_in_partial_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("take.wav");
    sized_file(&input, 1_024)?;

    let backend = FakeBackend {
        duration_ms: 90_000,
        converted_len: mb(20.0),
        fail_on_chunk: Some(1),
        ..FakeBackend::default()
    };
    let failure = run(&Config::new(&input)?, &backend, &mut NoProgress)
        .expect_err("first chunk fails");

    assert_eq!(failure.source_path, input);
    assert_eq!(failure.written, vec![dir.path().join("take.mp3")]);
    Ok(())
}

#[test]
fn run_surfaces_conversion_failure() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("broken.wav");
    sized_file(&input, 1_024)?;

    let backend = FakeBackend {
        duration_ms: 60_000,
        fail_convert: true,
        ..FakeBackend::default()
    };
    let failure = run(&Config::new(&input)?, &backend, &mut NoProgress)
        .expect_err("a failed conversion must stop the run");

    assert_eq!(failure.kind(), ErrorKind::Decode);
    assert_eq!(failure.source_path, input);
    assert!(failure.written.is_empty());
    assert!(failure.is_retry_safe());
    assert!(backend.slices.borrow().is_empty());
    assert!(!dir.path().join("broken.mp3").exists());
    Ok(())
}

#[test]
fn run_surfaces_load_failure_before_exporting() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("corrupt.mp3");
    sized_file(&input, mb(20.0))?;

    let backend = FakeBackend {
        fail_load: true,
        ..FakeBackend::default()
    };
    let failure = run(&Config::new(&input)?, &backend, &mut NoProgress)
        .expect_err("an unreadable source must stop the run");

    assert_eq!(failure.kind(), ErrorKind::Decode);
    assert!(failure.is_retry_safe());
    assert!(backend.slices.borrow().is_empty());
    assert!(!dir.path().join("corrupt.mp3_part1.mp3").exists());
    Ok(())
}

#[test]
fn run_leaves_final_slice_open_ended() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("set.mp3");
    sized_file(&input, mb(17.0))?;

    let backend = FakeBackend {
        duration_ms: 1_100,
        ..FakeBackend::default()
    };
    run(&Config::new(&input)?, &backend, &mut NoProgress)?;

    let flags: Vec<bool> = backend.slices.borrow().iter().map(|r| r.last).collect();
    assert_eq!(flags, vec![false, false, true]);
    Ok(())
}

#[test]
fn run_renumbers_and_preserves_source() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("show.mp3");
    sized_file(&input, mb(12.0))?;

    let backend = FakeBackend {
        duration_ms: 40_000,
        ..FakeBackend::default()
    };
    let config = Config::builder(&input)
        .naming(NamingPolicy::PreserveAndRenumber)
        .build()?;
    let result = run(&config, &backend, &mut NoProgress)?;

    assert_eq!(
        result.files,
        vec![
            dir.path().join("show_part1.mp3"),
            dir.path().join("show_part2.mp3"),
            dir.path().join("show_part3.mp3"),
        ]
    );
    assert!(!input.exists());
    assert_eq!(fs::metadata(&result.files[0])?.len(), mb(12.0));
    Ok(())
}

#[test]
fn run_refuses_second_renumbered_split_without_overwrite() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("show.mp3");
    sized_file(&input, mb(12.0))?;
    sized_file(&dir.path().join("show_part1.mp3"), 10)?;

    let backend = FakeBackend {
        duration_ms: 40_000,
        ..FakeBackend::default()
    };
    let config = Config::builder(&input)
        .naming(NamingPolicy::PreserveAndRenumber)
        .build()?;
    let failure = run(&config, &backend, &mut NoProgress).expect_err("part1 already exists");

    assert!(matches!(failure.error, AutoSplitError::OutputExists(_)));
    assert!(failure.is_retry_safe());
    assert!(input.exists());
    Ok(())
}

#[test]
fn run_honours_custom_limit() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("talk.mp3");
    sized_file(&input, mb(20.0))?;

    let backend = FakeBackend {
        duration_ms: 100_000,
        ..FakeBackend::default()
    };
    let config = Config::builder(&input).limit_bytes(mb(5.0)).build()?;
    let result = run(&config, &backend, &mut NoProgress)?;

    assert_eq!(result.plan.as_ref().map(|plan| plan.num_chunks()), Some(4));
    assert_eq!(result.files.len(), 4);
    Ok(())
}

#[test]
fn run_reports_missing_input() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config = Config::new(dir.path().join("missing.mp3"))?;

    let failure = run(&config, &FakeBackend::default(), &mut NoProgress).expect_err("missing input");
    assert_eq!(failure.kind(), ErrorKind::NotFound);
    assert!(failure.is_retry_safe());
    Ok(())
}

#[test]
fn run_rejects_unsupported_extension() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("notes.txt");
    fs::write(&input, b"not audio")?;

    let failure = run(&Config::new(&input)?, &FakeBackend::default(), &mut NoProgress)
        .expect_err("unsupported input should fail");
    assert!(matches!(
        failure.error,
        AutoSplitError::UnsupportedFormat { .. }
    ));
    Ok(())
}

#[test]
fn config_rejects_zero_limit() {
    let err = Config::builder("song.mp3").limit_bytes(0).build().unwrap_err();
    assert!(matches!(err, AutoSplitError::InvalidArgument(_)));
}

struct CountingProgress {
    chunks: usize,
    finished: bool,
}

impl ProgressReporter for CountingProgress {
    fn report(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::ChunkWritten { .. } => self.chunks += 1,
            ProgressEvent::Finish => self.finished = true,
            _ => {}
        }
    }
}

#[test]
fn run_reports_progress_until_finish() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("mix.mp3");
    sized_file(&input, mb(9.0))?;

    let backend = FakeBackend {
        duration_ms: 10_000,
        ..FakeBackend::default()
    };
    let mut progress = CountingProgress {
        chunks: 0,
        finished: false,
    };
    run(&Config::new(&input)?, &backend, &mut progress)?;

    assert_eq!(progress.chunks, 2);
    assert!(progress.finished);
    Ok(())
}

#[test]
fn probe_measures_wav_duration() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("tone.wav");
    write_tone(&input, 8_000, frames(8_000, 1_100))?;

    assert_eq!(probe_duration_ms(&input)?, 1_100);
    Ok(())
}

#[test]
fn probe_truncates_sub_millisecond_tail() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("tail.wav");
    // 8807 frames at 8 kHz is 1100.875 ms.
    write_tone(&input, 8_000, 8_807)?;

    assert_eq!(probe_duration_ms(&input)?, 1_100);
    Ok(())
}

#[test]
fn probe_rejects_garbage() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("noise.mp3");
    fs::write(&input, b"definitely not an mp3 stream")?;

    let err = probe_duration_ms(&input).expect_err("garbage should not decode");
    assert_eq!(err.kind(), ErrorKind::Decode);
    Ok(())
}

#[test]
fn dry_run_previews_conversion_for_wav() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("tone.wav");
    write_tone(&input, 8_000, frames(8_000, 500))?;

    match plan_split(&Config::new(&input)?)? {
        SplitPreview::Convert { from, to } => {
            assert_eq!(from, input);
            assert_eq!(to, dir.path().join("tone.mp3"));
        }
        other => panic!("unexpected preview: {other:?}"),
    }
    Ok(())
}

#[test]
fn dry_run_leaves_small_mp3_unchanged() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("tiny.mp3");
    sized_file(&input, 512)?;

    match plan_split(&Config::new(&input)?)? {
        SplitPreview::Unchanged { path, size } => {
            assert_eq!(path, input);
            assert!(!size.needs_split);
        }
        other => panic!("unexpected preview: {other:?}"),
    }
    Ok(())
}
