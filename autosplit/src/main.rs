mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use autosplit_core::backend::{FfmpegBackend, FfmpegOptions};
use autosplit_core::{
    bytes_to_mb, mp3_sibling, plan_split, run, Config, NamingPolicy, ProgressEvent, SplitFailure,
    SplitPreview, SplitResult, Toolchain,
};
use indicatif::{HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;

use crate::cli::build_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let input_path = matches
        .get_one::<PathBuf>("file_path")
        .expect("required argument");
    if !input_path.is_file() {
        return Err(anyhow!(
            "input file does not exist: {}",
            input_path.display()
        ));
    }

    let limit_bytes = *matches
        .get_one::<u64>("limit")
        .expect("defaulted argument");
    let naming = if matches.get_flag("rename") {
        NamingPolicy::PreserveAndRenumber
    } else {
        NamingPolicy::AppendSuffix
    };
    let overwrite = matches.get_flag("overwrite");
    let dry_run = matches.get_flag("dry-run");

    let config = Config::builder(input_path)
        .limit_bytes(limit_bytes)
        .naming(naming)
        .overwrite(overwrite)
        .build()
        .with_context(|| {
            format!(
                "failed to create configuration for '{}'",
                input_path.display()
            )
        })?;
    debug!("resolved configuration: {config:?}");

    if dry_run {
        let preview = plan_split(&config)
            .with_context(|| format!("failed to plan split for '{}'", input_path.display()))?;
        print_preview(&preview, limit_bytes);
        return Ok(());
    }

    let ffmpeg = matches
        .get_one::<PathBuf>("ffmpeg")
        .expect("defaulted argument");
    let bitrate = matches
        .get_one::<String>("bitrate")
        .cloned()
        .expect("defaulted argument");
    let toolchain = Toolchain::detect(ffmpeg).context("cannot split audio without ffmpeg")?;
    debug!(
        "encoding with {} ({})",
        toolchain.ffmpeg().display(),
        toolchain.version()
    );
    let backend = FfmpegBackend::with_options(&toolchain, FfmpegOptions { bitrate });

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());

    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    let spinner_style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let progress_handle = progress.clone();
    let result = run(&config, &backend, &mut |event: ProgressEvent| match event {
        ProgressEvent::Converting { from, to } => {
            progress_handle.set_style(spinner_style.clone());
            progress_handle.enable_steady_tick(Duration::from_millis(100));
            progress_handle.set_message(format!(
                "converting {} to {}",
                from.display(),
                to.display()
            ));
        }
        ProgressEvent::Start {
            chunks,
            total_duration,
        } => {
            progress_handle.set_style(bar_style.clone());
            progress_handle.set_length(chunks as u64);
            progress_handle.set_position(0);
            progress_handle.enable_steady_tick(Duration::from_millis(100));
            progress_handle.set_message(format!("splitting {}", HumanDuration(total_duration)));
        }
        ProgressEvent::ChunkWritten { path, .. } => {
            progress_handle.inc(1);
            progress_handle.set_message(format!("wrote {}", path.display()));
        }
        ProgressEvent::Finish => {
            progress_handle.set_message(String::from("Completed"));
        }
    });

    progress.finish_and_clear();

    match result {
        Ok(result) => {
            print_result(&result, limit_bytes);
            Ok(())
        }
        Err(failure) => {
            report_partial_output(&failure);
            let context = format!(
                "failed to split '{}' ({})",
                failure.source_path.display(),
                failure.kind()
            );
            Err(anyhow::Error::new(failure.error).context(context))
        }
    }
}

fn print_result(result: &SplitResult, limit_bytes: u64) {
    if let Some(original) = &result.converted_from {
        println!(
            "Converted {} to {}",
            original.display(),
            mp3_sibling(original).display()
        );
    }

    if result.split {
        println!("Done! Created {} part(s):", result.files.len());
    } else {
        println!(
            "File is {:.2} MB, within the {:.2} MB limit. No need to split.",
            result.size.size_mb_rounded(),
            bytes_to_mb(limit_bytes)
        );
    }
    for path in result.paths() {
        println!(" - {}", path.display());
    }
}

fn print_preview(preview: &SplitPreview, limit_bytes: u64) {
    match preview {
        SplitPreview::Convert { from, to } => {
            println!(
                "Dry run: would convert {} to {}; the split depends on the converted size.",
                from.display(),
                to.display()
            );
        }
        SplitPreview::Unchanged { path, size } => {
            println!(
                "Dry run: no split needed, {} is {:.2} MB (limit {:.2} MB).",
                path.display(),
                size.size_mb_rounded(),
                bytes_to_mb(limit_bytes)
            );
        }
        SplitPreview::Split { plan, outputs, .. } => {
            println!(
                "Dry run: would split into {} chunk(s) of ~{} and produce {} file(s):",
                plan.num_chunks(),
                HumanDuration(Duration::from_millis(plan.chunk_duration_ms() as u64)),
                outputs.len()
            );
            for path in outputs {
                println!("  {}", path.display());
            }
        }
    }
}

fn report_partial_output(failure: &SplitFailure) {
    if failure.is_retry_safe() {
        eprintln!("No files were written; it is safe to retry.");
        return;
    }

    eprintln!("Partial output left on disk:");
    for path in &failure.written {
        eprintln!("  {}", path.display());
    }
    eprintln!("Retrying will stop on these files unless --overwrite is given.");
}
