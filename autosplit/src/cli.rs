mod size;

use std::path::PathBuf;

use autosplit_core::backend::DEFAULT_BITRATE;
use autosplit_core::DEFAULT_FFMPEG;
use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};

use size::parse_size;

pub const DEFAULT_LIMIT: &str = "8MiB";

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Split audio files so every part fits under an upload size limit")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("limit")
                .short('l')
                .long("limit")
                .value_name("SIZE")
                .help("Largest allowed file size (e.g. 8MB, 25MiB, 500KB)")
                .default_value(DEFAULT_LIMIT)
                .value_parser(ValueParser::new(parse_size)),
        )
        .arg(
            Arg::new("rename")
                .long("rename")
                .help("Move the original to <name>_part1.mp3 and number the chunks from part2")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing output files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the files that would be produced without writing any")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ffmpeg")
                .long("ffmpeg")
                .value_name("PATH")
                .help("ffmpeg program used for conversion and encoding")
                .default_value(DEFAULT_FFMPEG)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("bitrate")
                .long("bitrate")
                .value_name("RATE")
                .help("MP3 bitrate passed to the encoder")
                .default_value(DEFAULT_BITRATE),
        )
        .arg(
            Arg::new("file_path")
                .value_name("FILE_PATH")
                .help("Path to the input audio file (mp3, wav or m4a)")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}
