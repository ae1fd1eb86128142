use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::AutoSplitError;

/// Measure the duration of an audio file in whole milliseconds.
///
/// Containers that advertise a frame count are answered from the header;
/// otherwise every packet of the default track is decoded and counted.
pub fn probe_duration_ms(path: &Path) -> Result<u64, AutoSplitError> {
    let decode_error = |reason: String| AutoSplitError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let file = File::open(path).map_err(|err| AutoSplitError::not_found(path, err))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| decode_error(err.to_string()))?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| decode_error("input stream does not provide a default track".into()))?;
    if track.codec_params.codec == CODEC_TYPE_NULL {
        return Err(decode_error("unsupported codec".into()));
    }

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| decode_error("input stream does not advertise a sample rate".into()))?;

    if let Some(frames) = params.n_frames {
        debug!("{}: {frames} frames at {sample_rate} Hz from header", path.display());
        return Ok(frames_to_ms(frames, sample_rate));
    }

    let mut decoder = get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|err| decode_error(err.to_string()))?;

    let mut frames: u64 = 0;
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(decode_error(err.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(err) => return Err(decode_error(err.to_string())),
        }
    }

    debug!("{}: decoded {frames} frames at {sample_rate} Hz", path.display());
    Ok(frames_to_ms(frames, sample_rate))
}

fn frames_to_ms(frames: u64, sample_rate: u32) -> u64 {
    let millis = u128::from(frames) * 1_000 / u128::from(sample_rate.max(1));
    millis.try_into().unwrap_or(u64::MAX)
}
