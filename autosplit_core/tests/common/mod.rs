//! Fixtures shared by the integration tests.

use std::error::Error;
use std::fs;
use std::path::Path;

/// Write `frames` samples of a 440 Hz mono tone as 16-bit PCM WAV.
///
/// Generated on the fly so no binary fixtures live in the repository.
pub fn write_tone(path: &Path, sample_rate: u32, frames: u32) -> Result<(), Box<dyn Error>> {
    let data_len = frames * 2;
    let mut wav = Vec::with_capacity(44 + data_len as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    // PCM, mono, rate, byte rate, block align, bits per sample
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());

    let step = std::f32::consts::TAU * 440.0 / sample_rate as f32;
    for frame in 0..frames {
        let sample = ((frame as f32 * step).sin() * 0.6 * i16::MAX as f32) as i16;
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    fs::write(path, wav)?;
    Ok(())
}

/// Frame count of `millis` milliseconds at `sample_rate`.
pub fn frames(sample_rate: u32, millis: u32) -> u32 {
    (sample_rate as u64 * millis as u64 / 1_000) as u32
}
