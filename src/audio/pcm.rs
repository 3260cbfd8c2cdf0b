//! Conversions between engine output and raw PCM16 byte buffers.
//!
//! Every waveform that leaves the synthesis adapter is signed 16-bit
//! little-endian mono at [`SAMPLE_RATE`](crate::defaults::SAMPLE_RATE); the
//! cache and the frame scheduler only ever see these bytes.

use crate::defaults::{PCM16_SCALE, SAMPLE_RATE, SAMPLE_WIDTH};
use std::time::Duration;

/// Converts float samples in `[-1, 1]` to PCM16 little-endian bytes.
///
/// Samples are clamped to `[-1, 1]`, scaled by 32767 and truncated toward
/// zero. Non-finite samples become silence.
pub fn f32_to_pcm16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * SAMPLE_WIDTH as usize);
    for &sample in samples {
        let value = if sample.is_finite() {
            (sample.clamp(-1.0, 1.0) * PCM16_SCALE) as i16
        } else {
            0
        };
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decodes PCM16 little-endian bytes into samples.
///
/// A trailing odd byte (which a well-formed waveform never has) is ignored.
pub fn pcm16_bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Playback duration of a PCM16 mono buffer at the output sample rate.
pub fn pcm16_duration(byte_len: usize) -> Duration {
    let samples = byte_len / SAMPLE_WIDTH as usize;
    Duration::from_secs_f64(samples as f64 / SAMPLE_RATE as f64)
}
