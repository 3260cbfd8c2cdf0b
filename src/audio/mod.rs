//! PCM16 waveform helpers.

pub mod pcm;
pub mod wav;

pub use pcm::{f32_to_pcm16_bytes, pcm16_bytes_to_samples, pcm16_duration};
pub use wav::{encode_wav, write_wav_file};
