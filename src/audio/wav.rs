//! WAV export for cached PCM16 waveforms.

use crate::audio::pcm::pcm16_bytes_to_samples;
use crate::defaults::{CHANNELS, SAMPLE_RATE, SAMPLE_WIDTH};
use crate::error::{Result, TtsError};
use std::io::{Seek, Write};
use std::path::Path;

fn wav_spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: SAMPLE_WIDTH * 8,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Writes raw PCM16 mono bytes as a WAV stream.
pub fn encode_wav<W: Write + Seek>(writer: W, pcm: &[u8]) -> Result<()> {
    let mut wav = hound::WavWriter::new(writer, wav_spec()).map_err(|e| TtsError::WavExport {
        message: format!("Failed to start WAV stream: {}", e),
    })?;

    for sample in pcm16_bytes_to_samples(pcm) {
        wav.write_sample(sample).map_err(|e| TtsError::WavExport {
            message: format!("Failed to write sample: {}", e),
        })?;
    }

    wav.finalize().map_err(|e| TtsError::WavExport {
        message: format!("Failed to finalize WAV stream: {}", e),
    })
}

/// Writes raw PCM16 mono bytes to a WAV file at `path`.
pub fn write_wav_file(path: &Path, pcm: &[u8]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    encode_wav(std::io::BufWriter::new(file), pcm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pcm::f32_to_pcm16_bytes;
    use std::io::Cursor;

    fn read_back(data: Vec<u8>) -> (hound::WavSpec, Vec<i16>) {
        let reader = hound::WavReader::new(Cursor::new(data)).unwrap();
        let spec = reader.spec();
        let samples = reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        (spec, samples)
    }

    #[test]
    fn encoded_stream_has_output_format() {
        let mut cursor = Cursor::new(Vec::new());
        encode_wav(&mut cursor, &f32_to_pcm16_bytes(&[0.25, -0.25])).unwrap();

        let (spec, samples) = read_back(cursor.into_inner());
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(samples, vec![8191, -8191]);
    }

    #[test]
    fn empty_waveform_encodes_header_only() {
        let mut cursor = Cursor::new(Vec::new());
        encode_wav(&mut cursor, &[]).unwrap();

        let (_, samples) = read_back(cursor.into_inner());
        assert!(samples.is_empty());
    }

    #[test]
    fn write_wav_file_creates_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        write_wav_file(&path, &[0x10, 0x00, 0x20, 0x00]).unwrap();

        let (_, samples) = read_back(std::fs::read(&path).unwrap());
        assert_eq!(samples, vec![16, 32]);
    }

    #[test]
    fn write_wav_file_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.wav");
        assert!(matches!(write_wav_file(&path, &[]), Err(TtsError::Io(_))));
    }
}
