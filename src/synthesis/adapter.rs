//! Cache-checked synthesis: text → PCM16 waveform.

use crate::audio::pcm::f32_to_pcm16_bytes;
use crate::error::Result;
use crate::synthesis::cache::{Fingerprint, WaveformCache};
use crate::synthesis::engine::SynthesisEngine;
use crate::synthesis::language::{Language, ModelIdentity};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of one synthesis request.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// PCM16 little-endian mono bytes at the output sample rate.
    pub waveform: Vec<u8>,
    /// True if the waveform came from the cache.
    pub cache_hit: bool,
    /// Wall-clock time spent (cache read or engine call).
    pub elapsed: Duration,
}

/// Wraps a [`SynthesisEngine`] behind a single cache-checked call.
pub struct Synthesizer {
    engine: Box<dyn SynthesisEngine>,
    identity: ModelIdentity,
    cache: WaveformCache,
}

impl Synthesizer {
    pub fn new(
        engine: Box<dyn SynthesisEngine>,
        identity: ModelIdentity,
        cache: WaveformCache,
    ) -> Self {
        Self {
            engine,
            identity,
            cache,
        }
    }

    /// Builds a synthesizer for a language code, falling back to English for
    /// unknown codes.
    pub fn for_language(
        engine: Box<dyn SynthesisEngine>,
        language: &str,
        cache: WaveformCache,
    ) -> Self {
        Self::new(engine, Language::resolve(language).models(), cache)
    }

    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    pub fn cache(&self) -> &WaveformCache {
        &self.cache
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Cache key for `text` under this synthesizer's models.
    pub fn fingerprint(&self, text: &str) -> Fingerprint {
        Fingerprint::compute(text, &self.identity.model_id, &self.identity.voice_id)
    }

    /// Synthesizes `text`, returning only the waveform bytes.
    pub fn synthesize(&mut self, text: &str) -> Result<Vec<u8>> {
        self.synthesize_detailed(text).map(|s| s.waveform)
    }

    /// Synthesizes `text`, serving from the cache when possible.
    ///
    /// Whitespace-only text yields an empty waveform without touching the
    /// engine or the cache.
    pub fn synthesize_detailed(&mut self, text: &str) -> Result<Synthesis> {
        let start = Instant::now();

        if text.trim().is_empty() {
            debug!("Empty text, returning empty waveform");
            return Ok(Synthesis {
                waveform: Vec::new(),
                cache_hit: false,
                elapsed: start.elapsed(),
            });
        }

        let fingerprint = self.fingerprint(text);
        if let Some(waveform) = self.cache.get(&fingerprint) {
            return Ok(Synthesis {
                waveform,
                cache_hit: true,
                elapsed: start.elapsed(),
            });
        }

        let samples = self.engine.synthesize(text)?;
        let waveform = f32_to_pcm16_bytes(&samples);
        self.cache.put(&fingerprint, &waveform);

        let elapsed = start.elapsed();
        info!(
            engine = self.engine.name(),
            %fingerprint,
            samples = samples.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Synthesized"
        );

        Ok(Synthesis {
            waveform,
            cache_hit: false,
            elapsed,
        })
    }
}
