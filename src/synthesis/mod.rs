//! Text → waveform: engine boundary, language table and result cache.

pub mod adapter;
pub mod cache;
pub mod engine;
pub mod language;

pub use adapter::{Synthesis, Synthesizer};
pub use cache::{CacheEntryInfo, Fingerprint, WaveformCache};
pub use engine::{MockEngine, SynthesisEngine};
pub use language::{Language, ModelIdentity};
