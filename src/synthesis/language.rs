//! Fixed language → model table.

use crate::defaults;
use tracing::warn;

/// Languages with a known synthesis model pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
}

/// The model pair that identifies a synthesis request.
///
/// Both identifiers take part in the cache fingerprint, so switching either
/// model never serves audio rendered by the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIdentity {
    /// Text → spectrogram model.
    pub model_id: String,
    /// Spectrogram → waveform model (vocoder / voice).
    pub voice_id: String,
}

impl ModelIdentity {
    pub fn new(model_id: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            voice_id: voice_id.into(),
        }
    }
}

impl Language {
    /// Every supported language, in table order.
    pub const ALL: &'static [Language] = &[Language::English];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
        }
    }

    /// Looks up a language by code (case-insensitive, region subtags ignored).
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next().unwrap_or_default();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.code().eq_ignore_ascii_case(primary))
    }

    /// Looks up a language, falling back to English for unknown codes.
    pub fn resolve(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            warn!(
                language = code,
                fallback = defaults::DEFAULT_LANGUAGE,
                "Unknown TTS language, defaulting to English"
            );
            Language::English
        })
    }

    /// The model pair used to synthesize this language.
    pub fn models(self) -> ModelIdentity {
        match self {
            Language::English => ModelIdentity::new(
                "speechbrain/tts-tacotron2-ljspeech",
                "speechbrain/tts-hifigan-ljspeech",
            ),
        }
    }
}
