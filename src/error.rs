//! Error types for ttstream.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Synthesis errors
    #[error("Synthesis failed for {text:?}: {message}")]
    SynthesisFailed { text: String, message: String },

    // Cache errors (only surfaced by explicit maintenance operations)
    #[error("Cache entry not found: {fingerprint}")]
    CacheEntryNotFound { fingerprint: String },

    #[error("Invalid fingerprint {value:?}: expected 32 lowercase hex characters")]
    InvalidFingerprint { value: String },

    // Output errors
    #[error("Frame sink failed: {message}")]
    FrameSink { message: String },

    #[error("WAV export failed: {message}")]
    WavExport { message: String },

    // Module lifecycle errors
    #[error("Module is not running")]
    ModuleStopped,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, TtsError>;
