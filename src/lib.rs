//! ttstream - Incremental text-to-speech streaming
//!
//! Aggregates add/revoke text increments, synthesizes them through a cached
//! engine boundary and emits fixed-size PCM16 frames on a real-time cadence.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod synthesis;

// Core traits (engine → module → sink)
pub use pipeline::sink::{ChannelSink, CollectorSink, FrameSink};
pub use synthesis::engine::SynthesisEngine;

// Module
pub use pipeline::orchestrator::{ModuleConfig, ModuleHandle, TtsModule};
pub use pipeline::types::{
    DispatchReport, FrameUpdate, IncrementId, TextIncrement, TextUpdate, UpdateBatch, UpdateKind,
};
pub use synthesis::{Fingerprint, Synthesizer, WaveformCache};

// Error handling
pub use error::{Result, TtsError};

// Config
pub use config::Config;

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
