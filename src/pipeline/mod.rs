//! Incremental TTS pipeline.
//!
//! Two threads per running module: the update thread aggregates text and
//! blocks on synthesis, the pacing thread emits one frame per tick from the
//! shared playback buffer.

pub mod aggregator;
pub mod error;
pub mod orchestrator;
pub mod pacer;
pub mod playback;
pub mod scheduler;
pub mod sink;
pub mod station;
pub mod synthesis_station;
pub mod types;

pub use aggregator::{Decision, DispatchPolicy, IncrementAggregator};
pub use error::{ErrorReporter, LogReporter, StationError};
pub use orchestrator::{ModuleConfig, ModuleHandle, TtsModule};
pub use pacer::Pacer;
pub use playback::{FrameBuffer, FrameRead, SharedPlayback};
pub use scheduler::{FrameScheduler, PacingLoop, Tick};
pub use sink::{ChannelSink, CollectorSink, FrameSink};
pub use station::{JoinOutcome, Station, StationRunner};
pub use synthesis_station::SynthesisStation;
pub use types::{
    AudioFrame, DispatchReport, FrameFormat, FrameUpdate, IncrementId, TextIncrement,
    TextUpdate, UpdateBatch, UpdateKind,
};
