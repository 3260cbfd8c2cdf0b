//! Default configuration constants for ttstream.
//!
//! Shared by the configuration file, the module configuration and the CLI so
//! the three never disagree about the audio format or dispatch policy.

use std::time::Duration;

/// Output sample rate in Hz.
///
/// Fixed by the Tacotron2/HiFi-GAN LJSpeech models; every cached waveform and
/// every emitted frame uses this rate.
pub const SAMPLE_RATE: u32 = 22050;

/// Bytes per sample (signed 16-bit PCM).
pub const SAMPLE_WIDTH: u16 = 2;

/// Output channel count (mono).
pub const CHANNELS: u16 = 1;

/// Scale applied to engine output in `[-1, 1]` before truncating to `i16`.
pub const PCM16_SCALE: f32 = 32767.0;

/// Default duration of one emitted frame, in seconds.
///
/// 200ms keeps the downstream update rate low (5 frames per second) while
/// still letting a fresh synthesis start playing within one tick.
pub const FRAME_DURATION_SECS: f64 = 0.2;

/// Longest accepted frame duration, in seconds.
///
/// One frame is also one pacing tick; anything longer stops being a stream.
pub const MAX_FRAME_DURATION_SECS: f64 = 10.0;

/// Default eager-dispatch growth threshold, in characters.
///
/// In eager mode a partial hypothesis is only re-synthesized once it has grown
/// by more than this many characters since the last dispatch.
pub const EAGER_THRESHOLD: usize = 15;

/// Synthesize only on finalized text unless configured otherwise.
pub const DISPATCH_ON_FINISH: bool = true;

/// Default language code.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Name of the cache directory below the platform cache root.
pub const CACHE_SUBDIR: &str = "sbcache";

/// Application directory name used for config and cache paths.
pub const APP_DIR: &str = "ttstream";

/// Capacity of the inbound update channel.
pub const UPDATE_BUFFER: usize = 64;

/// Capacity of the dispatch report channel. Reports beyond it are dropped.
pub const REPORT_BUFFER: usize = 64;

/// How long `stop()` waits for an in-flight synthesis before detaching it.
pub const SYNTHESIS_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default frame duration as a [`Duration`].
pub fn frame_duration() -> Duration {
    Duration::from_secs_f64(FRAME_DURATION_SECS)
}

/// Longest accepted frame duration as a [`Duration`].
pub fn max_frame_duration() -> Duration {
    Duration::from_secs_f64(MAX_FRAME_DURATION_SECS)
}

/// Platform cache directory for synthesized waveforms.
///
/// Returns `~/.cache/ttstream/sbcache` on Linux, or a relative
/// `ttstream/sbcache` if the platform has no cache directory.
pub fn cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_default()
        .join(APP_DIR)
        .join(CACHE_SUBDIR)
}
