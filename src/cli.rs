//! Command-line interface for ttstream
//!
//! Provides argument parsing using clap derive macros.

use crate::defaults;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Inspect and maintain the ttstream waveform cache
#[derive(Parser, Debug)]
#[command(
    name = "ttstream",
    version,
    about = "Incremental text-to-speech streaming tools"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the cache fingerprint of a text
    Fingerprint {
        /// Text to fingerprint
        text: String,

        /// Language code selecting the models (default: from config)
        #[arg(long, value_name = "LANG")]
        language: Option<String>,
    },

    /// Manage cached waveforms
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show how a cached waveform would be split into frames
    Frames {
        /// Fingerprint of the cache entry
        fingerprint: String,

        /// Frame duration (default: from config). Examples: 200ms, 0.5s, 1s
        #[arg(long, short = 'd', value_name = "DURATION", value_parser = parse_frame_duration)]
        frame_duration: Option<Duration>,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached waveforms
    List,

    /// Remove all cached waveforms
    Clear,

    /// Write a cached waveform to a WAV file
    Export {
        /// Fingerprint of the cache entry
        fingerprint: String,

        /// Output WAV path
        output: PathBuf,
    },
}

/// Parse a frame duration.
///
/// Accepts anything `humantime` does (`200ms`, `1s 250ms`) and bare numbers
/// as seconds (`0.2`), up to the maximum frame duration.
fn parse_frame_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let duration = match s.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => {
            Duration::try_from_secs_f64(secs).map_err(|e| format!("{}: {}", s, e))?
        }
        Ok(_) => return Err(format!("frame duration must be positive, got {}", s)),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("frame duration must be positive".to_string());
    }
    if duration > defaults::max_frame_duration() {
        return Err(format!(
            "frame duration must be at most {}s, got {}",
            defaults::MAX_FRAME_DURATION_SECS,
            s
        ));
    }
    Ok(duration)
}
