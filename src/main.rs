use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use ttstream::audio::{pcm16_duration, write_wav_file};
use ttstream::cli::{CacheAction, Cli, Commands};
use ttstream::config::Config;
use ttstream::pipeline::{FrameBuffer, FrameFormat};
use ttstream::synthesis::{Fingerprint, Language, WaveformCache};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fingerprint { text, language } => {
            let code = language.as_deref().unwrap_or(&config.synthesis.language);
            let models = Language::resolve(code).models();
            println!(
                "{}",
                Fingerprint::compute(&text, &models.model_id, &models.voice_id)
            );
        }
        Commands::Cache { action } => handle_cache_command(action, &config.open_cache())?,
        Commands::Frames {
            fingerprint,
            frame_duration,
        } => {
            let duration = frame_duration.unwrap_or_else(|| config.frame_duration());
            show_frames(&config.open_cache(), &fingerprint, duration)?;
        }
        Commands::Config => {
            let text = toml::to_string_pretty(&config).context("Failed to render config")?;
            print!("{}", text);
        }
    }

    Ok(())
}

/// Installs the log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration from file with environment overrides.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match (custom_path, Config::default_path()) {
        (Some(path), _) => Config::load(path)?,
        (None, Some(default_path)) => Config::load_or_default(&default_path)?,
        (None, None) => Config::default(),
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn handle_cache_command(action: CacheAction, cache: &WaveformCache) -> Result<()> {
    match action {
        CacheAction::List => {
            let entries = cache.entries()?;
            if entries.is_empty() {
                eprintln!("Cache is empty ({})", cache.dir().display());
                return Ok(());
            }
            for entry in &entries {
                println!(
                    "{}  {:>10} bytes  {}",
                    entry.fingerprint,
                    entry.size_bytes,
                    humantime::format_duration(round_to_millis(entry.duration))
                );
            }
            eprintln!("{} entries in {}", entries.len(), cache.dir().display());
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            eprintln!("Removed {} entries from {}", removed, cache.dir().display());
        }
        CacheAction::Export {
            fingerprint,
            output,
        } => {
            let fingerprint: Fingerprint = fingerprint.parse()?;
            let pcm = cache.load(&fingerprint)?;
            write_wav_file(&output, &pcm)
                .with_context(|| format!("Failed to export {}", fingerprint))?;
            eprintln!(
                "Wrote {} ({}) to {}",
                fingerprint,
                humantime::format_duration(round_to_millis(pcm16_duration(pcm.len()))),
                output.display()
            );
        }
    }
    Ok(())
}

fn show_frames(cache: &WaveformCache, fingerprint: &str, frame_duration: Duration) -> Result<()> {
    let fingerprint: Fingerprint = fingerprint.parse()?;
    let pcm = cache.load(&fingerprint)?;
    let format = FrameFormat::new(frame_duration);
    let frame_bytes = format.frame_bytes();
    anyhow::ensure!(
        frame_bytes > 0,
        "frame duration {:?} is shorter than one sample",
        frame_duration
    );
    let buffer = FrameBuffer::from_waveform(&pcm, frame_bytes);
    let padding = buffer.len() * frame_bytes - pcm.len();

    println!("fingerprint:    {}", fingerprint);
    println!("waveform:       {} bytes", pcm.len());
    println!(
        "frame:          {} bytes ({})",
        frame_bytes,
        humantime::format_duration(frame_duration)
    );
    println!("frames:         {}", buffer.len());
    println!("padding:        {} bytes", padding);
    let playback = u32::try_from(buffer.len())
        .ok()
        .and_then(|frames| frame_duration.checked_mul(frames))
        .map(|d| humantime::format_duration(d).to_string())
        .unwrap_or_else(|| "out of range".to_string());
    println!("playback time:  {}", playback);
    Ok(())
}

fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
