use crate::defaults;
use crate::error::{Result, TtsError};
use crate::pipeline::{DispatchPolicy, ModuleConfig};
use crate::synthesis::WaveformCache;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub synthesis: SynthesisConfig,
    pub playback: PlaybackConfig,
    pub cache: CacheConfig,
}

/// Dispatch and model selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub language: String,
    pub dispatch_on_finish: bool,
    pub eager_threshold: usize,
}

/// Outbound frame pacing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Seconds per frame
    pub frame_duration: f64,
}

/// Waveform cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Defaults to the platform cache directory when unset
    pub dir: Option<PathBuf>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            dispatch_on_finish: defaults::DISPATCH_ON_FINISH,
            eager_threshold: defaults::EAGER_THRESHOLD,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_duration: defaults::FRAME_DURATION_SECS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TtsError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                TtsError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file is missing
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(TtsError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TTSTREAM_LANGUAGE → synthesis.language
    /// - TTSTREAM_CACHE_DIR → cache.dir
    /// - TTSTREAM_CACHE → cache.enabled (`0`/`false`/`off` or `1`/`true`/`on`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("TTSTREAM_LANGUAGE")
            && !language.is_empty()
        {
            self.synthesis.language = language;
        }

        if let Ok(dir) = std::env::var("TTSTREAM_CACHE_DIR")
            && !dir.is_empty()
        {
            self.cache.dir = Some(PathBuf::from(dir));
        }

        if let Ok(flag) = std::env::var("TTSTREAM_CACHE") {
            match flag.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.cache.enabled = false,
                "1" | "true" | "on" => self.cache.enabled = true,
                "" => {}
                other => tracing::warn!(value = other, "Ignoring unrecognized TTSTREAM_CACHE"),
            }
        }

        self
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<()> {
        let secs = self.playback.frame_duration;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(TtsError::ConfigInvalidValue {
                key: "playback.frame_duration".to_string(),
                message: format!("must be a positive number of seconds, got {}", secs),
            });
        }
        if secs > defaults::MAX_FRAME_DURATION_SECS {
            return Err(TtsError::ConfigInvalidValue {
                key: "playback.frame_duration".to_string(),
                message: format!(
                    "{}s exceeds the maximum of {}s",
                    secs,
                    defaults::MAX_FRAME_DURATION_SECS
                ),
            });
        }
        if (defaults::SAMPLE_RATE as f64 * secs) < 1.0 {
            return Err(TtsError::ConfigInvalidValue {
                key: "playback.frame_duration".to_string(),
                message: format!("{}s is shorter than one sample", secs),
            });
        }
        if self.synthesis.language.trim().is_empty() {
            return Err(TtsError::ConfigInvalidValue {
                key: "synthesis.language".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/ttstream/config.toml on Linux, or `None` if the
    /// platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR).join("config.toml"))
    }

    /// Frame duration as a [`Duration`].
    ///
    /// Out-of-range values saturate to zero or to the maximum frame
    /// duration; `validate` is what reports them.
    pub fn frame_duration(&self) -> Duration {
        let secs = self.playback.frame_duration;
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs.min(defaults::MAX_FRAME_DURATION_SECS))
            .unwrap_or_default()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(defaults::cache_dir)
    }

    /// Module settings derived from this configuration.
    pub fn module_config(&self) -> ModuleConfig {
        ModuleConfig {
            policy: DispatchPolicy::from_flags(
                self.synthesis.dispatch_on_finish,
                self.synthesis.eager_threshold,
            ),
            frame_duration: self.frame_duration(),
            ..ModuleConfig::default()
        }
    }

    /// Opens the configured waveform cache.
    pub fn open_cache(&self) -> WaveformCache {
        WaveformCache::new(self.cache_dir(), self.cache.enabled)
    }
}
