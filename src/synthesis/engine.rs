use crate::error::{Result, TtsError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Trait for the neural text-to-speech engine.
///
/// Implementations wrap a concrete model (Tacotron2 + HiFi-GAN, VITS, ...)
/// and run synchronously. A call may block for a model-dependent amount of
/// time, so it must never be made from the pacing thread.
pub trait SynthesisEngine: Send {
    /// Synthesize text into float samples in `[-1, 1]`, mono, at the output
    /// sample rate.
    fn synthesize(&mut self, text: &str) -> Result<Vec<f32>>;

    /// Get the name of the loaded engine
    fn name(&self) -> &str;
}

impl<T: SynthesisEngine + ?Sized> SynthesisEngine for Box<T> {
    fn synthesize(&mut self, text: &str) -> Result<Vec<f32>> {
        (**self).synthesize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock engine for testing.
///
/// Produces a constant-amplitude waveform whose length is proportional to the
/// number of characters, and records every text it was asked to synthesize.
#[derive(Debug, Clone)]
pub struct MockEngine {
    name: String,
    samples_per_char: usize,
    amplitude: f32,
    delay: Option<Duration>,
    should_fail: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEngine {
    /// Create a new mock engine with default settings
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            samples_per_char: 100,
            amplitude: 0.5,
            delay: None,
            should_fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of output samples per input character
    pub fn with_samples_per_char(mut self, samples: usize) -> Self {
        self.samples_per_char = samples;
        self
    }

    /// Sample value of every output sample
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Block for `delay` on every call, simulating model latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the mock to fail on synthesize
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Shared log of every text passed to `synthesize`, in call order.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

impl SynthesisEngine for MockEngine {
    fn synthesize(&mut self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().push(text.to_string());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.should_fail {
            return Err(TtsError::SynthesisFailed {
                text: text.to_string(),
                message: "mock synthesis failure".to_string(),
            });
        }

        Ok(vec![
            self.amplitude;
            text.chars().count() * self.samples_per_char
        ])
    }

    fn name(&self) -> &str {
        &self.name
    }
}
