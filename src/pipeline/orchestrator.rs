//! Module lifecycle: start, inbound updates, stop.

use crate::defaults;
use crate::error::{Result, TtsError};
use crate::pipeline::aggregator::{DispatchPolicy, IncrementAggregator};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::playback::SharedPlayback;
use crate::pipeline::scheduler::PacingLoop;
use crate::pipeline::sink::FrameSink;
use crate::pipeline::station::{JoinOutcome, StationRunner};
use crate::pipeline::synthesis_station::SynthesisStation;
use crate::pipeline::types::{DispatchReport, FrameFormat, UpdateBatch};
use crate::synthesis::Synthesizer;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for a module run.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// When aggregated text is synthesized
    pub policy: DispatchPolicy,
    /// Duration of one outbound frame, also the tick period
    pub frame_duration: Duration,
    /// Inbound batch queue size
    pub update_buffer: usize,
    /// Dispatch report queue size; reports beyond it are dropped
    pub report_buffer: usize,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            policy: DispatchPolicy::default(),
            frame_duration: defaults::frame_duration(),
            update_buffer: defaults::UPDATE_BUFFER,
            report_buffer: defaults::REPORT_BUFFER,
        }
    }
}

/// Handle to a running module.
///
/// Dropping the handle without calling [`ModuleHandle::stop`] disconnects
/// both threads; they wind down on their own.
pub struct ModuleHandle {
    running: Arc<AtomicBool>,
    update_tx: Sender<UpdateBatch>,
    stop_tx: Sender<()>,
    report_rx: Receiver<DispatchReport>,
    pacing: Option<JoinHandle<u64>>,
    station: StationRunner<SynthesisStation>,
    shared: Arc<SharedPlayback>,
}

impl ModuleHandle {
    /// Hands one inbound batch to the update thread.
    ///
    /// Blocks only while the inbound queue is full. Synthesis runs on the
    /// update thread, never on the caller's.
    pub fn process_update(&self, batch: UpdateBatch) -> Result<()> {
        if !self.is_running() {
            return Err(TtsError::ModuleStopped);
        }
        self.update_tx
            .send(batch)
            .map_err(|_| TtsError::ModuleStopped)
    }

    /// One report per synthesis trigger, in trigger order.
    ///
    /// Reading is optional. Once `report_buffer` reports are waiting, newer
    /// ones are dropped.
    pub fn dispatches(&self) -> &Receiver<DispatchReport> {
        &self.report_rx
    }

    /// Playback state shared with the pacing loop.
    pub fn playback(&self) -> &Arc<SharedPlayback> {
        &self.shared
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the module.
    ///
    /// The pacing loop is halted first, so no frame is emitted once this
    /// returns. The update thread is then given a bounded grace period; a
    /// synthesis still in flight after that is detached and its result
    /// discarded. Batches still queued are dropped without synthesis.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);

        // Wakes the pacing loop out of its wait
        if self.stop_tx.send(()).is_err() {
            debug!("Pacing loop already gone");
        }
        if let Some(pacing) = self.pacing.take() {
            match pacing.join() {
                Ok(frames) => info!(frames, "Frame emission stopped"),
                Err(_) => error!("Pacing thread panicked"),
            }
        }

        let Self {
            update_tx, station, ..
        } = self;
        drop(update_tx);

        let name = station.name();
        match station.join_timeout(defaults::SYNTHESIS_JOIN_TIMEOUT) {
            JoinOutcome::Joined => {}
            JoinOutcome::Panicked(msg) => error!(station = name, panic = %msg, "Station panicked"),
            JoinOutcome::Detached => warn!(
                station = name,
                timeout_ms = defaults::SYNTHESIS_JOIN_TIMEOUT.as_millis() as u64,
                "Synthesis still in flight at shutdown, detaching"
            ),
        }
        info!("Module stopped");
    }
}

/// Incremental TTS module: UpdateBatch → aggregation → synthesis → paced frames.
pub struct TtsModule {
    config: ModuleConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl TtsModule {
    /// Creates a new module with default error reporter.
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Starts the module with fresh state: empty buffer, cursor 0, no text.
    ///
    /// Spawns the pacing thread, which emits a frame every
    /// `frame_duration` from now on, and the update thread that runs
    /// synthesis. Frames go to `sink`.
    pub fn start(
        self,
        synthesizer: Synthesizer,
        sink: Box<dyn FrameSink>,
    ) -> Result<ModuleHandle> {
        if self.config.frame_duration > defaults::max_frame_duration() {
            return Err(TtsError::ConfigInvalidValue {
                key: "playback.frame_duration".to_string(),
                message: format!(
                    "{:?} exceeds the maximum of {:?}",
                    self.config.frame_duration,
                    defaults::max_frame_duration()
                ),
            });
        }
        let format = FrameFormat::new(self.config.frame_duration);
        if format.frame_bytes() == 0 {
            return Err(TtsError::ConfigInvalidValue {
                key: "playback.frame_duration".to_string(),
                message: format!(
                    "{:?} is shorter than one sample",
                    self.config.frame_duration
                ),
            });
        }

        let running = Arc::new(AtomicBool::new(true));
        let shared = Arc::new(SharedPlayback::new());

        let (stop_tx, stop_rx) = bounded(1);
        let pacing = PacingLoop::new(
            shared.clone(),
            sink,
            format,
            self.error_reporter.clone(),
            stop_rx,
        )
        .spawn()?;

        let (update_tx, update_rx) = bounded(self.config.update_buffer.max(1));
        let (report_tx, report_rx) = bounded(self.config.report_buffer.max(1));
        let station = SynthesisStation::new(
            IncrementAggregator::new(self.config.policy),
            synthesizer,
            shared.clone(),
            running.clone(),
            format.frame_bytes(),
        );
        let station =
            StationRunner::spawn(station, update_rx, report_tx, self.error_reporter.clone())?;

        info!(
            policy = ?self.config.policy,
            frame_ms = self.config.frame_duration.as_millis() as u64,
            "Module started"
        );

        Ok(ModuleHandle {
            running,
            update_tx,
            stop_tx,
            report_rx,
            pacing: Some(pacing),
            station,
            shared,
        })
    }
}
