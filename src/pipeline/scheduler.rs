//! Frame scheduler: one frame per pacing tick.
//!
//! [`FrameScheduler`] owns the playback cursor and turns the shared buffer
//! into a frame-or-silence decision per tick. [`PacingLoop`] drives it on a
//! real-time cadence in its own thread and forwards each frame downstream.

use crate::pipeline::error::{ErrorReporter, StationError};
use crate::pipeline::pacer::Pacer;
use crate::pipeline::playback::{FrameRead, SharedPlayback};
use crate::pipeline::sink::FrameSink;
use crate::pipeline::types::{AudioFrame, FrameFormat, FrameUpdate};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info};

const STATION_NAME: &str = "FrameScheduler";

/// Result of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub frame: AudioFrame,
    /// The buffer was exhausted and silence was emitted.
    pub silent: bool,
    /// This tick consumed a pending reset.
    pub reset: bool,
}

/// Owns the playback cursor.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    cursor: usize,
    silence: AudioFrame,
}

impl FrameScheduler {
    pub fn new(frame_bytes: usize) -> Self {
        Self {
            cursor: 0,
            silence: AudioFrame::silence(frame_bytes),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Produces the frame for this tick.
    ///
    /// Emits the frame at the cursor and advances, or emits silence when the
    /// buffer is exhausted. An exhaustion that consumes a pending reset also
    /// rewinds the cursor to 0. A replacement buffer shorter than the cursor
    /// counts as exhausted and the cursor is clamped to its length.
    pub fn tick(&mut self, shared: &SharedPlayback) -> Tick {
        match shared.read(self.cursor) {
            FrameRead::Frame(frame) => {
                self.cursor += 1;
                Tick {
                    frame,
                    silent: false,
                    reset: false,
                }
            }
            FrameRead::Exhausted { reset, len } => {
                self.cursor = if reset { 0 } else { self.cursor.min(len) };
                Tick {
                    frame: self.silence.clone(),
                    silent: true,
                    reset,
                }
            }
        }
    }
}

/// The real-time emission loop.
pub struct PacingLoop {
    scheduler: FrameScheduler,
    shared: Arc<SharedPlayback>,
    sink: Box<dyn FrameSink>,
    format: FrameFormat,
    error_reporter: Arc<dyn ErrorReporter>,
    stop_rx: Receiver<()>,
}

impl PacingLoop {
    /// Creates a loop that runs until `stop_rx` receives a message or is
    /// disconnected.
    pub fn new(
        shared: Arc<SharedPlayback>,
        sink: Box<dyn FrameSink>,
        format: FrameFormat,
        error_reporter: Arc<dyn ErrorReporter>,
        stop_rx: Receiver<()>,
    ) -> Self {
        Self {
            scheduler: FrameScheduler::new(format.frame_bytes()),
            shared,
            sink,
            format,
            error_reporter,
            stop_rx,
        }
    }

    /// Spawns the loop in a dedicated thread. The thread returns the number
    /// of frames emitted.
    pub fn spawn(self) -> std::io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name(STATION_NAME.to_string())
            .spawn(move || self.run())
    }

    /// Runs the loop on the current thread until stopped.
    ///
    /// The stop channel doubles as the tick timer: each wait is a
    /// `recv_timeout`, so a stop request ends the wait immediately and no
    /// frame is emitted after it.
    pub fn run(mut self) -> u64 {
        let mut pacer = Pacer::new(self.format.frame_duration);
        let mut sequence: u64 = 0;
        info!(
            sink = self.sink.name(),
            frame_ms = self.format.frame_duration.as_millis() as u64,
            frame_bytes = self.format.frame_bytes(),
            "Pacing loop started"
        );

        loop {
            let wait = pacer.next_wait(Instant::now());
            match self.stop_rx.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let tick = self.scheduler.tick(&self.shared);
            if tick.reset {
                debug!(sequence, "Playback drained, context reset");
            }

            let update =
                FrameUpdate::add(tick.frame, &self.format, sequence, self.shared.grounded_in());
            sequence += 1;

            if let Err(e) = self.sink.emit(update) {
                self.error_reporter
                    .report(STATION_NAME, &StationError::Recoverable(e.to_string()));
            }
        }

        self.sink.finish();
        info!(frames = sequence, "Pacing loop stopped");
        sequence
    }
}
