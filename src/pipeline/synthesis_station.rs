//! Update-handling station: aggregates text and publishes synthesized frames.

use crate::pipeline::aggregator::IncrementAggregator;
use crate::pipeline::error::StationError;
use crate::pipeline::playback::{FrameBuffer, SharedPlayback};
use crate::pipeline::station::Station;
use crate::pipeline::types::{DispatchReport, UpdateBatch};
use crate::synthesis::Synthesizer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Station that turns inbound update batches into playback buffers.
///
/// Runs on the update thread. Synthesis blocks this station only; the pacing
/// loop keeps emitting from whatever buffer is currently published.
pub struct SynthesisStation {
    aggregator: IncrementAggregator,
    synthesizer: Synthesizer,
    shared: Arc<SharedPlayback>,
    running: Arc<AtomicBool>,
    frame_bytes: usize,
    seen_epoch: u64,
    trigger: u64,
}

impl SynthesisStation {
    pub fn new(
        aggregator: IncrementAggregator,
        synthesizer: Synthesizer,
        shared: Arc<SharedPlayback>,
        running: Arc<AtomicBool>,
        frame_bytes: usize,
    ) -> Self {
        let seen_epoch = shared.context_epoch();
        Self {
            aggregator,
            synthesizer,
            shared,
            running,
            frame_bytes,
            seen_epoch,
            trigger: 0,
        }
    }

    /// Clears the aggregator if the pacing loop finished an utterance since
    /// the last batch.
    fn sync_context(&mut self) {
        let epoch = self.shared.context_epoch();
        if epoch != self.seen_epoch {
            debug!(epoch, "Utterance finished, clearing text context");
            self.aggregator.clear_context();
            self.seen_epoch = epoch;
        }
    }
}

impl Station for SynthesisStation {
    type Input = UpdateBatch;
    type Output = DispatchReport;

    fn process(&mut self, batch: UpdateBatch) -> Result<Option<DispatchReport>, StationError> {
        // Batches still queued when the module stops are dropped unread
        if !self.running.load(Ordering::SeqCst) {
            debug!(
                updates = batch.updates.len(),
                "Module stopped, dropping queued batch"
            );
            return Ok(None);
        }

        self.sync_context();

        let Some(decision) = self.aggregator.apply(&batch) else {
            return Ok(None);
        };
        self.shared.set_grounded_in(self.aggregator.latest());

        let Some(text) = decision.dispatch else {
            return Ok(None);
        };
        self.trigger += 1;
        let trigger = self.trigger;

        let synthesis = match self.synthesizer.synthesize_detailed(&text) {
            Ok(synthesis) => synthesis,
            Err(e) => {
                // The previous buffer keeps playing; a final batch still ends
                // the utterance once it drains.
                if decision.is_final {
                    self.shared.arm_reset();
                }
                return Err(StationError::Recoverable(e.to_string()));
            }
        };

        if !self.running.load(Ordering::SeqCst) {
            debug!(trigger, "Module stopped during synthesis, discarding result");
            return Ok(None);
        }

        let buffer = FrameBuffer::from_waveform(&synthesis.waveform, self.frame_bytes);
        let frame_count = buffer.len();
        self.shared.publish(trigger, buffer, decision.is_final);

        Ok(Some(DispatchReport {
            trigger,
            text,
            frame_count,
            is_final: decision.is_final,
            cache_hit: synthesis.cache_hit,
            elapsed: synthesis.elapsed,
        }))
    }

    fn name(&self) -> &'static str {
        "SynthesisStation"
    }

    fn shutdown(&mut self) {
        debug!(triggers = self.trigger, "Synthesis station shutting down");
    }
}
