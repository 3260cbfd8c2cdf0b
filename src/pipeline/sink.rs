use crate::error::{Result, TtsError};
use crate::pipeline::types::FrameUpdate;
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Pluggable downstream consumer of paced audio frames.
///
/// Called from the pacing thread once per tick. Implementations must not
/// block: a slow consumer would delay every following frame.
pub trait FrameSink: Send + 'static {
    /// Handle one frame. Errors are reported and the next frame is attempted.
    fn emit(&mut self, update: FrameUpdate) -> Result<()>;

    /// Called once when the pacing loop stops.
    fn finish(&mut self) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Forwards frames into a crossbeam channel without blocking.
///
/// With a bounded channel a full queue drops the frame and reports an error;
/// an unbounded channel never drops.
pub struct ChannelSink {
    tx: Sender<FrameUpdate>,
}

impl ChannelSink {
    pub fn new(tx: Sender<FrameUpdate>) -> Self {
        Self { tx }
    }
}

impl FrameSink for ChannelSink {
    fn emit(&mut self, update: FrameUpdate) -> Result<()> {
        let sequence = update.sequence;
        self.tx.try_send(update).map_err(|e| TtsError::FrameSink {
            message: match e {
                TrySendError::Full(_) => format!("downstream full, dropped frame {}", sequence),
                TrySendError::Disconnected(_) => {
                    format!("downstream disconnected, dropped frame {}", sequence)
                }
            },
        })
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Sink that collects frames into a shared vector (for testing).
#[derive(Clone, Default)]
pub struct CollectorSink {
    frames: Arc<Mutex<Vec<FrameUpdate>>>,
    finished: Arc<Mutex<bool>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every frame received so far.
    pub fn frames(&self) -> Vec<FrameUpdate> {
        self.frames.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// True once the pacing loop has called `finish`.
    pub fn is_finished(&self) -> bool {
        *self.finished.lock()
    }
}

impl FrameSink for CollectorSink {
    fn emit(&mut self, update: FrameUpdate) -> Result<()> {
        self.frames.lock().push(update);
        Ok(())
    }

    fn finish(&mut self) {
        *self.finished.lock() = true;
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{AudioFrame, FrameFormat};
    use crossbeam_channel::bounded;
    use std::time::Duration;

    fn update(sequence: u64) -> FrameUpdate {
        let format = FrameFormat::new(Duration::from_millis(10));
        FrameUpdate::add(AudioFrame::silence(4), &format, sequence, None)
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, rx) = bounded(4);
        let mut sink = ChannelSink::new(tx);

        sink.emit(update(0)).unwrap();
        sink.emit(update(1)).unwrap();

        assert_eq!(rx.try_recv().unwrap().sequence, 0);
        assert_eq!(rx.try_recv().unwrap().sequence, 1);
    }

    #[test]
    fn test_channel_sink_full_queue_drops_without_blocking() {
        let (tx, _rx) = bounded(1);
        let mut sink = ChannelSink::new(tx);

        sink.emit(update(0)).unwrap();
        let err = sink.emit(update(1)).unwrap_err();
        assert!(err.to_string().contains("downstream full, dropped frame 1"));
    }

    #[test]
    fn test_channel_sink_disconnected() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut sink = ChannelSink::new(tx);

        let err = sink.emit(update(5)).unwrap_err();
        assert!(err.to_string().contains("disconnected"));
    }

    #[test]
    fn test_collector_sink_collects_and_finishes() {
        let sink = CollectorSink::new();
        let mut handle = sink.clone();

        handle.emit(update(0)).unwrap();
        handle.emit(update(1)).unwrap();
        assert!(!sink.is_finished());
        handle.finish();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.frames()[1].sequence, 1);
        assert!(sink.is_finished());
    }
}
