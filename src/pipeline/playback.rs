//! Frame buffers and the playback state shared between the update thread and
//! the pacing loop.
//!
//! The update thread publishes whole buffers; the pacing loop reads one frame
//! per tick. Both go through [`SharedPlayback`], whose lock is held only for a
//! swap or a single read, never across a sleep or an engine call.

use crate::pipeline::types::{AudioFrame, IncrementId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// An immutable sequence of equally sized frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    frames: Vec<AudioFrame>,
}

impl FrameBuffer {
    /// Splits a waveform into `ceil(len / frame_bytes)` frames of exactly
    /// `frame_bytes` bytes, zero-padding the last one.
    ///
    /// A zero `frame_bytes` yields an empty buffer.
    pub fn from_waveform(waveform: &[u8], frame_bytes: usize) -> Self {
        if frame_bytes == 0 {
            return Self::default();
        }

        let frames = waveform
            .chunks(frame_bytes)
            .map(|chunk| {
                let mut data = Vec::with_capacity(frame_bytes);
                data.extend_from_slice(chunk);
                data.resize(frame_bytes, 0);
                AudioFrame::new(data)
            })
            .collect();

        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AudioFrame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[AudioFrame] {
        &self.frames
    }
}

/// State guarded by the playback lock.
#[derive(Debug, Default)]
struct PlaybackState {
    buffer: Arc<FrameBuffer>,
    pending_reset: bool,
    /// Incremented on every context reset; the update thread compares it to
    /// the value it last saw to know when to clear its aggregator.
    context_epoch: u64,
    /// Trigger number of the buffer currently in play.
    published_trigger: u64,
    grounded_in: Option<IncrementId>,
}

/// What the pacing loop should emit for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRead {
    /// Frame at the cursor; the cursor should advance.
    Frame(AudioFrame),
    /// Buffer exhausted. `reset` is true when this exhaustion consumed a
    /// pending reset (buffer cleared, context epoch advanced). `len` is the
    /// length of the buffer now in play, so the reader can clamp its cursor.
    Exhausted { reset: bool, len: usize },
}

/// Playback state shared by the update thread and the pacing loop.
#[derive(Debug, Default)]
pub struct SharedPlayback {
    state: Mutex<PlaybackState>,
}

impl SharedPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the buffer, unless a later trigger has already published.
    ///
    /// Returns `false` (and leaves the state unchanged) for a stale trigger.
    /// When `finalize` is set, a context reset is armed for the next
    /// exhaustion.
    pub fn publish(&self, trigger: u64, buffer: FrameBuffer, finalize: bool) -> bool {
        let mut state = self.state.lock();
        if trigger <= state.published_trigger {
            debug!(
                trigger,
                published = state.published_trigger,
                "Discarding stale synthesis result"
            );
            return false;
        }
        state.buffer = Arc::new(buffer);
        state.published_trigger = trigger;
        if finalize {
            state.pending_reset = true;
        }
        true
    }

    /// Arms a context reset without replacing the buffer.
    ///
    /// Used when a final batch could not be synthesized: the previous buffer
    /// keeps playing and the utterance still ends once it drains.
    pub fn arm_reset(&self) {
        self.state.lock().pending_reset = true;
    }

    /// Records the latest input increment for outbound grounding.
    pub fn set_grounded_in(&self, id: Option<IncrementId>) {
        self.state.lock().grounded_in = id;
    }

    pub fn grounded_in(&self) -> Option<IncrementId> {
        self.state.lock().grounded_in
    }

    pub fn context_epoch(&self) -> u64 {
        self.state.lock().context_epoch
    }

    pub fn pending_reset(&self) -> bool {
        self.state.lock().pending_reset
    }

    /// Handle to the buffer currently in play.
    pub fn buffer(&self) -> Arc<FrameBuffer> {
        self.state.lock().buffer.clone()
    }

    /// Reads the frame at `cursor`, consuming a pending reset on exhaustion.
    ///
    /// The exhaustion check and the reset happen under one lock, so a buffer
    /// published concurrently is never cleared by a reset meant for the
    /// previous one.
    pub fn read(&self, cursor: usize) -> FrameRead {
        let mut state = self.state.lock();
        if let Some(frame) = state.buffer.get(cursor) {
            return FrameRead::Frame(frame.clone());
        }

        if !state.pending_reset {
            return FrameRead::Exhausted {
                reset: false,
                len: state.buffer.len(),
            };
        }

        state.buffer = Arc::new(FrameBuffer::default());
        state.pending_reset = false;
        state.context_epoch += 1;
        FrameRead::Exhausted {
            reset: true,
            len: 0,
        }
    }
}
