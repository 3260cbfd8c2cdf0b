//! Data types exchanged across the module boundary.

use crate::defaults::{CHANNELS, SAMPLE_RATE, SAMPLE_WIDTH};
use std::sync::Arc;
use std::time::Duration;

/// Identifies one text increment so a later revoke can name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IncrementId(pub u64);

/// Whether an update adds or revokes an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Add,
    Revoke,
}

/// One unit of incoming text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextIncrement {
    pub id: IncrementId,
    pub text: String,
    /// Committed by the producer; a final increment always triggers synthesis.
    pub is_final: bool,
}

impl TextIncrement {
    /// Creates a non-final (hypothesis) increment.
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id: IncrementId(id),
            text: text.into(),
            is_final: false,
        }
    }

    /// Creates a committed increment.
    pub fn committed(id: u64, text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            ..Self::new(id, text)
        }
    }
}

/// An increment paired with what to do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUpdate {
    pub increment: TextIncrement,
    pub kind: UpdateKind,
}

impl TextUpdate {
    pub fn add(increment: TextIncrement) -> Self {
        Self {
            increment,
            kind: UpdateKind::Add,
        }
    }

    pub fn revoke(increment: TextIncrement) -> Self {
        Self {
            increment,
            kind: UpdateKind::Revoke,
        }
    }
}

/// All updates delivered together in one upstream message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    pub updates: Vec<TextUpdate>,
}

impl UpdateBatch {
    pub fn new(updates: Vec<TextUpdate>) -> Self {
        Self { updates }
    }

    /// A batch holding a single add.
    pub fn add(increment: TextIncrement) -> Self {
        Self::new(vec![TextUpdate::add(increment)])
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// True if any increment in the batch is committed.
    pub fn is_final(&self) -> bool {
        self.updates.iter().any(|u| u.increment.is_final)
    }
}

impl From<Vec<TextUpdate>> for UpdateBatch {
    fn from(updates: Vec<TextUpdate>) -> Self {
        Self::new(updates)
    }
}

/// One fixed-size chunk of PCM16 audio.
///
/// The bytes are reference-counted so the pacing loop can hand a frame
/// downstream without copying it out of the shared buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    data: Arc<[u8]>,
}

impl AudioFrame {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }

    /// A frame of `len` zero bytes.
    pub fn silence(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}

/// Audio format attached to every outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub sample_width: u16,
    pub frame_duration: Duration,
}

impl FrameFormat {
    /// Output format for frames of `frame_duration`.
    pub fn new(frame_duration: Duration) -> Self {
        Self {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            sample_width: SAMPLE_WIDTH,
            frame_duration,
        }
    }

    /// Size in bytes of one frame: `int(rate * duration) * width`.
    pub fn frame_bytes(&self) -> usize {
        let samples = (self.sample_rate as f64 * self.frame_duration.as_secs_f64()) as usize;
        samples * self.sample_width as usize * self.channels as usize
    }
}

/// One outbound frame, emitted once per pacing tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameUpdate {
    /// Always [`UpdateKind::Add`]; frames are never revoked.
    pub kind: UpdateKind,
    pub frame: AudioFrame,
    pub channels: u16,
    pub sample_rate: u32,
    pub sample_width: u16,
    /// Position of this frame in the output stream, starting at 0.
    pub sequence: u64,
    /// Latest input increment this audio answers, if any was received.
    pub grounded_in: Option<IncrementId>,
}

impl FrameUpdate {
    pub fn add(
        frame: AudioFrame,
        format: &FrameFormat,
        sequence: u64,
        grounded_in: Option<IncrementId>,
    ) -> Self {
        Self {
            kind: UpdateKind::Add,
            frame,
            channels: format.channels,
            sample_rate: format.sample_rate,
            sample_width: format.sample_width,
            sequence,
            grounded_in,
        }
    }

    pub fn data(&self) -> &[u8] {
        self.frame.data()
    }
}

/// Summary of one synthesis trigger, published by the update thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Trigger number, starting at 1; later triggers win the buffer swap.
    pub trigger: u64,
    pub text: String,
    pub frame_count: usize,
    pub is_final: bool,
    pub cache_hit: bool,
    pub elapsed: Duration,
}
