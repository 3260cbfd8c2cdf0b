//! Real-time tick pacing.

use std::time::{Duration, Instant};

/// Computes how long to wait before each tick.
///
/// Takes the current instant as an argument so schedules can be checked
/// without sleeping; the pacing loop passes `Instant::now()`.
///
/// Ticks are scheduled on absolute deadlines `anchor + k * period`, so time
/// spent emitting a frame is absorbed by the next wait instead of accumulating
/// as drift. A wait is never negative: a late tick fires immediately. When the
/// loop falls more than one period behind (e.g. the process was suspended) the
/// schedule is re-anchored at the current instant rather than catching up with
/// a burst of frames.
#[derive(Debug, Clone)]
pub struct Pacer {
    period: Duration,
    next_deadline: Option<Instant>,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: None,
        }
    }

    /// Returns the wait until the next tick and schedules the one after.
    ///
    /// The first tick is due one period after the first call.
    pub fn next_wait(&mut self, now: Instant) -> Duration {
        let deadline = match self.next_deadline {
            Some(deadline) if now.saturating_duration_since(deadline) <= self.period => deadline,
            Some(_) => now,
            None => now + self.period,
        };
        self.next_deadline = Some(deadline + self.period);
        deadline.saturating_duration_since(now)
    }
}
