//! Incremental text aggregation and dispatch policy.
//!
//! Keeps the set of active increments, rebuilds the current text after every
//! batch, and decides whether that text should be (re)synthesized.

use crate::defaults;
use crate::pipeline::types::{IncrementId, TextIncrement, UpdateBatch, UpdateKind};
use tracing::debug;

/// When to synthesize the aggregated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Only committed (final) text is synthesized.
    OnFinish,
    /// Partial text is also synthesized once it has grown by more than
    /// `threshold` characters since the last dispatch.
    Eager { threshold: usize },
}

impl DispatchPolicy {
    /// Builds a policy from the `dispatch_on_finish` flag and eager threshold.
    pub fn from_flags(dispatch_on_finish: bool, threshold: usize) -> Self {
        if dispatch_on_finish {
            DispatchPolicy::OnFinish
        } else {
            DispatchPolicy::Eager { threshold }
        }
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::from_flags(defaults::DISPATCH_ON_FINISH, defaults::EAGER_THRESHOLD)
    }
}

/// What the aggregator decided for one non-empty batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Text to synthesize, if the batch triggered a dispatch.
    pub dispatch: Option<String>,
    /// The batch contained a committed increment.
    pub is_final: bool,
}

/// Aggregates add/revoke increments into the current text.
#[derive(Debug, Clone)]
pub struct IncrementAggregator {
    policy: DispatchPolicy,
    active: Vec<TextIncrement>,
    last_dispatched: String,
    latest: Option<IncrementId>,
}

impl IncrementAggregator {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            active: Vec::new(),
            last_dispatched: String::new(),
            latest: None,
        }
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Active increments' texts joined by a single space, in receipt order.
    pub fn current_text(&self) -> String {
        self.active
            .iter()
            .map(|inc| inc.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text of the most recent dispatch.
    pub fn last_dispatched(&self) -> &str {
        &self.last_dispatched
    }

    /// Id of the most recently added increment.
    pub fn latest(&self) -> Option<IncrementId> {
        self.latest
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Applies one batch and decides whether to dispatch.
    ///
    /// Returns `None` for an empty batch, which leaves all state untouched.
    /// On a dispatch the returned text is recorded as last dispatched.
    pub fn apply(&mut self, batch: &UpdateBatch) -> Option<Decision> {
        if batch.is_empty() {
            return None;
        }

        for update in &batch.updates {
            match update.kind {
                UpdateKind::Add => {
                    self.latest = Some(update.increment.id);
                    self.active.push(update.increment.clone());
                }
                UpdateKind::Revoke => {
                    if let Some(pos) = self
                        .active
                        .iter()
                        .position(|inc| inc.id == update.increment.id)
                    {
                        self.active.remove(pos);
                    }
                }
            }
        }

        let is_final = batch.is_final();
        let current = self.current_text();

        let dispatch = if is_final || self.grew_past_threshold(&current) {
            debug!(text = %current, is_final, "Dispatching");
            self.last_dispatched = current.clone();
            Some(current)
        } else {
            None
        };

        Some(Decision { dispatch, is_final })
    }

    fn grew_past_threshold(&self, current: &str) -> bool {
        match self.policy {
            DispatchPolicy::OnFinish => false,
            DispatchPolicy::Eager { threshold } => {
                let current_len = current.chars().count();
                let last_len = self.last_dispatched.chars().count();
                current_len > last_len + threshold
            }
        }
    }

    /// Forgets the finished utterance: active increments and last dispatch.
    ///
    /// The latest increment id is kept so frames emitted after the reset stay
    /// grounded in the last input received.
    pub fn clear_context(&mut self) {
        self.active.clear();
        self.last_dispatched.clear();
    }
}

impl Default for IncrementAggregator {
    fn default() -> Self {
        Self::new(DispatchPolicy::default())
    }
}
