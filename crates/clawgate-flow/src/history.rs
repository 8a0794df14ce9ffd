//! Bounded, age-pruned operation history.

use clawgate_core::{Operation, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default maximum number of operations kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Default age cutoff for kept operations.
pub const DEFAULT_HISTORY_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Default number of extra operations a pattern window may span.
pub const DEFAULT_WINDOW_SLACK: usize = 10;

/// Size and age limits for the flow detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLimits {
    /// Maximum operations kept.
    pub history_limit: usize,
    /// Operations older than this, relative to the newest one, are dropped.
    pub history_window: Duration,
    /// Extra operations a match window may span beyond the step count, so
    /// unrelated actions can interleave with a chain.
    pub window_slack: usize,
}

impl Default for FlowLimits {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            history_window: DEFAULT_HISTORY_WINDOW,
            window_slack: DEFAULT_WINDOW_SLACK,
        }
    }
}

impl FlowLimits {
    fn window_millis(&self) -> i64 {
        i64::try_from(self.history_window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Append-only ring of recent operations.
///
/// Every push enforces both the entry cap and the age cutoff, measured from
/// the timestamp of the operation just pushed.
#[derive(Debug, Clone, Default)]
pub struct OperationHistory {
    ops: VecDeque<Operation>,
    limits: FlowLimits,
}

impl OperationHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new(limits: FlowLimits) -> Self {
        Self {
            ops: VecDeque::with_capacity(limits.history_limit.min(DEFAULT_HISTORY_LIMIT)),
            limits,
        }
    }

    /// The limits in force.
    #[must_use]
    pub fn limits(&self) -> FlowLimits {
        self.limits
    }

    /// Append an operation, then prune.
    pub fn push(&mut self, op: Operation) {
        let newest = op.timestamp;
        self.ops.push_back(op);
        self.prune(newest);
    }

    /// Within the window and not after `reference`.
    fn is_fresh(&self, op: &Operation, reference: Timestamp) -> bool {
        let elapsed = reference.elapsed_since(op.timestamp).num_milliseconds();
        (0..=self.limits.window_millis()).contains(&elapsed)
    }

    fn prune(&mut self, reference: Timestamp) {
        while self.ops.len() > self.limits.history_limit {
            self.ops.pop_front();
        }
        let window = self.limits.window_millis();
        self.ops
            .retain(|op| reference.elapsed_since(op.timestamp).num_milliseconds() <= window);
    }

    /// Operations within the age window ending at `reference` that belong to
    /// `session_key` (every session when `None`), sorted by time.
    ///
    /// Operations stamped after `reference` are excluded, so a late-arriving
    /// operation never sees its own future.
    #[must_use]
    pub fn recent(&self, session_key: Option<&str>, reference: Timestamp) -> Vec<Operation> {
        let mut recent: Vec<Operation> = self
            .ops
            .iter()
            .filter(|op| self.is_fresh(op, reference))
            .filter(|op| session_key.is_none_or(|key| op.session_key.as_deref() == Some(key)))
            .cloned()
            .collect();
        recent.sort_by_key(|op| op.timestamp);
        recent
    }

    /// The last `count` operations in insertion order.
    #[must_use]
    pub fn tail(&self, count: usize) -> Vec<Operation> {
        let skip = self.ops.len().saturating_sub(count);
        self.ops.iter().skip(skip).cloned().collect()
    }

    /// Number of operations held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Drop every operation.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}
