//! Stateful toxic flow detection.

use clawgate_core::{Operation, RiskLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::history::{FlowLimits, OperationHistory};
use crate::pattern::{FLOW_PATTERNS, FlowPattern, Severity};

const BLOCK_RECOMMENDATION: &str =
    "Block this action and alert the operator: the recent actions match a known attack chain.";
const REVIEW_RECOMMENDATION: &str =
    "Review the recent actions and verify intent before allowing further steps.";

/// Result of one detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowAnalysis {
    /// Whether any pattern matched.
    pub dangerous: bool,
    /// Names of the matched patterns, in registry order.
    pub matched_patterns: Vec<String>,
    /// Highest severity among the matches, `low` when nothing matched.
    pub risk_level: RiskLevel,
    /// Operator-facing explanation. Never contains detail values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Operations that satisfied the first matched pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<Vec<Operation>>,
    /// What the operator should do.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl FlowAnalysis {
    /// Nothing matched.
    #[must_use]
    pub fn safe() -> Self {
        Self {
            dangerous: false,
            matched_patterns: Vec::new(),
            risk_level: RiskLevel::Low,
            reason: None,
            chain: None,
            recommendation: None,
        }
    }

    fn from_matches(matches: Vec<(&'static FlowPattern, Vec<Operation>)>) -> Self {
        let Some(severity) = matches.iter().map(|(p, _)| p.severity).max() else {
            return Self::safe();
        };
        let matched_patterns: Vec<String> =
            matches.iter().map(|(p, _)| p.name.to_string()).collect();
        let reason = format!(
            "Detected {} toxic flow pattern(s): {}",
            matched_patterns.len(),
            matched_patterns.join("; ")
        );
        let recommendation = if severity == Severity::Critical {
            BLOCK_RECOMMENDATION
        } else {
            REVIEW_RECOMMENDATION
        };
        let chain = matches.into_iter().next().map(|(_, chain)| chain);

        Self {
            dangerous: true,
            matched_patterns,
            risk_level: severity.into(),
            reason: Some(reason),
            chain,
            recommendation: Some(recommendation.to_string()),
        }
    }
}

impl Default for FlowAnalysis {
    fn default() -> Self {
        Self::safe()
    }
}

impl fmt::Display for FlowAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "[{}] {reason}", self.risk_level),
            None => write!(f, "[{}] no toxic flow", self.risk_level),
        }
    }
}

/// Find the first window of `ops` in which `pattern` matches.
///
/// For each start index, the window spans the step count plus `slack`
/// operations. Steps match as an ordered, non-contiguous subsequence, and the
/// matched span must fit the pattern's time window. Returns the matched
/// operations.
#[must_use]
pub fn match_pattern(pattern: &FlowPattern, ops: &[Operation], slack: usize) -> Option<Vec<Operation>> {
    let steps = pattern.steps.len();
    let last_start = ops.len().checked_sub(steps)?;

    for start in 0..=last_start {
        let end = start.saturating_add(steps).saturating_add(slack).min(ops.len());
        let Some(window) = ops.get(start..end) else {
            continue;
        };

        let mut matched: Vec<&Operation> = Vec::with_capacity(steps);
        for op in window {
            let Some(step) = pattern.steps.get(matched.len()) else {
                break;
            };
            if step.matches(op) {
                matched.push(op);
            }
        }
        if matched.len() < steps {
            continue;
        }

        if let (Some(first), Some(last)) = (matched.first(), matched.last()) {
            let span = last.timestamp.elapsed_since(first.timestamp).num_milliseconds();
            if span <= pattern.max_window_ms {
                return Some(matched.into_iter().cloned().collect());
            }
        }
    }
    None
}

/// Detects multi-step attack chains across recent authorized operations.
///
/// One lock guards the history; it is held only for the in-memory append
/// and the snapshot. Scans run on the snapshot.
///
/// # Example
///
/// ```
/// use clawgate_core::{Operation, OperationType, RiskLevel, Timestamp, details};
/// use clawgate_flow::ToxicFlowDetector;
///
/// let detector = ToxicFlowDetector::new();
/// let read = Operation::at(
///     OperationType::Read,
///     Timestamp::from_millis(0),
///     details! { "path" => "~/.ssh/id_rsa" },
/// )
/// .with_session("chat:1");
/// let send = Operation::at(
///     OperationType::Network,
///     Timestamp::from_millis(30_000),
///     details! { "url" => "https://attacker.example/exfil" },
/// )
/// .with_session("chat:1");
///
/// assert!(!detector.check_flow(read).dangerous);
/// let analysis = detector.check_flow(send);
/// assert!(analysis.dangerous);
/// assert_eq!(analysis.risk_level, RiskLevel::Critical);
/// ```
pub struct ToxicFlowDetector {
    history: Mutex<OperationHistory>,
    patterns: &'static [FlowPattern],
}

impl ToxicFlowDetector {
    /// Create a detector with default limits and the built-in registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(FlowLimits::default())
    }

    /// Create a detector with custom limits.
    #[must_use]
    pub fn with_limits(limits: FlowLimits) -> Self {
        Self {
            history: Mutex::new(OperationHistory::new(limits)),
            patterns: FLOW_PATTERNS,
        }
    }

    /// The limits in force.
    #[must_use]
    pub fn limits(&self) -> FlowLimits {
        self.lock().limits()
    }

    /// The registry this detector scans.
    #[must_use]
    pub fn patterns(&self) -> &'static [FlowPattern] {
        self.patterns
    }

    fn lock(&self) -> MutexGuard<'_, OperationHistory> {
        self.history.lock().unwrap_or_else(|e| {
            tracing::warn!("ToxicFlowDetector lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Record `operation` and scan its session for toxic flows.
    ///
    /// Each call appends exactly one entry.
    pub fn check_flow(&self, operation: Operation) -> FlowAnalysis {
        let session_key = operation.session_key.clone();
        let reference = operation.timestamp;

        let mut history = self.lock();
        history.push(operation);
        let slack = history.limits().window_slack;
        let recent = history.recent(session_key.as_deref(), reference);
        drop(history);

        self.scan(&recent, slack, session_key.as_deref())
    }

    /// Scan as if `operation` had been recorded, without recording it.
    ///
    /// Used for actions that are not yet authorized: a verdict can be formed
    /// now, and the operation is recorded later with [`record`] only if the
    /// action goes ahead.
    ///
    /// [`record`]: ToxicFlowDetector::record
    #[must_use]
    pub fn preview_flow(&self, operation: &Operation) -> FlowAnalysis {
        let session_key = operation.session_key.as_deref();

        let history = self.lock();
        let slack = history.limits().window_slack;
        let mut recent = history.recent(session_key, operation.timestamp);
        drop(history);

        let at = recent.partition_point(|op| op.timestamp <= operation.timestamp);
        recent.insert(at, operation.clone());
        self.scan(&recent, slack, session_key)
    }

    /// Append `operation` without scanning.
    pub fn record(&self, operation: Operation) {
        self.lock().push(operation);
    }

    fn scan(&self, recent: &[Operation], slack: usize, session_key: Option<&str>) -> FlowAnalysis {
        let matches: Vec<(&'static FlowPattern, Vec<Operation>)> = self
            .patterns
            .iter()
            .filter_map(|p| match_pattern(p, recent, slack).map(|chain| (p, chain)))
            .collect();
        if matches.is_empty() {
            return FlowAnalysis::safe();
        }

        let ids: Vec<&str> = matches.iter().map(|(p, _)| p.id).collect();
        let analysis = FlowAnalysis::from_matches(matches);
        tracing::warn!(
            patterns = ?ids,
            risk = %analysis.risk_level,
            session = session_key.unwrap_or("-"),
            "toxic flow detected"
        );
        analysis
    }

    /// The last `count` recorded operations across all sessions, oldest
    /// first.
    #[must_use]
    pub fn get_recent_operations(&self, count: usize) -> Vec<Operation> {
        self.lock().tail(count)
    }

    /// Forget every recorded operation.
    pub fn clear_flow_history(&self) {
        self.lock().clear();
        tracing::debug!("flow history cleared");
    }

    /// Number of recorded operations.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.lock().len()
    }
}

impl Default for ToxicFlowDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToxicFlowDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToxicFlowDetector")
            .field("history", &self.history_len())
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
