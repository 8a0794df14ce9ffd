//! Composable access decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict rendered by the access authority or the risk engine.
///
/// A denial is a normal outcome, not an error. `requires_approval` marks a
/// denial that a human can lift by approving the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    /// Whether the action may proceed now.
    pub allowed: bool,
    /// Human-readable explanation, always present on denials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether a human approval could lift this denial.
    #[serde(default)]
    pub requires_approval: bool,
}

impl AccessDecision {
    /// An unconditional allow.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            requires_approval: false,
        }
    }

    /// A hard denial.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            requires_approval: false,
        }
    }

    /// A denial that stands until a human approves the action.
    #[must_use]
    pub fn needs_approval(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            requires_approval: true,
        }
    }

    /// Check if this decision is a hard denial (no approval path).
    #[must_use]
    pub fn is_hard_denial(&self) -> bool {
        !self.allowed && !self.requires_approval
    }

    /// Compose with the decision of a later stage.
    ///
    /// The first veto wins: if `self` already denies, `next` is ignored.
    #[must_use]
    pub fn and_then(self, next: AccessDecision) -> AccessDecision {
        if self.allowed { next } else { self }
    }
}

impl Default for AccessDecision {
    fn default() -> Self {
        Self::allow()
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.allowed, self.requires_approval, &self.reason) {
            (true, _, _) => write!(f, "allowed"),
            (false, true, Some(reason)) => write!(f, "requires approval: {reason}"),
            (false, true, None) => write!(f, "requires approval"),
            (false, false, Some(reason)) => write!(f, "denied: {reason}"),
            (false, false, None) => write!(f, "denied"),
        }
    }
}
