//! Clawgate Flow - Toxic flow detection over recent agent actions.
//!
//! Individually authorized actions can still add up to an attack: read a
//! key, then send it somewhere. The [`ToxicFlowDetector`] keeps a bounded,
//! age-pruned history of authorized [`Operation`]s and scans each session's
//! recent actions against the fixed [`FLOW_PATTERNS`] registry.
//!
//! [`Operation`]: clawgate_core::Operation

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod detector;
pub mod history;
pub mod pattern;

pub use detector::{FlowAnalysis, ToxicFlowDetector, match_pattern};
pub use history::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_WINDOW, DEFAULT_WINDOW_SLACK, FlowLimits,
    OperationHistory,
};
pub use pattern::{FLOW_PATTERNS, FlowPattern, Severity, StepMatcher};
