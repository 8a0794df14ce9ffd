//! Prelude module - commonly used types for convenient import.
//!
//! Use `use clawgate_flow::prelude::*;` to import all essential types.

pub use crate::{FlowAnalysis, FlowLimits, ToxicFlowDetector};

pub use crate::{FLOW_PATTERNS, FlowPattern, Severity};
