//! Prelude module - commonly used types for convenient import.
//!
//! Use `use clawgate_core::prelude::*;` to import all essential types.

// Classification
pub use crate::{RiskLevel, Timestamp};

// Argument maps
pub use crate::{Details, DetailsExt};

// Decisions
pub use crate::AccessDecision;

// Flow records
pub use crate::{Operation, OperationType};
