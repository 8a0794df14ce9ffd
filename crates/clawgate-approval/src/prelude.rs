//! Prelude module - commonly used types for convenient import.
//!
//! Use `use clawgate_approval::prelude::*;` to import all essential types.

// Risk scoring
pub use crate::{RiskAssessment, RiskConfig, assess_operation_risk};

// Approval lifecycle
pub use crate::{
    ApprovalManager, ApprovalRecord, ApprovalRequest, ApprovalStatus, PendingFilter, RequestId,
};

// Errors
pub use crate::{ApprovalError, ApprovalResult};
