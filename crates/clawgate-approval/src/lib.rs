//! Clawgate Approval - Risk scoring and the human approval lifecycle.
//!
//! Two halves:
//! - [`assess_operation_risk`] scores one operation against a fixed rule
//!   table and says whether a human must approve it
//! - [`ApprovalManager`] tracks approval requests from `pending` to
//!   `approved`, `denied` or `expired`, keeping an in-memory history
//!
//! # Example
//!
//! ```
//! use clawgate_approval::{ApprovalManager, ApprovalRequest, RiskConfig, assess_operation_risk};
//! use clawgate_core::{RiskLevel, details};
//!
//! let args = details! { "path" => "/srv/ws/old.log" };
//! let risk = assess_operation_risk("delete", &args, &RiskConfig::default());
//! assert!(risk.requires_approval);
//! assert_eq!(risk.level, RiskLevel::High);
//!
//! let manager = ApprovalManager::new();
//! let reason = risk.reason.unwrap_or_default();
//! let record = manager.create_approval_request(ApprovalRequest::new("delete", args, reason));
//! assert_eq!(manager.pending_count(), 1);
//! # let _ = record;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

/// Error types and results for the approval engine.
pub mod error;
pub mod manager;
pub mod request;
pub mod risk;

pub use error::{ApprovalError, ApprovalResult};
pub use manager::{ApprovalManager, DEFAULT_MAX_AGE};
pub use request::{ApprovalRecord, ApprovalRequest, ApprovalStatus, PendingFilter, RequestId};
pub use risk::{DEFAULT_MESSAGE_RECIPIENT_LIMIT, RiskAssessment, RiskConfig, assess_operation_risk};
