//! Error types for the approval engine.
//!
//! Not-found lookups and denials are not errors; they come back as `None` or
//! as decision values. Only malformed input lands here.

use thiserror::Error;

/// Errors that can occur in the approval engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    /// A request id string could not be parsed.
    #[error("invalid approval request id: {0}")]
    InvalidRequestId(String),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
