//! Clawgate Core - Shared vocabulary for the agent action gate.
//!
//! Every engine in the gate speaks the same small set of types:
//! - [`RiskLevel`] and [`Timestamp`] for classification and ordering
//! - [`Details`] for the loosely-typed argument maps agents hand us
//! - [`AccessDecision`] for composable allow/deny/approve verdicts
//! - [`Operation`] for the authorized-action records the flow detector consumes
//!
//! # Example
//!
//! ```
//! use clawgate_core::{AccessDecision, Operation, OperationType, details};
//!
//! let decision = AccessDecision::allow()
//!     .and_then(AccessDecision::needs_approval("sensitive path"));
//! assert!(!decision.allowed);
//! assert!(decision.requires_approval);
//!
//! let op = Operation::new(OperationType::Read, details! { "path" => "~/.ssh/id_rsa" })
//!     .with_session("chat:42");
//! assert_eq!(op.session_key.as_deref(), Some("chat:42"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod decision;
pub mod details;
pub mod operation;
pub mod types;

pub use decision::AccessDecision;
pub use details::{Details, DetailsExt};
pub use operation::{Operation, OperationType, ParseOperationTypeError};
pub use types::{RiskLevel, Timestamp};
