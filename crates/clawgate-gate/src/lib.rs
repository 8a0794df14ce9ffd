//! Clawgate Gate - One entry point for every agent action.
//!
//! [`SecurityGate`] runs the three engines in order for each action:
//!
//! 1. **Access** (`clawgate-access`): role permissions, sensitive paths,
//!    workspace boundary, tool and gateway method tables
//! 2. **Risk and approval** (`clawgate-approval`): risky operations get a
//!    pending approval request
//! 3. **Toxic flow** (`clawgate-flow`): the session's recent history is
//!    scanned for attack chains; the action joins that history only once it
//!    is allowed or its approval is granted
//!
//! The result is a [`GateVerdict`] carrying the final decision plus what each
//! stage found. [`spawn_approval_sweeper`] expires stale approvals in the
//! background.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod action;
pub mod gate;
pub mod settings;
pub mod sweeper;

pub use action::GatedAction;
pub use gate::{GateVerdict, SecurityGate};
pub use settings::{DEFAULT_SWEEP_INTERVAL, GateSettings};
pub use sweeper::spawn_approval_sweeper;
