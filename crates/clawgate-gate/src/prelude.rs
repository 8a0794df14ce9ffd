//! Prelude module - commonly used types for convenient import.
//!
//! Use `use clawgate_gate::prelude::*;` to import all essential types.

pub use crate::{GateSettings, GateVerdict, GatedAction, SecurityGate, spawn_approval_sweeper};
