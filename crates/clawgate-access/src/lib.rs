//! Clawgate Access - Stateless access authority for agent actions.
//!
//! Answers "may this identity do this now?" for one action at a time:
//! - [`Role`] and [`Permission`] form a fixed, code-defined table
//! - [`is_sensitive_path`] classifies credential and secret locations
//! - [`is_outside_workspace`] checks workspace containment lexically
//! - [`check_file_access`], [`check_tool_access`] and
//!   [`check_gateway_method_access`] render [`AccessDecision`]s
//!
//! Nothing here holds state. Denials are values, never errors.
//!
//! # Example
//!
//! ```
//! use clawgate_access::{AccessContext, FileOperation, Role, check_file_access};
//!
//! let admin = AccessContext::new(Role::Admin);
//! let user = AccessContext::new(Role::User);
//!
//! let ok = check_file_access(&admin, "~/.aws/credentials", FileOperation::Read, "/srv/ws");
//! assert!(ok.allowed);
//!
//! let pending = check_file_access(&user, "~/.aws/credentials", FileOperation::Read, "/srv/ws");
//! assert!(pending.requires_approval);
//! ```
//!
//! [`AccessDecision`]: clawgate_core::AccessDecision

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod checks;
pub mod context;
pub mod paths;
pub mod permission;

pub use checks::{
    FileOperation, check_file_access, check_gateway_method_access, check_tool_access,
    gateway_method_permission, tool_permission,
};
pub use context::{AccessContext, resolve_role};
pub use paths::{
    SensitiveMatch, classify_sensitive_path, is_outside_workspace, is_sensitive_path, resolve_path,
};
pub use permission::{Permission, Role, has_permission};
