//! Prelude module - commonly used types for convenient import.
//!
//! Use `use clawgate_access::prelude::*;` to import all essential types.

pub use crate::{AccessContext, FileOperation, Permission, Role};

pub use crate::{
    check_file_access, check_gateway_method_access, check_tool_access, has_permission,
    is_outside_workspace, is_sensitive_path, resolve_role,
};
