//! Per-action access checks.
//!
//! Every check is a total function returning an [`AccessDecision`]. A denial
//! always carries a reason; only sensitive-path and elevated-exec denials can
//! be lifted by an approval.

use clawgate_core::{AccessDecision, Details, DetailsExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::context::AccessContext;
use crate::paths::{is_outside_workspace, is_sensitive_path};
use crate::permission::{Permission, Role};

/// The three file operations the authority distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Read a file.
    Read,
    /// Create or modify a file.
    Write,
    /// Delete a file.
    Delete,
}

impl FileOperation {
    /// The permission this operation needs.
    #[must_use]
    pub fn required_permission(self) -> Permission {
        match self {
            Self::Read => Permission::FilesRead,
            Self::Write => Permission::FilesWrite,
            Self::Delete => Permission::FilesDelete,
        }
    }

    /// Lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn missing_permission(role: Role, permission: Permission) -> AccessDecision {
    AccessDecision::deny(format!("role '{role}' lacks permission '{permission}'"))
}

/// Decide whether `ctx` may perform `op` on `path`.
///
/// Rules apply in order: the role must hold the base file permission; a
/// sensitive path needs approval unless the role is admin; a path outside the
/// workspace is denied for restricted and guest roles.
#[must_use]
pub fn check_file_access(
    ctx: &AccessContext,
    path: &str,
    op: FileOperation,
    workspace_dir: &str,
) -> AccessDecision {
    if path.trim().is_empty() {
        return AccessDecision::deny("empty path");
    }
    if path.contains('\0') {
        return AccessDecision::deny("path contains a NUL byte");
    }

    let required = op.required_permission();
    if !ctx.role.has(required) {
        debug!(role = %ctx.role, op = %op, "file access denied: missing permission");
        return missing_permission(ctx.role, required);
    }

    if ctx.role != Role::Admin && is_sensitive_path(path) {
        debug!(role = %ctx.role, op = %op, "file access needs approval: sensitive path");
        return AccessDecision::needs_approval(format!(
            "{op} of a sensitive path requires approval"
        ));
    }

    if ctx.role.is_workspace_confined() && is_outside_workspace(path, workspace_dir) {
        debug!(role = %ctx.role, op = %op, "file access denied: outside workspace");
        return AccessDecision::deny(format!(
            "role '{}' may not access paths outside the workspace",
            ctx.role
        ));
    }

    AccessDecision::allow()
}

/// Permission required for a known tool, or `None` when the tool is unmapped.
#[must_use]
pub fn tool_permission(tool_name: &str) -> Option<Permission> {
    let permission = match tool_name {
        "read" | "read_file" | "glob" | "grep" | "ls" => Permission::FilesRead,
        "write" | "edit" | "apply_patch" | "write_file" => Permission::FilesWrite,
        "delete" | "rm" => Permission::FilesDelete,
        "exec" | "process" | "bash" => Permission::ToolsExec,
        "browser" | "browser_navigate" => Permission::ToolsBrowser,
        "web_fetch" | "fetch" | "web_search" => Permission::ToolsWeb,
        "message" | "message_send" => Permission::ToolsMessage,
        "cron" | "cron_add" | "cron_remove" => Permission::ToolsCron,
        "sessions_list" | "sessions_send" | "sessions_spawn" | "sessions_history" => {
            Permission::ToolsSessions
        },
        "gateway" => Permission::GatewayConfigWrite,
        _ => return None,
    };
    Some(permission)
}

/// Roles that may call tools missing from the tool table.
fn allows_unmapped(role: Role) -> bool {
    matches!(role, Role::Admin | Role::User)
}

/// Decide whether `ctx` may invoke `tool_name` with `args`.
///
/// `exec` with `elevated: true` additionally needs `tools.exec.elevated` and
/// both elevated flags on the context; otherwise it needs approval.
#[must_use]
pub fn check_tool_access(ctx: &AccessContext, tool_name: &str, args: &Details) -> AccessDecision {
    let Some(required) = tool_permission(tool_name) else {
        if allows_unmapped(ctx.role) {
            return AccessDecision::allow();
        }
        debug!(role = %ctx.role, tool = tool_name, "tool denied: not in table");
        return AccessDecision::deny(format!(
            "unknown tool '{tool_name}' is not available to role '{}'",
            ctx.role
        ));
    };

    if !ctx.role.has(required) {
        debug!(role = %ctx.role, tool = tool_name, "tool denied: missing permission");
        return missing_permission(ctx.role, required);
    }

    if tool_name == "exec" && args.is_true("elevated") {
        let permitted = ctx.role.has(Permission::ToolsExecElevated)
            && ctx.elevated_enabled
            && ctx.elevated_allowed;
        if !permitted {
            debug!(role = %ctx.role, "elevated exec needs approval");
            return AccessDecision::needs_approval("elevated exec requires approval");
        }
    }

    AccessDecision::allow()
}

/// Permission required for a known gateway method, or `None` when unmapped.
#[must_use]
pub fn gateway_method_permission(method: &str) -> Option<Permission> {
    let permission = match method {
        "config.get" | "channels.status" | "cron.list" => Permission::GatewayConfigRead,
        "config.set" | "config.merge" | "config.apply" | "config.patch" => {
            Permission::GatewayConfigWrite
        },
        "sessions.list" | "sessions.history" | "sessions.preview" => {
            Permission::GatewaySessionsRead
        },
        "sessions.delete" | "sessions.reset" | "sessions.patch" | "sessions.compact" => {
            Permission::GatewaySessionsManage
        },
        "channels.login" | "channels.logout" => Permission::GatewayChannelsManage,
        "cron.add" | "cron.remove" | "cron.update" | "cron.run" => Permission::GatewayCronManage,
        "approvals.respond" | "exec.approval.resolve" => Permission::GatewayApprovalsRespond,
        "secrets.get" | "secrets.list" => Permission::AdminSecretsRead,
        "logs.tail" | "audit.query" => Permission::AdminAuditRead,
        "users.add" | "users.remove" | "users.set_role" => Permission::AdminUsersManage,
        "agent" | "send" | "chat.send" => Permission::ToolsMessage,
        _ => return None,
    };
    Some(permission)
}

/// Decide whether `ctx` may call the gateway method `method`.
#[must_use]
pub fn check_gateway_method_access(ctx: &AccessContext, method: &str) -> AccessDecision {
    match gateway_method_permission(method) {
        Some(required) if ctx.role.has(required) => AccessDecision::allow(),
        Some(required) => {
            debug!(role = %ctx.role, method, "gateway method denied: missing permission");
            missing_permission(ctx.role, required)
        },
        None if allows_unmapped(ctx.role) => AccessDecision::allow(),
        None => {
            debug!(role = %ctx.role, method, "gateway method denied: not in table");
            AccessDecision::deny(format!(
                "unknown gateway method '{method}' is not available to role '{}'",
                ctx.role
            ))
        },
    }
}

#[cfg(test)]
#[path = "checks_tests.rs"]
mod tests;
