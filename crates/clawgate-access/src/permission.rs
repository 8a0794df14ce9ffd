//! The closed permission vocabulary and the static role table.
//!
//! Roles are not a computed hierarchy. Each role's permission set is authored
//! explicitly below; the intended ordering admin ⊇ user ⊇ restricted ⊇ guest
//! is checked by tests, not derived at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An atomic capability tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Permission {
    /// Read files.
    FilesRead,
    /// Create or modify files.
    FilesWrite,
    /// Delete files.
    FilesDelete,
    /// Run commands.
    ToolsExec,
    /// Run commands with elevated privileges on the host.
    ToolsExecElevated,
    /// Drive the browser.
    ToolsBrowser,
    /// Fetch or search the web.
    ToolsWeb,
    /// Send messages through channels.
    ToolsMessage,
    /// Schedule cron jobs from the agent.
    ToolsCron,
    /// Inspect or spawn other sessions from the agent.
    ToolsSessions,
    /// Read gateway configuration.
    GatewayConfigRead,
    /// Change gateway configuration.
    GatewayConfigWrite,
    /// List and inspect sessions.
    GatewaySessionsRead,
    /// Reset, patch or delete sessions.
    GatewaySessionsManage,
    /// Log channels in and out.
    GatewayChannelsManage,
    /// Add, remove or run cron jobs.
    GatewayCronManage,
    /// Resolve pending approval requests.
    GatewayApprovalsRespond,
    /// Read stored secrets.
    AdminSecretsRead,
    /// Read audit trails and logs.
    AdminAuditRead,
    /// Manage users and their roles.
    AdminUsersManage,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 20] = [
        Self::FilesRead,
        Self::FilesWrite,
        Self::FilesDelete,
        Self::ToolsExec,
        Self::ToolsExecElevated,
        Self::ToolsBrowser,
        Self::ToolsWeb,
        Self::ToolsMessage,
        Self::ToolsCron,
        Self::ToolsSessions,
        Self::GatewayConfigRead,
        Self::GatewayConfigWrite,
        Self::GatewaySessionsRead,
        Self::GatewaySessionsManage,
        Self::GatewayChannelsManage,
        Self::GatewayCronManage,
        Self::GatewayApprovalsRespond,
        Self::AdminSecretsRead,
        Self::AdminAuditRead,
        Self::AdminUsersManage,
    ];

    /// The dotted tag, e.g. `tools.exec.elevated`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FilesRead => "files.read",
            Self::FilesWrite => "files.write",
            Self::FilesDelete => "files.delete",
            Self::ToolsExec => "tools.exec",
            Self::ToolsExecElevated => "tools.exec.elevated",
            Self::ToolsBrowser => "tools.browser",
            Self::ToolsWeb => "tools.web",
            Self::ToolsMessage => "tools.message",
            Self::ToolsCron => "tools.cron",
            Self::ToolsSessions => "tools.sessions",
            Self::GatewayConfigRead => "gateway.config.read",
            Self::GatewayConfigWrite => "gateway.config.write",
            Self::GatewaySessionsRead => "gateway.sessions.read",
            Self::GatewaySessionsManage => "gateway.sessions.manage",
            Self::GatewayChannelsManage => "gateway.channels.manage",
            Self::GatewayCronManage => "gateway.cron.manage",
            Self::GatewayApprovalsRespond => "gateway.approvals.respond",
            Self::AdminSecretsRead => "admin.secrets.read",
            Self::AdminAuditRead => "admin.audit.read",
            Self::AdminUsersManage => "admin.users.manage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Permission> for &'static str {
    fn from(p: Permission) -> Self {
        p.as_str()
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown permission: {s}"))
    }
}

impl TryFrom<String> for Permission {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The role an acting identity holds for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control, including secrets and elevated exec.
    Admin,
    /// Normal operator: files, exec, browser, sessions.
    #[default]
    User,
    /// Files inside the workspace, web and messaging only.
    Restricted,
    /// Read and message only.
    Guest,
}

const ADMIN_PERMISSIONS: &[Permission] = &Permission::ALL;

const USER_PERMISSIONS: &[Permission] = &[
    Permission::FilesRead,
    Permission::FilesWrite,
    Permission::FilesDelete,
    Permission::ToolsExec,
    Permission::ToolsBrowser,
    Permission::ToolsWeb,
    Permission::ToolsMessage,
    Permission::ToolsCron,
    Permission::ToolsSessions,
    Permission::GatewayConfigRead,
    Permission::GatewaySessionsRead,
    Permission::GatewaySessionsManage,
    Permission::GatewayCronManage,
    Permission::GatewayApprovalsRespond,
];

const RESTRICTED_PERMISSIONS: &[Permission] = &[
    Permission::FilesRead,
    Permission::FilesWrite,
    Permission::ToolsWeb,
    Permission::ToolsMessage,
    Permission::GatewaySessionsRead,
];

const GUEST_PERMISSIONS: &[Permission] = &[Permission::FilesRead, Permission::ToolsMessage];

impl Role {
    /// Every role, most privileged first.
    pub const ALL: [Role; 4] = [Self::Admin, Self::User, Self::Restricted, Self::Guest];

    /// The permission set authored for this role.
    #[must_use]
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Self::Admin => ADMIN_PERMISSIONS,
            Self::User => USER_PERMISSIONS,
            Self::Restricted => RESTRICTED_PERMISSIONS,
            Self::Guest => GUEST_PERMISSIONS,
        }
    }

    /// Check whether this role holds a permission.
    #[must_use]
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Lower-case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Restricted => "restricted",
            Self::Guest => "guest",
        }
    }

    /// Roles that may not touch paths outside the workspace.
    #[must_use]
    pub fn is_workspace_confined(&self) -> bool {
        matches!(self, Self::Restricted | Self::Guest)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Check whether `role` holds `permission` in the static role table.
#[must_use]
pub fn has_permission(role: Role, permission: Permission) -> bool {
    role.has(permission)
}
