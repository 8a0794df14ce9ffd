//! Per-request identity and environment.

use serde::{Deserialize, Serialize};

use crate::permission::Role;

/// Identity and environment of one agent action.
///
/// Built fresh for every action from the already-authenticated session; never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct AccessContext {
    /// Role the caller acts under.
    pub role: Role,
    /// Chat session key.
    #[serde(default)]
    pub session_key: Option<String>,
    /// Account the message came from.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Channel the message came from.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Whether the message came from a group chat.
    #[serde(default)]
    pub is_group: bool,
    /// Whether the agent runs inside a sandbox.
    #[serde(default)]
    pub sandboxed: bool,
    /// Whether elevated exec is enabled globally.
    #[serde(default)]
    pub elevated_enabled: bool,
    /// Whether elevated exec is allowed for this sender.
    #[serde(default)]
    pub elevated_allowed: bool,
}

impl AccessContext {
    /// Create a context for the given role.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// Set the session key.
    #[must_use]
    pub fn with_session(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }

    /// Set the account id.
    #[must_use]
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set the channel id.
    #[must_use]
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Mark the context as a group conversation.
    #[must_use]
    pub fn in_group(mut self) -> Self {
        self.is_group = true;
        self
    }

    /// Mark the agent as sandboxed.
    #[must_use]
    pub fn sandboxed(mut self) -> Self {
        self.sandboxed = true;
        self
    }

    /// Set both elevated-exec flags.
    #[must_use]
    pub fn with_elevated(mut self, enabled: bool, allowed: bool) -> Self {
        self.elevated_enabled = enabled;
        self.elevated_allowed = allowed;
        self
    }

    /// Replace the role, keeping everything else.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Resolve the role for a request from the admin allowlists.
///
/// An account id or channel id present in the matching allowlist yields
/// [`Role::Admin`]; everything else, including an empty allowlist, yields
/// [`Role::User`]. No other signal promotes a role.
#[must_use]
pub fn resolve_role(
    ctx: &AccessContext,
    admin_account_ids: &[String],
    admin_channels: &[String],
) -> Role {
    let account_match = ctx
        .account_id
        .as_deref()
        .is_some_and(|id| admin_account_ids.iter().any(|a| a == id));
    let channel_match = ctx
        .channel_id
        .as_deref()
        .is_some_and(|id| admin_channels.iter().any(|c| c == id));

    if account_match || channel_match {
        Role::Admin
    } else {
        Role::User
    }
}
