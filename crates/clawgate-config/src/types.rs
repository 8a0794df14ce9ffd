//! Configuration types.
//!
//! Plain data with no dependency on the engine crates; conversion into
//! engine settings happens where the gate is assembled. Every section has a
//! [`Default`] matching `defaults.toml`, so a bare `[section]` header still
//! yields a working value.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Role resolution and workspace.
    pub access: AccessSection,
    /// Risk scoring inputs.
    pub risk: RiskSection,
    /// Approval lifecycle timing.
    pub approvals: ApprovalsSection,
    /// Toxic flow history limits.
    pub flow: FlowSection,
    /// Logging output.
    pub logging: LoggingSection,
}

/// Admin allowlists and the workspace root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSection {
    /// Account ids that resolve to the admin role.
    pub admin_account_ids: Vec<String>,
    /// Channel ids that resolve to the admin role.
    pub admin_channels: Vec<String>,
    /// Workspace root for boundary checks. When unset, the loader fills in
    /// its workspace root; with no root either, the gate uses the process
    /// working directory.
    pub workspace_dir: Option<String>,
}

/// Inputs to risk scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    /// Hosts reachable without approval; empty disables the check.
    pub allowed_hosts: Vec<String>,
    /// `message_send` above this many recipients needs approval.
    pub message_recipient_limit: usize,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            message_recipient_limit: 10,
        }
    }
}

/// Approval expiry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalsSection {
    /// Pending approvals older than this many seconds expire.
    pub max_age_secs: u64,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for ApprovalsSection {
    fn default() -> Self {
        Self {
            max_age_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

/// Toxic flow history limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSection {
    /// Maximum operations kept.
    pub history_limit: usize,
    /// Age cutoff in seconds, relative to the newest operation.
    pub history_window_secs: u64,
    /// Extra operations a pattern match may span.
    pub window_slack: usize,
}

impl Default for FlowSection {
    fn default() -> Self {
        Self {
            history_limit: 1000,
            history_window_secs: 600,
            window_slack: 10,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Per-target directives, e.g. `["clawgate_flow=debug"]`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
