//! Engine settings, built from configuration or by hand.

use std::time::Duration;

use clawgate_approval::{DEFAULT_MAX_AGE, RiskConfig};
use clawgate_config::Config;
use clawgate_flow::FlowLimits;

/// Default interval between approval expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Everything a [`SecurityGate`] needs to run.
///
/// [`SecurityGate`]: crate::SecurityGate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSettings {
    /// Account ids that resolve to the admin role.
    pub admin_account_ids: Vec<String>,
    /// Channel ids that resolve to the admin role.
    pub admin_channels: Vec<String>,
    /// Workspace root for boundary checks.
    pub workspace_dir: String,
    /// Risk engine inputs.
    pub risk: RiskConfig,
    /// Flow detector limits.
    pub flow: FlowLimits,
    /// Pending approvals older than this expire on sweep.
    pub approval_max_age: Duration,
    /// Interval between expiry sweeps.
    pub sweep_interval: Duration,
}

impl GateSettings {
    /// Settings with built-in defaults and the given workspace.
    #[must_use]
    pub fn new(workspace_dir: impl Into<String>) -> Self {
        Self {
            admin_account_ids: Vec::new(),
            admin_channels: Vec::new(),
            workspace_dir: workspace_dir.into(),
            risk: RiskConfig::default(),
            flow: FlowLimits::default(),
            approval_max_age: DEFAULT_MAX_AGE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Translate a loaded configuration.
    ///
    /// `access.workspace_dir` is set by the loader when it was given a
    /// workspace root. Without it the process working directory is the
    /// workspace.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let workspace_dir = config.access.workspace_dir.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| ".".to_owned())
        });

        Self {
            admin_account_ids: config.access.admin_account_ids.clone(),
            admin_channels: config.access.admin_channels.clone(),
            workspace_dir,
            risk: RiskConfig {
                allowed_hosts: config.risk.allowed_hosts.clone(),
                message_recipient_limit: config.risk.message_recipient_limit,
            },
            flow: FlowLimits {
                history_limit: config.flow.history_limit,
                history_window: Duration::from_secs(config.flow.history_window_secs),
                window_slack: config.flow.window_slack,
            },
            approval_max_age: Duration::from_secs(config.approvals.max_age_secs),
            sweep_interval: Duration::from_secs(config.approvals.sweep_interval_secs),
        }
    }

    /// Add admin account ids.
    #[must_use]
    pub fn with_admin_accounts<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_account_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Add admin channels.
    #[must_use]
    pub fn with_admin_channels<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_channels.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Replace the risk inputs.
    #[must_use]
    pub fn with_risk(mut self, risk: RiskConfig) -> Self {
        self.risk = risk;
        self
    }

    /// Replace the flow limits.
    #[must_use]
    pub fn with_flow_limits(mut self, flow: FlowLimits) -> Self {
        self.flow = flow;
        self
    }

    /// Set the approval max age.
    #[must_use]
    pub fn with_approval_max_age(mut self, max_age: Duration) -> Self {
        self.approval_max_age = max_age;
        self
    }
}
