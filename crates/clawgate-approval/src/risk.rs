//! Per-action risk scoring.
//!
//! A fixed dispatch table keyed on the operation name. Exactly one rule fires
//! per call: the first that matches, in table order.

use clawgate_access::is_sensitive_path;
use clawgate_core::{Details, DetailsExt, RiskLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Default number of message recipients allowed without approval.
pub const DEFAULT_MESSAGE_RECIPIENT_LIMIT: usize = 10;

/// Argument keys that may carry a file path.
const PATH_KEYS: &[&str] = &["path", "file_path"];

/// Inputs the risk engine takes from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Hosts network calls may reach without approval.
    ///
    /// Empty means no allowlist is configured and hosts are not checked.
    /// Entries match case-insensitively; `*.example.com` matches any subdomain
    /// of `example.com` but not `example.com` itself.
    pub allowed_hosts: Vec<String>,
    /// Recipient count above which `message_send` needs approval.
    pub message_recipient_limit: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            message_recipient_limit: DEFAULT_MESSAGE_RECIPIENT_LIMIT,
        }
    }
}

impl RiskConfig {
    /// Replace the host allowlist.
    #[must_use]
    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether `host` is covered by the allowlist.
    #[must_use]
    pub fn is_host_allowed(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.allowed_hosts.iter().any(|entry| {
            let entry = entry.trim().to_ascii_lowercase();
            match entry.strip_prefix("*.") {
                Some(domain) => host
                    .strip_suffix(domain)
                    .is_some_and(|rest| rest.len() > 1 && rest.ends_with('.')),
                None => host == entry,
            }
        })
    }

    /// Check whether a URL points at an allow-listed host.
    ///
    /// Unparsable URLs and URLs without a host are never allow-listed.
    #[must_use]
    pub fn is_url_allowed(&self, raw: &str) -> bool {
        Url::parse(raw)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_matches(['[', ']']).to_string()))
            .is_some_and(|host| self.is_host_allowed(&host))
    }
}

/// Outcome of scoring one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Whether a human must approve before the action proceeds.
    pub requires_approval: bool,
    /// Why approval is needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The assessed risk level.
    #[serde(rename = "riskLevel")]
    pub level: RiskLevel,
}

impl RiskAssessment {
    /// No approval required, low risk.
    #[must_use]
    pub fn low() -> Self {
        Self {
            requires_approval: false,
            reason: None,
            level: RiskLevel::Low,
        }
    }

    /// Approval required at `level`.
    #[must_use]
    pub fn approval(level: RiskLevel, reason: impl Into<String>) -> Self {
        Self {
            requires_approval: true,
            reason: Some(reason.into()),
            level,
        }
    }
}

impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "[{}] {reason}", self.level),
            None => write!(f, "[{}]", self.level),
        }
    }
}

fn has_sensitive_path(args: &Details) -> bool {
    args.first_str(PATH_KEYS).is_some_and(is_sensitive_path)
}

/// Number of recipients in `to`: array length, or one for a plain string.
fn recipient_count(args: &Details) -> usize {
    match args.array_len("to") {
        Some(n) => n,
        None if args.str_field("to").is_some() => 1,
        None => 0,
    }
}

fn url_needs_approval(args: &Details, config: &RiskConfig) -> bool {
    if config.allowed_hosts.is_empty() {
        return false;
    }
    args.str_field("url")
        .is_some_and(|raw| !config.is_url_allowed(raw))
}

/// Score an operation by name and arguments.
///
/// Malformed arguments (wrong JSON types) read as absent, so the rule that
/// inspects them does not fire.
#[must_use]
pub fn assess_operation_risk(
    operation_name: &str,
    args: &Details,
    config: &RiskConfig,
) -> RiskAssessment {
    let assessment = match operation_name {
        "delete" => RiskAssessment::approval(RiskLevel::High, "file deletion requires approval"),
        "exec" | "process" if args.is_true("elevated") => RiskAssessment::approval(
            RiskLevel::Critical,
            "elevated command execution requires approval",
        ),
        "write" | "filesystem.write" if has_sensitive_path(args) => RiskAssessment::approval(
            RiskLevel::Critical,
            "write to a sensitive path requires approval",
        ),
        "read" | "filesystem.read" if has_sensitive_path(args) => RiskAssessment::approval(
            RiskLevel::High,
            "read of a sensitive path requires approval",
        ),
        "fetch" | "browser_navigate" if url_needs_approval(args, config) => {
            RiskAssessment::approval(
                RiskLevel::Medium,
                "network access to a host outside the allowlist requires approval",
            )
        },
        "config.set" | "config.merge" => RiskAssessment::approval(
            RiskLevel::High,
            "gateway configuration change requires approval",
        ),
        "sessions.delete" => {
            RiskAssessment::approval(RiskLevel::Medium, "session deletion requires approval")
        },
        "cron_add" | "cron_remove" => {
            RiskAssessment::approval(RiskLevel::Medium, "cron schedule change requires approval")
        },
        "message_send" if recipient_count(args) > config.message_recipient_limit => {
            RiskAssessment::approval(
                RiskLevel::Medium,
                format!(
                    "message to more than {} recipients requires approval",
                    config.message_recipient_limit
                ),
            )
        },
        _ => RiskAssessment::low(),
    };

    tracing::debug!(
        operation = operation_name,
        level = %assessment.level,
        requires_approval = assessment.requires_approval,
        "assessed operation risk"
    );
    assessment
}
