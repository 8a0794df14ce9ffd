//! The fixed registry of toxic flow patterns.
//!
//! Patterns are compile-time data. Each is an ordered list of step matchers,
//! an operation type plus a predicate over the operation's details, and the
//! longest time allowed between the first and last matched step.

use clawgate_core::{Details, DetailsExt, Operation, OperationType, RiskLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a toxic flow pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious, worth a look.
    Medium,
    /// Likely abuse.
    High,
    /// Known attack chain.
    Critical,
}

impl Severity {
    /// Lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl From<Severity> for RiskLevel {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Medium => RiskLevel::Medium,
            Severity::High => RiskLevel::High,
            Severity::Critical => RiskLevel::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a pattern.
#[derive(Clone, Copy)]
pub struct StepMatcher {
    /// Required operation type.
    pub op_type: OperationType,
    /// What the predicate looks for.
    pub description: &'static str,
    /// Predicate over the operation's details.
    pub predicate: fn(&Details) -> bool,
}

impl StepMatcher {
    /// Whether `op` satisfies this step.
    #[must_use]
    pub fn matches(&self, op: &Operation) -> bool {
        op.op_type == self.op_type && (self.predicate)(&op.details)
    }
}

impl fmt::Debug for StepMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepMatcher")
            .field("op_type", &self.op_type)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A code-defined multi-step attack chain.
#[derive(Debug, Clone, Copy)]
pub struct FlowPattern {
    /// Stable identifier, safe to log.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// What the chain does.
    pub description: &'static str,
    /// How bad a match is.
    pub severity: Severity,
    /// Ordered steps.
    pub steps: &'static [StepMatcher],
    /// Longest allowed span from first to last matched step.
    pub max_window_ms: i64,
}

impl FlowPattern {
    /// Look a pattern up in the registry by id.
    #[must_use]
    pub fn by_id(id: &str) -> Option<&'static FlowPattern> {
        FLOW_PATTERNS.iter().find(|p| p.id == id)
    }
}

// --- predicates ---

const PATH_KEYS: &[&str] = &["path", "file_path"];

fn folded(details: &Details, keys: &[&str]) -> Option<String> {
    details.first_str(keys).map(str::to_lowercase)
}

fn path_contains_any(details: &Details, needles: &[&str]) -> bool {
    folded(details, PATH_KEYS).is_some_and(|p| needles.iter().any(|n| p.contains(n)))
}

fn any_op(_: &Details) -> bool {
    true
}

fn sensitive_read(details: &Details) -> bool {
    path_contains_any(
        details,
        &[
            "password", "secret", ".ssh", ".aws", ".gnupg", "credential", ".env", "token",
            "id_rsa", "id_ed25519", ".pem", ".key", "api_key", "apikey",
        ],
    )
}

fn credential_read(details: &Details) -> bool {
    path_contains_any(
        details,
        &[
            "credential", ".aws/", ".ssh/", ".gnupg", ".netrc", ".git-credentials", ".kube/config",
            "token", "id_rsa", "id_ed25519",
        ],
    )
}

fn system_config_read(details: &Details) -> bool {
    path_contains_any(details, &["/etc/", "sudoers", "systemd"])
}

fn external_network(details: &Details) -> bool {
    folded(details, &["url", "host"]).is_some_and(|target| {
        !["localhost", "127.0.0.1", "[::1]", "::1"]
            .iter()
            .any(|local| target.contains(local))
    })
}

fn config_action_in(details: &Details, actions: &[&str]) -> bool {
    details
        .str_field("action")
        .is_some_and(|a| actions.iter().any(|want| a.eq_ignore_ascii_case(want)))
}

fn config_read(details: &Details) -> bool {
    config_action_in(details, &["read", "get"])
}

fn config_write(details: &Details) -> bool {
    config_action_in(details, &["write", "set", "merge", "patch", "apply"])
}

const EXECUTABLE_EXTENSIONS: &[&str] = &[
    ".sh", ".bash", ".exe", ".bat", ".cmd", ".ps1", ".bin", ".run", ".msi", ".dmg", ".pkg",
    ".deb", ".rpm", ".appimage", ".command", ".jar",
];

fn executable_write(details: &Details) -> bool {
    details.is_true("executable")
        || folded(details, PATH_KEYS)
            .is_some_and(|p| EXECUTABLE_EXTENSIONS.iter().any(|ext| p.ends_with(ext)))
}

fn elevated_exec(details: &Details) -> bool {
    details.is_true("elevated")
}

// --- registry ---

const READ_ANY: StepMatcher = StepMatcher {
    op_type: OperationType::Read,
    description: "any file read",
    predicate: any_op,
};

const DELETE_ANY: StepMatcher = StepMatcher {
    op_type: OperationType::Delete,
    description: "any deletion",
    predicate: any_op,
};

const NETWORK_EXTERNAL: StepMatcher = StepMatcher {
    op_type: OperationType::Network,
    description: "network call to a non-local host",
    predicate: external_network,
};

/// Every registered pattern, in scan order.
pub static FLOW_PATTERNS: &[FlowPattern] = &[
    FlowPattern {
        id: "sensitive-read-exfil",
        name: "Sensitive file read followed by external network call",
        description: "A secret is read and then something leaves the host",
        severity: Severity::Critical,
        steps: &[
            StepMatcher {
                op_type: OperationType::Read,
                description: "read of a secret-looking path",
                predicate: sensitive_read,
            },
            NETWORK_EXTERNAL,
        ],
        max_window_ms: 60_000,
    },
    FlowPattern {
        id: "credential-exec",
        name: "Credential read followed by command execution",
        description: "Credentials are read and then a command runs",
        severity: Severity::Critical,
        steps: &[
            StepMatcher {
                op_type: OperationType::Read,
                description: "read of a credential store",
                predicate: credential_read,
            },
            StepMatcher {
                op_type: OperationType::Exec,
                description: "any command",
                predicate: any_op,
            },
        ],
        max_window_ms: 120_000,
    },
    FlowPattern {
        id: "bulk-read-exfil",
        name: "Bulk file reads followed by network call",
        description: "Five or more reads and then an external network call",
        severity: Severity::High,
        steps: &[READ_ANY, READ_ANY, READ_ANY, READ_ANY, READ_ANY, NETWORK_EXTERNAL],
        max_window_ms: 300_000,
    },
    FlowPattern {
        id: "config-tamper",
        name: "Configuration read followed by configuration write",
        description: "Gateway configuration is inspected and then changed",
        severity: Severity::High,
        steps: &[
            StepMatcher {
                op_type: OperationType::Config,
                description: "configuration read",
                predicate: config_read,
            },
            StepMatcher {
                op_type: OperationType::Config,
                description: "configuration write",
                predicate: config_write,
            },
        ],
        max_window_ms: 60_000,
    },
    FlowPattern {
        id: "mass-deletion",
        name: "Mass deletion",
        description: "Three or more deletions in quick succession",
        severity: Severity::Critical,
        steps: &[DELETE_ANY, DELETE_ANY, DELETE_ANY],
        max_window_ms: 60_000,
    },
    FlowPattern {
        id: "download-execute",
        name: "Browser navigation followed by executable write",
        description: "A page is visited and then an executable file is written",
        severity: Severity::High,
        steps: &[
            StepMatcher {
                op_type: OperationType::Browser,
                description: "any navigation",
                predicate: any_op,
            },
            StepMatcher {
                op_type: OperationType::Write,
                description: "write of an executable",
                predicate: executable_write,
            },
        ],
        max_window_ms: 30_000,
    },
    FlowPattern {
        id: "system-config-escalation",
        name: "System configuration read followed by elevated execution",
        description: "System configuration is read and then an elevated command runs",
        severity: Severity::Critical,
        steps: &[
            StepMatcher {
                op_type: OperationType::Read,
                description: "read under /etc, sudoers or systemd",
                predicate: system_config_read,
            },
            StepMatcher {
                op_type: OperationType::Exec,
                description: "elevated command",
                predicate: elevated_exec,
            },
        ],
        max_window_ms: 60_000,
    },
];
