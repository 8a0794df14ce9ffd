//! Authorized-action records consumed by the toxic flow detector.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::details::Details;
use crate::types::Timestamp;

/// Category of an authorized action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// File or data read.
    Read,
    /// File write or edit.
    Write,
    /// File deletion.
    Delete,
    /// Command or process execution.
    Exec,
    /// Outbound network call.
    Network,
    /// Gateway configuration read or write.
    Config,
    /// Browser navigation or interaction.
    Browser,
}

impl OperationType {
    /// All operation types, in declaration order.
    pub const ALL: [OperationType; 7] = [
        Self::Read,
        Self::Write,
        Self::Delete,
        Self::Exec,
        Self::Network,
        Self::Config,
        Self::Browser,
    ];

    /// Lower-case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Exec => "exec",
            Self::Network => "network",
            Self::Config => "config",
            Self::Browser => "browser",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown operation type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOperationTypeError(String);

impl fmt::Display for ParseOperationTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operation type: {}", self.0)
    }
}

impl std::error::Error for ParseOperationTypeError {}

impl FromStr for OperationType {
    type Err = ParseOperationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseOperationTypeError(s.to_string()))
    }
}

/// A timestamped record of an action that already passed authorization.
///
/// Built by the integration point after the access and risk checks, then
/// handed to the flow detector. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// What kind of action this was.
    #[serde(rename = "type")]
    pub op_type: OperationType,
    /// When the action happened.
    pub timestamp: Timestamp,
    /// Action arguments (path, url, command, ...).
    #[serde(default)]
    pub details: Details,
    /// Chat session the action belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// Account that triggered the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl Operation {
    /// Record an operation happening now.
    #[must_use]
    pub fn new(op_type: OperationType, details: Details) -> Self {
        Self::at(op_type, Timestamp::now(), details)
    }

    /// Record an operation at an explicit time.
    #[must_use]
    pub fn at(op_type: OperationType, timestamp: Timestamp, details: Details) -> Self {
        Self {
            op_type,
            timestamp,
            details,
            session_key: None,
            account_id: None,
        }
    }

    /// Attach a session key.
    #[must_use]
    pub fn with_session(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }

    /// Attach an account id.
    #[must_use]
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set a single detail value.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.op_type, self.timestamp)?;
        if let Some(session) = &self.session_key {
            write!(f, " [{session}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DetailsExt;

    #[test]
    fn test_operation_type_parse() {
        assert_eq!("read".parse::<OperationType>(), Ok(OperationType::Read));
        assert_eq!("NETWORK".parse::<OperationType>(), Ok(OperationType::Network));
        assert!("teleport".parse::<OperationType>().is_err());
    }

    #[test]
    fn test_operation_builder() {
        let op = Operation::at(OperationType::Exec, Timestamp::from_millis(5), Details::new())
            .with_session("s1")
            .with_account("acct")
            .with_detail("command", "ls");

        assert_eq!(op.session_key.as_deref(), Some("s1"));
        assert_eq!(op.account_id.as_deref(), Some("acct"));
        assert_eq!(op.details.str_field("command"), Some("ls"));
        assert_eq!(op.timestamp.as_millis(), 5);
    }

    #[test]
    fn test_operation_serialization_shape() {
        let op = Operation::at(OperationType::Delete, Timestamp::from_millis(0), Details::new())
            .with_session("s1");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "delete");
        assert_eq!(json["sessionKey"], "s1");
        assert!(json.get("accountId").is_none());
    }

    #[test]
    fn test_operation_display() {
        let op = Operation::at(OperationType::Read, Timestamp::from_millis(0), Details::new())
            .with_session("chat:1");
        assert_eq!(op.to_string(), "read @ 1970-01-01T00:00:00.000Z [chat:1]");
    }
}
