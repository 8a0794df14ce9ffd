//! Approval request and record types.

use clawgate_core::{Details, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ApprovalError;

/// Display prefix of request ids.
const ID_PREFIX: &str = "apr_";

/// Unique identifier for an approval request.
///
/// A UUIDv7: a millisecond timestamp followed by random bits, so ids sort by
/// creation time. Uniqueness is probabilistic, not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new time-ordered request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{}", self.0.simple())
    }
}

impl FromStr for RequestId {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(ID_PREFIX).unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ApprovalError::InvalidRequestId(s.to_string()))
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RequestId {
    type Error = ApprovalError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Lifecycle state of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Waiting for a human.
    Pending,
    /// A human approved the action.
    Approved,
    /// A human denied the action.
    Denied,
    /// Nobody answered before the max age.
    Expired,
}

impl ApprovalStatus {
    /// Whether the request has left the pending state.
    #[must_use]
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for creating an approval request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    /// Operation name, as passed to risk assessment.
    pub operation: String,
    /// Operation arguments. Callers redact before display.
    #[serde(default)]
    pub details: Details,
    /// Why approval is needed.
    pub reason: String,
    /// Originating session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// Originating account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Originating channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl ApprovalRequest {
    /// Create a request for `operation` with a reason.
    #[must_use]
    pub fn new(operation: impl Into<String>, details: Details, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            details,
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// Set the originating session.
    #[must_use]
    pub fn with_session(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }

    /// Set the originating account.
    #[must_use]
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set the originating channel.
    #[must_use]
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }
}

/// A stored approval request and its resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    /// Unique id.
    pub id: RequestId,
    /// Operation name.
    pub operation: String,
    /// Operation arguments.
    #[serde(default)]
    pub details: Details,
    /// Why approval is needed.
    pub reason: String,
    /// When the request was created.
    pub created_at: Timestamp,
    /// Originating session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// Originating account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Originating channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Current lifecycle state.
    pub status: ApprovalStatus,
    /// Who approved or denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder: Option<String>,
    /// When the request left the pending state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<Timestamp>,
}

impl ApprovalRecord {
    /// Build a fresh pending record from a request.
    #[must_use]
    pub fn pending(request: ApprovalRequest, created_at: Timestamp) -> Self {
        Self {
            id: RequestId::new(),
            operation: request.operation,
            details: request.details,
            reason: request.reason,
            created_at,
            session_key: request.session_key,
            account_id: request.account_id,
            channel_id: request.channel_id,
            status: ApprovalStatus::Pending,
            responder: None,
            responded_at: None,
        }
    }

    /// Whether the record is still waiting for a human.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

impl fmt::Display for ApprovalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.id, self.status, self.operation, self.reason
        )
    }
}

/// Filter for pending-approval listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFilter {
    /// Only requests from this session.
    #[serde(default)]
    pub session_key: Option<String>,
    /// Only requests from this account.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Only requests from this channel.
    #[serde(default)]
    pub channel_id: Option<String>,
}

impl PendingFilter {
    /// Match every pending request.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a session.
    #[must_use]
    pub fn session(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }

    /// Restrict to an account.
    #[must_use]
    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Restrict to a channel.
    #[must_use]
    pub fn channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Whether `record` passes every set field.
    #[must_use]
    pub fn matches(&self, record: &ApprovalRecord) -> bool {
        fn field_ok(want: Option<&String>, have: Option<&String>) -> bool {
            want.is_none_or(|w| have == Some(w))
        }
        field_ok(self.session_key.as_ref(), record.session_key.as_ref())
            && field_ok(self.account_id.as_ref(), record.account_id.as_ref())
            && field_ok(self.channel_id.as_ref(), record.channel_id.as_ref())
    }
}
