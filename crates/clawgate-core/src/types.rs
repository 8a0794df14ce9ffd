//! Common types used throughout Clawgate.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp wrapper for consistent handling throughout Clawgate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Create a timestamp from milliseconds since the Unix epoch.
    ///
    /// Out-of-range values clamp to the epoch.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(Utc.timestamp_millis_opt(millis).single().unwrap_or_default())
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Time elapsed from `earlier` to `self`. Negative if `earlier` is later.
    #[must_use]
    pub fn elapsed_since(&self, earlier: Timestamp) -> Duration {
        self.0.signed_duration_since(earlier.0)
    }

    /// Subtract a duration, returning `None` on overflow.
    #[must_use]
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        self.0.checked_sub_signed(duration).map(Self)
    }

    /// Add a duration, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add_signed(duration).map(Self)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

/// Risk level classification shared by the risk engine and the flow detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low risk - proceeds without approval.
    Low,
    /// Medium risk - approval depends on the specific rule.
    Medium,
    /// High risk - destructive or privacy-relevant.
    High,
    /// Critical risk - credential exposure or privilege escalation.
    Critical,
}

impl RiskLevel {
    /// Lower-case label, as rendered to operators.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_millis_roundtrip() {
        let ts = Timestamp::from_millis(1_700_000_000_123);
        assert_eq!(ts.as_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_timestamp_elapsed() {
        let a = Timestamp::from_millis(1_000);
        let b = Timestamp::from_millis(61_000);
        assert_eq!(b.elapsed_since(a), Duration::seconds(60));
        assert_eq!(a.elapsed_since(b), Duration::seconds(-60));
    }

    #[test]
    fn test_timestamp_checked_sub() {
        let ts = Timestamp::from_millis(10_000);
        let earlier = ts.checked_sub(Duration::seconds(4)).unwrap();
        assert_eq!(earlier.as_millis(), 6_000);
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::from_millis(0);
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert_eq!(
            [RiskLevel::Medium, RiskLevel::Critical, RiskLevel::High]
                .into_iter()
                .max(),
            Some(RiskLevel::Critical)
        );
    }

    #[test]
    fn test_risk_level_serde() {
        let json = serde_json::to_string(&RiskLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let parsed: RiskLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, RiskLevel::Medium);
    }
}
