//! Fixtures for operations and argument maps on a fixed clock.

use serde_json::Value;

use clawgate_core::{Details, Operation, OperationType, Timestamp};

/// Session key used by every fixture operation.
pub const TEST_SESSION: &str = "test-session";

/// 2026-01-01T00:00:00Z, the zero point of fixture time.
pub const BASE_MILLIS: i64 = 1_767_225_600_000;

/// Fixture time `offset_ms` after [`BASE_MILLIS`].
#[must_use]
pub fn at(offset_ms: i64) -> Timestamp {
    Timestamp::from_millis(BASE_MILLIS.saturating_add(offset_ms))
}

/// An operation in [`TEST_SESSION`] at fixture time `offset_ms`.
#[must_use]
pub fn test_op(op_type: OperationType, offset_ms: i64, details: Details) -> Operation {
    Operation::at(op_type, at(offset_ms), details).with_session(TEST_SESSION)
}

fn one(key: &str, value: &str) -> Details {
    let mut details = Details::new();
    details.insert(key.to_string(), Value::String(value.to_string()));
    details
}

/// A file read of `path`.
#[must_use]
pub fn read_op(path: &str, offset_ms: i64) -> Operation {
    test_op(OperationType::Read, offset_ms, one("path", path))
}

/// A file write of `path`.
#[must_use]
pub fn write_op(path: &str, offset_ms: i64) -> Operation {
    test_op(OperationType::Write, offset_ms, one("path", path))
}

/// A deletion of `path`.
#[must_use]
pub fn delete_op(path: &str, offset_ms: i64) -> Operation {
    test_op(OperationType::Delete, offset_ms, one("path", path))
}

/// A network call to `url`.
#[must_use]
pub fn network_op(url: &str, offset_ms: i64) -> Operation {
    test_op(OperationType::Network, offset_ms, one("url", url))
}

/// A browser navigation to `url`.
#[must_use]
pub fn browser_op(url: &str, offset_ms: i64) -> Operation {
    test_op(OperationType::Browser, offset_ms, one("url", url))
}

/// A command execution.
#[must_use]
pub fn exec_op(command: &str, elevated: bool, offset_ms: i64) -> Operation {
    let mut details = one("command", command);
    details.insert("elevated".to_string(), Value::Bool(elevated));
    test_op(OperationType::Exec, offset_ms, details)
}

/// A gateway configuration access with `action` (`get`, `set`, ...).
#[must_use]
pub fn config_op(action: &str, offset_ms: i64) -> Operation {
    test_op(OperationType::Config, offset_ms, one("action", action))
}

/// A `to` argument with `n` recipients.
#[must_use]
pub fn recipients(n: usize) -> Details {
    let to: Vec<Value> = (0..n).map(|i| Value::String(format!("user{i}@example.com"))).collect();
    let mut details = Details::new();
    details.insert("to".to_string(), Value::Array(to));
    details
}
