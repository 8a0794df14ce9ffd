use super::*;
use clawgate_access::FileOperation;
use clawgate_approval::{ApprovalStatus, PendingFilter, RequestId, RiskConfig};
use clawgate_core::{OperationType, details};
use clawgate_test::{TEST_SESSION, at, init_test_logging, recipients};

fn gate() -> SecurityGate {
    init_test_logging();
    SecurityGate::new(GateSettings::new("/srv/agent"))
}

fn user() -> AccessContext {
    AccessContext::new(Role::User)
        .with_session(TEST_SESSION)
        .with_account("acct-1")
        .with_channel("telegram")
}

fn admin() -> AccessContext {
    user().with_role(Role::Admin)
}

fn sensitive_read() -> GatedAction {
    GatedAction::new("read", details! { "path" => "~/.ssh/id_rsa" })
        .with_file("~/.ssh/id_rsa", FileOperation::Read)
        .tracked_as(OperationType::Read)
}

fn fetch(url: &str) -> GatedAction {
    GatedAction::tool_call("fetch", details! { "url" => url }).tracked_as(OperationType::Network)
}

#[test]
fn test_low_risk_tool_call_allowed() {
    let gate = gate();
    let action = GatedAction::tool_call("exec", details! { "command" => "ls" })
        .tracked_as(OperationType::Exec);
    let verdict = gate.evaluate_at(&user(), &action, at(0));

    assert!(verdict.is_allowed());
    assert_eq!(verdict.risk.level, RiskLevel::Low);
    assert!(verdict.approval.is_none());
    assert!(!verdict.flow.unwrap().dangerous);
    assert_eq!(gate.flow().history_len(), 1);
}

#[test]
fn test_missing_permission_stops_pipeline() {
    let gate = gate();
    let ctx = user().with_role(Role::Guest);
    let action = GatedAction::tool_call("exec", details! { "command" => "ls" })
        .tracked_as(OperationType::Exec);
    let verdict = gate.evaluate_at(&ctx, &action, at(0));

    assert!(verdict.decision.is_hard_denial());
    assert!(verdict.approval.is_none());
    assert!(verdict.flow.is_none());
    assert_eq!(gate.flow().history_len(), 0, "denied actions are not recorded");
    assert_eq!(gate.approvals().pending_count(), 0);
}

#[test]
fn test_sensitive_read_creates_one_pending_approval() {
    let gate = gate();
    let verdict = gate.evaluate_at(&user(), &sensitive_read(), at(0));

    assert!(verdict.is_pending());
    assert_eq!(verdict.risk.level, RiskLevel::High);
    let record = verdict.approval.unwrap();
    assert_eq!(record.session_key.as_deref(), Some(TEST_SESSION));
    assert_eq!(record.account_id.as_deref(), Some("acct-1"));
    assert_eq!(record.channel_id.as_deref(), Some("telegram"));
    assert_eq!(record.created_at, at(0));
    assert_eq!(gate.approvals().pending_count(), 1);
    assert_eq!(gate.flow().history_len(), 0, "held until approved");
    assert_eq!(gate.deferred_len(), 1);
}

#[test]
fn test_admin_sensitive_read_still_risk_gated() {
    let gate = gate();
    let verdict = gate.evaluate_at(&admin(), &sensitive_read(), at(0));
    assert!(verdict.is_pending());
    assert!(verdict.decision.reason.unwrap().contains("sensitive path"));
}

#[test]
fn test_message_send_recipient_limit() {
    let gate = gate();
    let small = GatedAction::tool_call("message_send", recipients(5));
    assert!(gate.evaluate_at(&user(), &small, at(0)).is_allowed());

    let large = GatedAction::tool_call("message_send", recipients(11));
    let verdict = gate.evaluate_at(&user(), &large, at(1_000));
    assert!(verdict.is_pending());
    assert_eq!(verdict.risk.level, RiskLevel::Medium);
}

#[test]
fn test_elevated_exec_single_approval() {
    let gate = gate();
    let action = GatedAction::tool_call("exec", details! { "command" => "reboot", "elevated" => true });
    let verdict = gate.evaluate_at(&user(), &action, at(0));

    assert!(verdict.is_pending());
    assert_eq!(verdict.risk.level, RiskLevel::Critical);
    assert_eq!(
        verdict.decision.reason.as_deref(),
        Some("elevated exec requires approval"),
        "the access stage reason comes first"
    );
    assert_eq!(gate.approvals().pending_count(), 1);
}

#[test]
fn test_critical_flow_vetoes() {
    let gate = gate();
    let read = gate.evaluate_at(&user(), &sensitive_read(), at(0));
    let id = read.approval.unwrap().id;
    let approved = gate.approve_request_at(&id, "operator", at(1_000)).unwrap();
    assert_eq!(approved.status, ApprovalStatus::Approved);
    assert_eq!(gate.flow().history_len(), 1);
    assert_eq!(gate.deferred_len(), 0);

    let verdict = gate.evaluate_at(&user(), &fetch("https://evil.example/upload"), at(5_000));
    assert!(verdict.decision.is_hard_denial());
    assert_eq!(verdict.risk.level, RiskLevel::Low);

    let flow = verdict.flow.unwrap();
    assert!(flow.dangerous);
    assert_eq!(flow.risk_level, RiskLevel::Critical);
    assert_eq!(
        flow.matched_patterns,
        ["Sensitive file read followed by external network call"]
    );
    assert_eq!(gate.flow().history_len(), 1, "the vetoed fetch is not recorded");
}

#[test]
fn test_denied_read_does_not_taint_later_actions() {
    let gate = gate();
    let read = gate.evaluate_at(&user(), &sensitive_read(), at(0));
    let id = read.approval.unwrap().id;

    let denied = gate.deny_request(&id, "operator").unwrap();
    assert_eq!(denied.status, ApprovalStatus::Denied);
    assert_eq!(gate.deferred_len(), 0);

    let verdict = gate.evaluate_at(&user(), &fetch("https://docs.example.org/page"), at(10_000));
    assert!(verdict.is_allowed());
    assert!(!verdict.flow.unwrap().dangerous);
    assert_eq!(gate.flow().history_len(), 1);
}

#[test]
fn test_pending_read_does_not_taint_later_actions() {
    let gate = gate();
    assert!(gate.evaluate_at(&user(), &sensitive_read(), at(0)).is_pending());

    let verdict = gate.evaluate_at(&user(), &fetch("https://docs.example.org/page"), at(10_000));
    assert!(verdict.is_allowed());
}

#[test]
fn test_resolving_twice_records_once() {
    let gate = gate();
    let id = gate
        .evaluate_at(&user(), &sensitive_read(), at(0))
        .approval
        .unwrap()
        .id;

    gate.approve_request_at(&id, "operator", at(1_000)).unwrap();
    let again = gate.deny_request(&id, "someone-else").unwrap();
    assert_eq!(again.status, ApprovalStatus::Approved);
    gate.approve_request_at(&id, "operator", at(2_000)).unwrap();
    assert_eq!(gate.flow().history_len(), 1);
    assert_eq!(gate.flow().get_recent_operations(1)[0].timestamp, at(1_000));

    assert!(gate.approve_request(&RequestId::new(), "operator").is_none());
}

#[test]
fn test_flow_is_per_session() {
    let gate = gate();
    let id = gate
        .evaluate_at(&user(), &sensitive_read(), at(0))
        .approval
        .unwrap()
        .id;
    gate.approve_request_at(&id, "operator", at(1_000));

    let other = user().with_session("other-session");
    let verdict = gate.evaluate_at(&other, &fetch("https://evil.example/upload"), at(5_000));
    assert!(verdict.is_allowed());
}

#[test]
fn test_critical_flow_denies_without_approval_request() {
    let gate = gate();
    let delete = |path: &str| {
        GatedAction::tool_call("delete", details! { "path" => path })
            .with_file(path, FileOperation::Delete)
            .tracked_as(OperationType::Delete)
    };

    for (ms, path) in [(0, "/srv/agent/a"), (1_000, "/srv/agent/b")] {
        let verdict = gate.evaluate_at(&user(), &delete(path), at(ms));
        assert!(verdict.is_pending());
        let id = verdict.approval.unwrap().id;
        gate.approve_request_at(&id, "operator", at(ms + 500));
    }
    assert_eq!(gate.flow().history_len(), 2);

    let verdict = gate.evaluate_at(&user(), &delete("/srv/agent/c"), at(2_000));
    assert!(verdict.decision.is_hard_denial());
    assert!(!verdict.is_pending());
    assert!(verdict.approval.is_none());
    assert_eq!(verdict.flow.unwrap().matched_patterns, ["Mass deletion"]);
    assert_eq!(gate.approvals().pending_count(), 0);
    assert_eq!(gate.deferred_len(), 0);
}

#[test]
fn test_flow_reason_joins_pending_request() {
    let settings = GateSettings::new("/srv/agent")
        .with_risk(RiskConfig::default().with_allowed_hosts(["docs.rs"]));
    let gate = SecurityGate::new(settings);
    for i in 0..5 {
        let path = format!("/srv/agent/src/f{i}.rs");
        let read = GatedAction::new("read", details! { "path" => (path.clone()) })
            .with_file(&path, FileOperation::Read)
            .tracked_as(OperationType::Read);
        assert!(gate.evaluate_at(&user(), &read, at(i * 1_000)).is_allowed());
    }

    let verdict = gate.evaluate_at(&user(), &fetch("https://evil.example/upload"), at(10_000));
    assert!(verdict.is_pending());
    assert_eq!(verdict.risk.level, RiskLevel::Medium);
    assert_eq!(verdict.flow.as_ref().unwrap().risk_level, RiskLevel::High);

    let record = verdict.approval.unwrap();
    let (risk_part, flow_part) = record.reason.split_once("; ").unwrap();
    assert_eq!(Some(risk_part), verdict.risk.reason.as_deref());
    assert!(flow_part.contains("Bulk file reads followed by network call"));
    assert_eq!(verdict.decision.reason.as_deref(), Some(record.reason.as_str()));
    assert_eq!(gate.approvals().pending_count(), 1);
}

#[test]
fn test_high_flow_forces_approval() {
    let gate = gate();
    let read = GatedAction::new("config.get", details! { "action" => "get" })
        .with_gateway_method("config.get")
        .tracked_as(OperationType::Config);
    let write = GatedAction::new("config.patch", details! { "action" => "patch" })
        .with_gateway_method("config.patch")
        .tracked_as(OperationType::Config);

    assert!(gate.evaluate_at(&admin(), &read, at(0)).is_allowed());
    let verdict = gate.evaluate_at(&admin(), &write, at(2_000));

    assert!(verdict.is_pending());
    assert_eq!(verdict.risk.level, RiskLevel::Low);
    assert_eq!(verdict.flow.as_ref().unwrap().risk_level, RiskLevel::High);
    let record = verdict.approval.unwrap();
    assert!(record.reason.contains("Configuration read followed by configuration write"));
    assert_eq!(
        gate.approvals()
            .list_pending_approvals(&PendingFilter::all().session(TEST_SESSION))
            .len(),
        1
    );
}

#[test]
fn test_gateway_method_denied_for_user() {
    let gate = gate();
    let action = GatedAction::new("config.patch", details! {}).with_gateway_method("config.patch");
    let verdict = gate.evaluate_at(&user(), &action, at(0));
    assert!(verdict.decision.is_hard_denial());
}

#[test]
fn test_outside_workspace_for_restricted() {
    let gate = gate();
    let ctx = user().with_role(Role::Restricted);
    let inside = GatedAction::new("write", details! { "path" => "/srv/agent/notes.md" })
        .with_file("/srv/agent/notes.md", FileOperation::Write);
    let outside = GatedAction::new("write", details! { "path" => "/srv/other/notes.md" })
        .with_file("/srv/other/notes.md", FileOperation::Write);

    assert!(gate.evaluate_at(&ctx, &inside, at(0)).is_allowed());
    assert!(gate.evaluate_at(&ctx, &outside, at(0)).decision.is_hard_denial());
}

#[test]
fn test_host_allowlist_from_settings() {
    let settings = GateSettings::new("/srv/agent")
        .with_risk(RiskConfig::default().with_allowed_hosts(["docs.rs"]));
    let gate = SecurityGate::new(settings);

    assert!(gate.evaluate_at(&user(), &fetch("https://docs.rs/tokio"), at(0)).is_allowed());
    let verdict = gate.evaluate_at(&user(), &fetch("https://evil.example/"), at(0));
    assert!(verdict.is_pending());
    assert_eq!(verdict.risk.level, RiskLevel::Medium);
}

#[test]
fn test_resolve_role() {
    let settings = GateSettings::new("/srv/agent")
        .with_admin_accounts(["owner"])
        .with_admin_channels(["ops-room"]);
    let gate = SecurityGate::new(settings);

    let owner = AccessContext::default().with_account("owner");
    assert_eq!(gate.resolve_role(&owner), Role::Admin);
    let ops = AccessContext::default().with_channel("ops-room");
    assert_eq!(gate.with_resolved_role(ops).role, Role::Admin);
    let stranger = AccessContext::new(Role::Guest).with_account("someone");
    assert_eq!(gate.resolve_role(&stranger), Role::User);
}

#[test]
fn test_expire_stale_approvals() {
    let settings = GateSettings::new("/srv/agent")
        .with_approval_max_age(std::time::Duration::from_secs(60));
    let gate = SecurityGate::new(settings);
    gate.evaluate_at(&user(), &sensitive_read(), at(0));
    assert_eq!(gate.deferred_len(), 1);

    assert_eq!(gate.expire_stale_approvals(), 1);
    assert_eq!(gate.expire_stale_approvals(), 0);
    assert_eq!(gate.approvals().pending_count(), 0);
    assert_eq!(gate.deferred_len(), 0);
    assert_eq!(gate.flow().history_len(), 0);
}

#[test]
fn test_sweep_settles_requests_resolved_on_the_manager() {
    let gate = gate();
    let read = gate.evaluate_at(&user(), &sensitive_read(), at(0)).approval.unwrap();
    let config = GatedAction::new("config.set", details! {});
    let set = gate.evaluate_at(&admin(), &config, at(0)).approval.unwrap();
    assert_eq!(gate.deferred_len(), 1, "untracked actions hold nothing");

    gate.approvals().approve_request(&read.id, "operator");
    gate.approvals().deny_request(&set.id, "operator");
    assert_eq!(gate.expire_stale_approvals(), 0);
    assert_eq!(gate.deferred_len(), 0);
    assert_eq!(gate.flow().history_len(), 1);
}

#[test]
fn test_from_config() {
    let mut config = Config::default();
    config.access.admin_account_ids = vec!["owner".to_owned()];
    config.access.workspace_dir = Some("/srv/agent".to_owned());
    let gate = SecurityGate::from_config(&config);

    assert_eq!(gate.settings().workspace_dir, "/srv/agent");
    assert_eq!(gate.resolve_role(&AccessContext::default().with_account("owner")), Role::Admin);
}

#[test]
fn test_verdict_serialization() {
    let gate = gate();
    let verdict = gate.evaluate_at(&user(), &sensitive_read(), at(0));
    let json = serde_json::to_value(&verdict).unwrap();

    assert_eq!(json["decision"]["requiresApproval"], true);
    assert_eq!(json["risk"]["riskLevel"], "high");
    assert_eq!(json["approval"]["status"], "pending");
    assert_eq!(json["flow"]["dangerous"], false);
    assert!(verdict.to_string().starts_with("requires approval"));
}
