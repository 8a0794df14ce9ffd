//! The security gate: access, then risk and approval, then toxic flow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use clawgate_access::{
    AccessContext, Role, check_file_access, check_gateway_method_access, check_tool_access,
    resolve_role,
};
use clawgate_approval::{
    ApprovalManager, ApprovalRecord, ApprovalRequest, ApprovalStatus, RequestId, RiskAssessment,
    assess_operation_risk,
};
use clawgate_config::Config;
use clawgate_core::{AccessDecision, Operation, RiskLevel, Timestamp};
use clawgate_flow::{FlowAnalysis, ToxicFlowDetector};

use crate::action::GatedAction;
use crate::settings::GateSettings;

/// Combined outcome of one [`SecurityGate::evaluate`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateVerdict {
    /// Final decision after every stage.
    pub decision: AccessDecision,
    /// Risk assessment of the operation.
    pub risk: RiskAssessment,
    /// Approval request created for this action, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalRecord>,
    /// Flow analysis, when the action is flow-tracked and passed access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowAnalysis>,
}

impl GateVerdict {
    /// Whether the action may run now.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.decision.allowed
    }

    /// Whether the action waits on a human.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.decision.requires_approval
            && self
                .approval
                .as_ref()
                .is_some_and(ApprovalRecord::is_pending)
    }
}

impl fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (risk {})", self.decision, self.risk.level)?;
        if let Some(approval) = &self.approval {
            write!(f, " approval {}", approval.id)?;
        }
        Ok(())
    }
}

/// Runs every engine for one action and keeps their state.
///
/// The approval manager and the flow detector are shared across calls; the
/// gate itself is `Send + Sync` and is usually held in an `Arc`.
///
/// Only actions that go ahead reach the flow history. A pending action's
/// operation is held until its request is resolved through
/// [`SecurityGate::approve_request`] or [`SecurityGate::deny_request`], and is
/// recorded only on approval.
///
/// # Example
///
/// ```
/// use clawgate_access::{AccessContext, Role};
/// use clawgate_core::details;
/// use clawgate_gate::{GateSettings, GatedAction, SecurityGate};
///
/// let gate = SecurityGate::new(GateSettings::new("/srv/agent"));
/// let ctx = AccessContext::new(Role::User).with_session("chat:1");
///
/// let verdict = gate.evaluate(&ctx, &GatedAction::tool_call("exec", details! { "command" => "ls" }));
/// assert!(verdict.is_allowed());
///
/// let verdict = gate.evaluate(&ctx, &GatedAction::new("config.set", details! {}));
/// assert!(verdict.is_pending());
/// assert_eq!(gate.approvals().pending_count(), 1);
/// ```
#[derive(Debug)]
pub struct SecurityGate {
    settings: GateSettings,
    approvals: ApprovalManager,
    flow: ToxicFlowDetector,
    deferred: Mutex<HashMap<RequestId, Operation>>,
}

impl SecurityGate {
    /// Create a gate with fresh engine state.
    #[must_use]
    pub fn new(settings: GateSettings) -> Self {
        Self {
            approvals: ApprovalManager::with_max_age(settings.approval_max_age),
            flow: ToxicFlowDetector::with_limits(settings.flow),
            deferred: Mutex::new(HashMap::new()),
            settings,
        }
    }

    /// Create a gate from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(GateSettings::from_config(config))
    }

    /// The settings in force.
    #[must_use]
    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    /// The approval manager.
    #[must_use]
    pub fn approvals(&self) -> &ApprovalManager {
        &self.approvals
    }

    /// The toxic flow detector.
    #[must_use]
    pub fn flow(&self) -> &ToxicFlowDetector {
        &self.flow
    }

    /// Role for `ctx` under the configured admin allowlists.
    #[must_use]
    pub fn resolve_role(&self, ctx: &AccessContext) -> Role {
        resolve_role(
            ctx,
            &self.settings.admin_account_ids,
            &self.settings.admin_channels,
        )
    }

    /// `ctx` with its role replaced by [`SecurityGate::resolve_role`].
    #[must_use]
    pub fn with_resolved_role(&self, ctx: AccessContext) -> AccessContext {
        let role = self.resolve_role(&ctx);
        ctx.with_role(role)
    }

    /// Evaluate an action now.
    pub fn evaluate(&self, ctx: &AccessContext, action: &GatedAction) -> GateVerdict {
        self.evaluate_at(ctx, action, Timestamp::now())
    }

    /// Evaluate an action at an explicit time.
    ///
    /// Stages run in order and the first hard denial stops the pipeline:
    /// 1. access checks (file, tool, gateway method)
    /// 2. risk assessment
    /// 3. toxic flow detection against the session's recorded history
    ///
    /// A critical flow denies the action. A high or medium flow makes the
    /// action wait for approval, and its reason is added to the request. At
    /// most one approval request is created per call.
    pub fn evaluate_at(
        &self,
        ctx: &AccessContext,
        action: &GatedAction,
        now: Timestamp,
    ) -> GateVerdict {
        let risk =
            assess_operation_risk(&action.operation_name, &action.args, &self.settings.risk);

        let access = self.check_access(ctx, action);
        if access.is_hard_denial() {
            debug!(
                role = %ctx.role,
                operation = %action.operation_name,
                "action denied by access checks"
            );
            return GateVerdict {
                decision: access,
                risk,
                approval: None,
                flow: None,
            };
        }

        let mut decision = access.and_then(risk_decision(&risk));

        let operation = action.flow.as_ref().map(|(op_type, details)| {
            let mut op = Operation::at(*op_type, now, details.clone());
            op.session_key.clone_from(&ctx.session_key);
            op.account_id.clone_from(&ctx.account_id);
            op
        });
        let flow = operation.as_ref().map(|op| self.flow.preview_flow(op));

        if let Some(analysis) = flow.as_ref().filter(|a| a.dangerous) {
            let flow_reason = analysis
                .reason
                .clone()
                .unwrap_or_else(|| "toxic flow detected".to_owned());
            decision = if analysis.risk_level >= RiskLevel::Critical {
                AccessDecision::deny(flow_reason)
            } else {
                let reason = match decision.reason.as_deref() {
                    Some(pending) if decision.requires_approval => {
                        format!("{pending}; {flow_reason}")
                    },
                    _ => flow_reason,
                };
                AccessDecision::needs_approval(reason)
            };
        }

        let approval = decision
            .requires_approval
            .then(|| self.request_approval(ctx, action, decision.reason.as_deref(), now));

        if let Some(op) = operation {
            if decision.allowed {
                self.flow.record(op);
            } else if let Some(record) = &approval {
                self.lock_deferred().insert(record.id, op);
            }
        }

        debug!(
            role = %ctx.role,
            operation = %action.operation_name,
            allowed = decision.allowed,
            requires_approval = decision.requires_approval,
            risk = %risk.level,
            "action evaluated"
        );

        GateVerdict {
            decision,
            risk,
            approval,
            flow,
        }
    }

    /// Approve a pending request now. See [`SecurityGate::approve_request_at`].
    pub fn approve_request(&self, id: &RequestId, responder: &str) -> Option<ApprovalRecord> {
        self.approve_request_at(id, responder, Timestamp::now())
    }

    /// Approve a pending request and record its held operation, stamped
    /// `now`, in the flow history.
    ///
    /// Returns `None` for an unknown id. Resolving an already resolved
    /// request changes nothing and returns it as it is.
    pub fn approve_request_at(
        &self,
        id: &RequestId,
        responder: &str,
        now: Timestamp,
    ) -> Option<ApprovalRecord> {
        let record = self.approvals.approve_request(id, responder)?;
        self.settle(&record, now);
        Some(record)
    }

    /// Deny a pending request and drop its held operation.
    pub fn deny_request(&self, id: &RequestId, responder: &str) -> Option<ApprovalRecord> {
        let record = self.approvals.deny_request(id, responder)?;
        self.settle(&record, Timestamp::now());
        Some(record)
    }

    /// Number of operations waiting on an approval decision.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.lock_deferred().len()
    }

    /// Expire pending approvals older than the configured max age.
    ///
    /// Held operations of expired requests are dropped, along with those of
    /// requests resolved directly on the approval manager. Returns how many
    /// requests expired.
    pub fn expire_stale_approvals(&self) -> usize {
        let expired = self.approvals.expire_stale();
        for record in &expired {
            self.settle(record, Timestamp::now());
        }
        self.reconcile_deferred();
        expired.len()
    }

    fn lock_deferred(&self) -> MutexGuard<'_, HashMap<RequestId, Operation>> {
        self.deferred.lock().unwrap_or_else(|e| {
            tracing::warn!("SecurityGate deferred lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Record or drop the held operation of a resolved request.
    fn settle(&self, record: &ApprovalRecord, at: Timestamp) {
        if record.is_pending() {
            return;
        }
        let Some(mut op) = self.lock_deferred().remove(&record.id) else {
            return;
        };
        if record.status == ApprovalStatus::Approved {
            op.timestamp = at;
            self.flow.record(op);
        } else {
            debug!(id = %record.id, status = %record.status, "held flow operation dropped");
        }
    }

    fn reconcile_deferred(&self) {
        let ids: Vec<RequestId> = self.lock_deferred().keys().copied().collect();
        for id in ids {
            match self.approvals.get_approval_request(&id) {
                Some(record) => {
                    let at = record.responded_at.unwrap_or_else(Timestamp::now);
                    self.settle(&record, at);
                },
                None => {
                    self.lock_deferred().remove(&id);
                },
            }
        }
    }

    fn check_access(&self, ctx: &AccessContext, action: &GatedAction) -> AccessDecision {
        let mut decision = AccessDecision::allow();
        if let Some((path, op)) = &action.file {
            decision =
                decision.and_then(check_file_access(ctx, path, *op, &self.settings.workspace_dir));
        }
        if let Some(tool) = &action.tool {
            decision = decision.and_then(check_tool_access(ctx, tool, &action.args));
        }
        if let Some(method) = &action.gateway_method {
            decision = decision.and_then(check_gateway_method_access(ctx, method));
        }
        decision
    }

    fn request_approval(
        &self,
        ctx: &AccessContext,
        action: &GatedAction,
        reason: Option<&str>,
        now: Timestamp,
    ) -> ApprovalRecord {
        let mut request = ApprovalRequest::new(
            action.operation_name.clone(),
            action.args.clone(),
            reason.unwrap_or("approval required"),
        );
        request.session_key.clone_from(&ctx.session_key);
        request.account_id.clone_from(&ctx.account_id);
        request.channel_id.clone_from(&ctx.channel_id);
        self.approvals.create_approval_request_at(request, now)
    }
}

fn risk_decision(risk: &RiskAssessment) -> AccessDecision {
    if risk.requires_approval {
        AccessDecision::needs_approval(
            risk.reason
                .clone()
                .unwrap_or_else(|| format!("{} risk operation", risk.level)),
        )
    } else {
        AccessDecision::allow()
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
