//! Background expiry of stale approval requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::gate::SecurityGate;

/// Spawn a task that expires stale approvals every `interval`.
///
/// The task runs until the handle is aborted. The first sweep happens after
/// one full interval. Must be called from inside a tokio runtime.
#[must_use]
pub fn spawn_approval_sweeper(gate: Arc<SecurityGate>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            gate.expire_stale_approvals();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GateSettings, GatedAction};
    use clawgate_access::{AccessContext, Role};
    use clawgate_approval::ApprovalStatus;
    use clawgate_core::details;

    #[tokio::test]
    async fn test_sweeper_expires_pending_requests() {
        let settings =
            GateSettings::new("/srv/agent").with_approval_max_age(Duration::from_millis(10));
        let gate = Arc::new(SecurityGate::new(settings));
        let ctx = AccessContext::new(Role::User);

        let verdict = gate.evaluate(&ctx, &GatedAction::new("delete", details! { "path" => "/tmp/x" }));
        let id = verdict.approval.unwrap().id;

        let handle = spawn_approval_sweeper(Arc::clone(&gate), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        let record = gate.approvals().get_approval_request(&id).unwrap();
        assert_eq!(record.status, ApprovalStatus::Expired);
        assert_eq!(gate.approvals().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_abort_stops_sweeper() {
        let gate = Arc::new(SecurityGate::new(GateSettings::new("/srv/agent")));
        let handle = spawn_approval_sweeper(gate, Duration::from_secs(60));
        handle.abort();
        let err = handle.await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
