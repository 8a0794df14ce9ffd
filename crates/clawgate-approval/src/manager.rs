//! Approval lifecycle manager.
//!
//! Tracks every approval request from creation to resolution. Records move
//! `pending → approved | denied` through an idempotent responder call, or
//! `pending → expired` through the TTL sweep. Once resolved a record leaves
//! the pending index but stays in the history.

use clawgate_core::Timestamp;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::request::{ApprovalRecord, ApprovalRequest, ApprovalStatus, PendingFilter, RequestId};

/// Default age after which a pending request expires.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Default)]
struct ApprovalState {
    /// Every record ever created, in creation order.
    history: Vec<ApprovalRecord>,
    /// Position of each record in `history`.
    positions: HashMap<RequestId, usize>,
    /// Ids still pending. Ordered by id, which is creation order.
    pending: BTreeSet<RequestId>,
}

impl ApprovalState {
    fn record(&self, id: &RequestId) -> Option<&ApprovalRecord> {
        self.positions.get(id).and_then(|&i| self.history.get(i))
    }

    fn record_mut(&mut self, id: &RequestId) -> Option<&mut ApprovalRecord> {
        let i = *self.positions.get(id)?;
        self.history.get_mut(i)
    }
}

/// In-memory approval store with a single lock over the pending index and
/// the history.
///
/// # Example
///
/// ```
/// use clawgate_approval::{ApprovalManager, ApprovalRequest, ApprovalStatus, PendingFilter};
/// use clawgate_core::details;
///
/// let manager = ApprovalManager::new();
/// let record = manager.create_approval_request(
///     ApprovalRequest::new("delete", details! { "path" => "/tmp/a" }, "destructive"),
/// );
/// assert_eq!(record.status, ApprovalStatus::Pending);
///
/// let approved = manager.approve_request(&record.id, "alice").unwrap();
/// assert_eq!(approved.status, ApprovalStatus::Approved);
/// assert!(manager.list_pending_approvals(&PendingFilter::all()).is_empty());
/// ```
pub struct ApprovalManager {
    state: Mutex<ApprovalState>,
    max_age: Duration,
}

impl ApprovalManager {
    /// Create an empty manager with the default max age of one hour.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_age(DEFAULT_MAX_AGE)
    }

    /// Create an empty manager whose [`expire_stale`](Self::expire_stale)
    /// uses `max_age`.
    #[must_use]
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            state: Mutex::new(ApprovalState::default()),
            max_age,
        }
    }

    /// The max age used by [`expire_stale`](Self::expire_stale).
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn lock(&self) -> MutexGuard<'_, ApprovalState> {
        self.state.lock().unwrap_or_else(|e| {
            tracing::warn!("ApprovalManager lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Create a fresh pending request, timestamped now.
    pub fn create_approval_request(&self, request: ApprovalRequest) -> ApprovalRecord {
        self.create_approval_request_at(request, Timestamp::now())
    }

    /// Create a fresh pending request with an explicit creation time.
    pub fn create_approval_request_at(
        &self,
        request: ApprovalRequest,
        created_at: Timestamp,
    ) -> ApprovalRecord {
        let record = ApprovalRecord::pending(request, created_at);
        let mut state = self.lock();
        let position = state.history.len();
        state.positions.insert(record.id, position);
        state.pending.insert(record.id);
        state.history.push(record.clone());
        drop(state);

        tracing::info!(
            id = %record.id,
            operation = %record.operation,
            "approval request created"
        );
        record
    }

    /// Look up a request by id, in any state.
    #[must_use]
    pub fn get_approval_request(&self, id: &RequestId) -> Option<ApprovalRecord> {
        self.lock().record(id).cloned()
    }

    /// Snapshot of the currently pending requests matching `filter`, oldest
    /// first.
    #[must_use]
    pub fn list_pending_approvals(&self, filter: &PendingFilter) -> Vec<ApprovalRecord> {
        let state = self.lock();
        state
            .pending
            .iter()
            .filter_map(|id| state.record(id))
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Number of pending requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Approve a pending request.
    ///
    /// Returns `None` for an unknown id. A request that already left the
    /// pending state comes back unchanged.
    pub fn approve_request(&self, id: &RequestId, responder: &str) -> Option<ApprovalRecord> {
        self.resolve(id, responder, ApprovalStatus::Approved)
    }

    /// Deny a pending request. Same idempotence as
    /// [`approve_request`](Self::approve_request).
    pub fn deny_request(&self, id: &RequestId, responder: &str) -> Option<ApprovalRecord> {
        self.resolve(id, responder, ApprovalStatus::Denied)
    }

    fn resolve(
        &self,
        id: &RequestId,
        responder: &str,
        status: ApprovalStatus,
    ) -> Option<ApprovalRecord> {
        let mut state = self.lock();
        let record = state.record_mut(id)?;
        if record.status.is_resolved() {
            tracing::debug!(%id, status = %record.status, "approval already resolved");
            return Some(record.clone());
        }

        record.status = status;
        record.responder = Some(responder.to_string());
        record.responded_at = Some(Timestamp::now());
        let resolved = record.clone();
        state.pending.remove(id);
        drop(state);

        tracing::info!(%id, status = %status, responder, "approval request resolved");
        Some(resolved)
    }

    /// Expire every pending request older than `max_age`, measured now.
    ///
    /// Returns the records that were expired.
    pub fn expire_pending_approvals(&self, max_age: Duration) -> Vec<ApprovalRecord> {
        self.expire_pending_approvals_at(max_age, Timestamp::now())
    }

    /// Expire every pending request for which `now - created_at > max_age`.
    pub fn expire_pending_approvals_at(
        &self,
        max_age: Duration,
        now: Timestamp,
    ) -> Vec<ApprovalRecord> {
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);

        let mut state = self.lock();
        let stale: Vec<RequestId> = state
            .pending
            .iter()
            .filter(|id| {
                state
                    .record(id)
                    .is_some_and(|r| now.elapsed_since(r.created_at).num_milliseconds() > max_age_ms)
            })
            .copied()
            .collect();

        let mut expired = Vec::with_capacity(stale.len());
        for id in &stale {
            state.pending.remove(id);
            if let Some(record) = state.record_mut(id) {
                record.status = ApprovalStatus::Expired;
                record.responded_at = Some(now);
                expired.push(record.clone());
            }
        }
        drop(state);

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired stale approval requests");
        }
        expired
    }

    /// Expire pending requests older than the manager's configured max age.
    pub fn expire_stale(&self) -> Vec<ApprovalRecord> {
        self.expire_pending_approvals(self.max_age)
    }

    /// The most recent `limit` records in any state, oldest first.
    #[must_use]
    pub fn get_approval_history(&self, limit: usize) -> Vec<ApprovalRecord> {
        let state = self.lock();
        let skip = state.history.len().saturating_sub(limit);
        state.history.iter().skip(skip).cloned().collect()
    }

    /// Total number of records ever created.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }
}

impl Default for ApprovalManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApprovalManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ApprovalManager")
            .field("pending", &state.pending.len())
            .field("history", &state.history.len())
            .field("max_age", &self.max_age)
            .finish()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
