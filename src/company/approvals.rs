//! Approval queue (§4.5): items that require a human or chairman decision
//! before the action they describe is allowed to take effect.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalItem {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub requester: String,
    pub data: Value,
    pub status: ApprovalStatus,
    pub decision_by: Option<String>,
    pub decision_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("no such approval item: {0}")]
    NotFound(Uuid),
    #[error("approval item {0} is already decided")]
    AlreadyDecided(Uuid),
}

/// Pending/decided approval items keyed by id. Expiry is evaluated lazily
/// by [`ApprovalQueue::expire_overdue`], called once per scheduler tick.
#[derive(Default)]
pub struct ApprovalQueue {
    items: DashMap<Uuid, ApprovalItem>,
}

impl ApprovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(
        &self,
        kind: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        requester: impl Into<String>,
        data: Value,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> ApprovalItem {
        let item = ApprovalItem {
            id: Uuid::new_v4(),
            kind: kind.into(),
            title: title.into(),
            description: description.into(),
            requester: requester.into(),
            data,
            status: ApprovalStatus::Pending,
            decision_by: None,
            decision_reason: None,
            created_at: now,
            expires_at: now + ttl,
        };
        self.items.insert(item.id, item.clone());
        item
    }

    fn decide(
        &self,
        id: Uuid,
        status: ApprovalStatus,
        decision_by: impl Into<String>,
        reason: Option<String>,
    ) -> Result<ApprovalItem, ApprovalError> {
        let mut entry = self.items.get_mut(&id).ok_or(ApprovalError::NotFound(id))?;
        if entry.status != ApprovalStatus::Pending {
            return Err(ApprovalError::AlreadyDecided(id));
        }
        entry.status = status;
        entry.decision_by = Some(decision_by.into());
        entry.decision_reason = reason;
        Ok(entry.clone())
    }

    pub fn approve(&self, id: Uuid, decision_by: impl Into<String>) -> Result<ApprovalItem, ApprovalError> {
        self.decide(id, ApprovalStatus::Approved, decision_by, None)
    }

    pub fn reject(
        &self,
        id: Uuid,
        decision_by: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<ApprovalItem, ApprovalError> {
        self.decide(id, ApprovalStatus::Rejected, decision_by, Some(reason.into()))
    }

    /// Auto-rejects every pending item whose `expires_at` has passed,
    /// returning the items that were just expired.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Vec<ApprovalItem> {
        let overdue: Vec<Uuid> = self
            .items
            .iter()
            .filter(|e| e.status == ApprovalStatus::Pending && e.expires_at <= now)
            .map(|e| *e.key())
            .collect();
        overdue
            .into_iter()
            .filter_map(|id| self.reject(id, "scheduler", "expired").ok())
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<ApprovalItem> {
        self.items.get(&id).map(|e| e.clone())
    }

    pub fn pending(&self) -> Vec<ApprovalItem> {
        self.items
            .iter()
            .filter(|e| e.status == ApprovalStatus::Pending)
            .map(|e| e.clone())
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|e| e.status == ApprovalStatus::Pending).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_then_approve() {
        let q = ApprovalQueue::new();
        let now = Utc::now();
        let item = q.submit("budget_increase", "Raise budget", "desc", "lead_research", Value::Null, now, Duration::hours(24));
        assert_eq!(item.status, ApprovalStatus::Pending);
        let decided = q.approve(item.id, "chairman").unwrap();
        assert_eq!(decided.status, ApprovalStatus::Approved);
        assert_eq!(decided.decision_by.as_deref(), Some("chairman"));
    }

    #[test]
    fn cannot_decide_twice() {
        let q = ApprovalQueue::new();
        let now = Utc::now();
        let item = q.submit("k", "t", "d", "r", Value::Null, now, Duration::hours(1));
        q.approve(item.id, "chairman").unwrap();
        let err = q.reject(item.id, "chairman", "changed my mind");
        assert!(matches!(err, Err(ApprovalError::AlreadyDecided(_))));
    }

    #[test]
    fn expire_overdue_rejects_with_reason() {
        let q = ApprovalQueue::new();
        let now = Utc::now();
        let item = q.submit("k", "t", "d", "r", Value::Null, now - Duration::hours(2), Duration::hours(1));
        let expired = q.expire_overdue(now);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, item.id);
        let stored = q.get(item.id).unwrap();
        assert_eq!(stored.status, ApprovalStatus::Rejected);
        assert_eq!(stored.decision_reason.as_deref(), Some("expired"));
    }

    #[test]
    fn expire_overdue_leaves_fresh_items_pending() {
        let q = ApprovalQueue::new();
        let now = Utc::now();
        q.submit("k", "t", "d", "r", Value::Null, now, Duration::hours(24));
        assert!(q.expire_overdue(now).is_empty());
        assert_eq!(q.pending_count(), 1);
    }

    #[test]
    fn not_found_on_unknown_id() {
        let q = ApprovalQueue::new();
        let err = q.approve(Uuid::new_v4(), "chairman");
        assert!(matches!(err, Err(ApprovalError::NotFound(_))));
    }
}
