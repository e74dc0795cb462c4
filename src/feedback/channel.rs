//! `FeedbackChannel` (§4.10): intake, routing, and stats for
//! organization-facing feedback items.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::types::{FeedbackCategory, FeedbackEntry, FeedbackSource, FeedbackStats, FeedbackStatus, FeedbackUrgency};

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("no such feedback item: {0}")]
    NotFound(Uuid),
}

pub struct FeedbackChannel {
    entries: DashMap<Uuid, FeedbackEntry>,
}

impl Default for FeedbackChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackChannel {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    pub fn submit(
        &self,
        submitted_by: impl Into<String>,
        category: FeedbackCategory,
        content: impl Into<String>,
        title: Option<String>,
        urgency: FeedbackUrgency,
        refs: HashMap<String, Value>,
        now: DateTime<Utc>,
    ) -> FeedbackEntry {
        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            submitted_by: submitted_by.into(),
            category,
            title,
            content: content.into(),
            urgency,
            refs,
            source: FeedbackSource::Manual,
            status: FeedbackStatus::Open,
            reviewed_by: None,
            review_notes: None,
            created_at: now,
            reviewed_at: None,
        };
        self.entries.insert(entry.id, entry.clone());
        entry
    }

    /// Convenience wrapper matching the agent-facing "submit a tool
    /// request" entry point; the dedup-into-`ToolRequest` bookkeeping
    /// lives in `CapabilitySystem`, not here.
    pub fn submit_tool_request(
        &self,
        submitted_by: impl Into<String>,
        tool_name: &str,
        reason: &str,
        expected_benefit: &str,
        urgency: FeedbackUrgency,
        now: DateTime<Utc>,
    ) -> FeedbackEntry {
        let content = format!("tool request: {tool_name}\nreason: {reason}\nexpected benefit: {expected_benefit}");
        let mut refs = HashMap::new();
        refs.insert("tool_name".to_string(), Value::String(tool_name.to_string()));
        self.submit(
            submitted_by,
            FeedbackCategory::ToolRequest,
            content,
            Some(format!("tool request: {tool_name}")),
            urgency,
            refs,
            now,
        )
    }

    pub fn get(&self, id: Uuid) -> Option<FeedbackEntry> {
        self.entries.get(&id).map(|e| e.clone())
    }

    pub fn pending(&self, category: Option<FeedbackCategory>, handler: Option<&str>) -> Vec<FeedbackEntry> {
        let mut out: Vec<FeedbackEntry> = self
            .entries
            .iter()
            .map(|e| e.clone())
            .filter(|e| matches!(e.status, FeedbackStatus::Open | FeedbackStatus::InReview))
            .filter(|e| category.map(|c| c == e.category).unwrap_or(true))
            .filter(|e| handler.map(|h| e.category.handler_role() == h).unwrap_or(true))
            .collect();
        out.sort_by(|a, b| b.urgency.score().partial_cmp(&a.urgency.score()).unwrap().then(a.created_at.cmp(&b.created_at)));
        out
    }

    pub fn review(
        &self,
        id: Uuid,
        reviewed_by: impl Into<String>,
        status: FeedbackStatus,
        notes: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), FeedbackError> {
        let mut entry = self.entries.get_mut(&id).ok_or(FeedbackError::NotFound(id))?;
        entry.status = status;
        entry.reviewed_by = Some(reviewed_by.into());
        entry.review_notes = Some(notes.into());
        entry.reviewed_at = Some(now);
        Ok(())
    }

    pub fn handler_for(&self, category: FeedbackCategory) -> &'static str {
        category.handler_role()
    }

    /// Moves an item into review and reports who it was routed to.
    pub fn route(&self, id: Uuid, now: DateTime<Utc>) -> Result<&'static str, FeedbackError> {
        let mut entry = self.entries.get_mut(&id).ok_or(FeedbackError::NotFound(id))?;
        entry.status = FeedbackStatus::InReview;
        entry.reviewed_at = entry.reviewed_at.or(Some(now));
        Ok(entry.category.handler_role())
    }

    pub fn stats(&self, period_days: i64, now: DateTime<Utc>) -> FeedbackStats {
        let period_start = now - Duration::days(period_days);
        let in_period: Vec<FeedbackEntry> = self.entries.iter().map(|e| e.clone()).filter(|e| e.created_at >= period_start).collect();

        let mut by_category = HashMap::new();
        let mut by_urgency = HashMap::new();
        let mut by_status = HashMap::new();
        let mut manual_count = 0;
        let mut auto_extracted_count = 0;
        let mut resolution_hours = Vec::new();

        for e in &in_period {
            *by_category.entry(format!("{:?}", e.category)).or_insert(0) += 1;
            *by_urgency.entry(format!("{:?}", e.urgency)).or_insert(0) += 1;
            *by_status.entry(format!("{:?}", e.status)).or_insert(0) += 1;
            match e.source {
                FeedbackSource::Manual => manual_count += 1,
                FeedbackSource::AutoExtracted => auto_extracted_count += 1,
            }
            if let Some(reviewed_at) = e.reviewed_at {
                resolution_hours.push((reviewed_at - e.created_at).num_seconds() as f64 / 3600.0);
            }
        }

        let avg_resolution_hours =
            if resolution_hours.is_empty() { 0.0 } else { resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64 };

        let open_count =
            self.entries.iter().filter(|e| matches!(e.status, FeedbackStatus::Open | FeedbackStatus::InReview)).count();

        FeedbackStats {
            period_start,
            period_end: now,
            total_count: in_period.len(),
            by_category,
            by_urgency,
            by_status,
            manual_count,
            auto_extracted_count,
            avg_resolution_hours,
            open_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_then_route_updates_status_and_returns_handler() {
        let ch = FeedbackChannel::new();
        let now = Utc::now();
        let entry = ch.submit(
            "researcher-1",
            FeedbackCategory::ToolRequest,
            "need a faster backtester",
            None,
            FeedbackUrgency::Medium,
            HashMap::new(),
            now,
        );
        let handler = ch.route(entry.id, now).unwrap();
        assert_eq!(handler, "cto_capability");
        assert_eq!(ch.get(entry.id).unwrap().status, FeedbackStatus::InReview);
    }

    #[test]
    fn pending_excludes_resolved_items() {
        let ch = FeedbackChannel::new();
        let now = Utc::now();
        let e1 = ch.submit("a1", FeedbackCategory::OrgIssue, "c", None, FeedbackUrgency::Low, HashMap::new(), now);
        let e2 = ch.submit("a2", FeedbackCategory::OrgIssue, "c2", None, FeedbackUrgency::Critical, HashMap::new(), now);
        ch.review(e1.id, "cpo", FeedbackStatus::Implemented, "done", now).unwrap();

        let pending = ch.pending(None, None);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, e2.id);
    }

    #[test]
    fn stats_counts_period_and_efficiency() {
        let ch = FeedbackChannel::new();
        let now = Utc::now();
        let entry = ch.submit_tool_request("r1", "backtest.fast", "speed", "faster loop", FeedbackUrgency::High, now);
        ch.review(entry.id, "cto", FeedbackStatus::Accepted, "will build", now + Duration::hours(5)).unwrap();

        let stats = ch.stats(7, now + Duration::hours(6));
        assert_eq!(stats.total_count, 1);
        assert_eq!(stats.manual_count, 1);
        assert!((stats.avg_resolution_hours - 5.0).abs() < 1e-6);
        assert_eq!(stats.open_count, 0);
    }
}
