//! `CapabilitySystem` (§4.10): deduplicated tool-request intake,
//! priority scoring, and periodic capability-gap reporting.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::feedback::types::{CapabilityGapReport, FeedbackUrgency, ToolRequest, ToolUsageStat};

const LOW_USAGE_THRESHOLD_CALLS_PER_DAY: f64 = 0.1;

pub struct CapabilitySystem {
    requests: DashMap<Uuid, ToolRequest>,
    deployed: DashMap<String, ()>,
}

impl Default for CapabilitySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilitySystem {
    pub fn new() -> Self {
        Self { requests: DashMap::new(), deployed: DashMap::new() }
    }

    pub fn mark_deployed(&self, tool_name: impl Into<String>) {
        self.deployed.insert(tool_name.into(), ());
    }

    /// Submits a request for `tool_name`; if an undeployed request for
    /// the same tool already exists, increments its `request_count`
    /// instead of inserting a new row.
    pub fn submit_tool_request(
        &self,
        tool_name: impl Into<String>,
        reason: impl Into<String>,
        expected_benefit: impl Into<String>,
        urgency: FeedbackUrgency,
        now: DateTime<Utc>,
    ) -> Uuid {
        let tool_name = tool_name.into();
        if self.deployed.contains_key(&tool_name) {
            // Still recorded — a deployed tool can be re-requested with
            // a feature ask — but dedup only applies to undeployed ones.
        }

        let existing = self.requests.iter().find(|r| r.tool_name == tool_name).map(|r| r.id);
        if let Some(id) = existing {
            if let Some(mut entry) = self.requests.get_mut(&id) {
                entry.request_count += 1;
                entry.recompute_priority();
            }
            return id;
        }

        let mut request = ToolRequest {
            id: Uuid::new_v4(),
            tool_name,
            reason: reason.into(),
            expected_benefit: expected_benefit.into(),
            request_count: 1,
            urgency,
            feasibility_score: None,
            priority_score: 0.0,
            created_at: now,
        };
        request.recompute_priority();
        let id = request.id;
        self.requests.insert(id, request);
        id
    }

    pub fn get_request(&self, id: Uuid) -> Option<ToolRequest> {
        self.requests.get(&id).map(|r| r.clone())
    }

    pub fn evaluate_request(&self, id: Uuid, feasibility_score: f64) -> bool {
        let Some(mut entry) = self.requests.get_mut(&id) else { return false };
        entry.feasibility_score = Some(feasibility_score);
        entry.recompute_priority();
        true
    }

    /// All tracked requests, highest `priority_score` first.
    pub fn prioritized_requests(&self) -> Vec<ToolRequest> {
        let mut all: Vec<ToolRequest> = self.requests.iter().map(|r| r.clone()).collect();
        all.sort_by(|a, b| b.priority_score.partial_cmp(&a.priority_score).unwrap());
        all
    }

    pub fn low_usage_tools(&self, usage: &[ToolUsageStat], threshold_calls_per_day: f64) -> Vec<ToolUsageStat> {
        usage.iter().filter(|s| s.calls_per_day < threshold_calls_per_day).cloned().collect()
    }

    /// Summarizes `usage` and the currently tracked requests into a
    /// `CapabilityGapReport` for the given period.
    pub fn generate_gap_report(
        &self,
        usage: &[ToolUsageStat],
        capability_gaps: Vec<String>,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CapabilityGapReport {
        let deprecation_candidates = self.low_usage_tools(usage, LOW_USAGE_THRESHOLD_CALLS_PER_DAY);
        let development_priorities: Vec<ToolRequest> =
            self.prioritized_requests().into_iter().filter(|r| r.feasibility_score.unwrap_or(0.0) > 0.5).collect();

        CapabilityGapReport {
            period_start,
            period_end,
            capability_gaps,
            deprecation_candidates,
            development_priorities,
            generated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_request_increments_count() {
        let sys = CapabilitySystem::new();
        let now = Utc::now();
        let id1 = sys.submit_tool_request("backtest.fast", "speed", "faster loop", FeedbackUrgency::High, now);
        let id2 = sys.submit_tool_request("backtest.fast", "again", "still faster", FeedbackUrgency::Critical, now);
        assert_eq!(id1, id2);
        assert_eq!(sys.get_request(id1).unwrap().request_count, 2);
    }

    #[test]
    fn distinct_tool_names_create_separate_requests() {
        let sys = CapabilitySystem::new();
        let now = Utc::now();
        let id1 = sys.submit_tool_request("backtest.fast", "r", "b", FeedbackUrgency::Low, now);
        let id2 = sys.submit_tool_request("data.vendor_x", "r", "b", FeedbackUrgency::Low, now);
        assert_ne!(id1, id2);
        assert_eq!(sys.prioritized_requests().len(), 2);
    }

    #[test]
    fn evaluate_request_feeds_priority_score() {
        let sys = CapabilitySystem::new();
        let now = Utc::now();
        let id = sys.submit_tool_request("x", "r", "b", FeedbackUrgency::Medium, now);
        let before = sys.get_request(id).unwrap().priority_score;
        sys.evaluate_request(id, 0.95);
        let after = sys.get_request(id).unwrap().priority_score;
        assert!(after > before);
    }

    #[test]
    fn prioritized_requests_sorted_descending() {
        let sys = CapabilitySystem::new();
        let now = Utc::now();
        let low = sys.submit_tool_request("low", "r", "b", FeedbackUrgency::Low, now);
        let high = sys.submit_tool_request("high", "r", "b", FeedbackUrgency::Critical, now);
        sys.evaluate_request(high, 0.9);
        sys.evaluate_request(low, 0.1);
        let ranked = sys.prioritized_requests();
        assert_eq!(ranked[0].id, high);
    }

    #[test]
    fn gap_report_flags_deprecation_candidates() {
        let sys = CapabilitySystem::new();
        let now = Utc::now();
        let usage = vec![
            ToolUsageStat {
                tool_name: "rarely_used".to_string(),
                total_calls: 1,
                unique_agents: 1,
                calls_per_day: 0.03,
                avg_cost: 1.0,
                success_rate: 1.0,
            },
            ToolUsageStat {
                tool_name: "heavily_used".to_string(),
                total_calls: 500,
                unique_agents: 10,
                calls_per_day: 70.0,
                avg_cost: 1.0,
                success_rate: 0.98,
            },
        ];
        let report = sys.generate_gap_report(&usage, vec!["needs a sentiment feed".to_string()], now, now, now);
        assert_eq!(report.deprecation_candidates.len(), 1);
        assert_eq!(report.deprecation_candidates[0].tool_name, "rarely_used");
    }
}
