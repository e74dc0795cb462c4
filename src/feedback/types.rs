//! Feedback-channel domain types (§4.10): a structured item an agent
//! submits about the company itself, routed to a fixed handler role.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    ToolRequest,
    ProcessImprovement,
    OrgIssue,
    Collaboration,
    CapabilityGap,
}

impl FeedbackCategory {
    /// The role every item of this category is routed to.
    pub fn handler_role(self) -> &'static str {
        match self {
            FeedbackCategory::ToolRequest | FeedbackCategory::CapabilityGap => "cto_capability",
            FeedbackCategory::ProcessImprovement | FeedbackCategory::Collaboration => "chief_of_staff",
            FeedbackCategory::OrgIssue => "cpo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackUrgency {
    Low,
    Medium,
    High,
    Critical,
}

impl FeedbackUrgency {
    /// Fixed weight table used by the tool-request priority score.
    pub fn score(self) -> f64 {
        match self {
            FeedbackUrgency::Low => 0.3,
            FeedbackUrgency::Medium => 0.5,
            FeedbackUrgency::High => 0.8,
            FeedbackUrgency::Critical => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Open,
    InReview,
    Accepted,
    Rejected,
    Implemented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    Manual,
    AutoExtracted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub submitted_by: String,
    pub category: FeedbackCategory,
    pub title: Option<String>,
    pub content: String,
    pub urgency: FeedbackUrgency,
    pub refs: HashMap<String, Value>,
    pub source: FeedbackSource,
    pub status: FeedbackStatus,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_count: usize,
    pub by_category: HashMap<String, usize>,
    pub by_urgency: HashMap<String, usize>,
    pub by_status: HashMap<String, usize>,
    pub manual_count: usize,
    pub auto_extracted_count: usize,
    pub avg_resolution_hours: f64,
    pub open_count: usize,
}

/// A `tool_request`-category item tracked separately for deduplication
/// against the undeployed-tool name; a second request for the same
/// tool increments `request_count` instead of inserting a new row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: Uuid,
    pub tool_name: String,
    pub reason: String,
    pub expected_benefit: String,
    pub request_count: u32,
    pub urgency: FeedbackUrgency,
    pub feasibility_score: Option<f64>,
    pub priority_score: f64,
    pub created_at: DateTime<Utc>,
}

impl ToolRequest {
    /// `min(request_count/10, 1)*0.3 + urgencyScore*0.3 + feasibility*0.4`,
    /// feasibility defaulting to 0.5 until an owner evaluates it.
    pub fn recompute_priority(&mut self) {
        let count_term = (self.request_count as f64 / 10.0).min(1.0) * 0.3;
        let urgency_term = self.urgency.score() * 0.3;
        let feasibility_term = self.feasibility_score.unwrap_or(0.5) * 0.4;
        self.priority_score = count_term + urgency_term + feasibility_term;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUsageStat {
    pub tool_name: String,
    pub total_calls: u64,
    pub unique_agents: u64,
    pub calls_per_day: f64,
    pub avg_cost: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityGapReport {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub capability_gaps: Vec<String>,
    pub deprecation_candidates: Vec<ToolUsageStat>,
    pub development_priorities: Vec<ToolRequest>,
    pub generated_at: DateTime<Utc>,
}
