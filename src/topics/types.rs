//! Topic/meeting domain types (§4.6): a topic proposed by any agent,
//! seconded by others, auto-escalating into a scheduled meeting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicPriority {
    Low,
    Normal,
    High,
    Urgent,
    Critical,
}

impl TopicPriority {
    /// Hours until a freshly-proposed topic at this priority expires.
    pub fn expiry_hours(self) -> i64 {
        match self {
            TopicPriority::Low => 168,
            TopicPriority::Normal => 72,
            TopicPriority::High => 24,
            TopicPriority::Urgent => 4,
            TopicPriority::Critical => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Draft,
    Proposed,
    Seconding,
    Scheduled,
    InProgress,
    Resolved,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    Strategy,
    Risk,
    Data,
    Trading,
    Governance,
    Process,
    Organization,
    Emergency,
}

impl TopicKind {
    /// Seconds required per category before a topic auto-escalates to a
    /// scheduled meeting; emergency topics need none.
    pub fn required_seconds(self) -> usize {
        match self {
            TopicKind::Strategy => 2,
            TopicKind::Risk => 1,
            TopicKind::Data => 2,
            TopicKind::Trading => 2,
            TopicKind::Governance => 3,
            TopicKind::Process => 2,
            TopicKind::Organization => 3,
            TopicKind::Emergency => 0,
        }
    }

    pub fn default_participants(self) -> Vec<&'static str> {
        match self {
            TopicKind::Strategy => vec!["cio", "head_of_research", "skeptic"],
            TopicKind::Risk => vec!["cro", "skeptic", "black_swan"],
            TopicKind::Data => vec!["data_quality_auditor", "data_engineering_lead"],
            TopicKind::Trading => vec!["head_trader", "cro", "pm"],
            TopicKind::Governance => vec!["cgo", "cpo", "chief_of_staff"],
            TopicKind::Process => vec!["chief_of_staff", "cgo"],
            TopicKind::Organization => vec!["cpo", "cgo", "chief_of_staff"],
            TopicKind::Emergency => vec!["cro", "cio", "head_trader", "cgo"],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSecond {
    pub agent_id: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: TopicKind,
    pub priority: TopicPriority,
    pub status: TopicStatus,
    pub proposer_id: String,
    pub proposer_department: String,
    pub seconds: Vec<TopicSecond>,
    pub required_seconds: usize,
    pub suggested_participants: Vec<String>,
    pub actual_participants: Vec<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
}

impl Topic {
    pub fn second_count(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_seconded(&self) -> bool {
        self.second_count() >= self.required_seconds
    }
}

pub fn new_topic(
    proposer_id: impl Into<String>,
    proposer_department: impl Into<String>,
    title: impl Into<String>,
    description: impl Into<String>,
    kind: TopicKind,
    priority: TopicPriority,
    suggested_participants: Option<Vec<String>>,
    now: DateTime<Utc>,
) -> Topic {
    let required_seconds = kind.required_seconds();
    let status = if required_seconds == 0 { TopicStatus::Scheduled } else { TopicStatus::Seconding };
    Topic {
        id: Uuid::new_v4(),
        title: title.into(),
        description: description.into(),
        kind,
        priority,
        status,
        proposer_id: proposer_id.into(),
        proposer_department: proposer_department.into(),
        seconds: Vec::new(),
        required_seconds,
        suggested_participants: suggested_participants
            .unwrap_or_else(|| kind.default_participants().into_iter().map(String::from).collect()),
        actual_participants: Vec::new(),
        scheduled_at: None,
        created_at: now,
        updated_at: now,
        expires_at: Some(now + Duration::hours(priority.expiry_hours())),
        resolution: None,
    }
}
