//! [`Task`]: a unit of agent work, and its [`Priority`] ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

/// What kind of work a task represents; `task.kind` in the spec's dispatch
/// table plus an open-ended `Custom` variant for role-specific kinds like
/// `find_research_opportunity` or `run_backtest` (§4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "payload")]
pub enum TaskKind {
    Think { prompt: String },
    Respond { message: String, from: String },
    Review { item: Value, review_type: String },
    Report { report_type: String, data: Value },
    Meeting { meeting_id: String, agenda: String },
    Custom { name: String, payload: Value },
}

impl TaskKind {
    pub fn label(&self) -> &str {
        match self {
            TaskKind::Think { .. } => "think",
            TaskKind::Respond { .. } => "respond",
            TaskKind::Review { .. } => "review",
            TaskKind::Report { .. } => "report",
            TaskKind::Meeting { .. } => "meeting",
            TaskKind::Custom { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub retries_used: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(kind: TaskKind, priority: Priority, max_retries: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            priority,
            deadline: None,
            retries_used: 0,
            max_retries,
            created_at: now,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    pub fn can_retry(&self) -> bool {
        self.retries_used < self.max_retries
    }
}
