//! Scheduled-job payloads the company scheduler's default jobs and any
//! operator-submitted jobs are built from.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::scheduler::traits::Schedule;

use super::task::{Priority, TaskKind};

/// What a due job does. Per Design Notes, the scheduler never talks to an
/// LLM itself — a job's handler is either a bus operation (standup room
/// creation) or an ordinary task pushed onto a target agent's own queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum JobPayload {
    CreateMeetingRoom {
        room_id: String,
        title: String,
        host: String,
        participants: Vec<String>,
    },
    EnqueueTask {
        target_agent: String,
        kind: TaskKind,
        priority: Priority,
    },
    HealthCheck {
        idle_threshold_secs: i64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: String,
    pub name: String,
    pub schedule: Schedule,
    pub payload: JobPayload,
    pub enabled: bool,
    pub run_count: u64,
    pub last_run: Option<chrono::DateTime<chrono::Utc>>,
    pub next_run: Option<chrono::DateTime<chrono::Utc>>,
}

impl ScheduledJob {
    pub fn new(id: impl Into<String>, name: impl Into<String>, schedule: Schedule, payload: JobPayload) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schedule,
            payload,
            enabled: true,
            run_count: 0,
            last_run: None,
            next_run: None,
        }
    }
}

/// The four default jobs named in §4.5, expressed as cron/interval
/// schedules. `lead_ids` and the `chief_of_staff`/`governance` agent ids
/// are resolved by the caller (`Runtime`) from the loaded agent roster.
pub fn default_jobs(lead_ids: Vec<String>, chief_of_staff: &str, governance: &str) -> Vec<ScheduledJob> {
    vec![
        ScheduledJob::new(
            "daily_standup",
            "Daily standup",
            Schedule::Cron { expr: "0 9 * * *".to_string() },
            JobPayload::CreateMeetingRoom {
                room_id: "daily_standup".to_string(),
                title: "Daily Standup".to_string(),
                host: chief_of_staff.to_string(),
                participants: lead_ids,
            },
        ),
        ScheduledJob::new(
            "weekly_board_report",
            "Weekly board report",
            Schedule::Cron { expr: "0 16 * * 5".to_string() },
            JobPayload::EnqueueTask {
                target_agent: chief_of_staff.to_string(),
                kind: TaskKind::Report {
                    report_type: "weekly_board_report".to_string(),
                    data: Value::Null,
                },
                priority: Priority::High,
            },
        ),
        ScheduledJob::new(
            "daily_compliance_review",
            "Daily compliance review",
            Schedule::Cron { expr: "0 18 * * *".to_string() },
            JobPayload::EnqueueTask {
                target_agent: governance.to_string(),
                kind: TaskKind::Custom {
                    name: "daily_compliance_review".to_string(),
                    payload: Value::Null,
                },
                priority: Priority::High,
            },
        ),
        ScheduledJob::new(
            "health_check",
            "Health check",
            Schedule::Interval { secs: 300 },
            JobPayload::HealthCheck { idle_threshold_secs: 300 },
        ),
    ]
}
