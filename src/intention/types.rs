//! Agent-intention domain types (§4.9): a typed record of a thing an
//! agent wants to do, plus the risk triggers that can raise one
//! automatically.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionType {
    MeetingRequest,
    RiskAlert,
    StrategyProposal,
    DataRequest,
    ToolRequest,
    Feedback,
    Escalation,
    Collaboration,
    AutonomousAction,
}

impl IntentionType {
    /// Default time-to-live in hours, used when none is supplied.
    pub fn default_expiry_hours(self) -> i64 {
        match self {
            IntentionType::MeetingRequest => 72,
            IntentionType::RiskAlert => 4,
            IntentionType::StrategyProposal => 168,
            IntentionType::DataRequest => 48,
            IntentionType::ToolRequest => 168,
            IntentionType::Feedback => 168,
            IntentionType::Escalation => 24,
            IntentionType::Collaboration => 72,
            IntentionType::AutonomousAction => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionPriority {
    Critical,
    Urgent,
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionStatus {
    Pending,
    Acknowledged,
    InProgress,
    Approved,
    Rejected,
    Completed,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIntention {
    pub id: Uuid,
    pub agent_id: String,
    pub agent_name: String,
    pub department: String,

    pub intention_type: IntentionType,
    pub priority: IntentionPriority,
    pub status: IntentionStatus,

    pub title: String,
    pub description: String,
    pub context: HashMap<String, Value>,

    pub trigger_type: String,

    pub target_agents: Vec<String>,
    pub required_approvers: Vec<String>,

    pub autonomous_scope: Option<String>,
    pub autonomous_approved: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    pub response: Option<String>,
    pub action_taken: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOperator {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Ne,
}

impl TriggerOperator {
    pub fn evaluate(self, value: f64, threshold: f64) -> bool {
        match self {
            TriggerOperator::Gt => value > threshold,
            TriggerOperator::Lt => value < threshold,
            TriggerOperator::Gte => value >= threshold,
            TriggerOperator::Lte => value <= threshold,
            TriggerOperator::Eq => (value - threshold).abs() < f64::EPSILON,
            TriggerOperator::Ne => (value - threshold).abs() >= f64::EPSILON,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTrigger {
    pub id: Uuid,
    pub name: String,
    pub description: String,

    pub metric: String,
    pub operator: TriggerOperator,
    pub threshold: f64,

    pub action_type: String,
    pub target_agents: Vec<String>,
    pub priority: IntentionPriority,

    pub enabled: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub trigger_count: u64,
}

impl RiskTrigger {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        metric: impl Into<String>,
        operator: TriggerOperator,
        threshold: f64,
        action_type: impl Into<String>,
        target_agents: Vec<String>,
        priority: IntentionPriority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            metric: metric.into(),
            operator,
            threshold,
            action_type: action_type.into(),
            target_agents,
            priority,
            enabled: true,
            last_triggered: None,
            trigger_count: 0,
        }
    }
}

/// Built-in watch list, mirroring the source system's preset triggers.
pub fn default_risk_triggers() -> Vec<RiskTrigger> {
    vec![
        RiskTrigger::new(
            "large daily loss",
            "fires when a single day's loss crosses the threshold",
            "daily_pnl_pct",
            TriggerOperator::Lt,
            -5.0,
            "alert",
            vec!["cro".into(), "head_trader".into(), "chairman".into()],
            IntentionPriority::Critical,
        ),
        RiskTrigger::new(
            "volatility spike",
            "fires when market volatility is abnormally elevated",
            "volatility_zscore",
            TriggerOperator::Gt,
            2.5,
            "meeting",
            vec!["cro".into(), "cio".into(), "pm".into()],
            IntentionPriority::High,
        ),
        RiskTrigger::new(
            "position concentration",
            "fires when a single asset's share of the book is too high",
            "position_concentration",
            TriggerOperator::Gt,
            0.3,
            "escalation",
            vec!["cro".into(), "pm".into()],
            IntentionPriority::High,
        ),
        RiskTrigger::new(
            "extreme fear index",
            "fires when the fear/greed index reaches an extreme",
            "fear_greed_index",
            TriggerOperator::Lt,
            20.0,
            "alert",
            vec!["head_of_intelligence".into(), "cio".into()],
            IntentionPriority::Normal,
        ),
    ]
}
