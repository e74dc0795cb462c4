//! [`ResearchState`] and [`ResearchCycle`]: the strategy-artifact pipeline
//! from idea intake to archive (§4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchState {
    IdeaIntake,
    DataGate,
    BacktestGate,
    RobustnessGate,
    RiskSkepticGate,
    IcReview,
    BoardPack,
    BoardDecision,
    Archive,
}

impl ResearchState {
    /// The nine states in pipeline order, used to compute `next()`.
    const ORDER: [ResearchState; 9] = [
        ResearchState::IdeaIntake,
        ResearchState::DataGate,
        ResearchState::BacktestGate,
        ResearchState::RobustnessGate,
        ResearchState::RiskSkepticGate,
        ResearchState::IcReview,
        ResearchState::BoardPack,
        ResearchState::BoardDecision,
        ResearchState::Archive,
    ];

    /// The role whose positive review artifact is the gate predicate for
    /// leaving this state (`None` for `IdeaIntake`, which has no incoming
    /// gate, and `Archive`, which is terminal).
    pub fn approver_role(self) -> Option<&'static str> {
        match self {
            ResearchState::IdeaIntake => None,
            ResearchState::DataGate => Some("data_quality_auditor"),
            ResearchState::BacktestGate => Some("head_of_research"),
            ResearchState::RobustnessGate => Some("skeptic"),
            ResearchState::RiskSkepticGate => Some("cro"),
            ResearchState::IcReview => Some("cio"),
            ResearchState::BoardPack => Some("chief_of_staff"),
            ResearchState::BoardDecision => Some("chairman"),
            ResearchState::Archive => None,
        }
    }

    pub fn next(self) -> Option<ResearchState> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ResearchState::Archive)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReview {
    pub gate: ResearchState,
    pub reviewer: String,
    pub approved: bool,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchCycle {
    pub id: Uuid,
    pub title: String,
    pub owner: String,
    pub current_state: ResearchState,
    pub payload: Value,
    pub rejections: u32,
    pub history: Vec<GateReview>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchCycle {
    /// A freshly-intaken idea starts at `DataGate`: `IdeaIntake` itself
    /// requires no approver (§4.7's gate predicates are keyed on the
    /// *current* state, and only `IdeaIntake` has none) and exists purely
    /// as the rejection back-edge's landing state.
    pub fn new(owner: impl Into<String>, title: impl Into<String>, payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            owner: owner.into(),
            current_state: ResearchState::DataGate,
            payload,
            rejections: 0,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
