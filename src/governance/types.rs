//! Risk-rule domain types (§4.8): proposed rules, votes, and the
//! governance decisions a completed vote produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    PositionLimit,
    RiskLimit,
    TradingLimit,
    ExposureLimit,
    LossLimit,
    ConcentrationLimit,
    LiquidityRule,
    StrategyAllocation,
}

impl RuleKind {
    /// Roles whose vote is required before a proposal's outcome is
    /// decided (§4.8: "every required voter has voted").
    pub fn required_voters(self) -> &'static [&'static str] {
        match self {
            RuleKind::PositionLimit => &["cro", "pm", "cio"],
            RuleKind::RiskLimit => &["cro", "skeptic", "cio"],
            RuleKind::TradingLimit => &["head_trader", "cro", "pm"],
            RuleKind::ExposureLimit => &["cro", "pm", "black_swan"],
            RuleKind::LossLimit => &["cro", "cio", "chairman"],
            RuleKind::ConcentrationLimit => &["cro", "pm", "cio"],
            RuleKind::LiquidityRule => &["head_trader", "cro", "pm"],
            RuleKind::StrategyAllocation => &["cio", "pm", "head_of_research"],
        }
    }
}

/// Vote weight for a role; unlisted roles fall back to 1.0.
pub fn vote_weight(role: &str) -> f64 {
    match role {
        "chairman" => 3.0,
        "cro" => 2.0,
        "cio" => 2.0,
        "pm" => 1.5,
        "head_trader" => 1.5,
        "skeptic" => 1.5,
        "head_of_research" => 1.0,
        "black_swan" => 1.0,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Proposed,
    Voting,
    Approved,
    Rejected,
    Active,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Approve,
    Reject,
    Abstain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: String,
    pub role: String,
    pub choice: VoteChoice,
    pub reason: String,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRule {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub kind: RuleKind,
    pub status: RuleStatus,
    pub parameters: Value,
    pub proposer_id: String,
    pub required_voters: Vec<String>,
    pub required_approval_rate: f64,
    pub votes: Vec<Vote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub effective_from: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
}

impl RiskRule {
    /// Σ weight(APPROVE) / Σ weight(APPROVE ∪ REJECT); abstentions are
    /// excluded from both numerator and denominator.
    pub fn approval_rate(&self) -> f64 {
        let counted: Vec<&Vote> = self.votes.iter().filter(|v| v.choice != VoteChoice::Abstain).collect();
        let total_weight: f64 = counted.iter().map(|v| v.weight).sum();
        if total_weight == 0.0 {
            return 0.0;
        }
        let approve_weight: f64 = counted.iter().filter(|v| v.choice == VoteChoice::Approve).map(|v| v.weight).sum();
        approve_weight / total_weight
    }

    pub fn all_required_voted(&self) -> bool {
        let voted: std::collections::HashSet<&str> = self.votes.iter().map(|v| v.voter_id.as_str()).collect();
        self.required_voters.iter().all(|r| voted.contains(r.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceDecision {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub decision_type: String,
    pub participants: Vec<String>,
    pub summary: String,
    pub rationale: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    pub asset_allocations: std::collections::HashMap<String, f64>,
    pub daily_pnl_pct: f64,
    pub leverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceFinding {
    pub rule_id: Uuid,
    pub rule_name: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub compliant: bool,
    pub violations: Vec<ComplianceFinding>,
    pub warnings: Vec<ComplianceFinding>,
    pub rules_checked: usize,
}
