//! `RiskGovernance` (§4.8): rule proposal, weighted voting to a decision,
//! activation/suspension, and compliance checks against a position
//! snapshot.

#[cfg(feature = "persistence")]
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::types::{
    ComplianceFinding, ComplianceReport, GovernanceDecision, PositionSnapshot, RiskRule, RuleKind,
    RuleStatus, Severity, Vote, VoteChoice, vote_weight,
};
#[cfg(feature = "persistence")]
use crate::persistence::{DbPool, repo};

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("no such rule: {0}")]
    NotFound(Uuid),
    #[error("rule {0} is not open for voting (status {1:?})")]
    NotVotable(Uuid, RuleStatus),
    #[error("{voter} has already voted on rule {rule}")]
    DuplicateVote { rule: Uuid, voter: String },
    #[error("rule {0} is not in APPROVED status")]
    NotApproved(Uuid),
    #[error("rule {0} is not active")]
    NotActive(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Recorded, outcome still pending more required voters.
    Recorded,
    Approved,
    Rejected,
}

pub struct RiskGovernance {
    rules: DashMap<Uuid, RiskRule>,
    decisions: DashMap<Uuid, GovernanceDecision>,
    #[cfg(feature = "persistence")]
    pool: Option<Arc<DbPool>>,
}

impl Default for RiskGovernance {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskGovernance {
    pub fn new() -> Self {
        Self {
            rules: DashMap::new(),
            decisions: DashMap::new(),
            #[cfg(feature = "persistence")]
            pool: None,
        }
    }

    /// Mirrors every vote-tally decision onto `pool`'s `governance_alerts`
    /// table, the rule-activation record SPEC_FULL.md §4.13 requires
    /// durable before `vote` returns.
    #[cfg(feature = "persistence")]
    pub fn new_with_persistence(pool: Option<Arc<DbPool>>) -> Self {
        Self { rules: DashMap::new(), decisions: DashMap::new(), pool }
    }

    pub fn propose(
        &self,
        proposer_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        kind: RuleKind,
        parameters: Value,
        now: DateTime<Utc>,
    ) -> Uuid {
        let rule = RiskRule {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            kind,
            status: RuleStatus::Proposed,
            parameters,
            proposer_id: proposer_id.into(),
            required_voters: kind.required_voters().iter().map(|s| s.to_string()).collect(),
            required_approval_rate: 0.6,
            votes: Vec::new(),
            created_at: now,
            updated_at: now,
            effective_from: None,
            resolution: None,
        };
        let id = rule.id;
        self.rules.insert(id, rule);
        id
    }

    pub fn get(&self, rule_id: Uuid) -> Option<RiskRule> {
        self.rules.get(&rule_id).map(|r| r.clone())
    }

    pub fn vote(
        &self,
        rule_id: Uuid,
        voter_id: &str,
        role: &str,
        choice: VoteChoice,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, GovernanceError> {
        let mut entry = self.rules.get_mut(&rule_id).ok_or(GovernanceError::NotFound(rule_id))?;

        if !matches!(entry.status, RuleStatus::Proposed | RuleStatus::Voting) {
            return Err(GovernanceError::NotVotable(rule_id, entry.status));
        }
        if entry.votes.iter().any(|v| v.voter_id == voter_id) {
            return Err(GovernanceError::DuplicateVote { rule: rule_id, voter: voter_id.to_string() });
        }

        entry.status = RuleStatus::Voting;
        entry.votes.push(Vote {
            voter_id: voter_id.to_string(),
            role: role.to_string(),
            choice,
            reason: reason.into(),
            weight: vote_weight(role),
            timestamp: now,
        });
        entry.updated_at = now;

        if !entry.all_required_voted() {
            return Ok(VoteOutcome::Recorded);
        }

        let outcome = if entry.approval_rate() >= entry.required_approval_rate {
            entry.status = RuleStatus::Approved;
            VoteOutcome::Approved
        } else {
            entry.status = RuleStatus::Rejected;
            VoteOutcome::Rejected
        };

        let decision_type = if outcome == VoteOutcome::Approved { "approve" } else { "reject" };
        let decision = GovernanceDecision {
            id: Uuid::new_v4(),
            rule_id,
            decision_type: decision_type.to_string(),
            participants: entry.votes.iter().map(|v| v.voter_id.clone()).collect(),
            summary: format!("rule '{}' {}", entry.name, decision_type),
            rationale: format!("approval rate {:.1}%", entry.approval_rate() * 100.0),
            decided_at: now,
        };
        entry.resolution = Some(decision.summary.clone());

        #[cfg(feature = "persistence")]
        if let Some(pool) = &self.pool {
            repo::insert_governance_alert(pool, &decision);
        }

        self.decisions.insert(decision.id, decision);

        Ok(outcome)
    }

    pub fn activate(&self, rule_id: Uuid, now: DateTime<Utc>) -> Result<(), GovernanceError> {
        let mut entry = self.rules.get_mut(&rule_id).ok_or(GovernanceError::NotFound(rule_id))?;
        if entry.status != RuleStatus::Approved {
            return Err(GovernanceError::NotApproved(rule_id));
        }
        entry.status = RuleStatus::Active;
        entry.effective_from = Some(now);
        Ok(())
    }

    pub fn suspend(&self, rule_id: Uuid, suspender: &str, reason: &str) -> Result<(), GovernanceError> {
        let mut entry = self.rules.get_mut(&rule_id).ok_or(GovernanceError::NotFound(rule_id))?;
        if entry.status != RuleStatus::Active {
            return Err(GovernanceError::NotActive(rule_id));
        }
        entry.status = RuleStatus::Suspended;
        entry.resolution = Some(format!("suspended by {suspender}: {reason}"));
        Ok(())
    }

    pub fn active_rules(&self) -> Vec<RiskRule> {
        self.rules.iter().filter(|r| r.status == RuleStatus::Active).map(|r| r.clone()).collect()
    }

    pub fn decisions_for(&self, rule_id: Uuid) -> Vec<GovernanceDecision> {
        self.decisions.iter().filter(|d| d.rule_id == rule_id).map(|d| d.clone()).collect()
    }

    /// Per §4.8: evaluates every active rule's kind-specific predicate
    /// against `position`, producing violations and near-threshold
    /// warnings.
    pub fn check_compliance(&self, position: &PositionSnapshot) -> ComplianceReport {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        for rule in self.active_rules() {
            if let Some(finding) = check_rule(&rule, position) {
                match finding.severity {
                    Severity::Warning => warnings.push(finding),
                    Severity::High | Severity::Critical => violations.push(finding),
                }
            }
        }

        ComplianceReport {
            compliant: violations.is_empty(),
            rules_checked: self.active_rules().len(),
            violations,
            warnings,
        }
    }
}

fn param_f64(parameters: &Value, key: &str, default: f64) -> f64 {
    parameters.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

fn check_rule(rule: &RiskRule, position: &PositionSnapshot) -> Option<ComplianceFinding> {
    match rule.kind {
        RuleKind::ConcentrationLimit => {
            let max_pct = param_f64(&rule.parameters, "max_single_asset_pct", 30.0) / 100.0;
            let mut assets: Vec<_> = position.asset_allocations.iter().collect();
            assets.sort_by_key(|(name, _)| name.as_str());
            for (asset, pct) in assets {
                if *pct > max_pct {
                    return Some(ComplianceFinding {
                        rule_id: rule.id,
                        rule_name: rule.name.clone(),
                        message: format!("asset {asset} at {:.1}% exceeds the {:.0}% limit", pct * 100.0, max_pct * 100.0),
                        severity: Severity::High,
                    });
                }
                if *pct > max_pct * 0.9 {
                    return Some(ComplianceFinding {
                        rule_id: rule.id,
                        rule_name: rule.name.clone(),
                        message: format!("asset {asset} at {:.1}% is near the {:.0}% limit", pct * 100.0, max_pct * 100.0),
                        severity: Severity::Warning,
                    });
                }
            }
            None
        }
        RuleKind::LossLimit => {
            let max_loss = param_f64(&rule.parameters, "max_daily_loss_pct", 5.0) / 100.0;
            if position.daily_pnl_pct < -max_loss {
                Some(ComplianceFinding {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    message: format!("daily loss {:.1}% exceeds the {:.0}% limit", position.daily_pnl_pct.abs() * 100.0, max_loss * 100.0),
                    severity: Severity::Critical,
                })
            } else if position.daily_pnl_pct < -max_loss * 0.8 {
                Some(ComplianceFinding {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    message: format!("daily loss {:.1}% is near the {:.0}% limit", position.daily_pnl_pct.abs() * 100.0, max_loss * 100.0),
                    severity: Severity::Warning,
                })
            } else {
                None
            }
        }
        RuleKind::RiskLimit => {
            let max_leverage = param_f64(&rule.parameters, "max_leverage", 3.0);
            let margin_call_leverage = param_f64(&rule.parameters, "margin_call_leverage", max_leverage * 0.8);
            if position.leverage > max_leverage {
                Some(ComplianceFinding {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    message: format!("leverage {:.1}x exceeds the {max_leverage:.1}x limit", position.leverage),
                    severity: Severity::High,
                })
            } else if position.leverage > margin_call_leverage {
                Some(ComplianceFinding {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    message: format!("leverage {:.1}x is near the margin-call threshold", position.leverage),
                    severity: Severity::Warning,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snapshot() -> PositionSnapshot {
        PositionSnapshot { asset_allocations: HashMap::new(), daily_pnl_pct: 0.0, leverage: 1.0 }
    }

    #[test]
    fn vote_pending_until_all_required_voters() {
        let gov = RiskGovernance::new();
        let now = Utc::now();
        let id = gov.propose("r1", "Position cap", "desc", RuleKind::PositionLimit, Value::Null, now);
        let outcome = gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now).unwrap();
        assert_eq!(outcome, VoteOutcome::Recorded);
        assert_eq!(gov.get(id).unwrap().status, RuleStatus::Voting);
    }

    #[test]
    fn majority_approval_activates_decision() {
        let gov = RiskGovernance::new();
        let now = Utc::now();
        let id = gov.propose("r1", "Position cap", "desc", RuleKind::PositionLimit, Value::Null, now);
        gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now).unwrap();
        gov.vote(id, "pm", "pm", VoteChoice::Approve, "ok", now).unwrap();
        let outcome = gov.vote(id, "cio", "cio", VoteChoice::Approve, "ok", now).unwrap();
        assert_eq!(outcome, VoteOutcome::Approved);
        assert_eq!(gov.decisions_for(id).len(), 1);
        gov.activate(id, now).unwrap();
        assert_eq!(gov.get(id).unwrap().status, RuleStatus::Active);
    }

    #[test]
    fn majority_rejection_marks_rejected() {
        let gov = RiskGovernance::new();
        let now = Utc::now();
        let id = gov.propose("r1", "Position cap", "desc", RuleKind::PositionLimit, Value::Null, now);
        gov.vote(id, "cro", "cro", VoteChoice::Reject, "no", now).unwrap();
        gov.vote(id, "pm", "pm", VoteChoice::Reject, "no", now).unwrap();
        let outcome = gov.vote(id, "cio", "cio", VoteChoice::Approve, "ok", now).unwrap();
        assert_eq!(outcome, VoteOutcome::Rejected);
    }

    #[test]
    fn abstentions_excluded_from_denominator() {
        let gov = RiskGovernance::new();
        let now = Utc::now();
        let id = gov.propose("r1", "Position cap", "desc", RuleKind::PositionLimit, Value::Null, now);
        gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now).unwrap();
        gov.vote(id, "pm", "pm", VoteChoice::Abstain, "unsure", now).unwrap();
        let outcome = gov.vote(id, "cio", "cio", VoteChoice::Approve, "ok", now).unwrap();
        assert_eq!(outcome, VoteOutcome::Approved);
    }

    #[test]
    fn duplicate_vote_rejected() {
        let gov = RiskGovernance::new();
        let now = Utc::now();
        let id = gov.propose("r1", "Position cap", "desc", RuleKind::PositionLimit, Value::Null, now);
        gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now).unwrap();
        let err = gov.vote(id, "cro", "cro", VoteChoice::Reject, "changed mind", now);
        assert!(matches!(err, Err(GovernanceError::DuplicateVote { .. })));
    }

    #[test]
    fn concentration_violation_detected() {
        let gov = RiskGovernance::new();
        let now = Utc::now();
        let id = gov.propose(
            "r1",
            "Concentration cap",
            "desc",
            RuleKind::ConcentrationLimit,
            serde_json::json!({"max_single_asset_pct": 30}),
            now,
        );
        gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now).unwrap();
        gov.vote(id, "pm", "pm", VoteChoice::Approve, "ok", now).unwrap();
        gov.vote(id, "cio", "cio", VoteChoice::Approve, "ok", now).unwrap();
        gov.activate(id, now).unwrap();

        let mut snap = snapshot();
        snap.asset_allocations.insert("BTC".to_string(), 0.4);
        let report = gov.check_compliance(&snap);
        assert!(!report.compliant);
        assert_eq!(report.violations.len(), 1);
    }

    #[test]
    fn suspend_removes_from_active_set() {
        let gov = RiskGovernance::new();
        let now = Utc::now();
        let id = gov.propose("r1", "Position cap", "desc", RuleKind::PositionLimit, Value::Null, now);
        gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now).unwrap();
        gov.vote(id, "pm", "pm", VoteChoice::Approve, "ok", now).unwrap();
        gov.vote(id, "cio", "cio", VoteChoice::Approve, "ok", now).unwrap();
        gov.activate(id, now).unwrap();
        gov.suspend(id, "cro", "market regime change").unwrap();
        assert!(gov.active_rules().is_empty());
    }
}
