//! `ResearchCycleSM` (§4.7): drives each [`ResearchCycle`] through its
//! nine-state gate pipeline. Every transition carries a predicate (the
//! relevant gate approver produced a positive review artifact) and an
//! effect (advance `current_state`, persist an audit row). A rejection at
//! any gate returns the cycle to `IdeaIntake` and increments `rejections`.

#[cfg(feature = "persistence")]
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::types::{GateReview, ResearchCycle, ResearchState};
#[cfg(feature = "persistence")]
use crate::persistence::{DbPool, repo};

#[derive(Debug, Error)]
pub enum ResearchCycleError {
    #[error("no such research cycle: {0}")]
    NotFound(Uuid),
    #[error("cycle {0} is already archived")]
    Archived(Uuid),
    #[error("reviewer role mismatch: gate {gate:?} requires a {required} review, got {got}")]
    WrongApprover { gate: ResearchState, required: &'static str, got: String },
}

#[derive(Default)]
pub struct ResearchCycleSM {
    cycles: DashMap<Uuid, ResearchCycle>,
    #[cfg(feature = "persistence")]
    pool: Option<Arc<DbPool>>,
}

impl ResearchCycleSM {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors every state transition onto `pool`'s `research_cycles`
    /// table, loading any previously-persisted cycles into memory first.
    #[cfg(feature = "persistence")]
    pub fn new_with_persistence(pool: Option<Arc<DbPool>>) -> Self {
        let cycles = DashMap::new();
        if let Some(pool) = &pool {
            for cycle in repo::load_research_cycles(pool) {
                cycles.insert(cycle.id, cycle);
            }
        }
        Self { cycles, pool }
    }

    fn persist(&self, cycle: &ResearchCycle) {
        #[cfg(feature = "persistence")]
        if let Some(pool) = &self.pool {
            repo::upsert_research_cycle(pool, cycle);
        }
        #[cfg(not(feature = "persistence"))]
        let _ = cycle;
    }

    pub fn start(&self, owner: impl Into<String>, title: impl Into<String>, payload: Value, now: DateTime<Utc>) -> Uuid {
        let cycle = ResearchCycle::new(owner, title, payload, now);
        let id = cycle.id;
        self.persist(&cycle);
        self.cycles.insert(id, cycle);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<ResearchCycle> {
        self.cycles.get(&id).map(|c| c.clone())
    }

    /// Applies one gate review. `reviewer_role` must match the current
    /// gate's approver role. Approval advances to the next state (or, at
    /// `BoardDecision`, to `Archive`); rejection returns to `IdeaIntake`
    /// and increments `rejections`.
    pub fn submit_gate_review(
        &self,
        cycle_id: Uuid,
        reviewer: &str,
        reviewer_role: &str,
        approved: bool,
        note: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<ResearchState, ResearchCycleError> {
        let mut entry = self.cycles.get_mut(&cycle_id).ok_or(ResearchCycleError::NotFound(cycle_id))?;

        if entry.current_state.is_terminal() {
            return Err(ResearchCycleError::Archived(cycle_id));
        }

        let Some(required_role) = entry.current_state.approver_role() else {
            return Err(ResearchCycleError::Archived(cycle_id));
        };
        if reviewer_role != required_role {
            return Err(ResearchCycleError::WrongApprover {
                gate: entry.current_state,
                required: required_role,
                got: reviewer_role.to_string(),
            });
        }

        let note = note.into();
        let gate = entry.current_state;
        entry.history.push(GateReview {
            gate,
            reviewer: reviewer.to_string(),
            approved,
            note: note.clone(),
            timestamp: now,
        });
        entry.updated_at = now;

        if approved {
            entry.current_state = gate.next().unwrap_or(ResearchState::Archive);
        } else {
            entry.current_state = ResearchState::IdeaIntake;
            entry.rejections += 1;
        }

        self.persist(&entry);
        Ok(entry.current_state)
    }

    /// Re-enters the gate pipeline after a rejection sent the cycle back
    /// to `IdeaIntake`. No approver is required for this edge.
    pub fn resubmit(&self, cycle_id: Uuid, now: DateTime<Utc>) -> Result<ResearchState, ResearchCycleError> {
        let mut entry = self.cycles.get_mut(&cycle_id).ok_or(ResearchCycleError::NotFound(cycle_id))?;
        if entry.current_state != ResearchState::IdeaIntake {
            return Ok(entry.current_state);
        }
        entry.current_state = ResearchState::DataGate;
        entry.updated_at = now;
        self.persist(&entry);
        Ok(entry.current_state)
    }

    pub fn active_cycles(&self) -> Vec<ResearchCycle> {
        self.cycles
            .iter()
            .filter(|c| !c.current_state.is_terminal())
            .map(|c| c.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_advances_one_gate() {
        let sm = ResearchCycleSM::new();
        let now = Utc::now();
        let id = sm.start("r1", "alpha idea", Value::Null, now);
        let state = sm.submit_gate_review(id, "auditor1", "data_quality_auditor", true, "looks clean", now).unwrap();
        assert_eq!(state, ResearchState::BacktestGate);
    }

    #[test]
    fn rejection_returns_to_idea_intake_and_counts() {
        let sm = ResearchCycleSM::new();
        let now = Utc::now();
        let id = sm.start("r1", "alpha idea", Value::Null, now);
        sm.submit_gate_review(id, "auditor1", "data_quality_auditor", true, "ok", now).unwrap();
        let state = sm
            .submit_gate_review(id, "lead1", "head_of_research", false, "backtest overfit", now)
            .unwrap();
        assert_eq!(state, ResearchState::IdeaIntake);
        assert_eq!(sm.get(id).unwrap().rejections, 1);
    }

    #[test]
    fn wrong_approver_role_is_rejected() {
        let sm = ResearchCycleSM::new();
        let now = Utc::now();
        let id = sm.start("r1", "alpha idea", Value::Null, now);
        let err = sm.submit_gate_review(id, "cro1", "cro", true, "n/a", now);
        assert!(matches!(err, Err(ResearchCycleError::WrongApprover { .. })));
    }

    #[test]
    fn full_pipeline_reaches_archive() {
        let sm = ResearchCycleSM::new();
        let now = Utc::now();
        let id = sm.start("r1", "alpha idea", Value::Null, now);
        let roles = [
            "data_quality_auditor",
            "head_of_research",
            "skeptic",
            "cro",
            "cio",
            "chief_of_staff",
            "chairman",
        ];
        let mut last = ResearchState::IdeaIntake;
        for role in roles {
            last = sm.submit_gate_review(id, "x", role, true, "ok", now).unwrap();
        }
        assert_eq!(last, ResearchState::Archive);
        assert!(sm.active_cycles().is_empty());
    }

    #[test]
    fn resubmit_after_rejection_returns_to_data_gate() {
        let sm = ResearchCycleSM::new();
        let now = Utc::now();
        let id = sm.start("r1", "alpha idea", Value::Null, now);
        sm.submit_gate_review(id, "auditor1", "data_quality_auditor", false, "bad data", now).unwrap();
        assert_eq!(sm.get(id).unwrap().current_state, ResearchState::IdeaIntake);
        let state = sm.resubmit(id, now).unwrap();
        assert_eq!(state, ResearchState::DataGate);
    }

    #[test]
    fn archived_cycle_rejects_further_reviews() {
        let sm = ResearchCycleSM::new();
        let now = Utc::now();
        let id = sm.start("r1", "alpha idea", Value::Null, now);
        for role in ["data_quality_auditor", "head_of_research", "skeptic", "cro", "cio", "chief_of_staff", "chairman"] {
            sm.submit_gate_review(id, "x", role, true, "ok", now).unwrap();
        }
        let err = sm.submit_gate_review(id, "x", "chairman", true, "again", now);
        assert!(matches!(err, Err(ResearchCycleError::Archived(_))));
    }
}
