//! `PerformanceSystem` (§4.11 / §3.1 expansion): scorecards, KPI
//! tracking, and promotion/demotion eligibility.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

use super::config::PerformanceConfig;
use super::types::{AgentScorecard, JobLevel, PerformanceRating, QualitativeFeedback};

#[derive(Debug, Error)]
pub enum PerformanceError {
    #[error("no scorecard on file for agent {0}")]
    NoScorecard(String),
    #[error("no such KPI {kpi} on agent {agent}'s current scorecard")]
    UnknownKpi { agent: String, kpi: String },
}

#[derive(Debug, Clone)]
pub struct PromotionCheck {
    pub eligible: bool,
    pub reason: String,
    pub current_level: JobLevel,
    pub next_level: Option<JobLevel>,
    pub good_periods: u32,
    pub required_periods: u32,
}

pub struct PerformanceSystem {
    config: PerformanceConfig,
    scorecards: DashMap<String, Vec<AgentScorecard>>,
}

impl PerformanceSystem {
    pub fn new(config: PerformanceConfig) -> Self {
        Self { config, scorecards: DashMap::new() }
    }

    pub fn kpi_template(&self, role_type: &str) -> Vec<super::types::KpiMetric> {
        self.config.kpi_template(role_type)
    }

    pub fn create_scorecard(
        &self,
        agent_id: impl Into<String>,
        role_type: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        job_level: JobLevel,
    ) -> AgentScorecard {
        let agent_id = agent_id.into();
        let kpis = self.config.kpi_template(role_type);
        let scorecard = AgentScorecard::new(agent_id.clone(), period_start, period_end, job_level, kpis);
        self.scorecards.entry(agent_id).or_default().push(scorecard.clone());
        scorecard
    }

    pub fn update_kpi(&self, agent_id: &str, kpi_name: &str, actual_value: f64) -> Result<(), PerformanceError> {
        let mut entry = self.scorecards.get_mut(agent_id).ok_or_else(|| PerformanceError::NoScorecard(agent_id.to_string()))?;
        let current = entry.last_mut().ok_or_else(|| PerformanceError::NoScorecard(agent_id.to_string()))?;
        let kpi = current
            .kpis
            .iter_mut()
            .find(|k| k.name == kpi_name)
            .ok_or_else(|| PerformanceError::UnknownKpi { agent: agent_id.to_string(), kpi: kpi_name.to_string() })?;
        kpi.actual = actual_value;
        Ok(())
    }

    pub fn add_feedback(
        &self,
        agent_id: &str,
        from_agent: impl Into<String>,
        feedback_type: impl Into<String>,
        content: impl Into<String>,
        context: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), PerformanceError> {
        let mut entry = self.scorecards.get_mut(agent_id).ok_or_else(|| PerformanceError::NoScorecard(agent_id.to_string()))?;
        let current = entry.last_mut().ok_or_else(|| PerformanceError::NoScorecard(agent_id.to_string()))?;
        current.qualitative_feedback.push(QualitativeFeedback {
            from_agent: from_agent.into(),
            feedback_type: feedback_type.into(),
            content: content.into(),
            context,
            timestamp: now,
        });
        Ok(())
    }

    pub fn calculate_performance(&self, agent_id: &str) -> Result<AgentScorecard, PerformanceError> {
        let mut entry = self.scorecards.get_mut(agent_id).ok_or_else(|| PerformanceError::NoScorecard(agent_id.to_string()))?;
        let current = entry.last_mut().ok_or_else(|| PerformanceError::NoScorecard(agent_id.to_string()))?;
        current.calculate_score();
        Ok(current.clone())
    }

    pub fn check_promotion_eligibility(&self, agent_id: &str) -> PromotionCheck {
        let Some(scorecards) = self.scorecards.get(agent_id) else {
            return PromotionCheck {
                eligible: false,
                reason: "no performance record on file".to_string(),
                current_level: JobLevel::Junior,
                next_level: None,
                good_periods: 0,
                required_periods: 0,
            };
        };
        let Some(current) = scorecards.last() else {
            return PromotionCheck {
                eligible: false,
                reason: "no performance record on file".to_string(),
                current_level: JobLevel::Junior,
                next_level: None,
                good_periods: 0,
                required_periods: 0,
            };
        };
        let current_level = current.job_level;

        if current_level == JobLevel::CLevel {
            return PromotionCheck {
                eligible: false,
                reason: "already at the highest job level".to_string(),
                current_level,
                next_level: None,
                good_periods: 0,
                required_periods: 0,
            };
        }

        let Some(requirement) = self.config.promotion_requirements.get(&current_level) else {
            return PromotionCheck {
                eligible: false,
                reason: "no promotion path configured for this level".to_string(),
                current_level,
                next_level: None,
                good_periods: 0,
                required_periods: 0,
            };
        };

        let mut good_periods = 0u32;
        for sc in scorecards.iter().rev() {
            if sc.rating.is_good() {
                good_periods += 1;
            } else {
                break;
            }
        }

        if good_periods < requirement.consecutive_good_periods {
            return PromotionCheck {
                eligible: false,
                reason: format!("needs {} consecutive good periods, has {good_periods}", requirement.consecutive_good_periods),
                current_level,
                next_level: None,
                good_periods,
                required_periods: requirement.consecutive_good_periods,
            };
        }

        PromotionCheck {
            eligible: true,
            reason: "meets promotion requirements".to_string(),
            current_level,
            next_level: Some(current_level.next()),
            good_periods,
            required_periods: requirement.consecutive_good_periods,
        }
    }

    pub fn leaderboard(&self) -> Vec<(String, JobLevel, f64, PerformanceRating)> {
        let mut rows: Vec<(String, JobLevel, f64, PerformanceRating)> = self
            .scorecards
            .iter()
            .filter_map(|entry| entry.value().last().map(|sc| (entry.key().clone(), sc.job_level, sc.overall_score, sc.rating)))
            .collect();
        rows.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sys() -> PerformanceSystem {
        PerformanceSystem::new(PerformanceConfig::default())
    }

    #[test]
    fn create_scorecard_uses_role_template() {
        let sys = sys();
        let now = Utc::now();
        let sc = sys.create_scorecard("r1", "researcher", now, now, JobLevel::Junior);
        assert_eq!(sc.kpis.len(), 6);
    }

    #[test]
    fn update_kpi_then_calculate_sets_rating() {
        let sys = sys();
        let now = Utc::now();
        sys.create_scorecard("r1", "researcher", now, now, JobLevel::Junior);
        sys.update_kpi("r1", "strategy_proposals", 6.0).unwrap();
        sys.update_kpi("r1", "backtest_sharpe_avg", 3.0).unwrap();
        sys.update_kpi("r1", "pass_rate_robustness", 0.9).unwrap();
        sys.update_kpi("r1", "data_quality_issues", 0.0).unwrap();
        sys.update_kpi("r1", "collaboration_score", 1.0).unwrap();
        sys.update_kpi("r1", "memory_contribution", 8.0).unwrap();

        let card = sys.calculate_performance("r1").unwrap();
        assert!(card.overall_score > 1.0);
        assert!(card.promotion_eligible);
    }

    #[test]
    fn promotion_requires_consecutive_good_periods() {
        let sys = sys();
        let now = Utc::now();
        sys.create_scorecard("r1", "researcher", now, now, JobLevel::Junior);
        sys.update_kpi("r1", "strategy_proposals", 6.0).unwrap();
        sys.calculate_performance("r1").unwrap();

        let check = sys.check_promotion_eligibility("r1");
        assert!(!check.eligible);
        assert_eq!(check.good_periods, 1);
        assert_eq!(check.required_periods, 2);
    }

    #[test]
    fn promotion_eligible_after_enough_good_periods() {
        let sys = sys();
        let now = Utc::now();
        for _ in 0..2 {
            sys.create_scorecard("r1", "researcher", now, now, JobLevel::Junior);
            sys.update_kpi("r1", "strategy_proposals", 10.0).unwrap();
            sys.update_kpi("r1", "backtest_sharpe_avg", 3.0).unwrap();
            sys.calculate_performance("r1").unwrap();
        }
        let check = sys.check_promotion_eligibility("r1");
        assert!(check.eligible);
        assert_eq!(check.next_level, Some(JobLevel::Intermediate));
    }

    #[test]
    fn unknown_agent_is_not_eligible() {
        let sys = sys();
        let check = sys.check_promotion_eligibility("ghost");
        assert!(!check.eligible);
    }

    #[test]
    fn leaderboard_sorts_by_score_descending() {
        let sys = sys();
        let now = Utc::now();
        sys.create_scorecard("low", "default", now, now, JobLevel::Junior);
        sys.create_scorecard("high", "default", now, now, JobLevel::Junior);
        sys.update_kpi("high", "task_completion", 1.8).unwrap();
        sys.calculate_performance("low").unwrap();
        sys.calculate_performance("high").unwrap();

        let board = sys.leaderboard();
        assert_eq!(board[0].0, "high");
    }
}
