//! Performance-evaluation domain types (§4.11 / §3.1 `ReputationScore` /
//! `PerformanceScorecard`): KPI metrics, scorecards, and job levels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobLevel {
    Junior,
    Intermediate,
    Senior,
    Lead,
    Director,
    Vp,
    CLevel,
}

impl JobLevel {
    const ORDER: [JobLevel; 7] =
        [JobLevel::Junior, JobLevel::Intermediate, JobLevel::Senior, JobLevel::Lead, JobLevel::Director, JobLevel::Vp, JobLevel::CLevel];

    pub fn next(self) -> JobLevel {
        let idx = Self::ORDER.iter().position(|l| *l == self).unwrap_or(0);
        Self::ORDER[(idx + 1).min(Self::ORDER.len() - 1)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Underperforming,
    NeedsImprovement,
    Meets,
    Exceeds,
    Exceptional,
}

impl PerformanceRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 1.5 {
            PerformanceRating::Exceptional
        } else if score >= 1.2 {
            PerformanceRating::Exceeds
        } else if score >= 0.8 {
            PerformanceRating::Meets
        } else if score >= 0.5 {
            PerformanceRating::NeedsImprovement
        } else {
            PerformanceRating::Underperforming
        }
    }

    pub fn is_good(self) -> bool {
        matches!(self, PerformanceRating::Exceeds | PerformanceRating::Exceptional)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiMetric {
    pub name: String,
    pub description: String,
    pub weight: f64,
    pub target: f64,
    #[serde(default)]
    pub actual: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default = "default_true")]
    pub higher_is_better: bool,
}

fn default_true() -> bool {
    true
}

impl KpiMetric {
    pub fn new(name: impl Into<String>, description: impl Into<String>, weight: f64, target: f64, unit: impl Into<String>, higher_is_better: bool) -> Self {
        Self { name: name.into(), description: description.into(), weight, target, actual: 0.0, unit: unit.into(), higher_is_better }
    }

    /// Achievement rate, clamped to [0, 2]; inverted for
    /// lower-is-better metrics (e.g. error rates).
    pub fn achievement_rate(&self) -> f64 {
        if self.target == 0.0 {
            return if self.actual >= 0.0 { 1.0 } else { 0.0 };
        }
        let mut rate = self.actual / self.target;
        if !self.higher_is_better {
            rate = 2.0 - rate;
        }
        rate.clamp(0.0, 2.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitativeFeedback {
    pub from_agent: String,
    pub feedback_type: String,
    pub content: String,
    pub context: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentScorecard {
    pub agent_id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub job_level: JobLevel,
    pub kpis: Vec<KpiMetric>,
    pub qualitative_feedback: Vec<QualitativeFeedback>,

    pub overall_score: f64,
    pub rating: PerformanceRating,
    pub promotion_eligible: bool,
    pub demotion_risk: bool,
}

impl AgentScorecard {
    pub fn new(agent_id: impl Into<String>, period_start: DateTime<Utc>, period_end: DateTime<Utc>, job_level: JobLevel, kpis: Vec<KpiMetric>) -> Self {
        Self {
            agent_id: agent_id.into(),
            period_start,
            period_end,
            job_level,
            kpis,
            qualitative_feedback: Vec::new(),
            overall_score: 0.0,
            rating: PerformanceRating::Meets,
            promotion_eligible: false,
            demotion_risk: false,
        }
    }

    /// Weighted average achievement rate across KPIs, then maps to a
    /// rating and flags promotion eligibility / demotion risk.
    pub fn calculate_score(&mut self) -> f64 {
        if self.kpis.is_empty() {
            self.overall_score = 0.5;
            return self.overall_score;
        }
        let total_weight: f64 = self.kpis.iter().map(|k| k.weight).sum();
        if total_weight == 0.0 {
            self.overall_score = 0.5;
            return self.overall_score;
        }
        let weighted: f64 = self.kpis.iter().map(|k| k.weight * k.achievement_rate()).sum::<f64>() / total_weight;
        self.overall_score = (weighted * 1000.0).round() / 1000.0;
        self.rating = PerformanceRating::from_score(self.overall_score);
        self.promotion_eligible = matches!(self.rating, PerformanceRating::Exceeds | PerformanceRating::Exceptional);
        self.demotion_risk = matches!(self.rating, PerformanceRating::NeedsImprovement | PerformanceRating::Underperforming);
        self.overall_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn achievement_rate_inverts_for_lower_is_better() {
        let mut kpi = KpiMetric::new("errors", "error count", 0.2, 10.0, "count", false);
        kpi.actual = 5.0;
        assert!((kpi.achievement_rate() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn score_maps_to_exceptional_rating() {
        let mut kpi = KpiMetric::new("x", "x", 1.0, 10.0, "", true);
        kpi.actual = 16.0;
        let mut scorecard = AgentScorecard::new("a1", Utc::now(), Utc::now(), JobLevel::Junior, vec![kpi]);
        scorecard.calculate_score();
        assert_eq!(scorecard.rating, PerformanceRating::Exceptional);
        assert!(scorecard.promotion_eligible);
    }

    #[test]
    fn empty_kpis_score_half() {
        let mut scorecard = AgentScorecard::new("a1", Utc::now(), Utc::now(), JobLevel::Junior, vec![]);
        assert!((scorecard.calculate_score() - 0.5).abs() < 1e-9);
    }
}
