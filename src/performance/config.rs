//! Role-template KPI weights and promotion thresholds (§3.1:
//! "evaluated against the agent's role-template thresholds
//! (configuration-driven, not hard-coded)"). Follows the same
//! `#[serde(default)]` + `Default` idiom as `config::schema` so these
//! tables can be overridden from TOML without code changes, while still
//! shipping sane built-in values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{JobLevel, KpiMetric, PerformanceRating};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromotionRequirement {
    pub min_tenure_months: u32,
    pub min_rating: PerformanceRating,
    pub consecutive_good_periods: u32,
    pub requires_leadership_demo: bool,
}

impl Default for PromotionRequirement {
    fn default() -> Self {
        Self { min_tenure_months: 6, min_rating: PerformanceRating::Exceeds, consecutive_good_periods: 2, requires_leadership_demo: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    pub kpi_templates: HashMap<String, Vec<KpiMetric>>,
    pub promotion_requirements: HashMap<JobLevel, PromotionRequirement>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        let mut kpi_templates = HashMap::new();
        kpi_templates.insert(
            "researcher".to_string(),
            vec![
                KpiMetric::new("strategy_proposals", "strategy proposals submitted", 0.20, 3.0, "per period", true),
                KpiMetric::new("backtest_sharpe_avg", "average backtest Sharpe", 0.25, 1.5, "", true),
                KpiMetric::new("pass_rate_robustness", "robustness gate pass rate", 0.20, 0.6, "%", true),
                KpiMetric::new("data_quality_issues", "data quality issues raised against this agent", 0.15, 0.0, "count", false),
                KpiMetric::new("collaboration_score", "collaboration score", 0.10, 0.8, "", true),
                KpiMetric::new("memory_contribution", "knowledge contributions", 0.10, 5.0, "per period", true),
            ],
        );
        kpi_templates.insert(
            "risk".to_string(),
            vec![
                KpiMetric::new("risk_events_caught", "risk events caught", 0.25, 5.0, "per period", true),
                KpiMetric::new("false_positive_rate", "false positive rate", 0.20, 0.1, "%", false),
                KpiMetric::new("veto_accuracy", "veto accuracy", 0.25, 0.9, "%", true),
                KpiMetric::new("stress_test_coverage", "stress test coverage", 0.15, 0.95, "%", true),
                KpiMetric::new("response_time", "response time", 0.15, 1.0, "hours", false),
            ],
        );
        kpi_templates.insert(
            "trader".to_string(),
            vec![
                KpiMetric::new("execution_slippage", "execution slippage", 0.30, 10.0, "bps", false),
                KpiMetric::new("order_accuracy", "order accuracy", 0.25, 0.99, "%", true),
                KpiMetric::new("risk_limit_breaches", "risk limit breaches", 0.20, 0.0, "count", false),
                KpiMetric::new("execution_speed", "execution speed", 0.15, 0.5, "seconds", false),
                KpiMetric::new("reporting_quality", "reporting quality", 0.10, 0.9, "", true),
            ],
        );
        kpi_templates.insert(
            "intelligence".to_string(),
            vec![
                KpiMetric::new("alerts_issued", "alerts issued", 0.20, 10.0, "per period", true),
                KpiMetric::new("alert_accuracy", "alert accuracy", 0.25, 0.7, "%", true),
                KpiMetric::new("coverage", "monitoring coverage", 0.20, 0.95, "%", true),
                KpiMetric::new("response_time", "response time", 0.20, 0.5, "hours", false),
                KpiMetric::new("actionable_insights", "actionable insights", 0.15, 5.0, "per period", true),
            ],
        );
        kpi_templates.insert(
            "governance".to_string(),
            vec![
                KpiMetric::new("audits_completed", "audits completed", 0.20, 10.0, "per period", true),
                KpiMetric::new("violations_detected", "violations detected", 0.20, 3.0, "per period", true),
                KpiMetric::new("false_accusations", "false accusations", 0.20, 0.0, "count", false),
                KpiMetric::new("process_improvement", "process-improvement suggestions", 0.20, 2.0, "per period", true),
                KpiMetric::new("documentation_quality", "documentation quality", 0.20, 0.9, "", true),
            ],
        );
        kpi_templates.insert(
            "default".to_string(),
            vec![
                KpiMetric::new("task_completion", "task completion rate", 0.30, 0.9, "%", true),
                KpiMetric::new("quality_score", "quality score", 0.25, 0.8, "", true),
                KpiMetric::new("collaboration", "collaboration score", 0.20, 0.8, "", true),
                KpiMetric::new("initiative", "initiative", 0.15, 0.7, "", true),
                KpiMetric::new("communication", "communication effectiveness", 0.10, 0.8, "", true),
            ],
        );

        let mut promotion_requirements = HashMap::new();
        promotion_requirements.insert(
            JobLevel::Junior,
            PromotionRequirement { min_tenure_months: 3, min_rating: PerformanceRating::Exceeds, consecutive_good_periods: 2, requires_leadership_demo: false },
        );
        promotion_requirements.insert(
            JobLevel::Intermediate,
            PromotionRequirement { min_tenure_months: 6, min_rating: PerformanceRating::Exceeds, consecutive_good_periods: 3, requires_leadership_demo: false },
        );
        promotion_requirements.insert(
            JobLevel::Senior,
            PromotionRequirement { min_tenure_months: 12, min_rating: PerformanceRating::Exceptional, consecutive_good_periods: 4, requires_leadership_demo: false },
        );
        promotion_requirements.insert(
            JobLevel::Lead,
            PromotionRequirement { min_tenure_months: 18, min_rating: PerformanceRating::Exceptional, consecutive_good_periods: 4, requires_leadership_demo: true },
        );

        Self { kpi_templates, promotion_requirements }
    }
}

impl PerformanceConfig {
    pub fn kpi_template(&self, role_type: &str) -> Vec<KpiMetric> {
        self.kpi_templates.get(role_type).or_else(|| self.kpi_templates.get("default")).cloned().unwrap_or_default()
    }
}
