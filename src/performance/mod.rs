//! KPI scorecards and promotion/demotion eligibility (§4.11 table entry
//! C11, §3.1 `ReputationScore`/`PerformanceScorecard`).

pub mod config;
pub mod system;
pub mod types;

pub use config::{PerformanceConfig, PromotionRequirement};
pub use system::{PerformanceError, PerformanceSystem, PromotionCheck};
pub use types::{AgentScorecard, JobLevel, KpiMetric, PerformanceRating, QualitativeFeedback};
