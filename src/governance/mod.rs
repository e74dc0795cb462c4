//! Risk-rule governance (§4.8): proposal, weighted voting, activation, and
//! compliance checks against a position snapshot.

pub mod system;
pub mod types;

pub use system::{GovernanceError, RiskGovernance, VoteOutcome};
pub use types::{
    ComplianceFinding, ComplianceReport, GovernanceDecision, PositionSnapshot, RiskRule, RuleKind,
    RuleStatus, Severity, Vote, VoteChoice, vote_weight,
};
