//! Autonomous-action scopes (§4.9): the fixed table of what an agent is
//! allowed to decide for itself without a human approval gate, and the
//! check that decides whether a requested action falls inside it.

use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct AutonomousScope {
    pub name: &'static str,
    pub allowed_actions: &'static [&'static str],
    pub budget_limit_cp: Option<f64>,
    pub max_position_change_pct: Option<f64>,
    pub can_pause_trading: bool,
}

pub const RESEARCH: AutonomousScope = AutonomousScope {
    name: "research",
    allowed_actions: &["request_data", "run_backtest", "write_memo", "propose_strategy"],
    budget_limit_cp: Some(100.0),
    max_position_change_pct: None,
    can_pause_trading: false,
};

pub const RISK_MONITORING: AutonomousScope = AutonomousScope {
    name: "risk_monitoring",
    allowed_actions: &["issue_alert", "request_meeting", "pause_strategy"],
    budget_limit_cp: None,
    max_position_change_pct: None,
    can_pause_trading: true,
};

pub const TRADING_EXECUTION: AutonomousScope = AutonomousScope {
    name: "trading_execution",
    allowed_actions: &["adjust_order", "cancel_order", "report_anomaly"],
    budget_limit_cp: None,
    max_position_change_pct: Some(5.0),
    can_pause_trading: false,
};

pub const INTELLIGENCE: AutonomousScope = AutonomousScope {
    name: "intelligence",
    allowed_actions: &["issue_alert", "update_sentiment", "flag_news"],
    budget_limit_cp: None,
    max_position_change_pct: None,
    can_pause_trading: false,
};

pub const ALL_SCOPES: &[AutonomousScope] = &[RESEARCH, RISK_MONITORING, TRADING_EXECUTION, INTELLIGENCE];

pub fn scope_by_name(name: &str) -> Option<AutonomousScope> {
    ALL_SCOPES.iter().copied().find(|s| s.name == name)
}

/// Whether `action`, given `context`, falls within `scope` without
/// needing a human approver.
pub fn action_is_autonomous(scope: &AutonomousScope, action: &str, context: &serde_json::Map<String, Value>) -> bool {
    if !scope.allowed_actions.contains(&action) {
        return false;
    }
    if let Some(limit) = scope.budget_limit_cp {
        let requested = context.get("compute_points").and_then(Value::as_f64).unwrap_or(0.0);
        if requested > limit {
            return false;
        }
    }
    if let Some(limit) = scope.max_position_change_pct {
        let change = context.get("position_change_pct").and_then(Value::as_f64).unwrap_or(0.0);
        if change.abs() > limit {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(v: Value) -> serde_json::Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn unknown_action_rejected() {
        assert!(!action_is_autonomous(&RESEARCH, "launch_nukes", &ctx(json!({}))));
    }

    #[test]
    fn within_budget_is_autonomous() {
        assert!(action_is_autonomous(&RESEARCH, "run_backtest", &ctx(json!({"compute_points": 50}))));
    }

    #[test]
    fn over_budget_is_not_autonomous() {
        assert!(!action_is_autonomous(&RESEARCH, "run_backtest", &ctx(json!({"compute_points": 500}))));
    }

    #[test]
    fn over_position_change_is_not_autonomous() {
        assert!(!action_is_autonomous(
            &TRADING_EXECUTION,
            "adjust_order",
            &ctx(json!({"position_change_pct": 12.0}))
        ));
    }

    #[test]
    fn scope_lookup_by_name() {
        assert!(scope_by_name("risk_monitoring").is_some());
        assert!(scope_by_name("nonexistent").is_none());
    }
}
