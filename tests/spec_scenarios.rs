//! End-to-end checks for the six literal-valued scenarios: budget
//! exhaustion, topic-to-meeting escalation, weighted rule voting,
//! autonomous-intention gating, compliance violation, and broadcast
//! exclusion of the sender.

use std::collections::HashMap;
use std::sync::Arc;

use agentco::bus::TokioMessageBus;
use agentco::governance::types::{PositionSnapshot, RuleKind, VoteChoice};
use agentco::governance::RiskGovernance;
use agentco::intention::types::IntentionType;
use agentco::intention::{ExpressIntentionRequest, IntentionSystem};
use agentco::topics::{SeconderLevel, TopicKind, TopicManager, TopicPriority, TopicStatus, new_topic};
use agentco::toolrouter::handler::{ToolContext, ToolHandler, ToolResult};
use agentco::toolrouter::schema::{CostUnit, ToolCategory, ToolSchema};
use agentco::toolrouter::{
    AccountType, BudgetAccount, BudgetLedger, PermissionsFile, RouterError, ToolCallStatus, ToolRegistry, ToolRouter,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

fn now() -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
}

struct AlwaysOk;
#[async_trait]
impl ToolHandler for AlwaysOk {
    async fn handle(&self, _tool_name: &str, _args: Value, ctx: &ToolContext) -> ToolResult {
        ToolResult::ok(json!({}), ctx.now, ctx.now)
    }
}

#[tokio::test]
async fn s1_budget_exhaustion_rejects_and_leaves_team_remaining_unchanged() {
    let mut registry = ToolRegistry::new();
    registry.register_schema(ToolSchema {
        name: "market.get_ohlcv".into(),
        description: "test".into(),
        category: ToolCategory::Market,
        parameters: json!({}),
        base_cost: 1.0,
        cost_per_unit: 0.01,
        cost_unit: CostUnit::Rows,
        requires_approval_above: None,
        allowed_departments: None,
    });
    registry.register_handler(ToolCategory::Market, Arc::new(AlwaysOk));

    let mut agent_team = HashMap::new();
    agent_team.insert("R1".to_string(), "alpha_a".to_string());
    let ledger = Arc::new(BudgetLedger::new(agent_team));
    ledger.open_account(BudgetAccount::new("alpha_a", AccountType::Team, 3.0, now()));

    let router = ToolRouter::new(Arc::new(registry), PermissionsFile::default(), ledger.clone());

    let err = router
        .execute("R1", "research", "market.get_ohlcv", json!({"rows": 500}), None, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::InsufficientBudget(_)));

    let calls = router.audit_log();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].status, ToolCallStatus::Rejected);
    assert_eq!(calls[0].estimated_cost, 6.0);

    assert_eq!(ledger.remaining("R1", now()).unwrap(), 3.0);
}

#[tokio::test]
async fn s2_seconded_risk_topic_schedules_in_four_hours_with_proposer_and_seconder() {
    let mgr = TopicManager::new();
    let created_at = now();
    let topic = new_topic("P", "risk", "Position cap review", "desc", TopicKind::Risk, TopicPriority::High, None, created_at);
    let id = mgr.propose(topic);

    let outcome = mgr.add_second(id, "S1", "agree", SeconderLevel::Regular, created_at).unwrap();
    assert_eq!(outcome, agentco::topics::SecondOutcome::Scheduled);

    let scheduled = mgr.get(id).unwrap();
    assert_eq!(scheduled.status, TopicStatus::Scheduled);
    assert_eq!(scheduled.scheduled_at, Some(created_at + chrono::Duration::hours(4)));
    assert!(scheduled.actual_participants.contains(&"P".to_string()));
    assert!(scheduled.actual_participants.contains(&"S1".to_string()));
}

#[tokio::test]
async fn s3_split_vote_crosses_the_approval_rate_threshold() {
    let gov = RiskGovernance::new();
    let id = gov.propose("pm", "Position cap", "desc", RuleKind::PositionLimit, json!({}), now());

    // required_voters for PositionLimit are {cro, pm, cio} with weights
    // {2.0, 1.5, 2.0} -- matches the R/I/P weights {2.0, 2.0, 1.5} from the
    // scenario via cro=R, cio=I, pm=P.
    gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now()).unwrap();
    gov.vote(id, "cio", "cio", VoteChoice::Approve, "ok", now()).unwrap();
    let outcome = gov.vote(id, "pm", "pm", VoteChoice::Reject, "no", now()).unwrap();

    assert_eq!(outcome, agentco::governance::system::VoteOutcome::Approved);
    let rule = gov.get(id).unwrap();
    assert_eq!(rule.status, agentco::governance::types::RuleStatus::Approved);
}

#[tokio::test]
async fn s4_autonomous_intention_gate_respects_compute_point_limit() {
    let system = IntentionSystem::new();

    let mut ctx_under = HashMap::new();
    ctx_under.insert("action".to_string(), json!("run_backtest"));
    ctx_under.insert("compute_points".to_string(), json!(80));
    let under = system.express_intention(
        "r1",
        "Researcher One",
        "research",
        IntentionType::AutonomousAction,
        "run backtest",
        "desc",
        ExpressIntentionRequest {
            autonomous_scope: Some("research".to_string()),
            context: ctx_under,
            ..Default::default()
        },
        now(),
    );
    assert!(under.autonomous_approved);

    let mut ctx_over = HashMap::new();
    ctx_over.insert("action".to_string(), json!("run_backtest"));
    ctx_over.insert("compute_points".to_string(), json!(120));
    let over = system.express_intention(
        "r1",
        "Researcher One",
        "research",
        IntentionType::AutonomousAction,
        "run backtest",
        "desc",
        ExpressIntentionRequest {
            autonomous_scope: Some("research".to_string()),
            context: ctx_over,
            ..Default::default()
        },
        now(),
    );
    assert!(!over.autonomous_approved);
}

#[tokio::test]
async fn s5_concentration_rule_flags_the_over_limit_asset() {
    let gov = RiskGovernance::new();
    let id = gov.propose(
        "cro",
        "Concentration cap",
        "desc",
        RuleKind::ConcentrationLimit,
        json!({"max_single_asset_pct": 30}),
        now(),
    );
    gov.vote(id, "cro", "cro", VoteChoice::Approve, "ok", now()).unwrap();
    gov.vote(id, "pm", "pm", VoteChoice::Approve, "ok", now()).unwrap();
    gov.vote(id, "cio", "cio", VoteChoice::Approve, "ok", now()).unwrap();
    gov.activate(id, now()).unwrap();

    let mut asset_allocations = HashMap::new();
    asset_allocations.insert("BTC".to_string(), 0.35);
    asset_allocations.insert("ETH".to_string(), 0.20);
    asset_allocations.insert("USDT".to_string(), 0.45);
    let position = PositionSnapshot { asset_allocations, daily_pnl_pct: 0.0, leverage: 1.0 };

    let report = gov.check_compliance(&position);
    assert!(!report.compliant);
    let btc_violation = report
        .violations
        .iter()
        .find(|v| v.message.contains("BTC"))
        .expect("a violation citing BTC");
    assert_eq!(btc_violation.severity, agentco::governance::types::Severity::High);
    assert!(btc_violation.message.contains("35.0%"));
}

#[tokio::test]
async fn s6_broadcast_excludes_the_sender() {
    let bus = TokioMessageBus::new(1_000, 1_000);
    bus.register_mailbox("chairman");
    bus.register_mailbox("a");
    bus.register_mailbox("b");

    bus.broadcast("chairman", "Announcement", "hello", HashMap::new()).await;

    assert!(bus.peek_messages("chairman", 10).is_empty());
    assert_eq!(bus.peek_messages("a", 10).len(), 1);
    assert_eq!(bus.peek_messages("b", 10).len(), 1);
}
