//! Composition root (§4.12, ambient expansion): wires every subsystem into
//! one `Runtime`, grounded in the teacher's `lib.rs::run()` boot sequence
//! (config → identity → bus/services → scheduler → start), translated
//! from a Tauri app-builder into a plain async constructor.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::ai::provider::LLMProvider;
use crate::bus::{MessageBus, TokioMessageBus};
use crate::company::llm::ProviderLlmClient;
use crate::company::roles::behavior_for;
use crate::company::runtime::{AgentRuntime, AgentRuntimeConfig};
use crate::company::scheduler::CompanyScheduler;
use crate::company::{LlmClient, default_jobs};
use crate::config::AppConfig;
use crate::feedback::FeedbackChannel;
use crate::governance::RiskGovernance;
use crate::identity::{AgentRoster, load_agent_roster, parse_agent_roster};
use crate::intention::IntentionSystem;
use crate::performance::{PerformanceConfig, PerformanceSystem};
#[cfg(feature = "persistence")]
use crate::persistence::DbPool;
use crate::toolrouter::budget::{AccountType, BudgetAccount, BudgetLedger};
use crate::toolrouter::handlers::{BacktestHandler, MeetingHandler, MemoryHandler, PassthroughHandler};
use crate::toolrouter::schema::{CostUnit, ToolCategory, ToolSchema};
use crate::toolrouter::{PermissionsFile, ToolRegistry, ToolRouter, load_permissions, parse_permissions};
use crate::topics::TopicManager;

/// Everything a running company of agents needs, bundled behind `Arc`s so
/// callers (the CLI, tests) can hold a cheap handle to any subsystem.
/// No subsystem is reachable through global/static state.
pub struct Runtime {
    pub bus: Arc<dyn MessageBus>,
    pub tool_router: Arc<ToolRouter>,
    pub topics: Arc<TopicManager>,
    pub governance: Arc<RiskGovernance>,
    pub intentions: Arc<IntentionSystem>,
    pub feedback: Arc<FeedbackChannel>,
    pub performance: Arc<PerformanceSystem>,
    pub scheduler: Arc<CompanyScheduler>,
    pub roster: AgentRoster,
}

impl Runtime {
    /// Builds every subsystem in the order §4.12 names: bus, tool registry
    /// (+ default tool catalog), tool router, topic manager, risk
    /// governance, intention system, feedback channel, performance system,
    /// and finally the scheduler, which depends on all of the above plus
    /// one `AgentRuntime` per roster agent.
    pub async fn build(
        config: &AppConfig,
        roster: AgentRoster,
        permissions: PermissionsFile,
        llm_provider: Arc<dyn LLMProvider>,
    ) -> Result<Self, String> {
        let bus: Arc<dyn MessageBus> =
            TokioMessageBus::new(config.runtime.bus_history_cap, config.runtime.bus_history_cap);

        for agent_id in roster.agents.keys() {
            bus.register_mailbox(agent_id);
        }

        let registry = Arc::new(default_tool_registry(bus.clone()));

        #[cfg(feature = "persistence")]
        let pool: Option<Arc<DbPool>> = match &config.persistence.database_path {
            Some(path) => match crate::persistence::init(Path::new(path)) {
                Ok(pool) => Some(Arc::new(pool)),
                Err(e) => {
                    tracing::warn!("persistence disabled: failed to open {path}: {e}");
                    None
                }
            },
            None => None,
        };

        let agent_team: HashMap<String, String> = roster
            .agents
            .iter()
            .map(|(id, def)| (id.clone(), def.team.clone().unwrap_or_else(|| def.department.clone())))
            .collect();
        #[cfg(feature = "persistence")]
        let ledger = Arc::new(BudgetLedger::new_with_persistence(agent_team, pool.clone()));
        #[cfg(not(feature = "persistence"))]
        let ledger = Arc::new(BudgetLedger::new(agent_team));
        let now = chrono::Utc::now();
        for agent_id in roster.agents.keys() {
            if ledger.resolve(agent_id).is_some_and(|resolved| &resolved == agent_id) {
                continue;
            }
            ledger.open_account(BudgetAccount::new(
                agent_id.clone(),
                AccountType::Agent,
                config.budget.base_weekly_points,
                now,
            ));
        }

        #[cfg(feature = "persistence")]
        let tool_router = Arc::new(ToolRouter::new_with_persistence(registry, permissions, ledger, pool.clone()));
        #[cfg(not(feature = "persistence"))]
        let tool_router = Arc::new(ToolRouter::new(registry, permissions, ledger));
        let topics = Arc::new(TopicManager::new());
        #[cfg(feature = "persistence")]
        let governance = Arc::new(RiskGovernance::new_with_persistence(pool.clone()));
        #[cfg(not(feature = "persistence"))]
        let governance = Arc::new(RiskGovernance::new());
        let intentions = Arc::new(IntentionSystem::new());
        let feedback = Arc::new(FeedbackChannel::new());
        let performance = Arc::new(PerformanceSystem::new(PerformanceConfig::default()));

        let llm: Arc<dyn LlmClient> = Arc::new(ProviderLlmClient::new(
            llm_provider,
            config.provider.default_model.clone(),
            Duration::from_secs(config.provider.call_timeout_secs),
        ));

        let runtime_config = AgentRuntimeConfig {
            agent_interval: Duration::from_secs(config.runtime.agent_interval_secs),
            get_messages_timeout: Duration::from_millis(config.runtime.get_messages_timeout_ms),
            get_messages_max: config.runtime.get_messages_max,
            call_timeout: Duration::from_secs(config.provider.call_timeout_secs),
            activity_cap: config.runtime.activity_log_cap,
            history_cap: config.runtime.conversation_history_cap,
            max_retries: config.provider.max_retries,
        };

        let mut agent_ids: Vec<&String> = roster.agents.keys().collect();
        agent_ids.sort();
        let agents: Vec<Arc<AgentRuntime>> = agent_ids
            .into_iter()
            .map(|id| {
                let def = &roster.agents[id];
                Arc::new(AgentRuntime::new(
                    id.clone(),
                    def.department.clone(),
                    bus.clone(),
                    llm.clone(),
                    behavior_for(def.role),
                    runtime_config.clone(),
                ))
            })
            .collect();

        let leads = roster.leads();
        let chief_of_staff = leads.first().cloned().unwrap_or_else(|| "chief_of_staff".to_string());
        let governance_agent = roster
            .agents
            .iter()
            .find(|(_, def)| def.department.eq_ignore_ascii_case("governance"))
            .map(|(id, _)| id.clone())
            .unwrap_or_else(|| "governance".to_string());
        let jobs = default_jobs(leads, &chief_of_staff, &governance_agent);

        let scheduler = Arc::new(CompanyScheduler::new(bus.clone(), agents, jobs));
        scheduler.start().await;

        info!(agents = roster.agents.len(), "runtime started");

        Ok(Self {
            bus,
            tool_router,
            topics,
            governance,
            intentions,
            feedback,
            performance,
            scheduler,
            roster,
        })
    }

    /// Loads `AppConfig`, `agents.yaml`, and `permissions.yaml` from the
    /// paths named in `config.identity`, then builds the runtime.
    pub async fn build_from_config(config: &AppConfig, llm_provider: Arc<dyn LLMProvider>) -> Result<Self, String> {
        let roster = load_agent_roster(Path::new(&config.identity.agents_path))?;
        let permissions = load_permissions(Path::new(&config.identity.permissions_path))
            .or_else(|_| parse_permissions("tools: {}"))?;
        Self::build(config, roster, permissions, llm_provider).await
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }
}

/// Seeds the tool registry with the schemas/handlers named across §4.2 and
/// SPEC_FULL's worked scenarios: `market.get_ohlcv`, `memory.write`,
/// `meeting.present`, `backtest.run`, plus generic passthrough coverage
/// for the two remaining categories (intelligence search, trade
/// placement) that carry no side-constraints of their own.
fn default_tool_registry(bus: Arc<dyn MessageBus>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register_schema(ToolSchema {
        name: "market.get_ohlcv".to_string(),
        description: "Fetch OHLCV candles for a symbol/timeframe".to_string(),
        category: ToolCategory::Market,
        parameters: serde_json::json!({"symbol": "string", "timeframe": "string", "limit": "number"}),
        base_cost: 1.0,
        cost_per_unit: 0.01,
        cost_unit: CostUnit::Rows,
        requires_approval_above: None,
        allowed_departments: None,
    });
    registry.register_schema(ToolSchema {
        name: "memory.write".to_string(),
        description: "Write a knowledge-base entry".to_string(),
        category: ToolCategory::Memory,
        parameters: serde_json::json!({"content": "string", "refs": "array", "scope": "string"}),
        base_cost: 1.0,
        cost_per_unit: 0.0,
        cost_unit: CostUnit::Nil,
        requires_approval_above: None,
        allowed_departments: None,
    });
    registry.register_schema(ToolSchema {
        name: "meeting.present".to_string(),
        description: "Present a card inside an active meeting room".to_string(),
        category: ToolCategory::Meeting,
        parameters: serde_json::json!({"title": "string", "body": "string"}),
        base_cost: 0.5,
        cost_per_unit: 0.0,
        cost_unit: CostUnit::Nil,
        requires_approval_above: None,
        allowed_departments: None,
    });
    registry.register_schema(ToolSchema {
        name: "backtest.run".to_string(),
        description: "Run a strategy backtest over a config and data version".to_string(),
        category: ToolCategory::Backtest,
        parameters: serde_json::json!({"config": "object", "data_version": "string", "code_commit": "string"}),
        base_cost: 5.0,
        cost_per_unit: 0.5,
        cost_unit: CostUnit::Params,
        requires_approval_above: Some(50.0),
        allowed_departments: None,
    });
    registry.register_schema(ToolSchema {
        name: "intelligence.search".to_string(),
        description: "Search external intelligence sources".to_string(),
        category: ToolCategory::Intelligence,
        parameters: serde_json::json!({"query": "string"}),
        base_cost: 1.0,
        cost_per_unit: 0.0,
        cost_unit: CostUnit::Nil,
        requires_approval_above: None,
        allowed_departments: None,
    });
    registry.register_schema(ToolSchema {
        name: "trading.place_order".to_string(),
        description: "Place a trade order".to_string(),
        category: ToolCategory::Trading,
        parameters: serde_json::json!({"symbol": "string", "side": "string", "qty": "number"}),
        base_cost: 2.0,
        cost_per_unit: 0.0,
        cost_unit: CostUnit::Nil,
        requires_approval_above: Some(10.0),
        allowed_departments: None,
    });

    registry.register_handler(ToolCategory::Market, Arc::new(PassthroughHandler));
    registry.register_handler(ToolCategory::Backtest, Arc::new(BacktestHandler));
    registry.register_handler(ToolCategory::Memory, Arc::new(MemoryHandler));
    registry.register_handler(ToolCategory::Meeting, Arc::new(MeetingHandler::new(bus)));
    registry.register_handler(ToolCategory::Intelligence, Arc::new(PassthroughHandler));
    registry.register_handler(ToolCategory::Trading, Arc::new(PassthroughHandler));

    registry
}
