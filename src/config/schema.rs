//! TOML configuration schema for the agent company runtime.
//!
//! All fields have `#[serde(default)]` so a partially-filled `config.toml`
//! works correctly. Missing sections fall back to their `Default` impl.
//!
//! Example `~/.agentco/config.toml`:
//! ```toml
//! [provider]
//! default_id = "openai"
//! default_model = "gpt-4o-mini"
//! call_timeout_secs = 60
//!
//! [runtime]
//! agent_interval_secs = 2
//! scheduler_tick_secs = 10
//! bus_history_cap = 10000
//!
//! [budget]
//! base_weekly_points = 1000
//!
//! [identity]
//! agents_path = "agents.yaml"
//! permissions_path = "permissions.yaml"
//! ```

use serde::{Deserialize, Serialize};

// ─── ProviderConfig ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// ID of the default LLM provider (e.g. `"openai"`, `"anthropic"`).
    pub default_id: String,
    /// Default model identifier (e.g. `"gpt-4o-mini"`, `"claude-3-haiku"`).
    pub default_model: String,
    /// Per-call timeout in seconds. Agent loops must not block past this.
    pub call_timeout_secs: u64,
    /// Maximum retry attempts on transient provider errors.
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default_id: "openai".to_owned(),
            default_model: "gpt-4o-mini".to_owned(),
            call_timeout_secs: 60,
            max_retries: 3,
        }
    }
}

// ─── RuntimeConfig ────────────────────────────────────────────────────────────

/// Tick intervals and bus capacity governing the concurrency model in
/// the "CONCURRENCY & RESOURCE MODEL" section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How often each agent loop wakes to drain its mailbox and check for work.
    pub agent_interval_secs: u64,
    /// Timeout for a single `GetMessages` poll.
    pub get_messages_timeout_ms: u64,
    /// Max messages pulled per `GetMessages` call.
    pub get_messages_max: usize,
    /// Scheduler main-loop tick interval.
    pub scheduler_tick_secs: u64,
    /// Bounded FIFO cap on bus history (oldest dropped on overflow).
    pub bus_history_cap: usize,
    /// Bounded ring size for per-agent activity logs.
    pub activity_log_cap: usize,
    /// Bounded ring size for per-agent conversation history.
    pub conversation_history_cap: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            agent_interval_secs: 2,
            get_messages_timeout_ms: 100,
            get_messages_max: 10,
            scheduler_tick_secs: 10,
            bus_history_cap: 10_000,
            activity_log_cap: 100,
            conversation_history_cap: 50,
        }
    }
}

// ─── BudgetConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BudgetConfig {
    /// Default weekly compute-point allotment for a freshly created account.
    pub base_weekly_points: f64,
    /// Default required-approval-rate applied to a risk rule when its
    /// proposal omits one explicitly.
    pub default_required_approval_rate: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            base_weekly_points: 1000.0,
            default_required_approval_rate: 0.6,
        }
    }
}

// ─── IdentityConfig ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path to the `agents.yaml` roster file.
    pub agents_path: String,
    /// Path to the `permissions.yaml` tool-permission file.
    pub permissions_path: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            agents_path: "agents.yaml".to_owned(),
            permissions_path: "permissions.yaml".to_owned(),
        }
    }
}

// ─── PersistenceConfig ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Path to the SQLite database file. `None` means run fully in-memory.
    pub database_path: Option<String>,
}

// ─── AppConfig ────────────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// Loaded from `~/.agentco/config.toml`, falling back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub runtime: RuntimeConfig,
    pub budget: BudgetConfig,
    pub identity: IdentityConfig,
    pub persistence: PersistenceConfig,
}
