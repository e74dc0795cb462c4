pub mod ai;
pub mod bus;
pub mod capability;
pub mod company;
pub mod config;
pub mod feedback;
pub mod governance;
pub mod identity;
pub mod intention;
pub mod performance;
#[cfg(feature = "persistence")]
pub mod persistence;
pub mod research;
pub mod runtime;
pub mod scheduler;
pub mod toolrouter;
pub mod topics;

/// Convenience re-exports for the most commonly used traits and types
/// across the runtime.
///
/// ```rust
/// use agentco::prelude::*;
/// ```
pub mod prelude {
    // AI provider trait
    pub use crate::ai::provider::LLMProvider;
    pub use crate::ai::types::{CompletionRequest, CompletionResponse, Message, MessageRole};

    // Message bus
    pub use crate::bus::{MessageBus, TokioMessageBus};

    // The company of agents: per-agent runtime and scheduler
    pub use crate::company::{AgentRuntime, CompanyScheduler, LlmClient};

    // Tool router
    pub use crate::toolrouter::{ToolRegistry, ToolRouter};

    // Topics and escalation
    pub use crate::topics::TopicManager;

    // Risk governance
    pub use crate::governance::RiskGovernance;

    // Autonomous-intention gatekeeping
    pub use crate::intention::IntentionSystem;

    // Feedback and capability
    pub use crate::feedback::FeedbackChannel;
    pub use crate::capability::CapabilitySystem;

    // Performance and promotion
    pub use crate::performance::PerformanceSystem;

    // Configuration
    pub use crate::config::{AppConfig, load_default_config};

    // Identity
    pub use crate::identity::{AgentRoster, load_agent_roster};

    // Composition root
    pub use crate::runtime::Runtime;
}
