//! Role-specific `CheckForWork` overrides (§4.11): all role differences
//! live here — the runtime loop itself is identical for every role.

pub mod generic;
pub mod lead;
pub mod researcher;
pub mod risk;

pub use generic::GenericRoleBehavior;
pub use lead::LeadBehavior;
pub use researcher::ResearcherBehavior;
pub use risk::RiskBehavior;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::company::task::Task;

/// Snapshot the runtime hands to a role's `check_for_work` each tick. Role
/// behaviors are stateless with respect to this struct — any state they
/// need across ticks (cooldowns, counters) they own internally.
pub struct RoleContext {
    pub agent_id: String,
    pub now: DateTime<Utc>,
    pub queue_is_empty: bool,
    pub has_current_topic: bool,
    pub ideas_awaiting_validation: bool,
}

/// Proactive-work policy for a role. The runtime calls `check_for_work`
/// once per tick when it would otherwise sit idle; whatever tasks come
/// back are pushed onto the agent's own queue.
#[async_trait]
pub trait RoleBehavior: Send + Sync {
    async fn check_for_work(&self, ctx: &RoleContext) -> Vec<Task>;
}

/// Picks the behavior implementation for a configured role. Roles with no
/// behavior of their own (Trader/Intelligence/Director/Executive) share
/// [`GenericRoleBehavior`], matching the Design Notes' instruction that
/// unmodeled roles default to no proactive work rather than a stub that
/// invents behavior the spec never described.
pub fn behavior_for(role: crate::identity::RoleKind) -> Box<dyn RoleBehavior> {
    match role {
        crate::identity::RoleKind::Researcher => Box::new(ResearcherBehavior::new()),
        crate::identity::RoleKind::Lead => Box::new(LeadBehavior::new()),
        crate::identity::RoleKind::Risk => Box::new(RiskBehavior::new()),
        _ => Box::new(GenericRoleBehavior),
    }
}
