pub mod loader;
pub mod types;

pub use loader::{load_agent_roster, parse_agent_roster};
pub use types::{AgentDefinition, AgentRoster, RoleKind};
