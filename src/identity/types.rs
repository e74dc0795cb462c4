//! Agent roster schema (`agents.yaml`): the static configuration that seeds
//! every `Agent` at runtime startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The functional role a roster entry plays; drives which `CheckForWork`
/// override an `AgentRuntime` installs (see the role-specific extensions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Researcher,
    Risk,
    Trader,
    Intelligence,
    Lead,
    Director,
    Executive,
}

/// One entry in `agents.yaml`'s `agents:` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefinition {
    pub name: String,
    pub name_en: String,
    pub department: String,
    pub team: Option<String>,
    pub reports_to: Option<String>,
    pub is_lead: bool,
    pub capability_tier: u8,
    pub veto_power: bool,
    pub can_force_retest: bool,
    pub persona_traits: Vec<String>,
    pub role: RoleKind,
}

impl Default for AgentDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            name_en: String::new(),
            department: String::new(),
            team: None,
            reports_to: None,
            is_lead: false,
            capability_tier: 1,
            veto_power: false,
            can_force_retest: false,
            persona_traits: Vec::new(),
            role: RoleKind::Researcher,
        }
    }
}

/// The parsed contents of `agents.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentRoster {
    pub agents: HashMap<String, AgentDefinition>,
}

impl AgentRoster {
    /// Agent ids whose `is_lead` flag is set, sorted for determinism.
    pub fn leads(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .agents
            .iter()
            .filter(|(_, def)| def.is_lead)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Resolve `reports_to` for an agent id by one indirection lookup.
    pub fn reports_to(&self, agent_id: &str) -> Option<&str> {
        self.agents
            .get(agent_id)
            .and_then(|def| def.reports_to.as_deref())
    }
}
