//! Loads and validates `agents.yaml` into an [`AgentRoster`].

use std::{fs, path::Path};

use super::types::AgentRoster;

/// Read and validate `agents.yaml` at `path`.
///
/// Validation rejects: empty rosters, an agent whose `reports_to` points at
/// an id not present in the roster, and an agent whose `department` is blank.
pub fn load_agent_roster(path: &Path) -> Result<AgentRoster, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read agent roster at {path:?}: {e}"))?;
    parse_agent_roster(&raw)
}

/// Parse and validate `agents.yaml` content (split out for testability).
pub fn parse_agent_roster(raw: &str) -> Result<AgentRoster, String> {
    let roster: AgentRoster =
        serde_yaml::from_str(raw).map_err(|e| format!("failed to parse agents.yaml: {e}"))?;

    if roster.agents.is_empty() {
        return Err("agents.yaml declares no agents".to_string());
    }

    for (id, def) in &roster.agents {
        if def.department.trim().is_empty() {
            return Err(format!("agent '{id}' has an empty department"));
        }
        if let Some(parent) = &def.reports_to
            && !roster.agents.contains_key(parent)
        {
            return Err(format!(
                "agent '{id}' reports_to unknown agent '{parent}'"
            ));
        }
    }

    Ok(roster)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
agents:
  chairman:
    name: "董事长"
    name_en: "Chairman"
    department: "board"
    is_lead: true
    capability_tier: 5
    role: executive
  r1:
    name: "研究员一号"
    name_en: "Researcher One"
    department: "research"
    team: "alpha_a"
    reports_to: chairman
    capability_tier: 2
    role: researcher
"#;

    #[test]
    fn parses_valid_roster() {
        let roster = parse_agent_roster(VALID).unwrap();
        assert_eq!(roster.agents.len(), 2);
        assert_eq!(roster.leads(), vec!["chairman".to_string()]);
        assert_eq!(roster.reports_to("r1"), Some("chairman"));
    }

    #[test]
    fn rejects_empty_roster() {
        let err = parse_agent_roster("agents: {}").unwrap_err();
        assert!(err.contains("no agents"));
    }

    #[test]
    fn rejects_dangling_reports_to() {
        let yaml = r#"
agents:
  r1:
    name: "R1"
    name_en: "R1"
    department: "research"
    reports_to: nobody
    role: researcher
"#;
        let err = parse_agent_roster(yaml).unwrap_err();
        assert!(err.contains("reports_to"));
    }

    #[test]
    fn rejects_empty_department() {
        let yaml = r#"
agents:
  r1:
    name: "R1"
    name_en: "R1"
    department: ""
    role: researcher
"#;
        let err = parse_agent_roster(yaml).unwrap_err();
        assert!(err.contains("department"));
    }

    #[test]
    fn defaults_are_applied_for_missing_fields() {
        let yaml = r#"
agents:
  r1:
    name: "R1"
    name_en: "R1"
    department: "research"
    role: researcher
"#;
        let roster = parse_agent_roster(yaml).unwrap();
        let r1 = &roster.agents["r1"];
        assert!(!r1.is_lead);
        assert_eq!(r1.capability_tier, 1);
        assert!(r1.persona_traits.is_empty());
    }
}
