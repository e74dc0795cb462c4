//! Loads and evaluates `permissions.yaml`: per-tool allow-lists, parameter
//! caps, and approval thresholds.

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolPermission {
    #[serde(default)]
    pub allowed_agents: Vec<String>,
    #[serde(default)]
    pub allowed_departments: Vec<String>,
    pub max_cost: Option<f64>,
    pub requires_approval_above: Option<f64>,
    #[serde(default)]
    pub approvers: Vec<String>,
    pub max_limit: Option<u64>,
    #[serde(default)]
    pub allowed_timeframes: Vec<String>,
}

impl ToolPermission {
    fn agent_allowed(&self, agent_id: &str) -> bool {
        self.allowed_agents.is_empty()
            || self.allowed_agents.iter().any(|pat| glob_match(pat, agent_id))
    }

    fn department_allowed(&self, department: &str) -> bool {
        self.allowed_departments.is_empty()
            || self.allowed_departments.iter().any(|d| d == department)
    }

    /// True if `agent_id` in `department` may invoke the tool this
    /// permission entry guards at all (before cost/budget checks).
    pub fn permits(&self, agent_id: &str, department: &str) -> bool {
        self.agent_allowed(agent_id) && self.department_allowed(department)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionsFile {
    #[serde(default)]
    pub tools: HashMap<String, ToolPermission>,
}

impl PermissionsFile {
    pub fn get(&self, tool_name: &str) -> Option<&ToolPermission> {
        self.tools.get(tool_name)
    }
}

pub fn load_permissions(path: &Path) -> Result<PermissionsFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read permissions file at {path:?}: {e}"))?;
    parse_permissions(&raw)
}

pub fn parse_permissions(raw: &str) -> Result<PermissionsFile, String> {
    serde_yaml::from_str(raw).map_err(|e| format!("failed to parse permissions.yaml: {e}"))
}

/// Minimal glob matcher supporting only `*` as a wildcard, sufficient for
/// agent-id allow-lists like `research_*`. No `?`, `[..]`, or escaping.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut cursor = 0usize;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match text[cursor..].find(part) {
            Some(offset) => {
                if i == 0 && offset != 0 {
                    return false;
                }
                cursor += offset + part.len();
            }
            None => return false,
        }
    }
    if let Some(last) = parts.last()
        && !last.is_empty()
        && !text.ends_with(last)
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_exact_match() {
        assert!(glob_match("chairman", "chairman"));
        assert!(!glob_match("chairman", "director"));
    }

    #[test]
    fn glob_prefix_wildcard() {
        assert!(glob_match("research_*", "research_001"));
        assert!(!glob_match("research_*", "trading_001"));
    }

    #[test]
    fn glob_wildcard_only() {
        assert!(glob_match("*", "anything"));
    }

    #[test]
    fn parses_permissions_file() {
        let yaml = r#"
tools:
  market.history:
    allowed_departments: ["research"]
    max_cost: 50.0
    requires_approval_above: 100.0
    approvers: ["chairman"]
"#;
        let file = parse_permissions(yaml).unwrap();
        let perm = file.get("market.history").unwrap();
        assert!(perm.permits("r1", "research"));
        assert!(!perm.permits("r1", "trading"));
        assert_eq!(perm.max_cost, Some(50.0));
    }

    #[test]
    fn unknown_tool_has_no_permission_entry() {
        let file = parse_permissions("tools: {}").unwrap();
        assert!(file.get("ghost").is_none());
    }
}
