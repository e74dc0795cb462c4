//! `IntentionSystem` (§4.9): lets an agent express a typed intention,
//! gates autonomous actions against the scope table, watches metric
//! snapshots against risk triggers, and tracks each intention's
//! lifecycle through to a human response or expiry.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::scopes::{action_is_autonomous, scope_by_name};
use super::types::{
    AgentIntention, IntentionPriority, IntentionStatus, IntentionType, RiskTrigger, default_risk_triggers,
};

#[derive(Debug, Error)]
pub enum IntentionError {
    #[error("no such intention: {0}")]
    NotFound(Uuid),
    #[error("no such trigger: {0}")]
    TriggerNotFound(Uuid),
    #[error("unknown response action: {0}")]
    UnknownAction(String),
}

#[derive(Debug, Clone, Default)]
pub struct ExpressIntentionRequest {
    pub priority: Option<IntentionPriority>,
    pub context: HashMap<String, Value>,
    pub target_agents: Vec<String>,
    pub trigger_type: Option<String>,
    pub autonomous_scope: Option<String>,
}

pub struct IntentionSystem {
    intentions: DashMap<Uuid, AgentIntention>,
    triggers: DashMap<Uuid, RiskTrigger>,
}

impl Default for IntentionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentionSystem {
    pub fn new() -> Self {
        let triggers = DashMap::new();
        for trigger in default_risk_triggers() {
            triggers.insert(trigger.id, trigger);
        }
        Self { intentions: DashMap::new(), triggers }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn express_intention(
        &self,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        department: impl Into<String>,
        intention_type: IntentionType,
        title: impl Into<String>,
        description: impl Into<String>,
        req: ExpressIntentionRequest,
        now: DateTime<Utc>,
    ) -> AgentIntention {
        let expiry_hours = intention_type.default_expiry_hours();
        let agent_id = agent_id.into();

        let mut intention = AgentIntention {
            id: Uuid::new_v4(),
            agent_id: agent_id.clone(),
            agent_name: agent_name.into(),
            department: department.into(),
            intention_type,
            priority: req.priority.unwrap_or(IntentionPriority::Normal),
            status: IntentionStatus::Pending,
            title: title.into(),
            description: description.into(),
            context: req.context,
            trigger_type: req.trigger_type.unwrap_or_else(|| "manual".to_string()),
            target_agents: req.target_agents,
            required_approvers: Vec::new(),
            autonomous_scope: req.autonomous_scope.clone(),
            autonomous_approved: false,
            created_at: now,
            updated_at: now,
            expires_at: Some(now + Duration::hours(expiry_hours)),
            response: None,
            action_taken: None,
        };

        if intention_type == IntentionType::AutonomousAction {
            if let Some(scope_name) = &req.autonomous_scope {
                intention.autonomous_approved = self.check_autonomous_approval(scope_name, &intention.context);
            }
        }

        self.intentions.insert(intention.id, intention.clone());
        intention
    }

    fn check_autonomous_approval(&self, scope_name: &str, context: &HashMap<String, Value>) -> bool {
        let Some(scope) = scope_by_name(scope_name) else { return false };
        let Some(action) = context.get("action").and_then(Value::as_str) else { return false };
        let map: serde_json::Map<String, Value> = context.clone().into_iter().collect();
        action_is_autonomous(&scope, action, &map)
    }

    /// Evaluates every enabled trigger against `metrics`, raising a
    /// `RiskAlert` intention (and bumping the trigger's fire count) for
    /// each one that crosses its threshold.
    pub fn check_risk_triggers(&self, metrics: &HashMap<String, f64>, now: DateTime<Utc>) -> Vec<AgentIntention> {
        let mut raised = Vec::new();

        let due: Vec<RiskTrigger> = self
            .triggers
            .iter()
            .filter(|t| t.enabled)
            .filter(|t| metrics.contains_key(&t.metric))
            .map(|t| t.clone())
            .collect();

        for trigger in due {
            let value = metrics[&trigger.metric];
            if !trigger.operator.evaluate(value, trigger.threshold) {
                continue;
            }

            if let Some(mut entry) = self.triggers.get_mut(&trigger.id) {
                entry.last_triggered = Some(now);
                entry.trigger_count += 1;
            }

            let mut context = HashMap::new();
            context.insert("trigger_id".to_string(), Value::String(trigger.id.to_string()));
            context.insert("metric".to_string(), Value::String(trigger.metric.clone()));
            context.insert("value".to_string(), serde_json::json!(value));
            context.insert("threshold".to_string(), serde_json::json!(trigger.threshold));

            let intention = self.express_intention(
                "system",
                "risk monitoring system",
                "risk_guild",
                IntentionType::RiskAlert,
                trigger.name.clone(),
                format!("{}\ncurrent value: {value}, threshold: {}", trigger.description, trigger.threshold),
                ExpressIntentionRequest {
                    priority: Some(trigger.priority),
                    context,
                    target_agents: trigger.target_agents.clone(),
                    trigger_type: Some("automatic".to_string()),
                    autonomous_scope: None,
                },
                now,
            );
            raised.push(intention);
        }

        raised
    }

    pub fn get(&self, intention_id: Uuid) -> Option<AgentIntention> {
        self.intentions.get(&intention_id).map(|i| i.clone())
    }

    /// Lazily expires any pending intention past its `expires_at`, then
    /// returns every intention matching the given filters, sorted by
    /// priority (critical first) then creation time.
    pub fn list(
        &self,
        agent_id: Option<&str>,
        intention_type: Option<IntentionType>,
        status: Option<IntentionStatus>,
        priority: Option<IntentionPriority>,
        now: DateTime<Utc>,
    ) -> Vec<AgentIntention> {
        for mut entry in self.intentions.iter_mut() {
            if entry.status == IntentionStatus::Pending {
                if let Some(expires_at) = entry.expires_at {
                    if expires_at < now {
                        entry.status = IntentionStatus::Expired;
                    }
                }
            }
        }

        let mut out: Vec<AgentIntention> = self
            .intentions
            .iter()
            .map(|i| i.clone())
            .filter(|i| agent_id.is_none_or_eq(&i.agent_id))
            .filter(|i| intention_type.map(|t| t == i.intention_type).unwrap_or(true))
            .filter(|i| status.map(|s| s == i.status).unwrap_or(true))
            .filter(|i| priority.map(|p| p == i.priority).unwrap_or(true))
            .collect();

        out.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.created_at.cmp(&b.created_at)));
        out
    }

    pub fn respond(
        &self,
        intention_id: Uuid,
        action: &str,
        response: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<IntentionStatus, IntentionError> {
        let mut entry = self.intentions.get_mut(&intention_id).ok_or(IntentionError::NotFound(intention_id))?;
        entry.status = match action {
            "approve" => IntentionStatus::Approved,
            "reject" => IntentionStatus::Rejected,
            "acknowledge" => IntentionStatus::Acknowledged,
            other => return Err(IntentionError::UnknownAction(other.to_string())),
        };
        entry.response = response;
        entry.updated_at = now;
        Ok(entry.status)
    }

    pub fn complete(&self, intention_id: Uuid, action_taken: impl Into<String>, now: DateTime<Utc>) -> Result<(), IntentionError> {
        let mut entry = self.intentions.get_mut(&intention_id).ok_or(IntentionError::NotFound(intention_id))?;
        entry.status = IntentionStatus::Completed;
        entry.action_taken = Some(action_taken.into());
        entry.updated_at = now;
        Ok(())
    }

    pub fn triggers(&self) -> Vec<RiskTrigger> {
        self.triggers.iter().map(|t| t.clone()).collect()
    }

    pub fn add_trigger(&self, trigger: RiskTrigger) -> Uuid {
        let id = trigger.id;
        self.triggers.insert(id, trigger);
        id
    }

    pub fn set_trigger_enabled(&self, trigger_id: Uuid, enabled: bool) -> Result<(), IntentionError> {
        let mut entry = self.triggers.get_mut(&trigger_id).ok_or(IntentionError::TriggerNotFound(trigger_id))?;
        entry.enabled = enabled;
        Ok(())
    }
}

trait OptStrEq {
    fn is_none_or_eq(&self, other: &str) -> bool;
}

impl OptStrEq for Option<&str> {
    fn is_none_or_eq(&self, other: &str) -> bool {
        match self {
            Some(s) => *s == other,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn express_intention_sets_expiry_from_type() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        let intention = sys.express_intention(
            "researcher-1",
            "Researcher One",
            "research_guild",
            IntentionType::MeetingRequest,
            "let's discuss",
            "full description",
            ExpressIntentionRequest::default(),
            now,
        );
        assert_eq!(intention.expires_at, Some(now + Duration::hours(72)));
    }

    #[test]
    fn autonomous_action_within_scope_is_approved() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        let mut context = HashMap::new();
        context.insert("action".to_string(), Value::String("run_backtest".to_string()));
        context.insert("compute_points".to_string(), serde_json::json!(10));
        let intention = sys.express_intention(
            "researcher-1",
            "Researcher One",
            "research_guild",
            IntentionType::AutonomousAction,
            "run a quick backtest",
            "desc",
            ExpressIntentionRequest { context, autonomous_scope: Some("research".to_string()), ..Default::default() },
            now,
        );
        assert!(intention.autonomous_approved);
    }

    #[test]
    fn autonomous_action_over_budget_is_not_approved() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        let mut context = HashMap::new();
        context.insert("action".to_string(), Value::String("run_backtest".to_string()));
        context.insert("compute_points".to_string(), serde_json::json!(999));
        let intention = sys.express_intention(
            "researcher-1",
            "Researcher One",
            "research_guild",
            IntentionType::AutonomousAction,
            "run a huge backtest",
            "desc",
            ExpressIntentionRequest { context, autonomous_scope: Some("research".to_string()), ..Default::default() },
            now,
        );
        assert!(!intention.autonomous_approved);
    }

    #[test]
    fn risk_trigger_fires_on_threshold_cross() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        let mut metrics = HashMap::new();
        metrics.insert("daily_pnl_pct".to_string(), -7.0);
        let raised = sys.check_risk_triggers(&metrics, now);
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].intention_type, IntentionType::RiskAlert);
        assert_eq!(raised[0].priority, IntentionPriority::Critical);

        let trigger = sys.triggers().into_iter().find(|t| t.metric == "daily_pnl_pct").unwrap();
        assert_eq!(trigger.trigger_count, 1);
    }

    #[test]
    fn risk_trigger_does_not_fire_below_threshold() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        let mut metrics = HashMap::new();
        metrics.insert("daily_pnl_pct".to_string(), -1.0);
        assert!(sys.check_risk_triggers(&metrics, now).is_empty());
    }

    #[test]
    fn disabled_trigger_does_not_fire() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        let trigger_id = sys.triggers().into_iter().find(|t| t.metric == "daily_pnl_pct").unwrap().id;
        sys.set_trigger_enabled(trigger_id, false).unwrap();

        let mut metrics = HashMap::new();
        metrics.insert("daily_pnl_pct".to_string(), -7.0);
        assert!(sys.check_risk_triggers(&metrics, now).is_empty());
    }

    #[test]
    fn list_expires_overdue_pending_and_sorts_by_priority() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        sys.express_intention(
            "a1",
            "Agent One",
            "dept",
            IntentionType::Feedback,
            "low prio",
            "desc",
            ExpressIntentionRequest { priority: Some(IntentionPriority::Low), ..Default::default() },
            now,
        );
        sys.express_intention(
            "a1",
            "Agent One",
            "dept",
            IntentionType::RiskAlert,
            "urgent",
            "desc",
            ExpressIntentionRequest { priority: Some(IntentionPriority::Critical), ..Default::default() },
            now,
        );
        let already_expired = sys.express_intention(
            "a1",
            "Agent One",
            "dept",
            IntentionType::DataRequest,
            "stale",
            "desc",
            ExpressIntentionRequest::default(),
            now - Duration::hours(200),
        );

        let listed = sys.list(None, None, None, None, now);
        assert_eq!(listed[0].priority, IntentionPriority::Critical);

        let expired = sys.get(already_expired.id).unwrap();
        let refreshed = sys.list(None, None, Some(IntentionStatus::Expired), None, now);
        assert!(refreshed.iter().any(|i| i.id == expired.id));
    }

    #[test]
    fn respond_transitions_status() {
        let sys = IntentionSystem::new();
        let now = Utc::now();
        let intention = sys.express_intention(
            "a1",
            "Agent One",
            "dept",
            IntentionType::Escalation,
            "escalate",
            "desc",
            ExpressIntentionRequest::default(),
            now,
        );
        let status = sys.respond(intention.id, "approve", Some("go ahead".to_string()), now).unwrap();
        assert_eq!(status, IntentionStatus::Approved);
    }

    #[test]
    fn respond_to_unknown_intention_errors() {
        let sys = IntentionSystem::new();
        let err = sys.respond(Uuid::new_v4(), "approve", None, Utc::now());
        assert!(matches!(err, Err(IntentionError::NotFound(_))));
    }
}
