use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use serde_json::json;

use super::{RoleBehavior, RoleContext};
use crate::company::task::{Priority, Task, TaskKind};

const COOLDOWN: ChronoDuration = ChronoDuration::minutes(5);

/// A Risk agent's proactive behavior: when idle, periodically pull the
/// latest metric snapshot against the risk-trigger table. §4.11 names
/// this in one line ("Risk evaluates trigger snapshots"); the cooldown
/// mirrors Researcher's for the same reason `LeadBehavior`'s does.
pub struct RiskBehavior {
    last_check: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
}

impl RiskBehavior {
    pub fn new() -> Self {
        Self { last_check: Mutex::new(None) }
    }
}

impl Default for RiskBehavior {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleBehavior for RiskBehavior {
    async fn check_for_work(&self, ctx: &RoleContext) -> Vec<Task> {
        if !ctx.queue_is_empty {
            return Vec::new();
        }

        let mut last = self.last_check.lock();
        if let Some(prev) = *last
            && ctx.now - prev < COOLDOWN
        {
            return Vec::new();
        }
        *last = Some(ctx.now);
        drop(last);

        vec![Task::new(
            TaskKind::Custom { name: "evaluate_risk_triggers".to_string(), payload: json!({}) },
            Priority::Normal,
            3,
            ctx.now,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(now: chrono::DateTime<chrono::Utc>) -> RoleContext {
        RoleContext { agent_id: "risk-1".into(), now, queue_is_empty: true, has_current_topic: false, ideas_awaiting_validation: false }
    }

    #[tokio::test]
    async fn enqueues_trigger_evaluation_when_idle() {
        let behavior = RiskBehavior::new();
        let tasks = behavior.check_for_work(&ctx(chrono::Utc::now())).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind.label(), "evaluate_risk_triggers");
    }

    #[tokio::test]
    async fn respects_cooldown() {
        let behavior = RiskBehavior::new();
        let t0 = chrono::Utc::now();
        assert_eq!(behavior.check_for_work(&ctx(t0)).await.len(), 1);
        assert!(behavior.check_for_work(&ctx(t0 + chrono::Duration::minutes(1))).await.is_empty());
    }
}
