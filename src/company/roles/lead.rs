use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use serde_json::json;

use super::{RoleBehavior, RoleContext};
use crate::company::task::{Priority, Task, TaskKind};

const COOLDOWN: ChronoDuration = ChronoDuration::minutes(5);

/// A Lead's proactive behavior: when idle, periodically check whether
/// any research cycle or topic is waiting on this agent's own gate
/// review. §4.11 names this in one line ("a Lead reviews incoming
/// proposals") without the numeric detail §4.11 gives Researcher, so
/// the cooldown mirrors Researcher's rather than inventing a new
/// number, per the backpressure note that every `CheckForWork` must be
/// cooldowned.
pub struct LeadBehavior {
    last_check: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
}

impl LeadBehavior {
    pub fn new() -> Self {
        Self { last_check: Mutex::new(None) }
    }
}

impl Default for LeadBehavior {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleBehavior for LeadBehavior {
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
            TaskKind::Custom { name: "review_pending_proposals".to_string(), payload: json!({}) },
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
        RoleContext { agent_id: "lead-1".into(), now, queue_is_empty: true, has_current_topic: false, ideas_awaiting_validation: false }
    }

    #[tokio::test]
    async fn enqueues_review_when_idle() {
        let behavior = LeadBehavior::new();
        let tasks = behavior.check_for_work(&ctx(chrono::Utc::now())).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind.label(), "review_pending_proposals");
    }

    #[tokio::test]
    async fn respects_cooldown() {
        let behavior = LeadBehavior::new();
        let t0 = chrono::Utc::now();
        assert_eq!(behavior.check_for_work(&ctx(t0)).await.len(), 1);
        assert!(behavior.check_for_work(&ctx(t0 + chrono::Duration::minutes(1))).await.is_empty());
        assert_eq!(behavior.check_for_work(&ctx(t0 + chrono::Duration::minutes(6))).await.len(), 1);
    }

    #[tokio::test]
    async fn no_work_when_queue_not_empty() {
        let behavior = LeadBehavior::new();
        let mut c = ctx(chrono::Utc::now());
        c.queue_is_empty = false;
        assert!(behavior.check_for_work(&c).await.is_empty());
    }
}
