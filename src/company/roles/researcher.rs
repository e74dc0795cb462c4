use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use rand::Rng;
use serde_json::json;

use super::{RoleBehavior, RoleContext};
use crate::company::task::{Priority, Task, TaskKind};

const COOLDOWN: ChronoDuration = ChronoDuration::minutes(5);
const OBSERVE_MARKET_PROBABILITY: f64 = 0.3;

/// A Researcher's proactive behavior: look for a new opportunity when idle,
/// validate pending ideas before anything else, and otherwise occasionally
/// go observe the market. Runs on a 5-minute cooldown so an idle agent
/// doesn't spam its own queue every tick.
pub struct ResearcherBehavior {
    last_check: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
}

impl ResearcherBehavior {
    pub fn new() -> Self {
        Self {
            last_check: Mutex::new(None),
        }
    }
}

impl Default for ResearcherBehavior {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleBehavior for ResearcherBehavior {
    async fn check_for_work(&self, ctx: &RoleContext) -> Vec<Task> {
        if !ctx.queue_is_empty {
            return Vec::new();
        }

        {
            let mut last = self.last_check.lock();
            if let Some(prev) = *last
                && ctx.now - prev < COOLDOWN
            {
                return Vec::new();
            }
            *last = Some(ctx.now);
        }

        if !ctx.has_current_topic {
            return vec![Task::new(
                TaskKind::Custom {
                    name: "find_research_opportunity".to_string(),
                    payload: json!({}),
                },
                Priority::Normal,
                3,
                ctx.now,
            )];
        }

        if ctx.ideas_awaiting_validation {
            return vec![Task::new(
                TaskKind::Custom {
                    name: "validate_idea".to_string(),
                    payload: json!({}),
                },
                Priority::Normal,
                3,
                ctx.now,
            )];
        }

        if rand::thread_rng().gen_bool(OBSERVE_MARKET_PROBABILITY) {
            return vec![Task::new(
                TaskKind::Custom {
                    name: "observe_market".to_string(),
                    payload: json!({}),
                },
                Priority::Low,
                3,
                ctx.now,
            )];
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(now: chrono::DateTime<chrono::Utc>, has_topic: bool, ideas: bool) -> RoleContext {
        RoleContext {
            agent_id: "r1".into(),
            now,
            queue_is_empty: true,
            has_current_topic: has_topic,
            ideas_awaiting_validation: ideas,
        }
    }

    #[tokio::test]
    async fn finds_opportunity_when_no_current_topic() {
        let behavior = ResearcherBehavior::new();
        let tasks = behavior.check_for_work(&ctx(chrono::Utc::now(), false, false)).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind.label(), "find_research_opportunity");
    }

    #[tokio::test]
    async fn validates_idea_before_observing_market() {
        let behavior = ResearcherBehavior::new();
        let tasks = behavior.check_for_work(&ctx(chrono::Utc::now(), true, true)).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind.label(), "validate_idea");
    }

    #[tokio::test]
    async fn respects_cooldown() {
        let behavior = ResearcherBehavior::new();
        let t0 = chrono::Utc::now();
        let first = behavior.check_for_work(&ctx(t0, false, false)).await;
        assert_eq!(first.len(), 1);

        let second = behavior.check_for_work(&ctx(t0 + chrono::Duration::minutes(1), false, false)).await;
        assert!(second.is_empty());

        let third = behavior
            .check_for_work(&ctx(t0 + chrono::Duration::minutes(6), false, false))
            .await;
        assert_eq!(third.len(), 1);
    }

    #[tokio::test]
    async fn no_work_when_queue_not_empty() {
        let behavior = ResearcherBehavior::new();
        let mut c = ctx(chrono::Utc::now(), false, false);
        c.queue_is_empty = false;
        assert!(behavior.check_for_work(&c).await.is_empty());
    }
}
