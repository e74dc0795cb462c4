use async_trait::async_trait;

use super::{RoleBehavior, RoleContext};
use crate::company::task::Task;

/// No proactive work: the agent only ever acts in response to bus
/// messages. Correct default for roles §4.11 doesn't specify a
/// `CheckForWork` override for (Lead, Risk, Trader, Intelligence,
/// Director, Executive).
pub struct GenericRoleBehavior;

#[async_trait]
impl RoleBehavior for GenericRoleBehavior {
    async fn check_for_work(&self, _ctx: &RoleContext) -> Vec<Task> {
        Vec::new()
    }
}
