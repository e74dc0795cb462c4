//! Generic handler for categories with no side-constraints of their own
//! (market data, intelligence search, trade placement): echoes the
//! arguments back as the result payload. Real data-source/exchange
//! integration is out of scope; the router's permission and budget
//! enforcement around these calls is what the spec actually tests.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::toolrouter::handler::{ToolContext, ToolHandler, ToolResult};

pub struct PassthroughHandler;

#[async_trait]
impl ToolHandler for PassthroughHandler {
    async fn handle(&self, tool_name: &str, args: Value, ctx: &ToolContext) -> ToolResult {
        ToolResult::ok(json!({"tool": tool_name, "args": args}), ctx.now, ctx.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_args() {
        let ctx = ToolContext {
            agent_id: "r1".into(),
            department: "research".into(),
            meeting_room_id: None,
            research_cycle_id: None,
            now: chrono::Utc::now(),
        };
        let result = PassthroughHandler
            .handle("market.history", json!({"symbol": "AAPL"}), &ctx)
            .await;
        assert!(result.success);
        assert_eq!(result.data.unwrap()["tool"], "market.history");
    }
}
