//! `memory.write` side-constraints: content length cap, mandatory refs, and
//! scope-dependent auto-approval.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::toolrouter::handler::{ToolContext, ToolHandler, ToolResult};

const MAX_CONTENT_LEN: usize = 500;

pub struct MemoryHandler;

#[async_trait]
impl ToolHandler for MemoryHandler {
    async fn handle(&self, tool_name: &str, args: Value, ctx: &ToolContext) -> ToolResult {
        match tool_name {
            "memory.write" => self.write(args, ctx),
            other => ToolResult::err(format!("memory handler has no method '{other}'"), ctx.now, ctx.now),
        }
    }
}

impl MemoryHandler {
    fn write(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let content = args.get("content").and_then(Value::as_str).unwrap_or("");
        if content.chars().count() > MAX_CONTENT_LEN {
            return ToolResult::err(
                format!("content exceeds {MAX_CONTENT_LEN} characters"),
                ctx.now,
                ctx.now,
            );
        }

        let refs: Vec<&str> = args
            .get("refs")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).filter(|r| !r.trim().is_empty()).collect())
            .unwrap_or_default();
        if refs.is_empty() {
            return ToolResult::err("refs must contain at least one non-empty reference", ctx.now, ctx.now);
        }

        let scope = args.get("scope").and_then(Value::as_str).unwrap_or("private");
        let approval_status = match scope {
            "private" => "approved",
            "team" | "org" => "pending_approval",
            other => return ToolResult::err(format!("unknown memory scope '{other}'"), ctx.now, ctx.now),
        };

        ToolResult::ok(
            json!({
                "agent": ctx.agent_id,
                "content": content,
                "refs": refs,
                "scope": scope,
                "approval_status": approval_status,
            }),
            ctx.now,
            ctx.now,
        )
    }
}
