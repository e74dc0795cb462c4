//! `meeting.present` side-constraint: only callable from inside an active
//! meeting room, binding the resulting card to (meeting, presenter, time).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::bus::MessageBus;
use crate::toolrouter::handler::{ToolContext, ToolHandler, ToolResult};

pub struct MeetingHandler {
    bus: Arc<dyn MessageBus>,
}

impl MeetingHandler {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl ToolHandler for MeetingHandler {
    async fn handle(&self, tool_name: &str, args: Value, ctx: &ToolContext) -> ToolResult {
        match tool_name {
            "meeting.present" => self.present(args, ctx),
            other => ToolResult::err(format!("meeting handler has no method '{other}'"), ctx.now, ctx.now),
        }
    }
}

impl MeetingHandler {
    fn present(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let Some(room_id) = &ctx.meeting_room_id else {
            return ToolResult::err("meeting.present requires an active meeting room context", ctx.now, ctx.now);
        };
        match self.bus.get_room(room_id) {
            Some(room) if room.is_active() => ToolResult::ok(
                json!({
                    "room_id": room_id,
                    "presenter": ctx.agent_id,
                    "presented_at": ctx.now,
                    "card": args,
                }),
                ctx.now,
                ctx.now,
            ),
            Some(_) => ToolResult::err(format!("meeting room '{room_id}' is no longer active"), ctx.now, ctx.now),
            None => ToolResult::err(format!("meeting room '{room_id}' does not exist"), ctx.now, ctx.now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::TokioMessageBus;

    fn ctx(room: Option<String>) -> ToolContext {
        ToolContext {
            agent_id: "r1".into(),
            department: "research".into(),
            meeting_room_id: room,
            research_cycle_id: None,
            now: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn rejects_outside_meeting_context() {
        let bus = TokioMessageBus::new(100, 100);
        let handler = MeetingHandler::new(bus);
        let result = handler.handle("meeting.present", json!({}), &ctx(None)).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn rejects_unknown_room() {
        let bus = TokioMessageBus::new(100, 100);
        let handler = MeetingHandler::new(bus);
        let result = handler
            .handle("meeting.present", json!({}), &ctx(Some("ghost".into())))
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn succeeds_inside_active_room() {
        let bus = TokioMessageBus::new(100, 100);
        bus.register_mailbox("host");
        bus.create_meeting_room("m1", "Standup", "host", vec![]).await.unwrap();
        let handler = MeetingHandler::new(bus);
        let result = handler
            .handle("meeting.present", json!({"title": "slide"}), &ctx(Some("m1".into())))
            .await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn rejects_ended_room() {
        let bus = TokioMessageBus::new(100, 100);
        bus.create_meeting_room("m1", "Standup", "host", vec![]).await.unwrap();
        bus.end_meeting("m1").await.unwrap();
        let handler = MeetingHandler::new(bus);
        let result = handler
            .handle("meeting.present", json!({}), &ctx(Some("m1".into())))
            .await;
        assert!(!result.success);
    }
}
