//! The [`ToolHandler`] contract: category-bound execution, independent of
//! routing, permissions, and budget concerns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Context available to a handler beyond the raw arguments: which agent is
/// calling, from which department, and optionally which meeting room or
/// research cycle the call is scoped to.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub agent_id: String,
    pub department: String,
    pub meeting_room_id: Option<String>,
    pub research_cycle_id: Option<Uuid>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub data_version_hash: Option<String>,
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub artifact_ids: Vec<Uuid>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ToolResult {
    pub fn ok(data: Value, started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            data_version_hash: None,
            experiment_id: None,
            artifact_ids: Vec::new(),
            started_at,
            completed_at,
        }
    }

    pub fn err(error: impl Into<String>, started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            data_version_hash: None,
            experiment_id: None,
            artifact_ids: Vec::new(),
            started_at,
            completed_at,
        }
    }
}

/// A category-bound tool implementation. Handlers never see permissions or
/// budget state; the router enforces those before dispatch.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, tool_name: &str, args: Value, ctx: &ToolContext) -> ToolResult;
}
