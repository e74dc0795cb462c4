//! Wire types for the in-process message bus: [`Message`], [`MeetingRoom`],
//! and the channel/message kind taxonomies from the data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Priority-2 is reserved for system notifications (see `SendSystem`).
pub const SYSTEM_PRIORITY: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Direct,
    Broadcast,
    Department,
    Team,
    Meeting,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Memo,
    Task,
    Approval,
    System,
    Announcement,
    Discussion,
}

/// Immutable record carrying a single bus delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub channel_kind: ChannelKind,
    pub channel_id: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub subject: String,
    pub content: String,
    pub kind: MessageKind,
    pub metadata: HashMap<String, String>,
    pub priority: i32,
    pub requires_ack: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel_kind: ChannelKind,
        channel_id: Option<String>,
        from: impl Into<String>,
        to: Option<String>,
        subject: impl Into<String>,
        content: impl Into<String>,
        kind: MessageKind,
        metadata: HashMap<String, String>,
        priority: i32,
        requires_ack: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_kind,
            channel_id,
            from: from.into(),
            to,
            subject: subject.into(),
            content: content.into(),
            kind,
            metadata,
            priority,
            requires_ack,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Metric,
    Plot,
    Table,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingArtifact {
    pub id: Uuid,
    pub room_id: String,
    pub kind: ArtifactKind,
    pub title: Option<String>,
    pub data: serde_json::Value,
    pub presenter: String,
    pub created_at: DateTime<Utc>,
}

/// Ephemeral, ordered transcript bound to a participant set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRoom {
    pub id: String,
    pub title: String,
    pub host: String,
    pub participants: Vec<String>,
    pub transcript: Vec<Message>,
    pub artifacts: Vec<MeetingArtifact>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl MeetingRoom {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Running delivery counters, exposed through the operator surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BusStats {
    pub delivered: u64,
    pub failed: u64,
    pub history_len: usize,
    pub active_rooms: usize,
}
