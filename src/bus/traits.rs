//! The [`MessageBus`] trait: in-process pub/sub across direct, broadcast,
//! group, and meeting-room channels.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ArtifactKind, BusStats, ChannelKind, MeetingArtifact, MeetingRoom, Message, MessageKind};

#[derive(Debug, Error)]
pub enum BusError {
    #[error("meeting room '{0}' does not exist")]
    RoomNotFound(String),
    #[error("meeting room '{0}' is no longer active")]
    RoomNotActive(String),
    #[error("meeting room '{0}' already exists")]
    RoomAlreadyExists(String),
}

/// A subscriber-supplied predicate deciding whether a given message should
/// be delivered to it. Must not panic; the bus isolates callback failures
/// so a misbehaving filter cannot block delivery to other subscribers.
pub type MessageFilter = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

pub type SubscriptionId = uuid::Uuid;

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Register a mailbox for `agent_id`. Idempotent.
    fn register_mailbox(&self, agent_id: &str);

    /// Appends to the receiver's mailbox; fails silently (counted in bus
    /// statistics) if the receiver has no mailbox. The call still returns
    /// the constructed `Message`.
    #[allow(clippy::too_many_arguments)]
    async fn send_direct(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        content: &str,
        kind: MessageKind,
        metadata: HashMap<String, String>,
        priority: i32,
    ) -> Message;

    /// Fans out to every subscriber registered for `channel_kind` + `channel_id`.
    #[allow(clippy::too_many_arguments)]
    async fn send_to_group(
        &self,
        channel_kind: ChannelKind,
        from: &str,
        channel_id: &str,
        subject: &str,
        content: &str,
        kind: MessageKind,
        metadata: HashMap<String, String>,
        priority: i32,
    ) -> Message;

    /// Delivered to every subscriber of kind=broadcast AND to every
    /// registered mailbox except the sender's.
    async fn broadcast(
        &self,
        from: &str,
        subject: &str,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> Message;

    /// Priority-2 system notification sent directly to `to`.
    async fn send_system(&self, to: &str, subject: &str, content: &str) -> Message;

    /// Idempotent on `id`: creating a room that already exists is an error.
    async fn create_meeting_room(
        &self,
        id: &str,
        title: &str,
        host: &str,
        participants: Vec<String>,
    ) -> Result<MeetingRoom, BusError>;

    /// No-op (returns `None`) if the room is not active.
    async fn send_to_meeting(
        &self,
        room_id: &str,
        from: &str,
        content: &str,
        kind: MessageKind,
    ) -> Option<Message>;

    async fn add_meeting_artifact(
        &self,
        room_id: &str,
        kind: ArtifactKind,
        data: serde_json::Value,
        title: Option<String>,
        presenter: &str,
    ) -> Result<MeetingArtifact, BusError>;

    /// Finalizes the transcript, notifies participants, and removes the
    /// room from the active set while retaining it for later retrieval.
    async fn end_meeting(&self, room_id: &str) -> Result<MeetingRoom, BusError>;

    fn subscribe(
        &self,
        subscriber_id: &str,
        channel_kind: ChannelKind,
        channel_id: &str,
        filter: Option<MessageFilter>,
    ) -> SubscriptionId;

    /// Pulls up to `max_n` messages within `timeout_ms`, removing them from
    /// the mailbox (destructive read).
    async fn get_messages(&self, agent_id: &str, timeout_ms: u64, max_n: usize) -> Vec<Message>;

    /// Non-destructive peek of up to `max_n` messages.
    fn peek_messages(&self, agent_id: &str, max_n: usize) -> Vec<Message>;

    fn stats(&self) -> BusStats;

    fn get_room(&self, room_id: &str) -> Option<MeetingRoom>;
}
