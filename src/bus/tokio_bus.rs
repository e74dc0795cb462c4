//! [`TokioMessageBus`]: the default [`MessageBus`] implementation, backed by
//! per-agent bounded FIFO mailboxes and a `DashMap` subscriber registry.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::traits::{BusError, MessageBus, MessageFilter, SubscriptionId};
use super::types::{
    ArtifactKind, BusStats, ChannelKind, MeetingArtifact, MeetingRoom, Message, MessageKind,
};

struct Mailbox {
    queue: Mutex<VecDeque<Message>>,
    notify: Notify,
    cap: usize,
}

impl Mailbox {
    fn new(cap: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            cap,
        }
    }

    fn push(&self, msg: Message) {
        let mut q = self.queue.lock();
        if q.len() >= self.cap {
            q.pop_front();
        }
        q.push_back(msg);
        drop(q);
        self.notify.notify_waiters();
    }
}

struct Subscription {
    subscriber_id: String,
    channel_kind: ChannelKind,
    channel_id: String,
    filter: Option<MessageFilter>,
}

/// Default [`MessageBus`]. All cross-mailbox state lives in `DashMap`s so
/// independent channel kinds never contend on a single global lock.
pub struct TokioMessageBus {
    mailboxes: DashMap<String, Arc<Mailbox>>,
    subscriptions: DashMap<SubscriptionId, Subscription>,
    rooms: DashMap<String, Mutex<MeetingRoom>>,
    history: Mutex<VecDeque<Message>>,
    history_cap: usize,
    mailbox_cap: usize,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl TokioMessageBus {
    pub fn new(mailbox_cap: usize, history_cap: usize) -> Arc<Self> {
        Arc::new(Self {
            mailboxes: DashMap::new(),
            subscriptions: DashMap::new(),
            rooms: DashMap::new(),
            history: Mutex::new(VecDeque::new()),
            history_cap,
            mailbox_cap,
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        })
    }

    fn record_history(&self, msg: &Message) {
        let mut h = self.history.lock();
        if h.len() >= self.history_cap {
            h.pop_front();
        }
        h.push_back(msg.clone());
    }

    fn deliver_to(&self, agent_id: &str, msg: Message) -> bool {
        match self.mailboxes.get(agent_id) {
            Some(mailbox) => {
                mailbox.push(msg.clone());
                self.record_history(&msg);
                self.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => {
                warn!(agent_id, "bus: delivery to unknown mailbox");
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.record_history(&msg);
                false
            }
        }
    }

}

#[async_trait]
impl MessageBus for TokioMessageBus {
    fn register_mailbox(&self, agent_id: &str) {
        self.mailboxes
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mailbox::new(self.mailbox_cap)));
    }

    async fn send_direct(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        content: &str,
        kind: MessageKind,
        metadata: HashMap<String, String>,
        priority: i32,
    ) -> Message {
        let msg = Message::new(
            ChannelKind::Direct,
            None,
            from,
            Some(to.to_string()),
            subject,
            content,
            kind,
            metadata,
            priority,
            false,
            Utc::now(),
        );
        self.deliver_to(to, msg.clone());
        msg
    }

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
    ) -> Message {
        let msg = Message::new(
            channel_kind,
            Some(channel_id.to_string()),
            from,
            None,
            subject,
            content,
            kind,
            metadata,
            priority,
            false,
            Utc::now(),
        );

        let targets: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|s| {
                s.channel_kind == channel_kind
                    && (s.channel_id == "*" || s.channel_id == channel_id)
                    && s.filter.as_ref().is_none_or(|f| f(&msg))
            })
            .map(|s| s.subscriber_id.clone())
            .collect();

        for target in targets {
            if target != from {
                self.deliver_to(&target, msg.clone());
            }
        }
        self.record_history(&msg);
        msg
    }

    async fn broadcast(
        &self,
        from: &str,
        subject: &str,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> Message {
        let msg = Message::new(
            ChannelKind::Broadcast,
            None,
            from,
            None,
            subject,
            content,
            MessageKind::Announcement,
            metadata,
            0,
            false,
            Utc::now(),
        );

        for entry in self.mailboxes.iter() {
            let agent_id = entry.key();
            if agent_id != from {
                self.deliver_to(agent_id, msg.clone());
            }
        }
        self.record_history(&msg);
        msg
    }

    async fn send_system(&self, to: &str, subject: &str, content: &str) -> Message {
        let msg = Message::new(
            ChannelKind::System,
            None,
            "system",
            Some(to.to_string()),
            subject,
            content,
            MessageKind::System,
            HashMap::new(),
            super::types::SYSTEM_PRIORITY,
            false,
            Utc::now(),
        );
        self.deliver_to(to, msg.clone());
        msg
    }

    async fn create_meeting_room(
        &self,
        id: &str,
        title: &str,
        host: &str,
        participants: Vec<String>,
    ) -> Result<MeetingRoom, BusError> {
        if self.rooms.contains_key(id) {
            return Err(BusError::RoomAlreadyExists(id.to_string()));
        }

        let room = MeetingRoom {
            id: id.to_string(),
            title: title.to_string(),
            host: host.to_string(),
            participants: participants.clone(),
            transcript: Vec::new(),
            artifacts: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        };
        self.rooms.insert(id.to_string(), Mutex::new(room.clone()));

        for participant in &participants {
            self.send_system(
                participant,
                &format!("meeting: {title}"),
                &format!("You have been invited to meeting room '{id}': {title}"),
            )
            .await;
        }

        debug!(room_id = id, participants = participants.len(), "bus: meeting room created");
        Ok(room)
    }

    async fn send_to_meeting(
        &self,
        room_id: &str,
        from: &str,
        content: &str,
        kind: MessageKind,
    ) -> Option<Message> {
        let room_entry = self.rooms.get(room_id)?;
        let mut room = room_entry.lock();
        if !room.is_active() {
            return None;
        }

        let msg = Message::new(
            ChannelKind::Meeting,
            Some(room_id.to_string()),
            from,
            None,
            room.title.clone(),
            content,
            kind,
            HashMap::new(),
            0,
            false,
            Utc::now(),
        );
        room.transcript.push(msg.clone());
        let participants = room.participants.clone();
        drop(room);

        for participant in participants {
            if participant != from {
                self.deliver_to(&participant, msg.clone());
            }
        }
        Some(msg)
    }

    async fn add_meeting_artifact(
        &self,
        room_id: &str,
        kind: ArtifactKind,
        data: serde_json::Value,
        title: Option<String>,
        presenter: &str,
    ) -> Result<MeetingArtifact, BusError> {
        let room_entry = self
            .rooms
            .get(room_id)
            .ok_or_else(|| BusError::RoomNotFound(room_id.to_string()))?;
        let mut room = room_entry.lock();
        if !room.is_active() {
            return Err(BusError::RoomNotActive(room_id.to_string()));
        }

        let artifact = MeetingArtifact {
            id: uuid::Uuid::new_v4(),
            room_id: room_id.to_string(),
            kind,
            title,
            data,
            presenter: presenter.to_string(),
            created_at: Utc::now(),
        };
        room.artifacts.push(artifact.clone());
        Ok(artifact)
    }

    async fn end_meeting(&self, room_id: &str) -> Result<MeetingRoom, BusError> {
        let room_entry = self
            .rooms
            .get(room_id)
            .ok_or_else(|| BusError::RoomNotFound(room_id.to_string()))?;
        let (participants, title, snapshot) = {
            let mut room = room_entry.lock();
            room.ended_at = Some(Utc::now());
            (room.participants.clone(), room.title.clone(), room.clone())
        };

        for participant in participants {
            self.send_system(
                &participant,
                &format!("meeting ended: {title}"),
                &format!("Meeting room '{room_id}' has concluded."),
            )
            .await;
        }

        Ok(snapshot)
    }

    fn subscribe(
        &self,
        subscriber_id: &str,
        channel_kind: ChannelKind,
        channel_id: &str,
        filter: Option<MessageFilter>,
    ) -> SubscriptionId {
        let id = uuid::Uuid::new_v4();
        self.subscriptions.insert(
            id,
            Subscription {
                subscriber_id: subscriber_id.to_string(),
                channel_kind,
                channel_id: channel_id.to_string(),
                filter,
            },
        );
        id
    }

    async fn get_messages(&self, agent_id: &str, timeout_ms: u64, max_n: usize) -> Vec<Message> {
        let Some(mailbox) = self.mailboxes.get(agent_id).map(|m| m.clone()) else {
            return Vec::new();
        };

        {
            let q = mailbox.queue.lock();
            if !q.is_empty() {
                drop(q);
                return drain(&mailbox, max_n);
            }
        }

        let _ = tokio::time::timeout(Duration::from_millis(timeout_ms), mailbox.notify.notified())
            .await;
        drain(&mailbox, max_n)
    }

    fn peek_messages(&self, agent_id: &str, max_n: usize) -> Vec<Message> {
        match self.mailboxes.get(agent_id) {
            Some(mailbox) => mailbox.queue.lock().iter().take(max_n).cloned().collect(),
            None => Vec::new(),
        }
    }

    fn stats(&self) -> BusStats {
        BusStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            history_len: self.history.lock().len(),
            active_rooms: self.rooms.iter().filter(|r| r.lock().is_active()).count(),
        }
    }

    fn get_room(&self, room_id: &str) -> Option<MeetingRoom> {
        self.rooms.get(room_id).map(|r| r.lock().clone())
    }
}

fn drain(mailbox: &Mailbox, max_n: usize) -> Vec<Message> {
    let mut q = mailbox.queue.lock();
    let n = max_n.min(q.len());
    q.drain(..n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> Arc<TokioMessageBus> {
        TokioMessageBus::new(10_000, 10_000)
    }

    #[tokio::test]
    async fn mailbox_fifo_order_preserved() {
        let bus = bus();
        bus.register_mailbox("b");
        for i in 0..5 {
            bus.send_direct(
                "a",
                "b",
                "s",
                &format!("msg-{i}"),
                MessageKind::Text,
                HashMap::new(),
                0,
            )
            .await;
        }
        let msgs = bus.get_messages("b", 50, 10).await;
        let contents: Vec<_> = msgs.iter().map(|m| m.content.clone()).collect();
        assert_eq!(
            contents,
            vec!["msg-0", "msg-1", "msg-2", "msg-3", "msg-4"]
        );
    }

    #[tokio::test]
    async fn send_direct_to_missing_mailbox_counts_as_failure() {
        let bus = bus();
        let before = bus.stats().failed;
        let msg = bus
            .send_direct("a", "ghost", "s", "c", MessageKind::Text, HashMap::new(), 0)
            .await;
        assert_eq!(msg.to.as_deref(), Some("ghost"));
        assert_eq!(bus.stats().failed, before + 1);
    }

    #[tokio::test]
    async fn broadcast_excludes_sender() {
        let bus = bus();
        bus.register_mailbox("chairman");
        bus.register_mailbox("a");
        bus.register_mailbox("b");

        bus.broadcast("chairman", "Announcement", "hello", HashMap::new())
            .await;

        assert!(bus.peek_messages("chairman", 10).is_empty());
        assert_eq!(bus.peek_messages("a", 10).len(), 1);
        assert_eq!(bus.peek_messages("b", 10).len(), 1);
    }

    #[tokio::test]
    async fn meeting_room_lifecycle() {
        let bus = bus();
        bus.register_mailbox("host");
        bus.register_mailbox("p1");

        let room = bus
            .create_meeting_room("standup_1", "Daily Standup", "host", vec!["p1".to_string()])
            .await
            .unwrap();
        assert!(room.is_active());

        let sent = bus
            .send_to_meeting("standup_1", "host", "agenda", MessageKind::Text)
            .await;
        assert!(sent.is_some());

        let ended = bus.end_meeting("standup_1").await.unwrap();
        assert!(!ended.is_active());
        assert_eq!(ended.transcript.len(), 1);

        // Sending after end is a no-op.
        let after = bus
            .send_to_meeting("standup_1", "host", "late", MessageKind::Text)
            .await;
        assert!(after.is_none());
    }

    #[tokio::test]
    async fn send_to_meeting_missing_room_is_none() {
        let bus = bus();
        let result = bus
            .send_to_meeting("nope", "host", "hi", MessageKind::Text)
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn history_is_capped() {
        let bus = TokioMessageBus::new(10_000, 3);
        bus.register_mailbox("b");
        for i in 0..5 {
            bus.send_direct(
                "a",
                "b",
                "s",
                &format!("m{i}"),
                MessageKind::Text,
                HashMap::new(),
                0,
            )
            .await;
        }
        assert_eq!(bus.stats().history_len, 3);
    }

    #[tokio::test]
    async fn get_messages_times_out_with_empty_mailbox() {
        let bus = bus();
        bus.register_mailbox("b");
        let msgs = bus.get_messages("b", 20, 10).await;
        assert!(msgs.is_empty());
    }

    #[tokio::test]
    async fn group_send_honors_subscription_filter() {
        let bus = bus();
        bus.register_mailbox("a");
        bus.register_mailbox("b");
        bus.subscribe("a", ChannelKind::Department, "research", None);
        bus.subscribe(
            "b",
            ChannelKind::Department,
            "research",
            Some(Arc::new(|m: &Message| m.content.contains("urgent"))),
        );

        bus.send_to_group(
            ChannelKind::Department,
            "system",
            "research",
            "s",
            "routine update",
            MessageKind::Text,
            HashMap::new(),
            0,
        )
        .await;

        assert_eq!(bus.peek_messages("a", 10).len(), 1);
        assert_eq!(bus.peek_messages("b", 10).len(), 0);
    }
}
