//! [`AgentRuntime`]: the cooperative per-agent loop (§4.4) — get messages,
//! handle them, check for proactive work, process one task per tick.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, warn};

use super::llm::LlmClient;
use super::queue::AgentTaskQueue;
use super::roles::{RoleBehavior, RoleContext};
use super::task::{Priority, Task, TaskKind};
use crate::bus::{ChannelKind, MessageBus, MessageKind, Message};

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub activity_type: String,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct AgentRuntimeConfig {
    pub agent_interval: Duration,
    pub get_messages_timeout: Duration,
    pub get_messages_max: usize,
    pub call_timeout: Duration,
    pub activity_cap: usize,
    pub history_cap: usize,
    pub max_retries: u32,
}

impl Default for AgentRuntimeConfig {
    fn default() -> Self {
        Self {
            agent_interval: Duration::from_secs(2),
            get_messages_timeout: Duration::from_millis(100),
            get_messages_max: 10,
            call_timeout: Duration::from_secs(60),
            activity_cap: 100,
            history_cap: 50,
            max_retries: 3,
        }
    }
}

pub struct AgentRuntime {
    pub agent_id: String,
    pub department: String,
    bus: Arc<dyn MessageBus>,
    queue: Arc<AgentTaskQueue>,
    llm: Arc<dyn LlmClient>,
    behavior: Box<dyn RoleBehavior>,
    activity_log: Mutex<VecDeque<ActivityEntry>>,
    conversation_history: Mutex<VecDeque<ConversationEntry>>,
    running: Arc<AtomicBool>,
    config: AgentRuntimeConfig,
    has_current_topic: AtomicBool,
    ideas_awaiting_validation: AtomicBool,
}

impl AgentRuntime {
    pub fn new(
        agent_id: impl Into<String>,
        department: impl Into<String>,
        bus: Arc<dyn MessageBus>,
        llm: Arc<dyn LlmClient>,
        behavior: Box<dyn RoleBehavior>,
        config: AgentRuntimeConfig,
    ) -> Self {
        let agent_id = agent_id.into();
        bus.register_mailbox(&agent_id);
        Self {
            agent_id,
            department: department.into(),
            bus,
            queue: Arc::new(AgentTaskQueue::new()),
            llm,
            behavior,
            activity_log: Mutex::new(VecDeque::new()),
            conversation_history: Mutex::new(VecDeque::new()),
            running: Arc::new(AtomicBool::new(false)),
            config,
            has_current_topic: AtomicBool::new(false),
            ideas_awaiting_validation: AtomicBool::new(false),
        }
    }

    pub fn queue(&self) -> Arc<AgentTaskQueue> {
        self.queue.clone()
    }

    pub fn activity_log(&self) -> Vec<ActivityEntry> {
        self.activity_log.lock().iter().cloned().collect()
    }

    pub fn conversation_history(&self) -> Vec<ConversationEntry> {
        self.conversation_history.lock().iter().cloned().collect()
    }

    /// Timestamp of the most recent activity-log entry, used by the
    /// scheduler's health-check job to flag idle agents.
    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.activity_log.lock().back().map(|e| e.timestamp)
    }

    /// Signals from outside the loop (e.g. the research-cycle state
    /// machine, once wired) that this researcher is or isn't currently
    /// chasing a topic / has ideas awaiting validation. `CheckForWork`
    /// reads these each tick.
    pub fn set_has_current_topic(&self, value: bool) {
        self.has_current_topic.store(value, Ordering::Relaxed);
    }

    pub fn set_ideas_awaiting_validation(&self, value: bool) {
        self.ideas_awaiting_validation.store(value, Ordering::Relaxed);
    }

    fn log_activity(&self, activity_type: impl Into<String>, details: impl Into<String>, now: DateTime<Utc>) {
        let mut log = self.activity_log.lock();
        if log.len() >= self.config.activity_cap {
            log.pop_front();
        }
        log.push_back(ActivityEntry {
            timestamp: now,
            activity_type: activity_type.into(),
            details: details.into(),
        });
    }

    fn push_history(&self, role: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>) {
        let mut history = self.conversation_history.lock();
        if history.len() >= self.config.history_cap {
            history.pop_front();
        }
        history.push_back(ConversationEntry {
            timestamp: now,
            role: role.into(),
            content: content.into(),
        });
    }

    async fn handle_bus_message(&self, msg: Message) {
        let now = Utc::now();
        match msg.channel_kind {
            ChannelKind::System => {
                self.log_activity("system_message", msg.content.clone(), now);
            }
            ChannelKind::Meeting => {
                let agenda = msg.content.clone();
                let meeting_id = msg.channel_id.clone().unwrap_or_default();
                self.queue.push(Task::new(
                    TaskKind::Meeting { meeting_id, agenda },
                    Priority::High,
                    self.config.max_retries,
                    now,
                ));
            }
            _ => {
                self.queue.push(Task::new(
                    TaskKind::Respond {
                        message: msg.content.clone(),
                        from: msg.from.clone(),
                    },
                    Priority::Normal,
                    self.config.max_retries,
                    now,
                ));
            }
        }
        self.push_history("user", format!("[{}] {}", msg.from, msg.content), now);
    }

    async fn check_for_work(&self) {
        let now = Utc::now();
        let ctx = RoleContext {
            agent_id: self.agent_id.clone(),
            now,
            queue_is_empty: self.queue.is_empty(),
            has_current_topic: self.has_current_topic.load(Ordering::Relaxed),
            ideas_awaiting_validation: self.ideas_awaiting_validation.load(Ordering::Relaxed),
        };
        for task in self.behavior.check_for_work(&ctx).await {
            self.queue.push(task);
        }
    }

    async fn process_next_task(&self) {
        let Some(task) = self.queue.try_pop() else {
            return;
        };
        let now = Utc::now();

        if task.is_past_deadline(now) {
            self.log_activity("task_failed", format!("{} missed its deadline", task.kind.label()), now);
            return;
        }

        let outcome = self.run_task(&task).await;
        match outcome {
            Ok(detail) => self.log_activity("task_completed", detail, now),
            Err(e) => {
                warn!(agent_id = %self.agent_id, task = task.kind.label(), "task failed: {e}");
                if self.queue.retry(task.clone()) {
                    self.log_activity("task_retry", format!("{}: {e}", task.kind.label()), now);
                } else {
                    self.log_activity("task_failed", format!("{}: {e}", task.kind.label()), now);
                }
            }
        }
    }

    async fn think(&self, prompt: &str, ctx: Option<serde_json::Value>) -> Result<String, String> {
        match tokio::time::timeout(self.config.call_timeout, self.llm.think(prompt, ctx)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("llm call exceeded {:?}", self.config.call_timeout)),
        }
    }

    async fn run_task(&self, task: &Task) -> Result<String, String> {
        let now = Utc::now();
        match &task.kind {
            TaskKind::Think { prompt } => {
                let result = self.think(prompt, None).await?;
                self.push_history("assistant", result.clone(), now);
                Ok(result)
            }
            TaskKind::Respond { message, from } => {
                let prompt = format!("As {}, respond to a message from {from}: {message}", self.agent_id);
                let reply = self.think(&prompt, None).await?;
                self.bus
                    .send_direct(&self.agent_id, from, "Re:", &reply, MessageKind::Text, Default::default(), 0)
                    .await;
                self.push_history("assistant", reply.clone(), now);
                Ok(reply)
            }
            TaskKind::Review { item, review_type } => {
                let prompt = format!("Review this {review_type} item and reply with approved, rejected, or need_revision: {item}");
                let decision = self.think(&prompt, None).await?;
                Ok(decision)
            }
            TaskKind::Report { report_type, data } => {
                let prompt = format!("Produce a {report_type} report from: {data}");
                self.think(&prompt, None).await
            }
            TaskKind::Meeting { meeting_id, agenda } => {
                let transcript = self
                    .bus
                    .get_room(meeting_id)
                    .map(|r| r.transcript)
                    .unwrap_or_default();
                let prompt = format!(
                    "Meeting agenda: {agenda}\nRecent transcript: {} messages.",
                    transcript.len()
                );
                let contribution = self.think(&prompt, None).await?;
                self.bus
                    .send_to_meeting(meeting_id, &self.agent_id, &contribution, MessageKind::Discussion)
                    .await;
                Ok(contribution)
            }
            TaskKind::Custom { name, payload } => {
                let prompt = format!("Perform role-specific task '{name}' with payload {payload}");
                self.think(&prompt, Some(json!({"task": name}))).await
            }
        }
    }

    async fn tick(&self) {
        let msgs = self
            .bus
            .get_messages(&self.agent_id, self.config.get_messages_timeout.as_millis() as u64, self.config.get_messages_max)
            .await;
        for msg in msgs {
            self.handle_bus_message(msg).await;
        }

        self.check_for_work().await;

        if !self.queue.is_empty() {
            self.process_next_task().await;
        }
    }

    async fn run(self: Arc<Self>) {
        self.running.store(true, Ordering::SeqCst);
        debug!(agent_id = %self.agent_id, "agent runtime started");
        while self.running.load(Ordering::SeqCst) {
            self.tick().await;
            tokio::time::sleep(self.config.agent_interval).await;
        }
        debug!(agent_id = %self.agent_id, "agent runtime stopped");
    }
}

/// Handle to a spawned [`AgentRuntime`]; `stop()` requests a clean exit at
/// the runtime's next tick boundary without interrupting in-flight work.
pub struct AgentHandle {
    running: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl AgentHandle {
    pub fn spawn(runtime: Arc<AgentRuntime>) -> Self {
        let running = runtime.running.clone();
        let join = tokio::spawn(runtime.run());
        Self { running, join }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.join.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::llm::test_double::EchoLlmClient;
    use crate::company::roles::GenericRoleBehavior;
    use crate::bus::TokioMessageBus;

    fn runtime(bus: Arc<dyn MessageBus>) -> Arc<AgentRuntime> {
        Arc::new(AgentRuntime::new(
            "r1",
            "research",
            bus,
            Arc::new(EchoLlmClient),
            Box::new(GenericRoleBehavior),
            AgentRuntimeConfig::default(),
        ))
    }

    #[tokio::test]
    async fn tick_processes_one_pending_task() {
        let bus = TokioMessageBus::new(100, 100);
        let rt = runtime(bus);
        rt.queue.push(Task::new(
            TaskKind::Think { prompt: "hello".into() },
            Priority::Normal,
            3,
            Utc::now(),
        ));
        rt.tick().await;
        assert!(rt.queue.is_empty());
        let log = rt.activity_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].activity_type, "task_completed");
    }

    #[tokio::test]
    async fn incoming_direct_message_is_enqueued_as_respond_task() {
        let bus = TokioMessageBus::new(100, 100);
        bus.register_mailbox("other");
        let rt = runtime(bus.clone());
        bus.send_direct("other", "r1", "hi", "need help", MessageKind::Text, Default::default(), 0)
            .await;
        rt.tick().await;
        // the respond task was processed within the same tick.
        assert!(rt.queue.is_empty());
        assert!(rt.activity_log().iter().any(|e| e.activity_type == "task_completed"));
    }

    #[tokio::test]
    async fn activity_log_is_capped() {
        let bus = TokioMessageBus::new(100, 100);
        let mut config = AgentRuntimeConfig::default();
        config.activity_cap = 2;
        let rt = Arc::new(AgentRuntime::new(
            "r1",
            "research",
            bus,
            Arc::new(EchoLlmClient),
            Box::new(GenericRoleBehavior),
            config,
        ));
        for i in 0..5 {
            rt.queue.push(Task::new(
                TaskKind::Think { prompt: format!("p{i}") },
                Priority::Normal,
                3,
                Utc::now(),
            ));
            rt.tick().await;
        }
        assert_eq!(rt.activity_log().len(), 2);
    }

    #[tokio::test]
    async fn stop_flips_running_flag_and_exits_loop() {
        let bus = TokioMessageBus::new(100, 100);
        let rt = runtime(bus);
        let handle = AgentHandle::spawn(rt);
        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), handle.join()).await.unwrap().unwrap();
    }
}
