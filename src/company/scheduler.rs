//! The company scheduler (§4.5): owns every [`AgentRuntime`], drives the
//! default jobs, and holds the approval queue. The scheduler never calls
//! an LLM itself — job handlers only touch the bus or push tasks onto an
//! agent's own queue.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

use super::approvals::{ApprovalError, ApprovalItem, ApprovalQueue};
use super::jobs::{JobPayload, ScheduledJob};
use super::runtime::{AgentHandle, AgentRuntime};
use super::task::Task;
use crate::bus::MessageBus;
use crate::scheduler::traits::Schedule;

const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    Starting,
    Running,
    Paused,
    Stopping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub state: SchedulerState,
    pub total_iterations: u64,
    pub total_agent_runs: u64,
    pub total_messages: u64,
    pub total_approvals: u64,
    pub errors: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime_seconds: i64,
    pub active_agents: usize,
    pub pending_approvals: usize,
}

#[derive(Default)]
struct Counters {
    total_iterations: AtomicU64,
    total_agent_runs: AtomicU64,
    total_messages: AtomicU64,
    total_approvals: AtomicU64,
    errors: AtomicU64,
}

impl Counters {
    fn reset(&self) {
        self.total_iterations.store(0, Ordering::Relaxed);
        self.total_agent_runs.store(0, Ordering::Relaxed);
        self.total_messages.store(0, Ordering::Relaxed);
        self.total_approvals.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

/// Owns the agent roster, the default/operator jobs, and the approval
/// queue. Grounded in the old Tauri-era `TokioScheduler`'s `tokio::select!`
/// tick loop and cron/interval arithmetic (see [`compute_next_run`]),
/// adapted to drive the company's agent runtimes instead of desktop
/// session jobs.
pub struct CompanyScheduler {
    bus: Arc<dyn MessageBus>,
    agents: HashMap<String, Arc<AgentRuntime>>,
    handles: Mutex<Vec<AgentHandle>>,
    jobs: Mutex<Vec<ScheduledJob>>,
    approvals: ApprovalQueue,
    counters: Counters,
    state: Mutex<SchedulerState>,
    started_at: Mutex<Option<DateTime<Utc>>>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

impl CompanyScheduler {
    pub fn new(bus: Arc<dyn MessageBus>, agents: Vec<Arc<AgentRuntime>>, jobs: Vec<ScheduledJob>) -> Self {
        let agents = agents.into_iter().map(|a| (a.agent_id.clone(), a)).collect();
        Self {
            bus,
            agents,
            handles: Mutex::new(Vec::new()),
            jobs: Mutex::new(jobs),
            approvals: ApprovalQueue::new(),
            counters: Counters::default(),
            state: Mutex::new(SchedulerState::Stopped),
            started_at: Mutex::new(None),
            stop_tx: Mutex::new(None),
            tick_task: Mutex::new(None),
        }
    }

    pub fn approvals(&self) -> &ApprovalQueue {
        &self.approvals
    }

    /// Submits an item and notifies the chairman over the system channel.
    pub async fn submit_for_approval(
        &self,
        kind: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        requester: impl Into<String>,
        data: Value,
    ) -> ApprovalItem {
        let title = title.into();
        let description = description.into();
        let item = self.approvals.submit(kind, title.clone(), description.clone(), requester, data, Utc::now(), ChronoDuration::hours(24));
        self.counters.total_approvals.fetch_add(1, Ordering::Relaxed);
        self.bus
            .send_system("chairman", &format!("Approval requested: {title}"), &description)
            .await;
        item
    }

    pub async fn approve(&self, id: Uuid, decision_by: impl Into<String>) -> Result<ApprovalItem, ApprovalError> {
        let item = self.approvals.approve(id, decision_by)?;
        self.notify_requester(&item, "approved").await;
        Ok(item)
    }

    pub async fn reject(&self, id: Uuid, decision_by: impl Into<String>, reason: impl Into<String>) -> Result<ApprovalItem, ApprovalError> {
        let item = self.approvals.reject(id, decision_by, reason)?;
        self.notify_requester(&item, "rejected").await;
        Ok(item)
    }

    async fn notify_requester(&self, item: &ApprovalItem, verdict: &str) {
        self.bus
            .send_system(&item.requester, &format!("Approval {verdict}: {}", item.title), item.decision_reason.as_deref().unwrap_or(""))
            .await;
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    pub fn stats(&self) -> SchedulerStats {
        let started_at = *self.started_at.lock();
        let uptime_seconds = started_at.map(|s| (Utc::now() - s).num_seconds()).unwrap_or(0);
        SchedulerStats {
            state: self.state(),
            total_iterations: self.counters.total_iterations.load(Ordering::Relaxed),
            total_agent_runs: self.counters.total_agent_runs.load(Ordering::Relaxed),
            total_messages: self.counters.total_messages.load(Ordering::Relaxed),
            total_approvals: self.counters.total_approvals.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            started_at,
            uptime_seconds,
            active_agents: self.agents.len(),
            pending_approvals: self.approvals.pending_count(),
        }
    }

    /// STOPPED → STARTING → RUNNING. Spawns one loop per agent runtime and
    /// the scheduler's own tick loop, and resets the running counters to
    /// zero (every `start()` is a fresh epoch, per §4.5.1).
    pub async fn start(self: &Arc<Self>) {
        *self.state.lock() = SchedulerState::Starting;
        self.counters.reset();

        let mut handles = self.handles.lock();
        handles.clear();
        for agent in self.agents.values() {
            handles.push(AgentHandle::spawn(agent.clone()));
        }
        drop(handles);

        {
            let mut jobs = self.jobs.lock();
            for job in jobs.iter_mut() {
                job.next_run = compute_next_run(&job.schedule);
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        *self.stop_tx.lock() = Some(stop_tx);
        *self.started_at.lock() = Some(Utc::now());
        *self.state.lock() = SchedulerState::Running;

        let this = self.clone();
        let task = tokio::spawn(async move { this.tick_loop(stop_rx).await });
        *self.tick_task.lock() = Some(task);
    }

    pub fn pause(&self) {
        let mut state = self.state.lock();
        if *state == SchedulerState::Running {
            *state = SchedulerState::Paused;
        }
    }

    pub fn resume(&self) {
        let mut state = self.state.lock();
        if *state == SchedulerState::Paused {
            *state = SchedulerState::Running;
        }
    }

    /// RUNNING/PAUSED → STOPPING → STOPPED. Stops every agent loop, signals
    /// the tick loop to exit, and waits for both to finish.
    pub async fn stop(&self) {
        *self.state.lock() = SchedulerState::Stopping;

        for handle in self.handles.lock().drain(..) {
            handle.stop();
        }

        let stop_tx = self.stop_tx.lock().take();
        if let Some(tx) = stop_tx {
            let _ = tx.send(true);
        }
        let tick_task = self.tick_task.lock().take();
        if let Some(task) = tick_task {
            let _ = task.await;
        }

        *self.state.lock() = SchedulerState::Stopped;
    }

    async fn tick_loop(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.state() == SchedulerState::Running {
                        self.run_due_jobs(Utc::now()).await;
                        let expired = self.approvals.expire_overdue(Utc::now());
                        for item in &expired {
                            self.notify_requester(item, "rejected").await;
                        }
                        self.counters.total_iterations.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Ok(()) = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    }

    async fn run_due_jobs(&self, now: DateTime<Utc>) {
        let due: Vec<ScheduledJob> = {
            let mut jobs = self.jobs.lock();
            let mut due = Vec::new();
            for job in jobs.iter_mut() {
                if !job.enabled {
                    continue;
                }
                if job.next_run.is_some_and(|t| now >= t) {
                    due.push(job.clone());
                    job.run_count += 1;
                    job.last_run = Some(now);
                    job.next_run = compute_next_run(&job.schedule);
                }
            }
            due
        };

        for job in due {
            if let Err(e) = self.run_job(&job, now).await {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                error!(job = %job.name, "scheduled job failed: {e}");
            }
        }
    }

    async fn run_job(&self, job: &ScheduledJob, now: DateTime<Utc>) -> Result<(), String> {
        match &job.payload {
            JobPayload::CreateMeetingRoom { room_id, title, host, participants } => {
                self.bus
                    .create_meeting_room(room_id, title, host, participants.clone())
                    .await
                    .map_err(|e| e.to_string())?;
                self.counters.total_messages.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            JobPayload::EnqueueTask { target_agent, kind, priority } => {
                let agent = self
                    .agents
                    .get(target_agent)
                    .ok_or_else(|| format!("no such agent: {target_agent}"))?;
                agent.queue().push(Task::new(kind.clone(), *priority, 3, now));
                self.counters.total_agent_runs.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            JobPayload::HealthCheck { idle_threshold_secs } => {
                for agent in self.agents.values() {
                    let idle = agent
                        .last_activity_at()
                        .map(|t| (now - t).num_seconds() >= *idle_threshold_secs)
                        .unwrap_or(false);
                    if idle {
                        warn!(agent_id = %agent.agent_id, "agent idle past threshold");
                    }
                }
                Ok(())
            }
        }
    }

    pub fn agent(&self, agent_id: &str) -> Option<Arc<AgentRuntime>> {
        self.agents.get(agent_id).cloned()
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn jobs(&self) -> Vec<ScheduledJob> {
        self.jobs.lock().clone()
    }
}

/// Next-run arithmetic for interval/cron schedules. A `cron` expression may
/// be given 5-field (min hr dom mon dow) or 6-field (with leading seconds);
/// the 5-field form is widened by prepending `0` before parsing.
fn compute_next_run(schedule: &Schedule) -> Option<DateTime<Utc>> {
    match schedule {
        Schedule::Interval { secs } => Some(Utc::now() + ChronoDuration::seconds(*secs as i64)),
        Schedule::Cron { expr } => {
            use std::str::FromStr;
            let full_expr = if expr.split_whitespace().count() == 5 {
                format!("0 {expr}")
            } else {
                expr.clone()
            };
            cron::Schedule::from_str(&full_expr).ok()?.upcoming(Utc).next()
        }
    }
}
