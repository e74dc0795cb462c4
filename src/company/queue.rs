//! [`AgentTaskQueue`]: a priority queue keyed by `(-priority, created_at,
//! task_id)` so higher-priority tasks pop first and ties break FIFO.

use std::{cmp::Reverse, collections::BinaryHeap};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Duration;

use super::task::Task;

struct Entry(Task);

impl Entry {
    fn key(&self) -> (super::task::Priority, Reverse<DateTime<Utc>>, Reverse<[u8; 16]>) {
        (
            self.0.priority,
            Reverse(self.0.created_at),
            Reverse(*self.0.id.as_bytes()),
        )
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

/// A per-agent priority task queue. `PopBlocking` waits up to `timeout` for
/// a task to become available before returning `None`.
pub struct AgentTaskQueue {
    heap: Mutex<BinaryHeap<Entry>>,
    notify: Notify,
}

impl AgentTaskQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, task: Task) {
        self.heap.lock().push(Entry(task));
        self.notify.notify_waiters();
    }

    /// Non-blocking pop, used by the runtime's `if queue.NonEmpty()` check.
    pub fn try_pop(&self) -> Option<Task> {
        self.heap.lock().pop().map(|e| e.0)
    }

    pub async fn pop_blocking(&self, timeout: Duration) -> Option<Task> {
        if let Some(task) = self.try_pop() {
            return Some(task);
        }
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
        self.try_pop()
    }

    pub fn size(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Re-enqueues a transiently-failed task with `retries_used` incremented,
    /// provided it has not exhausted `max_retries`. Returns `false` (task is
    /// dropped by the caller and should be marked failed) once exhausted.
    pub fn retry(&self, mut task: Task) -> bool {
        if !task.can_retry() {
            return false;
        }
        task.retries_used += 1;
        self.push(task);
        true
    }
}

impl Default for AgentTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
