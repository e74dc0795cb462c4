//! The "company of agents": task queue, per-agent runtime loop, and the
//! role-specific behavior that makes a Researcher act differently from a
//! Risk officer.

pub mod approvals;
pub mod jobs;
pub mod llm;
pub mod queue;
pub mod roles;
pub mod runtime;
pub mod scheduler;
pub mod task;

pub use approvals::{ApprovalError, ApprovalItem, ApprovalQueue, ApprovalStatus};
pub use jobs::{JobPayload, ScheduledJob, default_jobs};
pub use llm::{LlmClient, LlmError};
pub use queue::AgentTaskQueue;
pub use runtime::{ActivityEntry, AgentHandle, AgentRuntime, AgentRuntimeConfig};
pub use scheduler::{CompanyScheduler, SchedulerState, SchedulerStats};
pub use task::{Priority, Task, TaskKind};
