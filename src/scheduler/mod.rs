//! Schedule types shared by the company scheduler (§4.5).
//!
//! # Architecture
//! ```text
//! Schedule   ← Interval | Cron
//! ```
//! The tick-driven scheduler implementation lives in
//! [`crate::company::scheduler::CompanyScheduler`]; this module only
//! carries the `Schedule`/job-description types it and `company::jobs`
//! are built from.

pub mod traits;

pub use traits::{
    JobExecution, JobId, JobPayload, JobStatus, Schedule, ScheduledJob, Scheduler, SessionTarget,
};
