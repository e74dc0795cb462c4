//! Structured feedback intake and routing (§4.10, feedback half).

pub mod channel;
pub mod types;

pub use channel::{FeedbackChannel, FeedbackError};
pub use types::{
    CapabilityGapReport, FeedbackCategory, FeedbackEntry, FeedbackSource, FeedbackStats, FeedbackStatus,
    FeedbackUrgency, ToolRequest, ToolUsageStat,
};
