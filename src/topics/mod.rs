//! Intention detection and topic-driven meeting escalation (§4.6): any
//! agent can raise a topic from free text or an explicit marker; topics
//! gather seconds and auto-escalate into a scheduled meeting.

pub mod detect;
pub mod keywords;
pub mod manager;
pub mod types;

pub use detect::{ExplicitTopicRequest, detect_intention, explicit_intention, parse_priority, parse_topic_kind};
pub use manager::{SecondOutcome, SeconderLevel, TopicError, TopicManager};
pub use types::{Topic, TopicKind, TopicPriority, TopicSecond, TopicStatus, new_topic};
