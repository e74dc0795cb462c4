//! In-process pub/sub message bus: mailboxes, group channels, broadcasts,
//! system notices, and ephemeral meeting rooms.

pub mod tokio_bus;
pub mod traits;
pub mod types;

pub use tokio_bus::TokioMessageBus;
pub use traits::{BusError, MessageBus, MessageFilter, SubscriptionId};
pub use types::{
    ArtifactKind, BusStats, ChannelKind, MeetingArtifact, MeetingRoom, Message, MessageKind,
    SYSTEM_PRIORITY,
};
