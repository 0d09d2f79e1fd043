//! Event delivery for the matchmaking service
//!
//! The core hands finished [`MatchmakingEvent`](crate::types::MatchmakingEvent)
//! payloads to an [`EventPublisher`]; the broadcast implementation fans them
//! out to every connected observer.

pub mod publisher;

// Re-export commonly used types
pub use publisher::{BroadcastEventPublisher, EventPublisher, RecordingEventPublisher};
