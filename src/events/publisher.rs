//! Event publishers for outbound matchmaking events

use crate::error::{MatchmakingError, Result};
use crate::types::MatchmakingEvent;
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

/// Trait for publishing matchmaking events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hand an event to observers without waiting for delivery
    async fn publish(&self, event: MatchmakingEvent) -> Result<()>;

    /// Number of observers currently attached
    fn observer_count(&self) -> usize;
}

/// Fan-out publisher backed by a tokio broadcast channel
///
/// Lagging observers lose the oldest events once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<MatchmakingEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Attach a new observer that receives all future events
    pub fn subscribe(&self) -> broadcast::Receiver<MatchmakingEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: MatchmakingEvent) -> Result<()> {
        let event_type = event.event_type_str();
        // No observers is not an error
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!("Broadcast {} to {} observers", event_type, delivered);
        Ok(())
    }

    fn observer_count(&self) -> usize {
        self.receiver_count()
    }
}

/// Publisher that keeps every event in memory (for testing and simulations)
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    published_events: Mutex<Vec<MatchmakingEvent>>,
    fail_publishes: bool,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish fails after recording the event
    pub fn failing() -> Self {
        Self {
            published_events: Mutex::new(Vec::new()),
            fail_publishes: true,
        }
    }

    pub fn events(&self) -> Vec<MatchmakingEvent> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Get all published event types (for testing)
    pub fn get_published_events(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|event| event.event_type_str().to_string())
            .collect()
    }

    pub fn clear_events(&self) {
        if let Ok(mut events) = self.published_events.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: MatchmakingEvent) -> Result<()> {
        self.published_events
            .lock()
            .map_err(|_| MatchmakingError::lock_poisoned("published events"))?
            .push(event);

        if self.fail_publishes {
            return Err(MatchmakingError::InternalError {
                message: "Publishing disabled".to_string(),
            });
        }
        Ok(())
    }

    fn observer_count(&self) -> usize {
        0
    }
}
