//! Shared matchmaking service
//!
//! Wraps the [`Matchmaker`] in a lock so concurrent requests are serialized.
//! Events are queued in an outbox while the lock is held, so the outbox order
//! is the order in which state changed. They are published once the lock is
//! released, draining the outbox one caller at a time.

use crate::error::{MatchmakingError, Result};
use crate::events::EventPublisher;
use crate::matchmaker::{Dispatch, Matchmaker};
use crate::metrics::MetricsCollector;
use crate::session::SessionManagerStats;
use crate::types::{
    Admission, MatchmakingEvent, Participant, ParticipantId, Resolution, Session, SessionId,
    StatusSnapshot,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Counters describing the current matchmaking state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchmakingStats {
    pub queue_length: usize,
    pub participants: usize,
    pub group_size: usize,
    pub sessions: SessionManagerStats,
}

/// Events waiting for delivery, in mutation order
struct Outbox {
    sender: mpsc::UnboundedSender<MatchmakingEvent>,
    pending: Mutex<mpsc::UnboundedReceiver<MatchmakingEvent>>,
}

impl Outbox {
    fn new() -> Self {
        let (sender, pending) = mpsc::unbounded_channel();
        Self {
            sender,
            pending: Mutex::new(pending),
        }
    }
}

/// Cloneable handle used by every request handler
#[derive(Clone)]
pub struct MatchmakingService {
    matchmaker: Arc<RwLock<Matchmaker>>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Option<Arc<MetricsCollector>>,
    outbox: Arc<Outbox>,
}

impl MatchmakingService {
    pub fn new(matchmaker: Matchmaker, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            matchmaker: Arc::new(RwLock::new(matchmaker)),
            publisher,
            metrics: None,
            outbox: Arc::new(Outbox::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn admit(&self, name: &str) -> Result<Admission> {
        let start = Instant::now();
        let admission = self.apply("admit", |mm| mm.admit(name))?;
        if let Some(metrics) = &self.metrics {
            metrics.record_admission(admission.weight, start.elapsed());
        }
        self.flush().await;
        Ok(admission)
    }

    pub async fn withdraw(&self, participant_id: &ParticipantId) -> Result<Participant> {
        let start = Instant::now();
        let participant = self.apply("withdraw", |mm| mm.withdraw(participant_id))?;
        if let Some(metrics) = &self.metrics {
            metrics.record_withdrawal(start.elapsed());
        }
        self.flush().await;
        Ok(participant)
    }

    pub async fn form_session(&self) -> Result<Session> {
        let start = Instant::now();
        let session = self.apply("form_session", |mm| mm.form_session())?;
        if let Some(metrics) = &self.metrics {
            metrics.record_session_formed(start.elapsed());
        }
        self.flush().await;
        Ok(session)
    }

    pub async fn resolve_session(
        &self,
        session_id: &SessionId,
        winning_ids: &[ParticipantId],
    ) -> Result<Resolution> {
        let start = Instant::now();
        let resolution = self.apply("resolve_session", |mm| {
            mm.resolve_session(session_id, winning_ids)
        })?;
        if let Some(metrics) = &self.metrics {
            metrics.record_session_resolved(&resolution.rating_changes, start.elapsed());
        }
        self.flush().await;
        Ok(resolution)
    }

    /// Consistent snapshot of the whole state; emits nothing
    pub fn status(&self) -> Result<StatusSnapshot> {
        self.read(|mm| Ok(mm.status()))
    }

    pub fn participant(&self, participant_id: &ParticipantId) -> Result<Participant> {
        self.read(|mm| mm.participant(participant_id))
    }

    /// A participant together with its queue rank, if queued
    pub fn participant_with_position(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<(Participant, Option<usize>)> {
        self.read(|mm| {
            let participant = mm.participant(participant_id)?;
            Ok((participant, mm.queue_position(participant_id)))
        })
    }

    pub fn session(&self, session_id: &SessionId) -> Result<Session> {
        self.read(|mm| mm.session(session_id))
    }

    pub fn stats(&self) -> Result<MatchmakingStats> {
        self.read(|mm| {
            Ok(MatchmakingStats {
                queue_length: mm.queue_len(),
                participants: mm.participant_count(),
                group_size: mm.group_size(),
                sessions: mm.session_stats(),
            })
        })
    }

    /// Push current state counts into the gauges
    pub fn refresh_gauges(&self) -> Result<MatchmakingStats> {
        let stats = self.stats()?;
        if let Some(metrics) = &self.metrics {
            metrics.update_state_gauges(stats.queue_length, stats.participants, &stats.sessions);
            metrics.update_event_observers(self.publisher.observer_count());
        }
        Ok(stats)
    }

    pub fn publisher(&self) -> Arc<dyn EventPublisher> {
        self.publisher.clone()
    }

    fn read<T>(&self, f: impl FnOnce(&Matchmaker) -> Result<T>) -> Result<T> {
        let matchmaker = self
            .matchmaker
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("matchmaker"))?;
        f(&matchmaker)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Matchmaker) -> Result<T>) -> Result<T> {
        let mut matchmaker = self
            .matchmaker
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("matchmaker"))?;
        f(&mut matchmaker)
    }

    fn observe<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("{} rejected: {}", operation, e);
            if let Some(metrics) = &self.metrics {
                metrics.record_rejection(operation, e.kind());
            }
        }
        result
    }

    /// Run a mutation and queue its events before the write lock is released
    fn apply<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Matchmaker) -> Result<Dispatch<T>>,
    ) -> Result<T> {
        let result = self.write(|mm| {
            let (value, events) = f(mm)?.into_parts();
            for event in events {
                if self.outbox.sender.send(event).is_err() {
                    warn!("Event outbox closed, dropping {} event", operation);
                }
            }
            Ok(value)
        });
        self.observe(operation, result)
    }

    /// Publish everything queued so far, in mutation order
    ///
    /// Only one caller drains at a time, so events from concurrent operations
    /// cannot overtake each other. On return, every event queued before the
    /// call has been handed to the publisher. Publishing is fire-and-forget:
    /// a failed publish is logged and never changes the outcome of the
    /// operation that produced the event.
    async fn flush(&self) {
        let mut pending = self.outbox.pending.lock().await;
        while let Ok(event) = pending.try_recv() {
            self.publish(event).await;
        }
    }

    async fn publish(&self, event: MatchmakingEvent) {
        let event_type = event.event_type_str();
        let outcome = self.publisher.publish(event).await;
        match &outcome {
            Ok(()) => debug!("Published {} event", event_type),
            Err(e) => warn!("Failed to publish {} event: {}", event_type, e),
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_event_published(event_type, outcome.is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::events::publisher::MockEventPublisher;
    use crate::events::RecordingEventPublisher;

    fn service_with(publisher: Arc<dyn EventPublisher>) -> MatchmakingService {
        let matchmaker = Matchmaker::from_config(&AppConfig::default()).unwrap();
        MatchmakingService::new(matchmaker, publisher)
    }

    #[tokio::test]
    async fn test_admit_publishes_queue_changed() {
        let publisher = Arc::new(RecordingEventPublisher::new());
        let service = service_with(publisher.clone());

        let admission = service.admit("ana").await.unwrap();
        assert_eq!(admission.rank, 1);
        assert_eq!(publisher.get_published_events(), vec!["queue_changed"]);
    }

    #[tokio::test]
    async fn test_failures_publish_nothing() {
        let publisher = Arc::new(RecordingEventPublisher::new());
        let service = service_with(publisher.clone());

        assert!(service.form_session().await.is_err());
        assert!(service.admit("  ").await.is_err());
        assert!(service
            .withdraw(&crate::utils::generate_participant_id())
            .await
            .is_err());

        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_operation() {
        let publisher = Arc::new(RecordingEventPublisher::failing());
        let service = service_with(publisher.clone());

        let admission = service.admit("ana").await.unwrap();
        assert_eq!(admission.participant.name, "ana");
        assert_eq!(service.status().unwrap().queue.len(), 1);
        assert_eq!(publisher.events().len(), 1);
    }

    #[tokio::test]
    async fn test_session_events_in_order() {
        let mut mock = MockEventPublisher::new();
        let mut seq = mockall::Sequence::new();
        for event_type in [
            "queue_changed",
            "queue_changed",
            "queue_changed",
            "queue_changed",
            "session_created",
            "queue_changed",
        ] {
            mock.expect_publish()
                .withf(move |event| event.event_type_str() == event_type)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        let service = service_with(Arc::new(mock));

        for name in ["a", "b", "c", "d"] {
            service.admit(name).await.unwrap();
        }
        let session = service.form_session().await.unwrap();
        assert_eq!(session.roster.len(), 4);
    }

    #[tokio::test]
    async fn test_metrics_track_operations() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let service = service_with(Arc::new(RecordingEventPublisher::new()))
            .with_metrics(metrics.clone());

        service.admit("ana").await.unwrap();
        service.admit("ana").await.unwrap_err();
        let stats = service.refresh_gauges().unwrap();

        assert_eq!(stats.queue_length, 1);
        assert_eq!(metrics.queue().admissions_total.get(), 1);
        assert_eq!(metrics.queue().queue_length.get(), 1);
        assert_eq!(
            metrics
                .operation()
                .rejected_operations_total
                .with_label_values(&["admit", "already_active"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_participant_with_position() {
        let service = service_with(Arc::new(RecordingEventPublisher::new()));
        let first = service.admit("ana").await.unwrap().participant;
        let second = service.admit("ben").await.unwrap().participant;
        service.withdraw(&first.id).await.unwrap();

        let (participant, position) = service.participant_with_position(&second.id).unwrap();
        assert_eq!(participant.name, "ben");
        assert_eq!(position, Some(1));

        let (_, position) = service.participant_with_position(&first.id).unwrap();
        assert_eq!(position, None);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_are_serialized() {
        let service = service_with(Arc::new(RecordingEventPublisher::new()));
        let mut handles = Vec::new();
        for i in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.admit(&format!("player-{}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let status = service.status().unwrap();
        assert_eq!(status.queue.len(), 32);
        let ranks: Vec<usize> = status.queue.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, (1..=32).collect::<Vec<_>>());
    }

    /// Records events, holding back the very first publish for a while
    struct SlowFirstPublisher {
        recorder: RecordingEventPublisher,
        delayed: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl EventPublisher for SlowFirstPublisher {
        async fn publish(&self, event: MatchmakingEvent) -> Result<()> {
            if !self.delayed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            self.recorder.publish(event).await
        }

        fn observer_count(&self) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_deliver_in_mutation_order() {
        let publisher = Arc::new(SlowFirstPublisher {
            recorder: RecordingEventPublisher::new(),
            delayed: std::sync::atomic::AtomicBool::new(false),
        });
        let service = service_with(publisher.clone());

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.admit("alice").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        service.admit("bob").await.unwrap();

        // bob's admit returns only after its own event went out
        assert_eq!(publisher.recorder.events().len(), 2);
        first.await.unwrap().unwrap();

        let lengths: Vec<usize> = publisher
            .recorder
            .events()
            .iter()
            .filter_map(|event| match event {
                MatchmakingEvent::QueueChanged { queue, .. } => Some(queue.len()),
                _ => None,
            })
            .collect();
        assert_eq!(lengths, vec![1, 2]);
        assert_eq!(
            lengths.last().copied(),
            Some(service.status().unwrap().queue.len())
        );
    }
}
