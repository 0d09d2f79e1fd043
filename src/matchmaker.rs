//! The matchmaking state object
//!
//! [`Matchmaker`] is the single owner of the participant registry, the priority
//! queue, the session index and the rating engine. Every mutating operation is
//! a plain synchronous call that returns its result together with the events
//! observers should receive; delivering them is left to the caller.

use crate::config::{AppConfig, QueueConfig, RatingConfig};
use crate::error::{MatchmakingError, Result};
use crate::queue::PriorityQueue;
use crate::rating::{EloRatingCalculator, RatingCalculator};
use crate::registry::ParticipantRegistry;
use crate::session::{SessionManager, SessionManagerStats};
use crate::types::{
    Admission, MatchmakingEvent, Participant, ParticipantId, QueueEntryView, Resolution, Session,
    SessionId, StatusSnapshot,
};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use tracing::info;

/// Result of a mutating operation plus the events it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch<T> {
    pub value: T,
    pub events: Vec<MatchmakingEvent>,
}

impl<T> Dispatch<T> {
    pub fn new(value: T, events: Vec<MatchmakingEvent>) -> Self {
        Self { value, events }
    }

    pub fn into_parts(self) -> (T, Vec<MatchmakingEvent>) {
        (self.value, self.events)
    }
}

/// Owns all mutable matchmaking state
pub struct Matchmaker {
    registry: ParticipantRegistry,
    queue: PriorityQueue,
    sessions: SessionManager,
    calculator: Box<dyn RatingCalculator>,
    group_size: usize,
}

impl std::fmt::Debug for Matchmaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matchmaker")
            .field("participants", &self.registry.len())
            .field("queued", &self.queue.len())
            .field("sessions", &self.sessions.stats())
            .field("group_size", &self.group_size)
            .finish()
    }
}

impl Matchmaker {
    /// Create a matchmaker with an explicit rating calculator
    pub fn new(
        queue_config: QueueConfig,
        calculator: Box<dyn RatingCalculator>,
        group_size: usize,
    ) -> Result<Self> {
        if group_size == 0 || group_size % 2 != 0 {
            return Err(MatchmakingError::InvalidGroupSize { size: group_size });
        }
        queue_config.validate()?;

        Ok(Self {
            registry: ParticipantRegistry::new(calculator.initial_rating()),
            queue: PriorityQueue::new(queue_config),
            sessions: SessionManager::new(),
            calculator,
            group_size,
        })
    }

    /// Create an Elo-backed matchmaker from queue and rating settings
    pub fn with_elo(
        queue_config: QueueConfig,
        rating_config: RatingConfig,
        group_size: usize,
    ) -> Result<Self> {
        let calculator = EloRatingCalculator::new(rating_config)?;
        Self::new(queue_config, Box::new(calculator), group_size)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::with_elo(
            config.queue.clone(),
            config.rating.clone(),
            config.matchmaking.group_size,
        )
    }

    /// Admit a participant by display name, registering it if unknown
    pub fn admit(&mut self, name: &str) -> Result<Dispatch<Admission>> {
        self.admit_at(name, current_timestamp())
    }

    pub fn admit_at(&mut self, name: &str, now: DateTime<Utc>) -> Result<Dispatch<Admission>> {
        let (participant_id, created) = self.registry.lookup_or_create(name, now)?;
        let participant = self.registry.get_mut(&participant_id)?;
        let rank = self.queue.admit(participant, now)?;
        let participant = participant.clone();
        let weight = self
            .queue
            .entries()
            .get(rank - 1)
            .map(|entry| entry.weight)
            .unwrap_or_default();

        info!(
            "'{}' joined the queue at rank {} of {}{}",
            participant.name,
            rank,
            self.queue.len(),
            if created { " (new participant)" } else { "" }
        );

        let events = vec![self.queue_changed(now)];
        Ok(Dispatch::new(
            Admission {
                participant,
                rank,
                weight,
            },
            events,
        ))
    }

    /// Remove a queued participant from the waiting list
    pub fn withdraw(&mut self, participant_id: &ParticipantId) -> Result<Dispatch<Participant>> {
        let now = current_timestamp();
        self.registry.get(participant_id)?;
        let participant = self.queue.withdraw(&mut self.registry, participant_id)?;

        info!(
            "'{}' left the queue, {} still waiting",
            participant.name,
            self.queue.len()
        );

        let events = vec![self.queue_changed(now)];
        Ok(Dispatch::new(participant, events))
    }

    /// Form a session from the top of the queue using the configured group size
    pub fn form_session(&mut self) -> Result<Dispatch<Session>> {
        self.form_session_at(current_timestamp())
    }

    pub fn form_session_at(&mut self, now: DateTime<Utc>) -> Result<Dispatch<Session>> {
        let (session, roster) = self.sessions.form_session(
            &mut self.queue,
            &mut self.registry,
            self.group_size,
            now,
        )?;

        let events = vec![
            MatchmakingEvent::SessionCreated {
                session: session.clone(),
                roster,
                timestamp: now,
            },
            self.queue_changed(now),
        ];
        Ok(Dispatch::new(session, events))
    }

    /// Resolve an active session with the ids of its winning half
    pub fn resolve_session(
        &mut self,
        session_id: &SessionId,
        winning_ids: &[ParticipantId],
    ) -> Result<Dispatch<Resolution>> {
        self.resolve_session_at(session_id, winning_ids, current_timestamp())
    }

    pub fn resolve_session_at(
        &mut self,
        session_id: &SessionId,
        winning_ids: &[ParticipantId],
        now: DateTime<Utc>,
    ) -> Result<Dispatch<Resolution>> {
        let resolution = self.sessions.resolve_session(
            &mut self.registry,
            self.calculator.as_ref(),
            session_id,
            winning_ids,
            now,
        )?;

        let (winners, losers) = match &resolution.session.outcome {
            Some(outcome) => (
                self.participants_by_id(&outcome.winners),
                self.participants_by_id(&outcome.losers),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let events = vec![
            MatchmakingEvent::SessionResolved {
                session: resolution.session.clone(),
                winners,
                losers,
                rating_changes: resolution.rating_changes.clone(),
                ended_at: now,
            },
            self.queue_changed(now),
        ];
        Ok(Dispatch::new(resolution, events))
    }

    /// Consistent point-in-time view of queue, active sessions and participants
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            queue: self.queue.snapshot(&self.registry),
            active_sessions: self.sessions.active_sessions(),
            participants: self.registry.all(),
            generated_at: current_timestamp(),
        }
    }

    pub fn participant(&self, participant_id: &ParticipantId) -> Result<Participant> {
        self.registry.get(participant_id).cloned()
    }

    pub fn session(&self, session_id: &SessionId) -> Result<Session> {
        self.sessions
            .session(session_id)
            .cloned()
            .ok_or(MatchmakingError::SessionNotFound {
                session_id: *session_id,
            })
    }

    pub fn queue_snapshot(&self) -> Vec<QueueEntryView> {
        self.queue.snapshot(&self.registry)
    }

    /// 1-based queue rank of a participant, if queued
    pub fn queue_position(&self, participant_id: &ParticipantId) -> Option<usize> {
        self.queue.position(participant_id)
    }

    pub fn history(&self) -> &[Session] {
        self.sessions.history()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn participant_count(&self) -> usize {
        self.registry.len()
    }

    pub fn session_stats(&self) -> SessionManagerStats {
        self.sessions.stats()
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    /// Seed an idle participant record directly, bypassing name lookup
    pub fn insert_participant(&mut self, participant: Participant) -> Result<()> {
        self.registry.insert(participant)
    }

    fn queue_changed(&self, now: DateTime<Utc>) -> MatchmakingEvent {
        MatchmakingEvent::QueueChanged {
            queue: self.queue.snapshot(&self.registry),
            active_sessions: self.sessions.active_sessions(),
            timestamp: now,
        }
    }

    fn participants_by_id(&self, ids: &[ParticipantId]) -> Vec<Participant> {
        ids.iter()
            .filter_map(|id| self.registry.get(id).ok())
            .cloned()
            .collect()
    }
}
