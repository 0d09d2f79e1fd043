//! Session manager implementation
//!
//! Sessions are created here at formation, mutated exactly once when they
//! resolve, and then kept in history. A participant is `InSession` exactly when
//! it appears in the roster of one active session.

use crate::error::{MatchmakingError, Result};
use crate::queue::PriorityQueue;
use crate::rating::{team_rating_changes, RatingCalculator};
use crate::registry::ParticipantRegistry;
use crate::types::{
    Participant, ParticipantId, Resolution, Session, SessionId, SessionOutcome, SessionStatus,
};
use crate::utils::generate_session_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Statistics about session manager operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionManagerStats {
    /// Total number of sessions formed
    pub sessions_formed: u64,
    /// Total number of sessions resolved
    pub sessions_resolved: u64,
    /// Current number of active sessions
    pub active_sessions: usize,
}

/// Owns active sessions (in formation order) and resolved history
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    active: Vec<Session>,
    history: Vec<Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull `group_size` participants off the queue and open a session
    ///
    /// Returns the session and its roster participants in rank order. On
    /// failure the queue and registry are left unchanged.
    pub fn form_session(
        &mut self,
        queue: &mut PriorityQueue,
        registry: &mut ParticipantRegistry,
        group_size: usize,
        now: DateTime<Utc>,
    ) -> Result<(Session, Vec<Participant>)> {
        if group_size == 0 || group_size % 2 != 0 {
            return Err(MatchmakingError::InvalidGroupSize { size: group_size });
        }

        let roster = queue.extract_top(registry, group_size)?;
        let session = Session {
            id: generate_session_id(),
            roster: roster.iter().map(|p| p.id).collect(),
            started_at: now,
            ended_at: None,
            outcome: None,
            status: SessionStatus::Active,
        };

        info!(
            "Formed session {} with {} participants, {} still waiting",
            session.id,
            roster.len(),
            queue.len()
        );
        for (i, participant) in roster.iter().enumerate() {
            debug!(
                "  Seat {}: '{}' ({}) - rating {}",
                i + 1,
                participant.name,
                participant.id,
                participant.rating
            );
        }

        self.active.push(session.clone());
        Ok((session, roster))
    }

    /// Resolve an active session with the given winning half of its roster
    ///
    /// Validation completes before any participant or session is touched, so a
    /// failed call leaves every record as it was.
    pub fn resolve_session(
        &mut self,
        registry: &mut ParticipantRegistry,
        calculator: &dyn RatingCalculator,
        session_id: &SessionId,
        winning_ids: &[ParticipantId],
        now: DateTime<Utc>,
    ) -> Result<Resolution> {
        let index = self
            .active
            .iter()
            .position(|session| &session.id == session_id)
            .ok_or(MatchmakingError::SessionNotFound {
                session_id: *session_id,
            })?;
        let session = &self.active[index];

        validate_outcome(session, winning_ids)?;

        let winner_set: HashSet<&ParticipantId> = winning_ids.iter().collect();
        let mut winners = Vec::with_capacity(winning_ids.len());
        let mut losers = Vec::with_capacity(winning_ids.len());
        for participant_id in &session.roster {
            let rating = registry.get(participant_id)?.rating;
            if winner_set.contains(participant_id) {
                winners.push((*participant_id, rating));
            } else {
                losers.push((*participant_id, rating));
            }
        }

        let rating_changes = team_rating_changes(calculator, &winners, &losers);
        for change in &rating_changes {
            registry.record_result(&change.participant_id, change.new_rating, change.result, now)?;
        }

        let mut session = self.active.remove(index);
        session.ended_at = Some(now);
        session.outcome = Some(SessionOutcome {
            winners: winners.iter().map(|(id, _)| *id).collect(),
            losers: losers.iter().map(|(id, _)| *id).collect(),
        });
        session.status = SessionStatus::Resolved;
        self.history.push(session.clone());

        info!(
            "Resolved session {} - {} winners, {} losers",
            session.id,
            winners.len(),
            losers.len()
        );
        for change in &rating_changes {
            debug!(
                "  {} {:?}: {} -> {} ({:+})",
                change.participant_id,
                change.result,
                change.old_rating,
                change.new_rating,
                change.delta
            );
        }

        Ok(Resolution {
            session,
            rating_changes,
        })
    }

    /// Active sessions in formation order
    pub fn active_sessions(&self) -> Vec<Session> {
        self.active.clone()
    }

    /// Resolved sessions in resolution order
    pub fn history(&self) -> &[Session] {
        &self.history
    }

    /// Look up a session by id, active or resolved
    pub fn session(&self, session_id: &SessionId) -> Option<&Session> {
        self.active
            .iter()
            .chain(self.history.iter())
            .find(|session| &session.id == session_id)
    }

    /// The active session a participant is seated in, if any
    pub fn active_session_for(&self, participant_id: &ParticipantId) -> Option<&Session> {
        self.active
            .iter()
            .find(|session| session.contains(participant_id))
    }

    pub fn stats(&self) -> SessionManagerStats {
        SessionManagerStats {
            sessions_formed: (self.active.len() + self.history.len()) as u64,
            sessions_resolved: self.history.len() as u64,
            active_sessions: self.active.len(),
        }
    }
}

fn validate_outcome(session: &Session, winning_ids: &[ParticipantId]) -> Result<()> {
    let required = session.roster.len() / 2;
    if winning_ids.len() != required {
        return Err(MatchmakingError::InvalidOutcome {
            reason: format!(
                "expected {} winners for a roster of {}, got {}",
                required,
                session.roster.len(),
                winning_ids.len()
            ),
        });
    }

    let mut seen = HashSet::with_capacity(winning_ids.len());
    for participant_id in winning_ids {
        if !seen.insert(participant_id) {
            return Err(MatchmakingError::InvalidOutcome {
                reason: format!("participant {} listed more than once", participant_id),
            });
        }
        if !session.contains(participant_id) {
            return Err(MatchmakingError::InvalidOutcome {
                reason: format!(
                    "participant {} is not in session {}",
                    participant_id, session.id
                ),
            });
        }
    }

    Ok(())
}
