//! Participant registry
//!
//! Holds every known participant with its rating record and membership state.
//! Display names are a convenience lookup key used on admission; they are not
//! an identity guarantee, and the participant id is the only authoritative key.

use crate::error::{MatchmakingError, Result};
use crate::types::{MembershipState, Participant, ParticipantId, SessionResult};
use crate::utils::generate_participant_id;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// In-memory store of participants, keyed by id with a name index
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    participants: HashMap<ParticipantId, Participant>,
    by_name: HashMap<String, ParticipantId>,
    creation_order: Vec<ParticipantId>,
    initial_rating: i32,
}

impl ParticipantRegistry {
    /// Create an empty registry that seeds new participants at `initial_rating`
    pub fn new(initial_rating: i32) -> Self {
        Self {
            participants: HashMap::new(),
            by_name: HashMap::new(),
            creation_order: Vec::new(),
            initial_rating,
        }
    }

    /// Find a participant by display name, registering a new one if unknown
    ///
    /// Returns the participant id and whether it was newly created.
    pub fn lookup_or_create(
        &mut self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(ParticipantId, bool)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MatchmakingError::InvalidName {
                reason: "name must not be empty".to_string(),
            });
        }

        if let Some(id) = self.by_name.get(name) {
            return Ok((*id, false));
        }

        let id = generate_participant_id();
        let participant = Participant::new(id, name.to_string(), self.initial_rating, now);
        self.participants.insert(id, participant);
        self.by_name.insert(name.to_string(), id);
        self.creation_order.push(id);

        debug!(
            "Registered participant '{}' ({}) at rating {}",
            name, id, self.initial_rating
        );
        Ok((id, true))
    }

    /// Insert a participant as-is (seeding, simulations)
    ///
    /// Replaces any existing participant with the same id. Both the incoming
    /// record and the one it replaces must be idle, since queue entries and
    /// session rosters are only created through admission.
    pub fn insert(&mut self, participant: Participant) -> Result<()> {
        let id = participant.id;
        if participant.name.trim().is_empty() {
            return Err(MatchmakingError::InvalidName {
                reason: "name must not be empty".to_string(),
            });
        }
        if participant.is_active() {
            return Err(MatchmakingError::AlreadyActive { participant_id: id });
        }
        if let Some(previous) = self.participants.get(&id) {
            if previous.is_active() {
                return Err(MatchmakingError::AlreadyActive { participant_id: id });
            }
        }
        if let Some(owner) = self.by_name.get(&participant.name) {
            if *owner != id {
                return Err(MatchmakingError::InvalidName {
                    reason: format!("name '{}' belongs to another participant", participant.name),
                });
            }
        }

        if let Some(previous) = self.participants.get(&id) {
            self.by_name.remove(&previous.name);
        } else {
            self.creation_order.push(id);
        }
        self.by_name.insert(participant.name.clone(), id);
        self.participants.insert(id, participant);
        Ok(())
    }

    pub fn get(&self, id: &ParticipantId) -> Result<&Participant> {
        self.participants
            .get(id)
            .ok_or(MatchmakingError::ParticipantNotFound {
                participant_id: *id,
            })
    }

    pub fn get_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant> {
        self.participants
            .get_mut(id)
            .ok_or(MatchmakingError::ParticipantNotFound {
                participant_id: *id,
            })
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        self.by_name
            .get(name.trim())
            .and_then(|id| self.participants.get(id))
    }

    /// Move a participant to a new membership state
    pub fn set_state(&mut self, id: &ParticipantId, state: MembershipState) -> Result<()> {
        let participant = self.get_mut(id)?;
        participant.state = state;
        Ok(())
    }

    /// Apply a resolved session to a participant's record and return it to `Idle`
    ///
    /// The only mutator touching counters, so `wins + losses == sessions_played`
    /// always holds.
    pub fn record_result(
        &mut self,
        id: &ParticipantId,
        new_rating: i32,
        result: SessionResult,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let participant = self.get_mut(id)?;
        participant.rating = new_rating;
        match result {
            SessionResult::Won => participant.wins += 1,
            SessionResult::Lost => participant.losses += 1,
        }
        participant.sessions_played += 1;
        participant.last_session_at = Some(at);
        participant.state = MembershipState::Idle;
        Ok(())
    }

    /// All participants in registration order
    pub fn all(&self) -> Vec<Participant> {
        self.creation_order
            .iter()
            .filter_map(|id| self.participants.get(id))
            .cloned()
            .collect()
    }

    /// Number of participants in a given membership state
    pub fn count_in_state(&self, state: MembershipState) -> usize {
        self.participants
            .values()
            .filter(|p| p.state == state)
            .count()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn initial_rating(&self) -> i32 {
        self.initial_rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;

    #[test]
    fn test_lookup_or_create_registers_at_baseline() {
        let mut registry = ParticipantRegistry::new(1200);
        let (id, created) = registry
            .lookup_or_create("alice", current_timestamp())
            .unwrap();

        assert!(created);
        let alice = registry.get(&id).unwrap();
        assert_eq!(alice.name, "alice");
        assert_eq!(alice.rating, 1200);
        assert_eq!(alice.state, MembershipState::Idle);
        assert_eq!(alice.sessions_played, 0);
        assert!(alice.last_session_at.is_none());
    }

    #[test]
    fn test_lookup_by_name_returns_existing() {
        let mut registry = ParticipantRegistry::new(1200);
        let now = current_timestamp();
        let (first, _) = registry.lookup_or_create("bob", now).unwrap();
        let (second, created) = registry.lookup_or_create("  bob ", now).unwrap();

        assert_eq!(first, second);
        assert!(!created);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rejects_blank_name() {
        let mut registry = ParticipantRegistry::new(1200);
        let err = registry
            .lookup_or_create("   ", current_timestamp())
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_name");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_participant() {
        let registry = ParticipantRegistry::new(1200);
        let id = generate_participant_id();
        assert_eq!(
            registry.get(&id).unwrap_err(),
            MatchmakingError::ParticipantNotFound { participant_id: id }
        );
    }

    #[test]
    fn test_record_result_keeps_counters_consistent() {
        let mut registry = ParticipantRegistry::new(1200);
        let now = current_timestamp();
        let (id, _) = registry.lookup_or_create("carol", now).unwrap();
        registry.set_state(&id, MembershipState::InSession).unwrap();

        registry
            .record_result(&id, 1216, SessionResult::Won, now)
            .unwrap();
        registry
            .record_result(&id, 1199, SessionResult::Lost, now)
            .unwrap();

        let carol = registry.get(&id).unwrap();
        assert_eq!(carol.rating, 1199);
        assert_eq!(carol.wins, 1);
        assert_eq!(carol.losses, 1);
        assert_eq!(carol.wins + carol.losses, carol.sessions_played);
        assert_eq!(carol.last_session_at, Some(now));
        assert_eq!(carol.state, MembershipState::Idle);
    }

    #[test]
    fn test_all_preserves_registration_order() {
        let mut registry = ParticipantRegistry::new(1200);
        let now = current_timestamp();
        for name in ["d", "a", "c", "b"] {
            registry.lookup_or_create(name, now).unwrap();
        }

        let names: Vec<String> = registry.all().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn test_insert_replaces_name_index() {
        let mut registry = ParticipantRegistry::new(1200);
        let now = current_timestamp();
        let (id, _) = registry.lookup_or_create("old", now).unwrap();

        let mut renamed = registry.get(&id).unwrap().clone();
        renamed.name = "new".to_string();
        registry.insert(renamed).unwrap();

        assert!(registry.find_by_name("old").is_none());
        assert_eq!(registry.find_by_name("new").map(|p| p.id), Some(id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn test_insert_rejects_active_records() {
        let mut registry = ParticipantRegistry::new(1200);
        let now = current_timestamp();
        let (id, _) = registry.lookup_or_create("dana", now).unwrap();
        registry.set_state(&id, MembershipState::Queued).unwrap();

        // Overwriting a queued participant would orphan its queue entry
        let replacement = Participant::new(id, "dana".to_string(), 900, now);
        assert_eq!(
            registry.insert(replacement).unwrap_err(),
            MatchmakingError::AlreadyActive { participant_id: id }
        );
        assert_eq!(registry.get(&id).unwrap().rating, 1200);

        let mut seated = Participant::new(generate_participant_id(), "erin".to_string(), 1200, now);
        seated.state = MembershipState::InSession;
        assert_eq!(registry.insert(seated).unwrap_err().kind(), "already_active");
        assert!(registry.find_by_name("erin").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_rejects_name_owned_by_another_id() {
        let mut registry = ParticipantRegistry::new(1200);
        let now = current_timestamp();
        let (id, _) = registry.lookup_or_create("fay", now).unwrap();

        let impostor = Participant::new(generate_participant_id(), "fay".to_string(), 1500, now);
        assert_eq!(registry.insert(impostor).unwrap_err().kind(), "invalid_name");
        assert_eq!(registry.find_by_name("fay").map(|p| p.id), Some(id));
        assert_eq!(registry.len(), 1);
    }
}
