//! Priority-ordered waiting list
//!
//! Entries are kept sorted by weight descending. Weights are compared as whole
//! hundredths, so only weights that round to the same two-decimal value count
//! as equal and fall back to admission time, then admission sequence.

use crate::config::QueueConfig;
use crate::error::{MatchmakingError, Result};
use crate::queue::weight::compute_weight;
use crate::registry::ParticipantRegistry;
use crate::types::{MembershipState, Participant, ParticipantId, QueueEntry, QueueEntryView};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::debug;

/// Ordered waiting list; owns every queue entry
#[derive(Debug, Clone)]
pub struct PriorityQueue {
    entries: Vec<QueueEntry>,
    config: QueueConfig,
    next_sequence: u64,
}

/// Weight expressed in whole hundredths
fn weight_key(weight: f64) -> i64 {
    (weight * 100.0).round() as i64
}

/// Total order used by the queue: higher weight first, then earlier admission
///
/// Weights are equal when their hundredths keys match, not when their float
/// difference is under 0.01. Adjacent values such as 1.12 and 1.13 differ by
/// slightly less than 0.01 in binary, and a tolerance test would call them
/// equal while 1.13 and 1.14 are not, which is not transitive and can leave
/// the sorted list inconsistent. Keep the integer key.
fn compare_entries(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    weight_key(b.weight)
        .cmp(&weight_key(a.weight))
        .then_with(|| a.admitted_at.cmp(&b.admitted_at))
        .then_with(|| a.sequence.cmp(&b.sequence))
}

impl PriorityQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            entries: Vec::new(),
            config,
            next_sequence: 0,
        }
    }

    /// Weight a participant would receive if admitted at `now`
    pub fn compute_weight(&self, participant: &Participant, now: DateTime<Utc>) -> f64 {
        compute_weight(participant, now, &self.config)
    }

    /// Admit an idle participant and return its 1-based rank
    pub fn admit(&mut self, participant: &mut Participant, now: DateTime<Utc>) -> Result<usize> {
        if participant.is_active() || self.contains(&participant.id) {
            return Err(MatchmakingError::AlreadyActive {
                participant_id: participant.id,
            });
        }

        let weight = self.compute_weight(participant, now);
        let entry = QueueEntry {
            participant_id: participant.id,
            weight,
            admitted_at: now,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        self.entries.push(entry);
        self.entries.sort_by(compare_entries);
        participant.state = MembershipState::Queued;

        let rank = self.position(&participant.id).ok_or_else(|| {
            MatchmakingError::InternalError {
                message: format!("Admitted participant {} missing from queue", participant.id),
            }
        })?;

        debug!(
            "Admitted '{}' ({}) with weight {:.2} at rank {}/{}",
            participant.name,
            participant.id,
            weight,
            rank,
            self.entries.len()
        );
        Ok(rank)
    }

    /// Remove a queued participant and return it to `Idle`
    pub fn withdraw(
        &mut self,
        registry: &mut ParticipantRegistry,
        participant_id: &ParticipantId,
    ) -> Result<Participant> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.participant_id == participant_id)
            .ok_or(MatchmakingError::NotQueued {
                participant_id: *participant_id,
            })?;

        // Resolve the participant before touching the queue
        let participant = registry.get_mut(participant_id)?;
        self.entries.remove(index);
        participant.state = MembershipState::Idle;

        debug!(
            "Withdrew '{}' ({}), {} still waiting",
            participant.name,
            participant_id,
            self.entries.len()
        );
        Ok(participant.clone())
    }

    /// Remove the `n` highest-priority entries, marking them `InSession`
    ///
    /// Returned participants are in rank order. Fails without side effects
    /// when fewer than `n` entries are waiting.
    pub fn extract_top(
        &mut self,
        registry: &mut ParticipantRegistry,
        n: usize,
    ) -> Result<Vec<Participant>> {
        if self.entries.len() < n {
            return Err(MatchmakingError::InsufficientEntries {
                required: n,
                available: self.entries.len(),
            });
        }

        for entry in &self.entries[..n] {
            registry.get(&entry.participant_id)?;
        }

        let extracted: Vec<QueueEntry> = self.entries.drain(..n).collect();
        let mut participants = Vec::with_capacity(n);
        for entry in extracted {
            let participant = registry.get_mut(&entry.participant_id)?;
            participant.state = MembershipState::InSession;
            participants.push(participant.clone());
        }

        Ok(participants)
    }

    /// Ordered read-only view of every entry
    pub fn snapshot(&self, registry: &ParticipantRegistry) -> Vec<QueueEntryView> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let participant = registry.get(&entry.participant_id).ok();
                QueueEntryView {
                    rank: index + 1,
                    participant_id: entry.participant_id,
                    name: participant.map(|p| p.name.clone()).unwrap_or_default(),
                    rating: participant.map(|p| p.rating).unwrap_or_default(),
                    weight: entry.weight,
                    admitted_at: entry.admitted_at,
                }
            })
            .collect()
    }

    /// 1-based rank of a queued participant
    pub fn position(&self, participant_id: &ParticipantId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.participant_id == participant_id)
            .map(|index| index + 1)
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.entries
            .iter()
            .any(|entry| &entry.participant_id == participant_id)
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}
