//! Common types used throughout the matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for participants
pub type ParticipantId = Uuid;

/// Unique identifier for sessions
pub type SessionId = Uuid;

/// Where a participant currently is in the matchmaking lifecycle
///
/// Transitions: `Idle -> Queued` (admission), `Queued -> Idle` (withdrawal),
/// `Queued -> InSession` (session formed), `InSession -> Idle` (resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    Idle,
    Queued,
    InSession,
}

impl std::fmt::Display for MembershipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipState::Idle => write!(f, "Idle"),
            MembershipState::Queued => write!(f, "Queued"),
            MembershipState::InSession => write!(f, "InSession"),
        }
    }
}

/// A known participant and its rating record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub sessions_played: u32,
    pub last_session_at: Option<DateTime<Utc>>,
    pub state: MembershipState,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Create a fresh, idle participant with no session history
    pub fn new(id: ParticipantId, name: String, rating: i32, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            rating,
            wins: 0,
            losses: 0,
            sessions_played: 0,
            last_session_at: None,
            state: MembershipState::Idle,
            created_at,
        }
    }

    /// Whether the participant is queued or playing
    pub fn is_active(&self) -> bool {
        self.state != MembershipState::Idle
    }
}

/// Outcome of a session from one participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionResult {
    Won,
    Lost,
}

impl SessionResult {
    /// Actual score used by the rating formula
    pub fn actual_score(self) -> f64 {
        match self {
            SessionResult::Won => 1.0,
            SessionResult::Lost => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionResult::Won => "won",
            SessionResult::Lost => "lost",
        }
    }
}

/// A waiting participant's slot in the priority queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub participant_id: ParticipantId,
    /// Priority weight frozen at admission time
    pub weight: f64,
    pub admitted_at: DateTime<Utc>,
    /// Monotonic admission counter, breaks timestamp ties
    pub sequence: u64,
}

/// Read-only view of a queue entry for status reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntryView {
    pub rank: usize,
    pub participant_id: ParticipantId,
    pub name: String,
    pub rating: i32,
    pub weight: f64,
    pub admitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Resolved,
}

/// Partition of a resolved roster into two equal sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub winners: Vec<ParticipantId>,
    pub losers: Vec<ParticipantId>,
}

/// One formed group of participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Roster in queue rank order, frozen at formation
    pub roster: Vec<ParticipantId>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub outcome: Option<SessionOutcome>,
    pub status: SessionStatus,
}

impl Session {
    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.roster.contains(participant_id)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Rating change applied to one participant when a session resolves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub participant_id: ParticipantId,
    pub old_rating: i32,
    pub new_rating: i32,
    pub delta: i32,
    pub result: SessionResult,
}

/// Successful admission: the queued participant, its 1-based rank and weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub participant: Participant,
    pub rank: usize,
    pub weight: f64,
}

/// Resolved session together with the rating changes it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub session: Session,
    pub rating_changes: Vec<RatingChange>,
}

/// Consistent point-in-time view of the whole matchmaking state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub queue: Vec<QueueEntryView>,
    pub active_sessions: Vec<Session>,
    pub participants: Vec<Participant>,
    pub generated_at: DateTime<Utc>,
}

/// Notifications handed to observers after a successful mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatchmakingEvent {
    QueueChanged {
        queue: Vec<QueueEntryView>,
        active_sessions: Vec<Session>,
        timestamp: DateTime<Utc>,
    },
    SessionCreated {
        session: Session,
        roster: Vec<Participant>,
        timestamp: DateTime<Utc>,
    },
    SessionResolved {
        session: Session,
        winners: Vec<Participant>,
        losers: Vec<Participant>,
        rating_changes: Vec<RatingChange>,
        ended_at: DateTime<Utc>,
    },
}

impl MatchmakingEvent {
    /// Event name used for routing and SSE event types
    pub fn event_type_str(&self) -> &'static str {
        match self {
            MatchmakingEvent::QueueChanged { .. } => "queue_changed",
            MatchmakingEvent::SessionCreated { .. } => "session_created",
            MatchmakingEvent::SessionResolved { .. } => "session_resolved",
        }
    }
}
