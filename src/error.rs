//! Error types for the matchmaking service
//!
//! Core operations return [`MatchmakingError`] so the boundary layer can
//! translate each kind into a client-visible response. Service wiring and
//! binaries use anyhow on top of it.

use crate::types::{ParticipantId, SessionId};

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, MatchmakingError>;

/// Expected, recoverable caller errors plus the few internal failure modes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Participant {participant_id} is already queued or in a session")]
    AlreadyActive { participant_id: ParticipantId },

    #[error("Participant {participant_id} is not queued")]
    NotQueued { participant_id: ParticipantId },

    #[error("Not enough waiting participants: need {required}, have {available}")]
    InsufficientEntries { required: usize, available: usize },

    #[error("Invalid session outcome: {reason}")]
    InvalidOutcome { reason: String },

    #[error("Session not found or not active: {session_id}")]
    SessionNotFound { session_id: SessionId },

    #[error("Participant not found: {participant_id}")]
    ParticipantNotFound { participant_id: ParticipantId },

    #[error("Invalid participant name: {reason}")]
    InvalidName { reason: String },

    #[error("Invalid group size {size}: must be a positive even number")]
    InvalidGroupSize { size: usize },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl MatchmakingError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            MatchmakingError::AlreadyActive { .. } => "already_active",
            MatchmakingError::NotQueued { .. } => "not_queued",
            MatchmakingError::InsufficientEntries { .. } => "insufficient_entries",
            MatchmakingError::InvalidOutcome { .. } => "invalid_outcome",
            MatchmakingError::SessionNotFound { .. } => "session_not_found",
            MatchmakingError::ParticipantNotFound { .. } => "participant_not_found",
            MatchmakingError::InvalidName { .. } => "invalid_name",
            MatchmakingError::InvalidGroupSize { .. } => "invalid_group_size",
            MatchmakingError::ConfigurationError { .. } => "configuration_error",
            MatchmakingError::InternalError { .. } => "internal_error",
        }
    }

    /// Whether the error was caused by the caller rather than the service
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            MatchmakingError::ConfigurationError { .. } | MatchmakingError::InternalError { .. }
        )
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        MatchmakingError::InternalError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
