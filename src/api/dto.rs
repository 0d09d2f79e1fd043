//! Request and response bodies for the matchmaking API

use crate::types::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};

/// Request body for `POST /queue`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmitRequest {
    /// Display name; an unknown name registers a new participant
    pub name: String,
}

/// Request body for `POST /sessions/{session_id}/resolve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveSessionRequest {
    /// Exactly half of the session roster
    pub winning_ids: Vec<ParticipantId>,
}

/// Response body for `GET /participants/{participant_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResponse {
    pub participant: Participant,
    /// 1-based queue rank while queued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

/// Structured JSON error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error kind, e.g. `already_active`
    pub code: String,
    pub message: String,
}
