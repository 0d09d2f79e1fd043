//! Route handlers for queue, session and status endpoints

use crate::api::dto::{AdmitRequest, ParticipantResponse, ResolveSessionRequest};
use crate::api::ApiState;
use crate::error::MatchmakingError;
use crate::types::{
    Admission, Participant, ParticipantId, Resolution, Session, SessionId, StatusSnapshot,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/queue", post(admit))
        .route("/queue/{participant_id}", delete(withdraw))
        .route("/sessions", post(form_session))
        .route("/sessions/{session_id}", get(get_session))
        .route("/sessions/{session_id}/resolve", post(resolve_session))
        .route("/participants/{participant_id}", get(get_participant))
        .route("/status", get(status))
}

/// `POST /queue`
pub async fn admit(
    State(state): State<ApiState>,
    Json(req): Json<AdmitRequest>,
) -> Result<(StatusCode, Json<Admission>), MatchmakingError> {
    let admission = state.service.admit(&req.name).await?;
    Ok((StatusCode::CREATED, Json(admission)))
}

/// `DELETE /queue/{participant_id}`
pub async fn withdraw(
    State(state): State<ApiState>,
    Path(participant_id): Path<ParticipantId>,
) -> Result<Json<Participant>, MatchmakingError> {
    Ok(Json(state.service.withdraw(&participant_id).await?))
}

/// `POST /sessions`
pub async fn form_session(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<Session>), MatchmakingError> {
    let session = state.service.form_session().await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /sessions/{session_id}/resolve`
pub async fn resolve_session(
    State(state): State<ApiState>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<ResolveSessionRequest>,
) -> Result<Json<Resolution>, MatchmakingError> {
    let resolution = state
        .service
        .resolve_session(&session_id, &req.winning_ids)
        .await?;
    Ok(Json(resolution))
}

/// `GET /sessions/{session_id}`
pub async fn get_session(
    State(state): State<ApiState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<Session>, MatchmakingError> {
    Ok(Json(state.service.session(&session_id)?))
}

/// `GET /participants/{participant_id}`
pub async fn get_participant(
    State(state): State<ApiState>,
    Path(participant_id): Path<ParticipantId>,
) -> Result<Json<ParticipantResponse>, MatchmakingError> {
    let (participant, queue_position) = state.service.participant_with_position(&participant_id)?;
    Ok(Json(ParticipantResponse {
        participant,
        queue_position,
    }))
}

/// `GET /status`
pub async fn status(
    State(state): State<ApiState>,
) -> Result<Json<StatusSnapshot>, MatchmakingError> {
    Ok(Json(state.service.status()?))
}
