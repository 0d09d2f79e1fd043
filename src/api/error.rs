//! HTTP status mapping for matchmaking errors
//!
//! | Kind                                                    | Status |
//! |---------------------------------------------------------|--------|
//! | `participant_not_found`, `session_not_found`            | 404    |
//! | `already_active`, `not_queued`, `insufficient_entries`  | 409    |
//! | `invalid_outcome`, `invalid_group_size`                 | 422    |
//! | `invalid_name`                                          | 400    |
//! | `configuration_error`, `internal_error`                 | 500    |

use crate::api::dto::{ErrorBody, ErrorResponse};
use crate::error::MatchmakingError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// HTTP status code for an error kind
pub fn status_code(error: &MatchmakingError) -> StatusCode {
    match error {
        MatchmakingError::ParticipantNotFound { .. } | MatchmakingError::SessionNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        MatchmakingError::AlreadyActive { .. }
        | MatchmakingError::NotQueued { .. }
        | MatchmakingError::InsufficientEntries { .. } => StatusCode::CONFLICT,
        MatchmakingError::InvalidOutcome { .. } | MatchmakingError::InvalidGroupSize { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        MatchmakingError::InvalidName { .. } => StatusCode::BAD_REQUEST,
        MatchmakingError::ConfigurationError { .. } | MatchmakingError::InternalError { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for MatchmakingError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.kind().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
