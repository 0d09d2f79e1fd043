//! HTTP API for the matchmaking operations
//!
//! A thin JSON boundary over [`MatchmakingService`]: each route maps to one
//! core operation, errors map to status codes by kind, and `/events` streams
//! matchmaking events to observers as server-sent events.

pub mod dto;
pub mod error;
pub mod events;
pub mod handlers;

use crate::events::BroadcastEventPublisher;
use crate::service::MatchmakingService;
use axum::Router;
use std::sync::Arc;

/// State shared by every API handler
#[derive(Clone)]
pub struct ApiState {
    pub service: MatchmakingService,
    pub events: Arc<BroadcastEventPublisher>,
}

/// Builds the API router with all matchmaking endpoints
pub fn router(state: ApiState) -> Router {
    Router::new()
        .merge(handlers::routes())
        .merge(events::routes())
        .with_state(state)
}
