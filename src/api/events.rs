//! Server-sent event stream of matchmaking events
//!
//! Each observer first receives a `status` event carrying the current
//! snapshot, then every published [`MatchmakingEvent`] as it happens. An
//! observer that falls behind the broadcast buffer skips the missed events.

use crate::api::ApiState;
use crate::error::MatchmakingError;
use crate::types::MatchmakingEvent;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

pub fn routes() -> Router<ApiState> {
    Router::new().route("/events", get(stream_events))
}

/// `GET /events`
pub async fn stream_events(
    State(state): State<ApiState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, MatchmakingError> {
    // Subscribe before taking the snapshot so nothing falls between them
    let receiver = state.events.subscribe();
    let snapshot = state.service.status()?;
    let initial = Event::default()
        .event("status")
        .json_data(&snapshot)
        .map_err(|e| MatchmakingError::InternalError {
            message: format!("Failed to encode status event: {}", e),
        })?;
    debug!(
        "Event stream opened ({} observers)",
        state.events.receiver_count()
    );

    let updates = BroadcastStream::new(receiver).filter_map(|message| match message {
        Ok(event) => to_sse_event(&event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("Event observer lagged, skipped {} events", skipped);
            None
        }
    });

    let stream = tokio_stream::once(Ok::<Event, Infallible>(initial)).chain(updates.map(Ok));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &MatchmakingEvent) -> Option<Event> {
    match Event::default()
        .event(event.event_type_str())
        .json_data(event)
    {
        Ok(sse) => Some(sse),
        Err(e) => {
            warn!("Failed to encode {} event: {}", event.event_type_str(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::config::AppConfig;
    use crate::events::BroadcastEventPublisher;
    use crate::matchmaker::Matchmaker;
    use crate::service::MatchmakingService;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> ApiState {
        let events = Arc::new(BroadcastEventPublisher::new(64));
        let matchmaker = Matchmaker::from_config(&AppConfig::default()).unwrap();
        let service = MatchmakingService::new(matchmaker, events.clone());
        ApiState { service, events }
    }

    async fn next_chunk(body: &mut axum::body::BodyDataStream) -> String {
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .unwrap();
        String::from_utf8(chunk.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_stream_starts_with_status_then_follows_mutations() {
        let state = state();
        let app = router(state.clone());

        let response = app
            .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));
        assert_eq!(state.events.receiver_count(), 1);

        let mut body = response.into_body().into_data_stream();
        let first = next_chunk(&mut body).await;
        assert!(first.starts_with("event: status"));

        state.service.admit("ana").await.unwrap();
        let second = next_chunk(&mut body).await;
        assert!(second.starts_with("event: queue_changed"));
        assert!(second.contains("\"ana\""));
    }

    #[test]
    fn test_event_type_becomes_sse_name() {
        let event = MatchmakingEvent::QueueChanged {
            queue: Vec::new(),
            active_sessions: Vec::new(),
            timestamp: chrono::Utc::now(),
        };
        assert!(to_sse_event(&event).is_some());
    }
}
