//! Test fixtures shared by the integration suites

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use match_hall::config::AppConfig;
use match_hall::events::RecordingEventPublisher;
use match_hall::service::MatchmakingService;
use match_hall::{Matchmaker, MatchmakingEvent, Participant, ParticipantId};
use std::sync::Arc;

/// Service wired to a recording publisher so tests can inspect events
pub fn create_test_service(group_size: usize) -> (MatchmakingService, Arc<RecordingEventPublisher>) {
    let publisher = Arc::new(RecordingEventPublisher::new());
    let service = MatchmakingService::new(create_test_matchmaker(group_size), publisher.clone());
    (service, publisher)
}

pub fn create_test_matchmaker(group_size: usize) -> Matchmaker {
    let mut config = AppConfig::default();
    config.matchmaking.group_size = group_size;
    Matchmaker::from_config(&config).unwrap()
}

/// Fixed reference instant so weight assertions do not depend on the wall clock
pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn minutes_after(start: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    start + Duration::minutes(minutes)
}

/// Register participants with explicit ratings, returning their ids in order
pub fn seed_participants(
    matchmaker: &mut Matchmaker,
    ratings: &[(&str, i32)],
    created_at: DateTime<Utc>,
) -> Vec<ParticipantId> {
    ratings
        .iter()
        .map(|(name, rating)| {
            let id = uuid::Uuid::new_v4();
            matchmaker.insert_participant(Participant::new(
                id,
                name.to_string(),
                *rating,
                created_at,
            ))
            .unwrap();
            id
        })
        .collect()
}

/// Count events of a specific type
pub fn count_events_of_type(events: &[MatchmakingEvent], event_type: &str) -> usize {
    events
        .iter()
        .filter(|event| event.event_type_str() == event_type)
        .count()
}
