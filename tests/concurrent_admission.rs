//! High concurrency tests for the shared matchmaking service
//!
//! These tests validate that concurrent callers observe a consistent queue
//! and that no participant is ever seated twice.

mod fixtures;

use match_hall::MatchmakingError;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use fixtures::create_test_service;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admissions_get_unique_ranks() {
    let (service, publisher) = create_test_service(4);
    let participants = 64;

    let handles: Vec<_> = (0..participants)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.admit(&format!("player_{}", i)).await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    for result in results {
        result.unwrap().unwrap();
    }

    let status = service.status().unwrap();
    assert_eq!(status.queue.len(), participants);
    let ranks: Vec<usize> = status.queue.iter().map(|entry| entry.rank).collect();
    assert_eq!(ranks, (1..=participants).collect::<Vec<_>>());
    assert_eq!(publisher.events().len(), participants);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_name_admitted_once_under_contention() {
    let (service, _publisher) = create_test_service(4);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.admit("contested").await })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(_) => admitted += 1,
            Err(MatchmakingError::AlreadyActive { .. }) => rejected += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(rejected, 15);
    assert_eq!(service.stats().unwrap().participants, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_session_formation_never_double_seats() {
    let (service, _publisher) = create_test_service(4);
    for i in 0..40 {
        service.admit(&format!("player_{}", i)).await.unwrap();
    }

    let start = Instant::now();
    let handles: Vec<_> = (0..12)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.form_session().await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    assert!(start.elapsed() < Duration::from_secs(5));

    let mut sessions = Vec::new();
    let mut insufficient = 0;
    for result in results {
        match result.unwrap() {
            Ok(session) => sessions.push(session),
            Err(MatchmakingError::InsufficientEntries { .. }) => insufficient += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(sessions.len(), 10);
    assert_eq!(insufficient, 2);

    let seated: HashSet<_> = sessions
        .iter()
        .flat_map(|session| session.roster.iter().copied())
        .collect();
    assert_eq!(seated.len(), 40);
    assert_eq!(service.stats().unwrap().sessions.active_sessions, 10);
}
