//! Utility functions for the matchmaking service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique participant ID
pub fn generate_participant_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new unique session ID
pub fn generate_session_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Round to two decimal places, ties away from zero
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean of integer ratings; 0.0 for an empty slice
pub fn mean_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64
}

/// Minutes elapsed between two timestamps, never negative
pub fn minutes_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let millis = (later - earlier).num_milliseconds();
    (millis.max(0) as f64) / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_generate_unique_ids() {
        assert_ne!(generate_participant_id(), generate_participant_id());
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(1.234), 1.23);
        assert_eq!(round_to_hundredths(1.236), 1.24);
        assert_eq!(round_to_hundredths(3.0), 3.0);
        assert_eq!(round_to_hundredths(1.3 + 0.0000001), 1.3);
    }

    #[test]
    fn test_mean_rating() {
        assert_eq!(mean_rating(&[1300, 1250]), 1275.0);
        assert_eq!(mean_rating(&[1150, 1100]), 1125.0);
        assert_eq!(mean_rating(&[1201, 1200]), 1200.5);
        assert_eq!(mean_rating(&[]), 0.0);
    }

    #[test]
    fn test_minutes_between() {
        let now = current_timestamp();
        assert_eq!(minutes_between(now - Duration::minutes(45), now), 45.0);
        assert_eq!(minutes_between(now - Duration::seconds(90), now), 1.5);
        // Clock went backwards
        assert_eq!(minutes_between(now + Duration::minutes(5), now), 0.0);
    }
}
