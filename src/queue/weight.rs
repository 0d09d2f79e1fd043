//! Admission weight computation
//!
//! A participant's priority is computed once, when it is admitted, and frozen
//! on its queue entry until it leaves the queue.

use crate::config::QueueConfig;
use crate::types::Participant;
use crate::utils::{minutes_between, round_to_hundredths};
use chrono::{DateTime, Utc};

/// Compute the admission weight of a participant at `now`
///
/// `base + min(idle_minutes / wait_bonus_minutes, max_wait_bonus)` when the
/// participant has played before, plus the assistance bonus when its rating is
/// under the threshold, rounded to two decimals.
pub fn compute_weight(participant: &Participant, now: DateTime<Utc>, config: &QueueConfig) -> f64 {
    let mut weight = config.base_weight;

    if let Some(last_session_at) = participant.last_session_at {
        let idle_minutes = minutes_between(last_session_at, now);
        weight += (idle_minutes / config.wait_bonus_minutes).min(config.max_wait_bonus);
    }

    if participant.rating < config.assistance_threshold {
        weight += config.assistance_bonus;
    }

    round_to_hundredths(weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{current_timestamp, generate_participant_id};
    use chrono::Duration;

    fn participant(rating: i32, idle: Option<Duration>, now: DateTime<Utc>) -> Participant {
        let mut p = Participant::new(generate_participant_id(), "p".to_string(), rating, now);
        p.last_session_at = idle.map(|d| now - d);
        p
    }

    #[test]
    fn test_fresh_participant_gets_base_weight() {
        let now = current_timestamp();
        let config = QueueConfig::default();
        assert_eq!(compute_weight(&participant(1200, None, now), now, &config), 1.0);
    }

    #[test]
    fn test_wait_bonus_grows_linearly() {
        let now = current_timestamp();
        let config = QueueConfig::default();
        let p = participant(1200, Some(Duration::minutes(15)), now);
        assert_eq!(compute_weight(&p, now, &config), 1.5);

        let p = participant(1200, Some(Duration::minutes(10)), now);
        assert_eq!(compute_weight(&p, now, &config), 1.33);
    }

    #[test]
    fn test_wait_bonus_is_capped() {
        let now = current_timestamp();
        let config = QueueConfig::default();
        let p = participant(1200, Some(Duration::minutes(45)), now);
        assert_eq!(compute_weight(&p, now, &config), 3.0);

        let p = participant(1200, Some(Duration::hours(5)), now);
        assert_eq!(compute_weight(&p, now, &config), 3.0);
    }

    #[test]
    fn test_assistance_bonus_below_threshold() {
        let now = current_timestamp();
        let config = QueueConfig::default();
        assert_eq!(compute_weight(&participant(999, None, now), now, &config), 1.3);
        assert_eq!(compute_weight(&participant(1000, None, now), now, &config), 1.0);

        let p = participant(950, Some(Duration::minutes(60)), now);
        assert_eq!(compute_weight(&p, now, &config), 3.3);
    }

    #[test]
    fn test_future_last_session_earns_nothing() {
        let now = current_timestamp();
        let config = QueueConfig::default();
        let mut p = participant(1200, None, now);
        p.last_session_at = Some(now + Duration::minutes(10));
        assert_eq!(compute_weight(&p, now, &config), 1.0);
    }
}
