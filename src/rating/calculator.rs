//! Rating calculator trait and team update
//!
//! This module defines the interface for rating calculations and the team
//! update that applies it to both sides of a resolved session.

use crate::types::{ParticipantId, RatingChange, SessionResult};
use crate::utils::mean_rating;

/// Trait for calculating rating changes after sessions
pub trait RatingCalculator: Send + Sync {
    /// Probability that a player at `own_rating` beats `opponent_rating`
    fn expected_score(&self, own_rating: f64, opponent_rating: f64) -> f64;

    /// New integer rating after a single result against `opponent_rating`
    fn updated_rating(&self, own_rating: i32, opponent_rating: f64, result: SessionResult) -> i32;

    /// Signed rating change for a single result
    fn delta(&self, own_rating: i32, opponent_rating: f64, result: SessionResult) -> i32 {
        self.updated_rating(own_rating, opponent_rating, result) - own_rating
    }

    /// Get the initial rating for new participants
    fn initial_rating(&self) -> i32;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Rating changes for a two-sided session outcome
///
/// Each side's opponent rating is the mean of the other side's ratings taken
/// from the same pre-update snapshot, so neither side's update can leak into
/// the other. Output order is winners first, then losers, each in input order.
pub fn team_rating_changes(
    calculator: &dyn RatingCalculator,
    winners: &[(ParticipantId, i32)],
    losers: &[(ParticipantId, i32)],
) -> Vec<RatingChange> {
    let winner_ratings: Vec<i32> = winners.iter().map(|(_, rating)| *rating).collect();
    let loser_ratings: Vec<i32> = losers.iter().map(|(_, rating)| *rating).collect();
    let winners_average = mean_rating(&winner_ratings);
    let losers_average = mean_rating(&loser_ratings);

    let side = |members: &[(ParticipantId, i32)], opponent_average: f64, result: SessionResult| {
        members
            .iter()
            .map(|(participant_id, old_rating)| {
                let new_rating = calculator.updated_rating(*old_rating, opponent_average, result);
                RatingChange {
                    participant_id: *participant_id,
                    old_rating: *old_rating,
                    new_rating,
                    delta: new_rating - old_rating,
                    result,
                }
            })
            .collect::<Vec<_>>()
    };

    let mut changes = side(winners, losers_average, SessionResult::Won);
    changes.extend(side(losers, winners_average, SessionResult::Lost));
    changes
}
