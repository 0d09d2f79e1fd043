//! Elo rating system implementation
//!
//! This module provides a concrete implementation of the rating calculator
//! using the Elo expected score from the skillratings crate, with a fixed K
//! factor and integer ratings rounded half away from zero.

use crate::config::RatingConfig;
use crate::rating::calculator::RatingCalculator;
use crate::types::SessionResult;
use skillratings::elo::{expected_score, EloRating};

/// Elo rating calculator
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    config: RatingConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo rating calculator
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn k_factor(&self) -> f64 {
        self.config.k_factor
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn expected_score(&self, own_rating: f64, opponent_rating: f64) -> f64 {
        let (own, _) = expected_score(
            &EloRating { rating: own_rating },
            &EloRating {
                rating: opponent_rating,
            },
        );
        own
    }

    fn updated_rating(&self, own_rating: i32, opponent_rating: f64, result: SessionResult) -> i32 {
        let own = f64::from(own_rating);
        let expected = self.expected_score(own, opponent_rating);
        let updated = own + self.config.k_factor * (result.actual_score() - expected);
        // f64::round rounds half away from zero
        updated.round() as i32
    }

    fn initial_rating(&self) -> i32 {
        self.config.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "elo",
            "k_factor": self.config.k_factor,
            "initial_rating": self.config.initial_rating
        })
    }
}
