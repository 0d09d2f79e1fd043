//! Rating system integration using the Elo algorithm
//!
//! This module provides the rating calculator interface and the Elo
//! implementation backed by the skillratings crate, including the team
//! variant used when a session resolves.

pub mod calculator;
pub mod elo;

// Re-export commonly used types
pub use calculator::{team_rating_changes, RatingCalculator};
pub use elo::EloRatingCalculator;
