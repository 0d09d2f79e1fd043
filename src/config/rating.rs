//! Rating system configuration

use serde::{Deserialize, Serialize};

/// Elo parameters shared by every rating update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Maximum rating change per session
    pub k_factor: f64,
    /// Rating assigned to newly registered participants
    pub initial_rating: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: 1200,
        }
    }
}

impl RatingConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(crate::error::MatchmakingError::ConfigurationError {
                message: format!("K factor must be positive, got {}", self.k_factor),
            });
        }
        Ok(())
    }
}
