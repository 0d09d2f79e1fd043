//! Queue weighting configuration

use serde::{Deserialize, Serialize};

/// Constants feeding the admission weight formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Weight every admission starts from
    pub base_weight: f64,
    /// Idle minutes that earn one full point of wait bonus
    pub wait_bonus_minutes: f64,
    /// Upper bound of the wait bonus
    pub max_wait_bonus: f64,
    /// Ratings strictly below this receive the assistance bonus
    pub assistance_threshold: i32,
    /// Flat bonus for participants under the threshold
    pub assistance_bonus: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_weight: 1.0,
            wait_bonus_minutes: 30.0,
            max_wait_bonus: 2.0,
            assistance_threshold: 1000,
            assistance_bonus: 0.3,
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        let invalid = |message: String| crate::error::MatchmakingError::ConfigurationError { message };

        if !self.base_weight.is_finite() || self.base_weight < 0.0 {
            return Err(invalid(format!(
                "Base weight must be non-negative, got {}",
                self.base_weight
            )));
        }
        if !self.wait_bonus_minutes.is_finite() || self.wait_bonus_minutes <= 0.0 {
            return Err(invalid(format!(
                "Wait bonus interval must be positive, got {}",
                self.wait_bonus_minutes
            )));
        }
        if !self.max_wait_bonus.is_finite() || self.max_wait_bonus < 0.0 {
            return Err(invalid(format!(
                "Max wait bonus must be non-negative, got {}",
                self.max_wait_bonus
            )));
        }
        if !self.assistance_bonus.is_finite() || self.assistance_bonus < 0.0 {
            return Err(invalid(format!(
                "Assistance bonus must be non-negative, got {}",
                self.assistance_bonus
            )));
        }
        Ok(())
    }
}
