//! Configuration management for the match-hall service
//!
//! This module handles all configuration loading from environment variables
//! and TOML files, validation, and default values for the matchmaking service.

pub mod app;
pub mod queue;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, HttpSettings, MatchmakingSettings, ServiceSettings};
pub use queue::QueueConfig;
pub use rating::RatingConfig;
