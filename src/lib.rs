//! Match Hall - priority-queue matchmaking service
//!
//! This crate provides a weighted waiting queue that groups participants into
//! sessions, Elo team ratings applied when a session resolves, and an HTTP
//! surface with an event stream for observers.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod matchmaker;
pub mod metrics;
pub mod queue;
pub mod rating;
pub mod registry;
pub mod service;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use events::{BroadcastEventPublisher, EventPublisher};
pub use matchmaker::{Dispatch, Matchmaker};
pub use rating::{EloRatingCalculator, RatingCalculator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
