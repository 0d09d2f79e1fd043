//! Session management for the matchmaking service
//!
//! This module forms sessions from the priority queue, tracks the active ones
//! and resolves them into rating updates.

pub mod manager;

// Re-export commonly used types
pub use manager::{SessionManager, SessionManagerStats};
