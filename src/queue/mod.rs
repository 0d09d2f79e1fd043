//! Priority queue for waiting participants
//!
//! This module handles admission weight computation and the ordered waiting
//! list sessions are formed from.

pub mod priority;
pub mod weight;

// Re-export commonly used types
pub use priority::PriorityQueue;
pub use weight::compute_weight;
