//! Metrics and monitoring for the match-hall matchmaking service
//!
//! This module provides Prometheus metrics collection and the HTTP server that
//! exposes health probes, metrics and statistics.

pub mod collector;
pub mod health;

pub use collector::{
    MetricsCollector, MetricsTimer, OperationMetrics, QueueMetrics, ServiceMetrics,
    SessionMetrics,
};
pub use health::{HealthServer, HealthServerConfig};
