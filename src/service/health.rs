//! Health check endpoints and monitoring
//!
//! This module provides health check functionality for the match-hall
//! matchmaking service, including readiness and liveness probes.

use crate::service::app::AppState;
use crate::service::matchmaking::MatchmakingStats;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Numeric form used by the health gauge (0=unhealthy, 1=degraded, 2=healthy)
    pub fn as_gauge(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub queue_length: usize,
    pub participants: usize,
    pub active_sessions: usize,
    pub sessions_formed: u64,
    pub sessions_resolved: u64,
    pub event_observers: usize,
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(&app_state).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        let (matchmaker_check, matchmaking_stats) = Self::check_matchmaker(&app_state);
        if matchmaker_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(matchmaker_check);

        let observers = app_state.event_publisher().receiver_count();
        checks.push(ComponentCheck {
            name: "event_stream".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!("{} observers attached", observers)),
            duration_ms: 0,
        });

        let stats = match matchmaking_stats {
            Some(stats) => ServiceStats {
                queue_length: stats.queue_length,
                participants: stats.participants,
                active_sessions: stats.sessions.active_sessions,
                sessions_formed: stats.sessions.sessions_formed,
                sessions_resolved: stats.sessions.sessions_resolved,
                event_observers: observers,
                uptime_seconds: app_state.uptime().as_secs(),
            },
            None => ServiceStats {
                event_observers: observers,
                uptime_seconds: app_state.uptime().as_secs(),
                ..ServiceStats::default()
            },
        };

        Ok(HealthCheck {
            status: overall_status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_matchmaker(&app_state).0.status)
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// The matchmaker is healthy while its lock can be taken
    fn check_matchmaker(app_state: &AppState) -> (ComponentCheck, Option<MatchmakingStats>) {
        let start = std::time::Instant::now();

        let (status, message, stats) = match app_state.matchmaking().stats() {
            Ok(stats) => (HealthStatus::Healthy, None, Some(stats)),
            Err(e) => {
                error!("Matchmaker health check failed: {}", e);
                (HealthStatus::Unhealthy, Some(e.to_string()), None)
            }
        };

        let check = ComponentCheck {
            name: "matchmaker".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        (check, stats)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
