//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the matchmaker,
//! the event stream, metrics and the HTTP server together and runs the
//! background maintenance tasks.

use crate::api::{self, ApiState};
use crate::config::AppConfig;
use crate::events::BroadcastEventPublisher;
use crate::matchmaker::Matchmaker;
use crate::metrics::health::HealthServerConfig;
use crate::metrics::{HealthServer, MetricsCollector};
use crate::service::health::HealthCheck;
use crate::service::matchmaking::MatchmakingService;
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Lock-guarded matchmaker plus event delivery
    matchmaking: MatchmakingService,

    /// Fan-out of matchmaking events to observers
    event_publisher: Arc<BroadcastEventPublisher>,

    metrics_collector: Arc<MetricsCollector>,

    /// HTTP server for API, health and metrics, present while started
    http_server: Mutex<Option<Arc<HealthServer>>>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing match-hall matchmaking service");
        info!(
            "Configuration: service={}, group_size={}, k_factor={}",
            config.service.name, config.matchmaking.group_size, config.rating.k_factor
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let event_publisher = Arc::new(BroadcastEventPublisher::new(
            config.matchmaking.event_channel_capacity,
        ));

        let matchmaker =
            Matchmaker::from_config(&config).map_err(|e| ServiceError::Configuration {
                message: format!("Failed to initialize matchmaker: {}", e),
            })?;

        let matchmaking = MatchmakingService::new(matchmaker, event_publisher.clone())
            .with_metrics(metrics_collector.clone());

        Ok(Self {
            config,
            matchmaking,
            event_publisher,
            metrics_collector,
            http_server: Mutex::new(None),
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Start the HTTP server and background tasks
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting match-hall matchmaking service");

        *self.is_running.write().await = true;

        self.start_http_server().await?;
        self.start_background_tasks()?;

        info!("Match-hall matchmaking service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of match-hall service");

        *self.is_running.write().await = false;

        let server = self
            .http_server
            .lock()
            .map_err(|_| ServiceError::BackgroundTask {
                message: "Failed to acquire http server lock".to_string(),
            })?
            .take();
        if let Some(server) = server {
            if let Err(e) = server.stop().await {
                warn!("Failed to stop HTTP server: {}", e);
            } else {
                info!("HTTP server stopped");
            }
        }

        self.stop_background_tasks().await?;

        let final_stats =
            self.matchmaking
                .stats()
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;
        info!("Final service statistics: {:?}", final_stats);
        info!("Match-hall service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn matchmaking(&self) -> &MatchmakingService {
        &self.matchmaking
    }

    pub fn event_publisher(&self) -> Arc<BroadcastEventPublisher> {
        self.event_publisher.clone()
    }

    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Full HTTP surface: matchmaking API plus health and metrics endpoints
    pub fn router(self: &Arc<Self>) -> Router {
        self.build_http_server().router()
    }

    fn build_http_server(self: &Arc<Self>) -> HealthServer {
        let server_config = HealthServerConfig {
            port: self.config.http.port,
            host: self.config.http.host.clone(),
        };
        let api_routes = api::router(ApiState {
            service: self.matchmaking.clone(),
            events: self.event_publisher.clone(),
        });

        HealthServer::new(server_config, self.metrics_collector.clone())
            .with_app_state(self.clone())
            .with_routes(api_routes)
    }

    async fn start_http_server(self: &Arc<Self>) -> Result<(), ServiceError> {
        let server = Arc::new(self.build_http_server());
        let addr = server.bind_address();

        let handle = {
            let server = server.clone();
            tokio::spawn(async move {
                if let Err(e) = server.start().await {
                    error!("HTTP server failed: {}", e);
                } else {
                    info!("HTTP server task completed");
                }
            })
        };

        *self
            .http_server
            .lock()
            .map_err(|_| ServiceError::Initialization {
                message: "Failed to acquire http server lock".to_string(),
            })? = Some(server);
        self.push_task(handle)?;

        // Give the server a moment to start up
        tokio::time::sleep(Duration::from_millis(100)).await;

        info!("HTTP server started on {}", addr);
        Ok(())
    }

    /// Start background maintenance tasks
    fn start_background_tasks(self: &Arc<Self>) -> Result<(), ServiceError> {
        let interval = self.config.metrics_interval();
        info!(
            "Starting gauge refresh task ({}s interval)...",
            interval.as_secs()
        );
        let gauge_task = {
            let matchmaking = self.matchmaking.clone();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                info!("Gauge refresh task started");

                while *is_running.read().await {
                    ticker.tick().await;

                    match matchmaking.refresh_gauges() {
                        Ok(stats) => debug!(
                            "Updated gauges - queued: {}, active sessions: {}, participants: {}",
                            stats.queue_length,
                            stats.sessions.active_sessions,
                            stats.participants
                        ),
                        Err(e) => warn!("Failed to refresh gauges: {}", e),
                    }
                }

                info!("Gauge refresh task stopped");
            })
        };

        info!("Starting health metrics task ({}s interval)...", interval.as_secs());
        let health_task = {
            let app_state = self.clone();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                info!("Health metrics task started");

                while app_state.is_running().await {
                    ticker.tick().await;

                    let collector = app_state.metrics_collector();
                    collector.update_uptime(app_state.uptime());
                    match HealthCheck::check(app_state.clone()).await {
                        Ok(health) => {
                            collector.update_health_status(health.status.as_gauge());
                            for check in &health.checks {
                                collector.update_component_health(
                                    &check.name,
                                    check.status.as_gauge() > 0,
                                );
                            }
                        }
                        Err(e) => warn!("Health check failed: {}", e),
                    }
                }

                info!("Health metrics task stopped");
            })
        };

        self.push_task(gauge_task)?;
        self.push_task(health_task)?;
        info!("2 background maintenance tasks started successfully");
        Ok(())
    }

    fn push_task(&self, handle: JoinHandle<()>) -> Result<(), ServiceError> {
        self.background_tasks
            .lock()
            .map_err(|_| ServiceError::BackgroundTask {
                message: "Failed to acquire background task lock".to_string(),
            })?
            .push(handle);
        Ok(())
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&self) -> Result<(), ServiceError> {
        let tasks: Vec<JoinHandle<()>> = self
            .background_tasks
            .lock()
            .map_err(|_| ServiceError::BackgroundTask {
                message: "Failed to acquire background task lock".to_string(),
            })?
            .drain(..)
            .collect();

        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return Ok(());
        }

        info!("Stopping {} background tasks...", task_count);
        for (i, task) in tasks.into_iter().enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("All {} background tasks stopped", task_count);
        Ok(())
    }
}
