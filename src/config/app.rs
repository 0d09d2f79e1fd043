//! Main application configuration
//!
//! This module defines the primary configuration structures for the match-hall
//! matchmaking service, including environment variable loading, TOML file
//! loading and validation.

use crate::config::queue::QueueConfig;
use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub http: HttpSettings,
    pub matchmaking: MatchmakingSettings,
    pub queue: QueueConfig,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// HTTP listener settings for the API, health and metrics endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Number of participants per session, split into two equal sides
    pub group_size: usize,
    /// Buffered events per observer before lagging observers drop old ones
    pub event_channel_capacity: usize,
    /// Interval of the gauge refresh task in seconds
    pub metrics_interval_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "match-hall".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            group_size: 4,
            event_channel_capacity: 1024,
            metrics_interval_seconds: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // HTTP settings
        if let Ok(host) = env::var("HTTP_HOST") {
            self.http.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.http.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }

        // Matchmaking settings
        if let Ok(size) = env::var("GROUP_SIZE") {
            self.matchmaking.group_size = size
                .parse()
                .map_err(|_| anyhow!("Invalid GROUP_SIZE value: {}", size))?;
        }
        if let Ok(capacity) = env::var("EVENT_CHANNEL_CAPACITY") {
            self.matchmaking.event_channel_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("Invalid EVENT_CHANNEL_CAPACITY value: {}", capacity))?;
        }
        if let Ok(interval) = env::var("METRICS_INTERVAL_SECONDS") {
            self.matchmaking.metrics_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid METRICS_INTERVAL_SECONDS value: {}", interval))?;
        }

        // Rating settings
        if let Ok(k_factor) = env::var("RATING_K_FACTOR") {
            self.rating.k_factor = k_factor
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_K_FACTOR value: {}", k_factor))?;
        }
        if let Ok(initial) = env::var("INITIAL_RATING") {
            self.rating.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid INITIAL_RATING value: {}", initial))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get the gauge refresh interval as Duration
    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.matchmaking.metrics_interval_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.http.port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate matchmaking settings
    let group_size = config.matchmaking.group_size;
    if group_size == 0 || group_size % 2 != 0 {
        return Err(anyhow!(
            "Group size must be a positive even number, got {}",
            group_size
        ));
    }
    if config.matchmaking.event_channel_capacity == 0 {
        return Err(anyhow!("Event channel capacity must be greater than 0"));
    }
    if config.matchmaking.metrics_interval_seconds == 0 {
        return Err(anyhow!("Metrics interval must be greater than 0"));
    }

    config.queue.validate()?;
    config.rating.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.matchmaking.group_size, 4);
        assert_eq!(config.rating.initial_rating, 1200);
        assert_eq!(config.rating.k_factor, 32.0);
    }

    #[test]
    fn test_rejects_odd_group_size() {
        let mut config = AppConfig::default();
        config.matchmaking.group_size = 3;
        assert!(validate_config(&config).is_err());

        config.matchmaking.group_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_non_positive_k_factor() {
        let mut config = AppConfig::default();
        config.rating.k_factor = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [matchmaking]
            group_size = 6

            [rating]
            k_factor = 24.0
            "#,
        )
        .unwrap();

        assert_eq!(config.matchmaking.group_size, 6);
        assert_eq!(config.rating.k_factor, 24.0);
        assert_eq!(config.rating.initial_rating, 1200);
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.queue, QueueConfig::default());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.metrics_interval(), Duration::from_secs(15));
    }
}
