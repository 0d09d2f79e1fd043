//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the match-hall matchmaking
//! service using Prometheus metrics.

use crate::session::SessionManagerStats;
use crate::types::RatingChange;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue and participant metrics
    queue_metrics: QueueMetrics,

    /// Session and rating metrics
    session_metrics: SessionMetrics,

    /// Operation outcome and latency metrics
    operation_metrics: OperationMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,

    /// Observers attached to the event stream
    pub event_observers: IntGauge,
}

/// Queue and participant metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Participants currently waiting
    pub queue_length: IntGauge,

    /// Participants ever registered
    pub participants_known: IntGauge,

    /// Total successful admissions
    pub admissions_total: IntCounter,

    /// Total successful withdrawals
    pub withdrawals_total: IntCounter,

    /// Weight assigned on admission
    pub admission_weight: Histogram,
}

/// Session and rating metrics
#[derive(Clone)]
pub struct SessionMetrics {
    /// Sessions currently active
    pub active_sessions: IntGauge,

    /// Total sessions formed
    pub sessions_formed_total: IntCounter,

    /// Total sessions resolved
    pub sessions_resolved_total: IntCounter,

    /// Rating deltas applied at resolution, by result
    pub rating_delta: HistogramVec,
}

/// Operation metrics
#[derive(Clone)]
pub struct OperationMetrics {
    /// Duration of core operations including lock acquisition
    pub operation_duration: HistogramVec,

    /// Operations rejected with a caller or internal error
    pub rejected_operations_total: IntCounterVec,

    /// Events handed to the publisher
    pub events_published_total: IntCounterVec,

    /// Events the publisher failed to accept
    pub publish_failures_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let session_metrics = SessionMetrics::new(&registry)?;
        let operation_metrics = OperationMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            session_metrics,
            operation_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    pub fn session(&self) -> &SessionMetrics {
        &self.session_metrics
    }

    pub fn operation(&self) -> &OperationMetrics {
        &self.operation_metrics
    }

    /// Refresh the state gauges from a consistent read of the matchmaker
    pub fn update_state_gauges(
        &self,
        queue_length: usize,
        participants: usize,
        stats: &SessionManagerStats,
    ) {
        self.queue_metrics.queue_length.set(queue_length as i64);
        self.queue_metrics.participants_known.set(participants as i64);
        self.session_metrics
            .active_sessions
            .set(stats.active_sessions as i64);
    }

    /// Record a successful admission
    pub fn record_admission(&self, weight: f64, duration: Duration) {
        self.queue_metrics.admissions_total.inc();
        self.queue_metrics.admission_weight.observe(weight);
        self.record_operation("admit", duration);
    }

    /// Record a successful withdrawal
    pub fn record_withdrawal(&self, duration: Duration) {
        self.queue_metrics.withdrawals_total.inc();
        self.record_operation("withdraw", duration);
    }

    /// Record a session being formed
    pub fn record_session_formed(&self, duration: Duration) {
        self.session_metrics.sessions_formed_total.inc();
        self.record_operation("form_session", duration);
    }

    /// Record a session being resolved with its rating changes
    pub fn record_session_resolved(&self, changes: &[RatingChange], duration: Duration) {
        self.session_metrics.sessions_resolved_total.inc();
        for change in changes {
            self.session_metrics
                .rating_delta
                .with_label_values(&[change.result.as_str()])
                .observe(f64::from(change.delta));
        }
        self.record_operation("resolve_session", duration);
    }

    /// Record an operation rejected with the given error kind
    pub fn record_rejection(&self, operation: &str, kind: &str) {
        self.operation_metrics
            .rejected_operations_total
            .with_label_values(&[operation, kind])
            .inc();
    }

    /// Record operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.operation_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Record an event handed to the publisher
    pub fn record_event_published(&self, event_type: &str, success: bool) {
        self.operation_metrics
            .events_published_total
            .with_label_values(&[event_type])
            .inc();
        if !success {
            self.operation_metrics.publish_failures_total.inc();
        }
    }

    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    pub fn update_event_observers(&self, observers: usize) {
        self.service_metrics.event_observers.set(observers as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("match_hall_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "match_hall_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("match_hall_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        let event_observers = IntGauge::new(
            "match_hall_event_observers",
            "Observers attached to the event stream",
        )?;
        registry.register(Box::new(event_observers.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
            event_observers,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let queue_length =
            IntGauge::new("match_hall_queue_length", "Participants currently waiting")?;
        registry.register(Box::new(queue_length.clone()))?;

        let participants_known = IntGauge::new(
            "match_hall_participants_known",
            "Participants ever registered",
        )?;
        registry.register(Box::new(participants_known.clone()))?;

        let admissions_total =
            IntCounter::new("match_hall_admissions_total", "Total queue admissions")?;
        registry.register(Box::new(admissions_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("match_hall_withdrawals_total", "Total queue withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let admission_weight = Histogram::with_opts(
            HistogramOpts::new("match_hall_admission_weight", "Weight assigned on admission")
                .buckets(vec![1.0, 1.3, 1.5, 2.0, 2.5, 3.0, 3.3]),
        )?;
        registry.register(Box::new(admission_weight.clone()))?;

        Ok(Self {
            queue_length,
            participants_known,
            admissions_total,
            withdrawals_total,
            admission_weight,
        })
    }
}

impl SessionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_sessions =
            IntGauge::new("match_hall_active_sessions", "Sessions currently active")?;
        registry.register(Box::new(active_sessions.clone()))?;

        let sessions_formed_total =
            IntCounter::new("match_hall_sessions_formed_total", "Total sessions formed")?;
        registry.register(Box::new(sessions_formed_total.clone()))?;

        let sessions_resolved_total = IntCounter::new(
            "match_hall_sessions_resolved_total",
            "Total sessions resolved",
        )?;
        registry.register(Box::new(sessions_resolved_total.clone()))?;

        let rating_delta = HistogramVec::new(
            HistogramOpts::new("match_hall_rating_delta", "Rating change per participant")
                .buckets(vec![
                    -32.0, -24.0, -16.0, -8.0, 0.0, 8.0, 16.0, 24.0, 32.0,
                ]),
            &["result"],
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        Ok(Self {
            active_sessions,
            sessions_formed_total,
            sessions_resolved_total,
            rating_delta,
        })
    }
}

impl OperationMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "match_hall_operation_duration_seconds",
                "Matchmaking operation duration",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let rejected_operations_total = IntCounterVec::new(
            Opts::new(
                "match_hall_rejected_operations_total",
                "Operations rejected with an error",
            ),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(rejected_operations_total.clone()))?;

        let events_published_total = IntCounterVec::new(
            Opts::new(
                "match_hall_events_published_total",
                "Events handed to the publisher",
            ),
            &["event_type"],
        )?;
        registry.register(Box::new(events_published_total.clone()))?;

        let publish_failures_total = IntCounter::new(
            "match_hall_publish_failures_total",
            "Events the publisher failed to accept",
        )?;
        registry.register(Box::new(publish_failures_total.clone()))?;

        Ok(Self {
            operation_duration,
            rejected_operations_total,
            events_published_total,
            publish_failures_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionResult;
    use crate::utils::generate_participant_id;
    use prometheus::Encoder;

    fn render(collector: &MetricsCollector) -> String {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&collector.registry().gather(), &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _service = collector.service();
        let _queue = collector.queue();
        let _session = collector.session();
        let _operation = collector.operation();
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Arc::new(Registry::new());
        assert!(MetricsCollector::with_registry(registry.clone()).is_ok());
        assert!(MetricsCollector::with_registry(registry).is_err());
    }

    #[test]
    fn test_queue_operations_are_counted() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_admission(1.3, Duration::from_micros(50));
        collector.record_admission(1.0, Duration::from_micros(50));
        collector.record_withdrawal(Duration::from_micros(20));

        assert_eq!(collector.queue().admissions_total.get(), 2);
        assert_eq!(collector.queue().withdrawals_total.get(), 1);
        assert_eq!(collector.queue().admission_weight.get_sample_count(), 2);
    }

    #[test]
    fn test_resolution_records_deltas() {
        let collector = MetricsCollector::new().unwrap();
        let changes = vec![
            RatingChange {
                participant_id: generate_participant_id(),
                old_rating: 1200,
                new_rating: 1216,
                delta: 16,
                result: SessionResult::Won,
            },
            RatingChange {
                participant_id: generate_participant_id(),
                old_rating: 1200,
                new_rating: 1184,
                delta: -16,
                result: SessionResult::Lost,
            },
        ];

        collector.record_session_formed(Duration::from_micros(10));
        collector.record_session_resolved(&changes, Duration::from_micros(10));

        assert_eq!(collector.session().sessions_formed_total.get(), 1);
        assert_eq!(collector.session().sessions_resolved_total.get(), 1);
        let won = collector
            .session()
            .rating_delta
            .with_label_values(&["won"]);
        assert_eq!(won.get_sample_count(), 1);
        assert_eq!(won.get_sample_sum(), 16.0);
    }

    #[test]
    fn test_rejections_by_kind() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_rejection("admit", "already_active");
        collector.record_rejection("admit", "already_active");
        collector.record_rejection("withdraw", "not_queued");

        let rejected = &collector.operation().rejected_operations_total;
        assert_eq!(rejected.with_label_values(&["admit", "already_active"]).get(), 2);
        assert_eq!(rejected.with_label_values(&["withdraw", "not_queued"]).get(), 1);
    }

    #[test]
    fn test_state_gauges_and_exposition() {
        let collector = MetricsCollector::new().unwrap();
        let stats = SessionManagerStats {
            sessions_formed: 3,
            sessions_resolved: 1,
            active_sessions: 2,
        };
        collector.update_state_gauges(5, 13, &stats);
        collector.update_health_status(2);
        collector.record_event_published("queue_changed", false);

        assert_eq!(collector.queue().queue_length.get(), 5);
        assert_eq!(collector.session().active_sessions.get(), 2);
        assert_eq!(collector.operation().publish_failures_total.get(), 1);

        let output = render(&collector);
        assert!(output.contains("match_hall_queue_length 5"));
        assert!(output.contains("match_hall_participants_known 13"));
        assert!(output.contains("match_hall_health_status 2"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().unwrap();
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();
        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
