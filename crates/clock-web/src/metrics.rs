//! Prometheus metrics for the clock service.
//!
//! Exposes tick, command, and hand metrics in Prometheus text format at `/metrics`.

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
};
use clock_common::snapshot::{ClockSnapshot, CommandKind};
use prometheus::{GaugeVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics registry and collectors.
pub struct ClockMetrics {
    /// The registry holding all metrics.
    registry: Registry,

    /// Total ticks executed.
    pub ticks_total: IntCounter,

    /// Commands applied to the clock, by kind.
    pub commands_applied: IntCounterVec,

    /// Commands rejected by the clock or the endpoints, by kind.
    pub commands_rejected: IntCounterVec,

    /// 1 while the alarm matches the current wall-clock minute.
    pub alarm_ringing: IntGauge,

    /// Current hand angles in degrees, by hand.
    pub hand_angle: GaugeVec,

    /// Number of connected WebSocket clients.
    pub websocket_clients: IntGauge,
}

impl ClockMetrics {
    /// Create a new metrics instance with a custom registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let ticks_total = IntCounter::new("clock_ticks_total", "Total number of clock ticks")
            .expect("metric creation should succeed");

        let commands_applied = IntCounterVec::new(
            Opts::new("clock_commands_applied_total", "Commands applied to the clock"),
            &["kind"],
        )
        .expect("metric creation should succeed");

        let commands_rejected = IntCounterVec::new(
            Opts::new(
                "clock_commands_rejected_total",
                "Commands rejected as invalid",
            ),
            &["kind"],
        )
        .expect("metric creation should succeed");

        let alarm_ringing = IntGauge::new(
            "clock_alarm_ringing",
            "1 while the alarm matches the current minute",
        )
        .expect("metric creation should succeed");

        let hand_angle = GaugeVec::new(
            Opts::new("clock_hand_angle_degrees", "Hand angle in degrees by hand"),
            &["hand"],
        )
        .expect("metric creation should succeed");

        let websocket_clients = IntGauge::new(
            "clock_websocket_clients",
            "Number of connected WebSocket clients",
        )
        .expect("metric creation should succeed");

        registry
            .register(Box::new(ticks_total.clone()))
            .expect("registration should succeed");
        registry
            .register(Box::new(commands_applied.clone()))
            .expect("registration should succeed");
        registry
            .register(Box::new(commands_rejected.clone()))
            .expect("registration should succeed");
        registry
            .register(Box::new(alarm_ringing.clone()))
            .expect("registration should succeed");
        registry
            .register(Box::new(hand_angle.clone()))
            .expect("registration should succeed");
        registry
            .register(Box::new(websocket_clients.clone()))
            .expect("registration should succeed");

        Self {
            registry,
            ticks_total,
            commands_applied,
            commands_rejected,
            alarm_ringing,
            hand_angle,
            websocket_clients,
        }
    }

    /// Record a completed tick.
    pub fn record_tick(&self) {
        self.ticks_total.inc();
    }

    /// Record a command outcome.
    pub fn record_command(&self, kind: CommandKind, applied: bool) {
        let counter = if applied {
            &self.commands_applied
        } else {
            &self.commands_rejected
        };
        counter.with_label_values(&[kind.as_str()]).inc();
    }

    /// Update gauges from a published snapshot.
    pub fn update_from_snapshot(&self, snapshot: &ClockSnapshot) {
        self.alarm_ringing.set(i64::from(snapshot.alarm_active));
        self.hand_angle
            .with_label_values(&["hour"])
            .set(snapshot.hour_angle);
        self.hand_angle
            .with_label_values(&["minute"])
            .set(snapshot.minute_angle);
        self.hand_angle
            .with_label_values(&["second"])
            .set(snapshot.second_angle);
    }

    /// Render metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}

impl Default for ClockMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics endpoint handler.
///
/// GET /metrics
pub async fn metrics_handler(
    axum::extract::Extension(metrics): axum::extract::Extension<Arc<ClockMetrics>>,
) -> impl IntoResponse {
    match metrics.render() {
        Ok(output) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        )
            .into_response(),
    }
}
