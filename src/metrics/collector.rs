//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the autohost client: traffic
//! and dispatch counters for the protocol engine, and lobby activity for the
//! host rotation.

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

/// Main metrics collector for the client
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Connection and dispatch metrics
    connection_metrics: ConnectionMetrics,

    /// Lobby-related metrics
    lobby_metrics: LobbyMetrics,
}

/// Connection and dispatch metrics
#[derive(Clone)]
pub struct ConnectionMetrics {
    /// Non-blank lines received from the server
    pub lines_received_total: IntCounter,

    /// Keepalive probes answered
    pub keepalives_total: IntCounter,

    /// Lines sent, by command
    pub outbound_lines_total: IntCounterVec,

    /// Events handed to a registered handler, by event kind
    pub events_dispatched_total: IntCounterVec,

    /// Handler failures that ended the receive loop or shutdown
    pub handler_failures_total: IntCounter,
}

/// Lobby-related metrics
#[derive(Clone)]
pub struct LobbyMetrics {
    /// Recognized system bot announcements, by kind
    pub announcements_total: IntCounterVec,

    /// Host commands issued, for first joins and rotations
    pub host_assignments_total: IntCounter,

    /// Rotations performed at match end
    pub host_rotations_total: IntCounter,

    /// Player commands relayed into the lobby
    pub relayed_commands_total: IntCounter,

    /// Players currently in the host queue
    pub host_queue_length: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let connection_metrics = ConnectionMetrics::new(&registry)?;
        let lobby_metrics = LobbyMetrics::new(&registry)?;

        Ok(Self {
            registry,
            connection_metrics,
            lobby_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get connection metrics
    pub fn connection(&self) -> &ConnectionMetrics {
        &self.connection_metrics
    }

    /// Get lobby metrics
    pub fn lobby(&self) -> &LobbyMetrics {
        &self.lobby_metrics
    }

    pub fn record_line_received(&self) {
        self.connection_metrics.lines_received_total.inc();
    }

    pub fn record_keepalive(&self) {
        self.connection_metrics.keepalives_total.inc();
    }

    /// Record a line sent to the server
    pub fn record_outbound(&self, command: &str) {
        self.connection_metrics
            .outbound_lines_total
            .with_label_values(&[command])
            .inc();
    }

    /// Record an event handed to its handler
    pub fn record_event_dispatched(&self, event: impl fmt::Display) {
        let event = event.to_string();
        self.connection_metrics
            .events_dispatched_total
            .with_label_values(&[event.as_str()])
            .inc();
    }

    pub fn record_handler_failure(&self) {
        self.connection_metrics.handler_failures_total.inc();
    }

    /// Record a recognized announcement
    pub fn record_announcement(&self, kind: &str) {
        self.lobby_metrics
            .announcements_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn record_host_assignment(&self) {
        self.lobby_metrics.host_assignments_total.inc();
    }

    pub fn record_host_rotation(&self) {
        self.lobby_metrics.host_rotations_total.inc();
    }

    pub fn record_relayed_command(&self) {
        self.lobby_metrics.relayed_commands_total.inc();
    }

    pub fn set_host_queue_length(&self, length: usize) {
        self.lobby_metrics.host_queue_length.set(length as i64);
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl ConnectionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let lines_received_total = IntCounter::new(
            "autohost_lines_received_total",
            "Total non-blank lines received",
        )?;
        registry.register(Box::new(lines_received_total.clone()))?;

        let keepalives_total = IntCounter::new(
            "autohost_keepalives_total",
            "Total keepalive probes answered",
        )?;
        registry.register(Box::new(keepalives_total.clone()))?;

        let outbound_lines_total = IntCounterVec::new(
            Opts::new("autohost_outbound_lines_total", "Total lines sent"),
            &["command"],
        )?;
        registry.register(Box::new(outbound_lines_total.clone()))?;

        let events_dispatched_total = IntCounterVec::new(
            Opts::new(
                "autohost_events_dispatched_total",
                "Total events handed to handlers",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events_dispatched_total.clone()))?;

        let handler_failures_total = IntCounter::new(
            "autohost_handler_failures_total",
            "Total event handler failures",
        )?;
        registry.register(Box::new(handler_failures_total.clone()))?;

        Ok(Self {
            lines_received_total,
            keepalives_total,
            outbound_lines_total,
            events_dispatched_total,
            handler_failures_total,
        })
    }
}

impl LobbyMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let announcements_total = IntCounterVec::new(
            Opts::new(
                "autohost_announcements_total",
                "Total recognized system bot announcements",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(announcements_total.clone()))?;

        let host_assignments_total = IntCounter::new(
            "autohost_host_assignments_total",
            "Total host commands issued",
        )?;
        registry.register(Box::new(host_assignments_total.clone()))?;

        let host_rotations_total = IntCounter::new(
            "autohost_host_rotations_total",
            "Total host rotations at match end",
        )?;
        registry.register(Box::new(host_rotations_total.clone()))?;

        let relayed_commands_total = IntCounter::new(
            "autohost_relayed_commands_total",
            "Total player commands relayed to the lobby",
        )?;
        registry.register(Box::new(relayed_commands_total.clone()))?;

        let host_queue_length = IntGauge::new(
            "autohost_host_queue_length",
            "Players currently in the host queue",
        )?;
        registry.register(Box::new(host_queue_length.clone()))?;

        Ok(Self {
            announcements_total,
            host_assignments_total,
            host_rotations_total,
            relayed_commands_total,
            host_queue_length,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientEventKind;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _connection = collector.connection();
        let _lobby = collector.lobby();
    }

    #[test]
    fn test_connection_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_line_received();
        collector.record_line_received();
        collector.record_keepalive();
        collector.record_outbound("PONG");
        collector.record_event_dispatched(ClientEventKind::Message);

        let connection = collector.connection();
        assert_eq!(connection.lines_received_total.get(), 2);
        assert_eq!(connection.keepalives_total.get(), 1);
        assert_eq!(
            connection
                .outbound_lines_total
                .with_label_values(&["PONG"])
                .get(),
            1
        );
        assert_eq!(
            connection
                .events_dispatched_total
                .with_label_values(&["message"])
                .get(),
            1
        );
    }

    #[test]
    fn test_lobby_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_announcement("join");
        collector.record_host_assignment();
        collector.record_host_rotation();
        collector.set_host_queue_length(3);

        assert_eq!(collector.lobby().host_rotations_total.get(), 1);
        assert_eq!(collector.lobby().host_queue_length.get(), 3);
    }

    #[test]
    fn test_clones_share_registry() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let clone = collector.clone();
        clone.record_relayed_command();

        assert_eq!(collector.lobby().relayed_commands_total.get(), 1);
        let text = collector.encode_text().unwrap();
        assert!(text.contains("autohost_relayed_commands_total 1"));
    }
}
