//! Metrics and monitoring for the autohost client
//!
//! This module provides Prometheus metrics collection and the optional HTTP
//! server exposing health, metrics and lobby statistics.

pub mod collector;
pub mod health;

pub use collector::{ConnectionMetrics, LobbyMetrics, MetricsCollector};
pub use health::{HealthServer, HealthServerConfig};
