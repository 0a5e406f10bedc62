//! Metrics collection and exposition.
//!
//! # Metrics
//! - `events_emitted_total` (counter): events accepted by the bus, by channel and level
//! - `event_sink_writes_total` (counter): records appended, by sink
//! - `event_sink_failures_total` (counter): contained storage failures, by sink
//! - `http_requests_total` (counter): requests by method and status
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is optional and off by default

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::observability::event::{Channel, Level};

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_event(channel: Channel, level: Level) {
    ::metrics::counter!(
        "events_emitted_total",
        "channel" => channel.as_str(),
        "level" => level.as_str()
    )
    .increment(1);
}

pub fn record_sink_write(sink: &str) {
    ::metrics::counter!("event_sink_writes_total", "sink" => sink.to_string()).increment(1);
}

pub fn record_sink_failure(sink: &str) {
    ::metrics::counter!("event_sink_failures_total", "sink" => sink.to_string()).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
