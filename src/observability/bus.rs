//! Event bus: the single entry point for emitting events.
//!
//! # Responsibilities
//! - Build an [`Event`] from the caller's inputs, the clock and the
//!   correlation id of the current unit of work
//! - Resolve the channel and present the event to each sink in order
//! - Close every sink at shutdown
//!
//! # Design Decisions
//! - Constructed explicitly and shared via `Arc`; no global registry
//! - Unrouted channels are returned as errors; sink failures never are
//! - Timestamps never go backwards within the process

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::observability::correlation::CorrelationId;
use crate::observability::error::ConfigurationError;
use crate::observability::event::{Channel, Event, Fields, Level};
use crate::observability::metrics;
use crate::observability::router::ChannelRouter;
use crate::observability::sink::Delivery;

/// Per-emit delivery summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitReport {
    pub written: usize,
    pub filtered: usize,
    pub failed: usize,
}

/// Process-wide event bus.
#[derive(Debug)]
pub struct EventBus {
    router: ChannelRouter,
    source: String,
    last_timestamp_micros: AtomicI64,
}

impl EventBus {
    /// Wrap a routing table. Every channel must be bound.
    pub fn new(router: ChannelRouter, source: impl Into<String>) -> Result<Self, ConfigurationError> {
        router.ensure_complete()?;
        Ok(Self::with_partial_routes(router, source))
    }

    /// Wrap a routing table that may leave channels unbound; emitting to
    /// one of those returns [`ConfigurationError::UnroutedChannel`].
    pub fn with_partial_routes(router: ChannelRouter, source: impl Into<String>) -> Self {
        Self {
            router,
            source: source.into(),
            last_timestamp_micros: AtomicI64::new(i64::MIN),
        }
    }

    pub fn router(&self) -> &ChannelRouter {
        &self.router
    }

    /// Emit with no active unit of work (correlation id `unknown`).
    pub fn emit(
        &self,
        channel: Channel,
        level: Level,
        message: impl Into<String>,
        fields: Fields,
    ) -> Result<EmitReport, ConfigurationError> {
        self.emit_event(channel, level, message.into(), fields, CorrelationId::unknown())
    }

    /// Emit to a channel given by name.
    pub fn emit_named(
        &self,
        channel: &str,
        level: Level,
        message: impl Into<String>,
        fields: Fields,
    ) -> Result<EmitReport, ConfigurationError> {
        self.emit(channel.parse()?, level, message, fields)
    }

    /// An emitter that stamps every event with `correlation_id`.
    pub fn scoped<'a>(&'a self, correlation_id: &'a CorrelationId) -> ScopedEmitter<'a> {
        ScopedEmitter {
            bus: self,
            correlation_id,
        }
    }

    /// Total contained sink failures across every sink.
    pub fn failure_count(&self) -> u64 {
        self.router.sinks().iter().map(|s| s.failures()).sum()
    }

    /// Flush and close every sink. Failures are reported, not returned.
    pub fn shutdown(&self) {
        for sink in self.router.sinks() {
            if let Err(error) = sink.close() {
                tracing::error!(sink = %sink.name(), error = %error, "Failed to close sink");
            }
        }
        tracing::info!("Event sinks closed");
    }

    fn emit_event(
        &self,
        channel: Channel,
        level: Level,
        message: String,
        fields: Fields,
        correlation_id: CorrelationId,
    ) -> Result<EmitReport, ConfigurationError> {
        let binding = self.router.resolve(channel)?;
        let mut report = EmitReport::default();
        if level < binding.floor() {
            report.filtered = binding.sinks().len();
            return Ok(report);
        }

        let event = Event::new(
            self.now(),
            channel,
            level,
            message,
            fields,
            correlation_id,
            self.source.as_str(),
        );
        metrics::record_event(channel, level);

        for sink in binding.sinks() {
            match sink.write(&event) {
                Delivery::Written => report.written += 1,
                Delivery::Filtered => report.filtered += 1,
                Delivery::Failed => report.failed += 1,
            }
        }
        Ok(report)
    }

    fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let micros = now.timestamp_micros();
        let previous = self.last_timestamp_micros.fetch_max(micros, Ordering::AcqRel);
        if previous > micros {
            DateTime::from_timestamp_micros(previous).unwrap_or(now)
        } else {
            now
        }
    }
}

/// Emits on behalf of one unit of work.
#[derive(Debug, Clone, Copy)]
pub struct ScopedEmitter<'a> {
    bus: &'a EventBus,
    correlation_id: &'a CorrelationId,
}

impl ScopedEmitter<'_> {
    pub fn correlation_id(&self) -> &CorrelationId {
        self.correlation_id
    }

    pub fn emit(
        &self,
        channel: Channel,
        level: Level,
        message: impl Into<String>,
        fields: Fields,
    ) -> Result<EmitReport, ConfigurationError> {
        self.bus
            .emit_event(channel, level, message.into(), fields, self.correlation_id.clone())
    }
}
