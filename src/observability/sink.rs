//! Event sinks.
//!
//! # Responsibilities
//! - Drop events below the sink's severity floor without touching storage
//! - Encode accepted events and append them to the destination
//! - Contain storage failures: count them and report on the console
//!
//! # Design Decisions
//! - One mutex per sink; independent sinks never contend
//! - Encoding happens before the lock is taken
//! - Rotation runs inside the lock, so no writer observes it half-done
//! - Writes are synchronous: async handlers block on a local append for
//!   disk latency only, never on network or on other sinks

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::observability::error::{ConfigurationError, SinkWriteError};
use crate::observability::event::{Encoding, Event, Level};
use crate::observability::metrics;
use crate::observability::rotation::{Console, Destination, RotatingFile, RotationPolicy};

/// Lifecycle state of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Open,
    Closed,
}

/// What happened to one event presented to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The record was appended.
    Written,
    /// Below the severity floor; no I/O performed.
    Filtered,
    /// Storage refused the record; the failure was counted.
    Failed,
}

struct SinkInner {
    destination: Box<dyn Destination>,
    state: SinkState,
}

/// A single destination with a severity floor and an encoding.
pub struct Sink {
    name: String,
    floor: Level,
    encoding: Encoding,
    inner: Mutex<SinkInner>,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl Sink {
    pub fn new(
        name: impl Into<String>,
        floor: Level,
        encoding: Encoding,
        destination: Box<dyn Destination>,
    ) -> Self {
        Self {
            name: name.into(),
            floor,
            encoding,
            inner: Mutex::new(SinkInner {
                destination,
                state: SinkState::Open,
            }),
            writes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// A size-rotated file sink.
    pub fn file(
        name: impl Into<String>,
        floor: Level,
        encoding: Encoding,
        path: impl Into<PathBuf>,
        policy: RotationPolicy,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let path = path.into();
        let file = RotatingFile::open(&path, policy).map_err(|source| {
            ConfigurationError::InvalidDestination {
                sink: name.clone(),
                path,
                source,
            }
        })?;
        Ok(Self::new(name, floor, encoding, Box::new(file)))
    }

    /// A stdout sink.
    pub fn console(name: impl Into<String>, floor: Level, encoding: Encoding) -> Self {
        Self::new(name, floor, encoding, Box::new(Console::stdout()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn floor(&self) -> Level {
        self.floor
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn accepts(&self, level: Level) -> bool {
        level >= self.floor
    }

    /// Records appended so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Write or rotation failures so far. Never decreases.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> SinkState {
        self.lock().state
    }

    /// Present an event to this sink.
    ///
    /// Storage failures never escape: they are counted and reported on the
    /// diagnostic console, and the event is reported as [`Delivery::Failed`].
    pub fn write(&self, event: &Event) -> Delivery {
        if !self.accepts(event.level()) {
            return Delivery::Filtered;
        }

        let mut record = event.encode(self.encoding);
        record.push('\n');

        match self.append(record.as_bytes()) {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                metrics::record_sink_write(&self.name);
                Delivery::Written
            }
            Err(error) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                metrics::record_sink_failure(&self.name);
                tracing::error!(
                    sink = %self.name,
                    channel = %event.channel(),
                    level = %event.level(),
                    correlation_id = %event.correlation_id(),
                    error = %error,
                    "Logging itself failed"
                );
                Delivery::Failed
            }
        }
    }

    /// Flush and close the destination. Later writes fail.
    pub fn close(&self) -> Result<(), SinkWriteError> {
        let mut inner = self.lock();
        if inner.state == SinkState::Closed {
            return Ok(());
        }
        inner.state = SinkState::Closed;
        inner.destination.close()
    }

    fn append(&self, record: &[u8]) -> Result<(), SinkWriteError> {
        let mut inner = self.lock();
        if inner.state == SinkState::Closed {
            return Err(SinkWriteError::Closed);
        }
        inner.destination.append(record)
    }

    fn lock(&self) -> MutexGuard<'_, SinkInner> {
        // A panic mid-append cannot leave the destination in a state worse
        // than a failed write, so keep logging.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name)
            .field("floor", &self.floor)
            .field("encoding", &self.encoding)
            .field("writes", &self.writes())
            .field("failures", &self.failures())
            .finish()
    }
}
