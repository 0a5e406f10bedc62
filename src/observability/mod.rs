//! Observability subsystem: structured event logging and routing.
//!
//! # Data Flow
//! ```text
//! Request handler (or startup code)
//!     → bus.rs (EventBus::emit / ScopedEmitter::emit)
//!         builds Event: now() + correlation id + source
//!     → router.rs (channel → floor + ordered sinks)
//!     → sink.rs (severity floor, encode, lock)
//!     → rotation.rs (rotate if needed, append one record)
//!
//! Files produced (reference configuration):
//!     api_all.log       every channel, INFO and above
//!     api_security.log  security channel, INFO and above
//!     api_errors.log    errors channel, WARNING and above
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON lines) for machine parsing
//! - Correlation id flows from the request middleware into every event
//! - Metrics are cheap (atomic increments)
//! - Service diagnostics (logging.rs) stay separate from the event feeds

pub mod bus;
pub mod correlation;
pub mod error;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod rotation;
pub mod router;
pub mod sink;

pub use bus::{EmitReport, EventBus, ScopedEmitter};
pub use correlation::CorrelationId;
pub use error::{ConfigurationError, SinkWriteError};
pub use event::{into_fields, Channel, Encoding, Event, Fields, Level};
pub use rotation::RotationPolicy;
pub use router::ChannelRouter;
pub use sink::{Delivery, Sink, SinkState};
