//! Error types for the event logging subsystem.

use std::path::PathBuf;

use crate::observability::event::Channel;

/// A programming or deployment mistake in how channels and sinks are wired.
///
/// Fatal at startup; surfaced to the caller (never swallowed) at runtime.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A channel name outside the closed set.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// A channel with no sink binding in the routing table.
    #[error("channel {0} has no sink binding")]
    UnroutedChannel(Channel),

    /// A channel binding that names a sink that was never built.
    #[error("channel {channel} is bound to undefined sink {sink}")]
    UnknownSink { channel: Channel, sink: String },

    /// Two sinks registered under the same name.
    #[error("sink {0} is defined more than once")]
    DuplicateSink(String),

    /// Two file sinks writing the same file.
    #[error("sinks {first} and {second} share destination {}", path.display())]
    SharedDestination {
        first: String,
        second: String,
        path: PathBuf,
    },

    /// A file sink whose destination cannot be opened.
    #[error("sink {sink} has invalid destination {}: {source}", path.display())]
    InvalidDestination {
        sink: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage refused a write or rotation. Contained inside the sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkWriteError {
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("rotation failed: {0}")]
    Rotate(#[source] std::io::Error),

    #[error("reopening destination failed: {0}")]
    Reopen(#[source] std::io::Error),

    #[error("sink is closed")]
    Closed,
}
