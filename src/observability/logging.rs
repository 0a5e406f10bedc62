//! Diagnostic logging for the service itself.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for operator-facing output
//! - Respect `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - Separate from the event bus: the bus writes the SIEM feeds, this is
//!   the console the service reports its own health on
//! - Initialization is idempotent so tests and binaries can both call it

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global diagnostic subscriber.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("event_feed={default_level},tower_http={default_level}"))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
