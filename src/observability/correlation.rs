//! Correlation context.
//!
//! A correlation id is issued once per inbound unit of work and copied onto
//! every event produced while handling it. Events emitted outside any unit
//! of work (startup, shutdown) carry the `unknown` sentinel.

use std::sync::Arc;
use uuid::Uuid;

/// Sentinel used when no unit of work is active.
pub const UNKNOWN_CORRELATION_ID: &str = "unknown";

/// Identifier shared by all events of one request. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Issue a fresh random (UUID v4) id.
    pub fn new() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    /// The sentinel for events with no active unit of work.
    pub fn unknown() -> Self {
        Self(Arc::from(UNKNOWN_CORRELATION_ID))
    }

    pub fn is_unknown(&self) -> bool {
        &*self.0 == UNKNOWN_CORRELATION_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::unknown()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
