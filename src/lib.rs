//! Demo event-feed service library.
//!
//! Emits structured security-monitoring events and routes them to rotating
//! JSON log files for a downstream SIEM to ship.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::EventBus;
