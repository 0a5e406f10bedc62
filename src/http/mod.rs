//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (issue correlation id, "Incoming request" event)
//!     → handlers.rs (simulated operation, domain events)
//!         scenarios.rs decides the simulated outcome
//!     → request.rs ("Outgoing response" event, x-request-id header)
//!     → response.rs (JSON bodies, error mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod scenarios;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID};
pub use scenarios::{FixedScenarios, RandomScenarios, ScenarioPicker};
pub use server::{AppState, HttpServer};
