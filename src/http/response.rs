//! Response helpers and error mapping.
//!
//! # Design Decisions
//! - Every endpoint answers with a JSON body
//! - A configuration error reaching a handler is a programming mistake:
//!   it is logged on the diagnostic console and answered with 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::observability::ConfigurationError;

/// A JSON response with the given status.
pub fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Error surfaced by a handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("event routing misconfigured: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "error",
                "message": "Internal server error",
            }),
        )
    }
}
