//! Request context and lifecycle events.
//!
//! # Responsibilities
//! - Issue a fresh correlation id for every inbound request
//! - Make it (and client details) available to handlers via extensions
//! - Emit the "Incoming request" / "Outgoing response" events
//! - Return the id to the client in `x-request-id`
//!
//! # Design Decisions
//! - The id is always generated here; a client-supplied `x-request-id`
//!   is never reused, so concurrent requests cannot share one
//! - Context lives in request extensions, never in global state

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::event::into_fields;
use crate::observability::{metrics, Channel, CorrelationId, EventBus, Level, ScopedEmitter};

/// Header carrying the correlation id back to the client.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Per-request context attached by [`request_context_middleware`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub remote_addr: String,
    pub user_agent: String,
}

impl RequestContext {
    fn from_request(request: &Request) -> Self {
        let remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            correlation_id: CorrelationId::new(),
            remote_addr,
            user_agent: header_str(request.headers(), header::USER_AGENT),
        }
    }

    /// Emitter stamping events with this request's correlation id.
    pub fn emitter<'a>(&'a self, bus: &'a EventBus) -> ScopedEmitter<'a> {
        bus.scoped(&self.correlation_id)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Outside the middleware there is no unit of work: use the sentinel.
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext {
                correlation_id: CorrelationId::unknown(),
                remote_addr: "unknown".to_string(),
                user_agent: header_str(&parts.headers, header::USER_AGENT),
            }))
    }
}

/// Issue the correlation id and log the request/response pair.
pub async fn request_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let context = RequestContext::from_request(&request);
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let incoming = context.emitter(&state.bus).emit(
        Channel::Api,
        Level::Info,
        "Incoming request",
        into_fields(json!({
            "event_type": "api_request",
            "method": method,
            "path": path,
            "remote_addr": context.remote_addr,
            "user_agent": context.user_agent,
            "content_type": header_str(request.headers(), header::CONTENT_TYPE),
        })),
    );
    if let Err(e) = incoming {
        return ApiError::from(e).into_response();
    }

    request.extensions_mut().insert(context.clone());
    let mut response = next.run(request).await;

    let status = response.status().as_u16();
    let content_length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .or_else(|| response.body().size_hint().exact());

    let outgoing = context.emitter(&state.bus).emit(
        Channel::Api,
        Level::Info,
        "Outgoing response",
        into_fields(json!({
            "event_type": "api_response",
            "method": method,
            "path": path,
            "status_code": status,
            "content_length": content_length,
            "duration_ms": start.elapsed().as_secs_f64() * 1000.0,
        })),
    );
    if let Err(e) = outgoing {
        return ApiError::from(e).into_response();
    }

    metrics::record_request(&method, status, start);

    if let Ok(value) = HeaderValue::from_str(context.correlation_id.as_str()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
