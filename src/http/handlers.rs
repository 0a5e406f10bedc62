//! Demo endpoints.
//!
//! Each endpoint simulates a business operation and emits the events a
//! security pipeline would expect to see for it.

use axum::{body::Bytes, extract::State, http::StatusCode, response::Response};
use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::http::request::RequestContext;
use crate::http::response::{reply, ApiError};
use crate::http::scenarios::LoginOutcome;
use crate::http::server::AppState;
use crate::observability::event::into_fields;
use crate::observability::{Channel, Level};

pub const ENDPOINTS: [&str; 7] = [
    "/",
    "/health",
    "/api/user/login",
    "/api/user/register",
    "/api/data/process",
    "/api/system/error",
    "/api/system/warning",
];

/// A JSON object body; anything else (absent, malformed) reads as `{}`.
fn json_object(body: &Bytes) -> Map<String, Value> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn string_field(body: &Map<String, Value>, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

pub async fn home(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    ctx.emitter(&state.bus).emit(
        Channel::Api,
        Level::Info,
        "Home endpoint accessed",
        into_fields(json!({"event_type": "endpoint_access", "endpoint": "/"})),
    )?;

    Ok(reply(
        StatusCode::OK,
        json!({
            "message": "Event feed API - demo service for security monitoring",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "active",
            "endpoints": ENDPOINTS,
        }),
    ))
}

pub async fn health(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    ctx.emitter(&state.bus).emit(
        Channel::Api,
        Level::Info,
        "Health check performed",
        into_fields(json!({"event_type": "health_check", "status": "healthy"})),
    )?;

    Ok(reply(
        StatusCode::OK,
        json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "uptime_seconds": state.started.elapsed().as_secs(),
            "sink_failures": state.bus.failure_count(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = json_object(&body);
    let username = string_field(&body, "username");
    let emitter = ctx.emitter(&state.bus);

    let mut fields = into_fields(json!({
        "event_type": "user_authentication",
        "action": "login",
        "username": username,
        "source_ip": ctx.remote_addr,
        "user_agent": ctx.user_agent,
    }));

    let response = match state.scenarios.login() {
        LoginOutcome::Success => {
            let session_id = Uuid::new_v4().to_string();
            fields.insert("status".into(), json!("success"));
            fields.insert("session_id".into(), json!(session_id));
            emitter.emit(Channel::Security, Level::Info, "User login successful", fields)?;
            reply(
                StatusCode::OK,
                json!({
                    "status": "success",
                    "message": "Login successful",
                    "session_id": session_id,
                    "user": username,
                }),
            )
        }
        LoginOutcome::InvalidPassword => {
            fields.insert("status".into(), json!("failed"));
            fields.insert("failure_reason".into(), json!("invalid_password"));
            emitter.emit(Channel::Security, Level::Warning, "Invalid password attempt", fields)?;
            reply(
                StatusCode::UNAUTHORIZED,
                json!({"status": "error", "message": "Invalid credentials"}),
            )
        }
        LoginOutcome::UserNotFound => {
            fields.insert("status".into(), json!("failed"));
            fields.insert("failure_reason".into(), json!("user_not_found"));
            emitter.emit(
                Channel::Security,
                Level::Warning,
                "Login attempt for non-existent user",
                fields,
            )?;
            reply(
                StatusCode::NOT_FOUND,
                json!({"status": "error", "message": "User not found"}),
            )
        }
        LoginOutcome::AccountLocked => {
            fields.insert("status".into(), json!("blocked"));
            fields.insert("failure_reason".into(), json!("account_locked"));
            fields.insert("security_alert".into(), json!(true));
            emitter.emit(Channel::Security, Level::Error, "Login attempt on locked account", fields)?;
            reply(
                StatusCode::LOCKED,
                json!({"status": "error", "message": "Account is locked"}),
            )
        }
    };
    Ok(response)
}

pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = json_object(&body);
    let user_id = Uuid::new_v4().to_string();

    ctx.emitter(&state.bus).emit(
        Channel::Api,
        Level::Info,
        "User registration",
        into_fields(json!({
            "event_type": "user_management",
            "action": "register",
            "status": "success",
            "username": string_field(&body, "username"),
            "email": string_field(&body, "email"),
            "source_ip": ctx.remote_addr,
            "user_id": user_id,
        })),
    )?;

    Ok(reply(
        StatusCode::CREATED,
        json!({
            "status": "success",
            "message": "User registered successfully",
            "user_id": user_id,
        }),
    ))
}

pub async fn process_data(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Result<Response, ApiError> {
    let data = Value::Object(json_object(&body));
    let data_size = data.to_string().len();
    let outcome = state.scenarios.processing();
    tokio::time::sleep(outcome.duration).await;

    let seconds = (outcome.duration.as_secs_f64() * 1000.0).round() / 1000.0;
    let emitter = ctx.emitter(&state.bus);

    if outcome.succeeded {
        emitter.emit(
            Channel::Api,
            Level::Info,
            "Data processing completed",
            into_fields(json!({
                "event_type": "data_processing",
                "action": "process",
                "status": "success",
                "processing_time_seconds": seconds,
                "data_size": data_size,
                "records_processed": outcome.records_processed,
            })),
        )?;
        Ok(reply(
            StatusCode::OK,
            json!({
                "status": "success",
                "message": "Data processed successfully",
                "processing_time": seconds,
                "records_processed": outcome.records_processed,
            }),
        ))
    } else {
        emitter.emit(
            Channel::Errors,
            Level::Warning,
            "Data processing failed",
            into_fields(json!({
                "event_type": "data_processing",
                "action": "process",
                "status": "failed",
                "processing_time_seconds": seconds,
                "data_size": data_size,
                "error_reason": "data_validation_failed",
            })),
        )?;
        Ok(reply(
            StatusCode::BAD_REQUEST,
            json!({"status": "error", "message": "Data validation failed"}),
        ))
    }
}

pub async fn system_error(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    let condition = state.scenarios.system_error();

    ctx.emitter(&state.bus).emit(
        Channel::Errors,
        Level::Error,
        "System error triggered",
        into_fields(json!({
            "event_type": "system_error",
            "error_type": condition.kind,
            "error_message": condition.message,
            "severity": "high",
            "component": "system",
        })),
    )?;

    Ok(reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "status": "error",
            "type": condition.kind,
            "message": condition.message,
        }),
    ))
}

pub async fn system_warning(State(state): State<AppState>, ctx: RequestContext) -> Result<Response, ApiError> {
    let condition = state.scenarios.system_warning();

    ctx.emitter(&state.bus).emit(
        Channel::Api,
        Level::Warning,
        "System warning triggered",
        into_fields(json!({
            "event_type": "system_warning",
            "warning_type": condition.kind,
            "warning_message": condition.message,
            "severity": "medium",
            "component": "system",
        })),
    )?;

    Ok(reply(
        StatusCode::OK,
        json!({
            "status": "warning",
            "type": condition.kind,
            "message": condition.message,
        }),
    ))
}

/// Unmatched paths still pass through the request middleware.
pub async fn not_found() -> Response {
    reply(
        StatusCode::NOT_FOUND,
        json!({"status": "error", "message": "Endpoint not found"}),
    )
}
