//! HTTP endpoint tests driving the router in-process.

use std::collections::HashSet;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use event_feed::http::scenarios::{LoginOutcome, ProcessingOutcome, SYSTEM_ERRORS, SYSTEM_WARNINGS};
use event_feed::http::{FixedScenarios, X_REQUEST_ID};

mod common;
use common::{get, post_json, send, Deployment, ALL_LOG, ERRORS_LOG, SECURITY_LOG};

fn request_id(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string()
}

fn by_message<'a>(records: &'a [Value], message: &str) -> Vec<&'a Value> {
    records.iter().filter(|r| r["message"] == message).collect()
}

#[tokio::test]
async fn test_request_lifecycle_events_share_correlation_id() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios::default());

    let (response, body) = send(&router, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    let id = request_id(&response);

    let all = d.records(ALL_LOG);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["message"], "Incoming request");
    assert_eq!(all[0]["method"], "GET");
    assert_eq!(all[0]["path"], "/health");
    assert_eq!(all[1]["message"], "Health check performed");
    assert_eq!(all[2]["message"], "Outgoing response");
    assert_eq!(all[2]["status_code"], 200);
    for record in &all {
        assert_eq!(record["correlation_id"], id.as_str());
    }
}

#[tokio::test]
async fn test_each_request_gets_a_fresh_id() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios::default());

    let mut ids = HashSet::new();
    for _ in 0..5 {
        let request = axum::http::Request::builder()
            .uri("/")
            .header(X_REQUEST_ID, "client-chosen")
            .body(axum::body::Body::empty())
            .unwrap();
        let (response, _) = send(&router, request).await;
        let id = request_id(&response);
        assert_ne!(id, "client-chosen");
        ids.insert(id);
    }
    assert_eq!(ids.len(), 5);
}

#[tokio::test]
async fn test_successful_login() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios::default());

    let (response, body) = send(
        &router,
        post_json("/api/user/login", json!({"username": "alice", "password": "password123"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body["user"], "alice");

    let security = d.records(SECURITY_LOG);
    assert_eq!(security.len(), 1);
    assert_eq!(security[0]["level"], "INFO");
    assert_eq!(security[0]["status"], "success");
    assert_eq!(security[0]["session_id"], body["session_id"]);
    assert_eq!(security[0]["correlation_id"], request_id(&response).as_str());
    assert_eq!(by_message(&d.records(ALL_LOG), "User login successful").len(), 1);
}

#[tokio::test]
async fn test_failed_logins_map_to_status_and_level() {
    let cases = [
        (LoginOutcome::InvalidPassword, StatusCode::UNAUTHORIZED, "WARNING", "invalid_password"),
        (LoginOutcome::UserNotFound, StatusCode::NOT_FOUND, "WARNING", "user_not_found"),
        (LoginOutcome::AccountLocked, StatusCode::LOCKED, "ERROR", "account_locked"),
    ];

    for (outcome, status, level, reason) in cases {
        let d = Deployment::new();
        let router = d.router(FixedScenarios {
            login: outcome,
            ..FixedScenarios::default()
        });

        let (response, body) = send(&router, post_json("/api/user/login", json!({"username": "admin"}))).await;
        assert_eq!(response.status(), status);
        assert_eq!(body["status"], "error");

        let security = d.records(SECURITY_LOG);
        assert_eq!(security.len(), 1);
        assert_eq!(security[0]["level"], level);
        assert_eq!(security[0]["failure_reason"], reason);
        assert_eq!(security[0]["username"], "admin");
        assert!(d.records(ERRORS_LOG).is_empty());
    }
}

#[tokio::test]
async fn test_locked_account_raises_security_alert() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios {
        login: LoginOutcome::AccountLocked,
        ..FixedScenarios::default()
    });

    send(&router, post_json("/api/user/login", json!({"username": "admin"}))).await;
    assert_eq!(d.records(SECURITY_LOG)[0]["security_alert"], true);
}

#[tokio::test]
async fn test_malformed_login_body_is_tolerated() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios::default());

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/user/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (response, _) = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(d.records(SECURITY_LOG)[0]["username"], "unknown");
}

#[tokio::test]
async fn test_register() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios::default());

    let (response, body) = send(
        &router,
        post_json("/api/user/register", json!({"username": "maria", "email": "maria@example.com"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let all = d.records(ALL_LOG);
    let registration = by_message(&all, "User registration");
    assert_eq!(registration.len(), 1);
    assert_eq!(registration[0]["email"], "maria@example.com");
    assert_eq!(registration[0]["user_id"], body["user_id"]);
    assert!(d.records(SECURITY_LOG).is_empty());
}

#[tokio::test]
async fn test_data_processing_success_and_failure() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios::default());
    let (response, body) = send(&router, post_json("/api/data/process", json!({"data": [1, 2, 3]}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body["records_processed"], 42);
    assert!(d.records(ERRORS_LOG).is_empty());

    let d = Deployment::new();
    let router = d.router(FixedScenarios {
        processing: ProcessingOutcome {
            succeeded: false,
            duration: Duration::from_millis(5),
            records_processed: 0,
        },
        ..FixedScenarios::default()
    });
    let (response, _) = send(&router, post_json("/api/data/process", json!({"data": []}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let errors = d.records(ERRORS_LOG);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["level"], "WARNING");
    assert_eq!(errors[0]["error_reason"], "data_validation_failed");
    assert_eq!(by_message(&d.records(ALL_LOG), "Data processing failed").len(), 1);
}

#[tokio::test]
async fn test_system_error_and_warning() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios {
        system_error: SYSTEM_ERRORS[3],
        system_warning: SYSTEM_WARNINGS[1],
        ..FixedScenarios::default()
    });

    let (response, body) = send(&router, get("/api/system/error")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["type"], "disk_space_low");

    let (response, body) = send(&router, get("/api/system/warning")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body["type"], "slow_response_time");

    let errors = d.records(ERRORS_LOG);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["level"], "ERROR");
    assert_eq!(errors[0]["error_type"], "disk_space_low");

    let warnings = by_message(&d.records(ALL_LOG), "System warning triggered").len();
    assert_eq!(warnings, 1);
}

#[tokio::test]
async fn test_unknown_route_is_still_logged() {
    let d = Deployment::new();
    let router = d.router(FixedScenarios::default());

    let (response, _) = send(&router, get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let all = d.records(ALL_LOG);
    let outgoing = by_message(&all, "Outgoing response");
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0]["status_code"], 404);
}
