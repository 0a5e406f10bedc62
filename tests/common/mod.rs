//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use event_feed::config::ServiceConfig;
use event_feed::http::{FixedScenarios, HttpServer};
use event_feed::lifecycle::build_event_bus;
use event_feed::observability::EventBus;

pub const ALL_LOG: &str = "api_all.log";
pub const ERRORS_LOG: &str = "api_errors.log";
pub const SECURITY_LOG: &str = "api_security.log";

/// The reference deployment, writing into a temporary directory.
pub struct Deployment {
    pub dir: TempDir,
    pub config: ServiceConfig,
    pub bus: Arc<EventBus>,
}

impl Deployment {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Start from the default configuration and adjust it before building.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = ServiceConfig::default();
        config.logging.directory = dir.path().display().to_string();
        adjust(&mut config);
        let bus = Arc::new(build_event_bus(&config).unwrap());
        Self { dir, config, bus }
    }

    pub fn log_path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    pub fn records(&self, file: &str) -> Vec<Value> {
        read_records(&self.log_path(file))
    }

    /// Router over this deployment's bus with pinned outcomes.
    pub fn router(&self, scenarios: FixedScenarios) -> Router {
        HttpServer::new(self.config.clone(), self.bus.clone(), Arc::new(scenarios)).router()
    }
}

/// Parse every line of a log file as a JSON record.
pub fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("corrupt line {line:?}: {e}")))
        .collect()
}

pub async fn send(router: &Router, request: Request<Body>) -> (Response<Body>, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (Response::from_parts(parts, Body::empty()), json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
