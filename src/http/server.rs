//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request context, CORS)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::request::request_context_middleware;
use crate::http::scenarios::ScenarioPicker;
use crate::observability::EventBus;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<EventBus>,
    pub scenarios: Arc<dyn ScenarioPicker>,
    pub started: Instant,
}

/// HTTP server for the demo API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server around an already built event bus.
    pub fn new(config: ServiceConfig, bus: Arc<EventBus>, scenarios: Arc<dyn ScenarioPicker>) -> Self {
        let state = AppState {
            bus,
            scenarios,
            started: Instant::now(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", get(handlers::home))
            .route("/health", get(handlers::health))
            .route("/api/user/login", post(handlers::login))
            .route("/api/user/register", post(handlers::register))
            .route("/api/data/process", post(handlers::process_data))
            .route("/api/system/error", get(handlers::system_error))
            .route("/api/system/warning", get(handlers::system_warning))
            .fallback(handlers::not_found)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(middleware::from_fn_with_state(
                        state.clone(),
                        request_context_middleware,
                    )),
            )
            .with_state(state);

        if config.server.cors_enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// The router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            cors = self.config.server.cors_enabled,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
