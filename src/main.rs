//! Event feed demo service.
//!
//! An HTTP API whose endpoints exist to emit synthetic security events
//! (logins, registrations, data processing, system errors and warnings).
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request context ──▶ handler ──▶ EventBus::emit
//!                     (correlation id)                     │
//!                                                          ▼
//!                                                   channel router
//!                                                    │     │     │
//!                                   api_security.log ◀┘     │     └▶ console
//!                                                          ▼
//!                                        api_all.log / api_errors.log
//!                                        (size-rotated, JSON lines)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use event_feed::config::{load_config, ServiceConfig};
use event_feed::http::{HttpServer, RandomScenarios};
use event_feed::lifecycle::{announce_startup, build_event_bus, signals, Shutdown};
use event_feed::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "event-feed")]
#[command(about = "Demo API emitting structured security events", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.logging.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "event-feed starting");

    tracing::info!(
        bind_address = %config.server.bind_address,
        log_directory = %config.logging.directory,
        sinks = config.sinks.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bus = Arc::new(build_event_bus(&config)?);
    announce_startup(&bus, &config)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let scenarios = Arc::new(RandomScenarios::new(config.scenarios.clone()));
    let server = HttpServer::new(config, bus.clone(), scenarios);
    let result = server.run(listener, shutdown.subscribe()).await;

    bus.shutdown();
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
