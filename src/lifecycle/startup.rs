//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every sink from configuration (creating the log directory)
//! - Bind channels to sinks and wrap them in the event bus
//! - Emit the startup event before any request is served
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal
//! - Sinks are opened in configuration order

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::config::{ServiceConfig, SinkConfig, SinkKind};
use crate::observability::event::into_fields;
use crate::observability::{
    Channel, ChannelRouter, ConfigurationError, EventBus, Level, RotationPolicy, Sink,
};

/// Build the process-wide event bus from a validated configuration.
pub fn build_event_bus(config: &ServiceConfig) -> Result<EventBus, ConfigurationError> {
    let directory = Path::new(&config.logging.directory);

    let mut builder = ChannelRouter::builder();
    let mut destinations: HashMap<PathBuf, &str> = HashMap::new();
    for sink in &config.sinks {
        if let Some(path) = destination(directory, sink) {
            if let Some(first) = destinations.insert(path.clone(), sink.name.as_str()) {
                return Err(ConfigurationError::SharedDestination {
                    first: first.to_string(),
                    second: sink.name.clone(),
                    path,
                });
            }
        }
        builder = builder.sink(build_sink(directory, sink)?);
    }
    for (name, binding) in &config.channels {
        let channel: Channel = name.parse()?;
        builder = builder.bind(channel, binding.level, binding.sinks.iter().cloned());
    }

    let bus = EventBus::new(builder.build()?, config.server.service_name.as_str())?;
    tracing::info!(
        directory = %directory.display(),
        sinks = config.sinks.len(),
        "Event bus ready"
    );
    Ok(bus)
}

/// Where a file sink writes; `None` for the console.
fn destination(directory: &Path, config: &SinkConfig) -> Option<PathBuf> {
    match config.kind {
        SinkKind::Console => None,
        SinkKind::File => Some(directory.join(config.path.as_deref().unwrap_or_default().trim())),
    }
}

fn build_sink(directory: &Path, config: &SinkConfig) -> Result<Sink, ConfigurationError> {
    match destination(directory, config) {
        None => Ok(Sink::console(&config.name, config.level, config.encoding)),
        Some(path) => {
            let policy = RotationPolicy {
                capacity_bytes: config.max_bytes,
                max_generations: config.backup_count,
            };
            Sink::file(
                &config.name,
                config.level,
                config.encoding,
                path,
                policy,
            )
        }
    }
}

/// Record that the service is starting. No request is active yet.
pub fn announce_startup(bus: &EventBus, config: &ServiceConfig) -> Result<(), ConfigurationError> {
    let fields = into_fields(json!({
        "event_type": "application_start",
        "bind_address": config.server.bind_address,
        "version": env!("CARGO_PKG_VERSION"),
    }));
    bus.emit(Channel::Api, Level::Info, "Starting API microservice", fields)?;
    Ok(())
}
