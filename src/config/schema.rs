//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! Every section has defaults that reproduce the reference deployment: three
//! rotating JSON feeds plus a plain console feed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::observability::event::{Channel, Encoding, Level};
use crate::observability::rotation::{DEFAULT_CAPACITY_BYTES, DEFAULT_MAX_GENERATIONS};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Log directory and diagnostic level.
    pub logging: LoggingConfig,

    /// Event sink definitions.
    pub sinks: Vec<SinkConfig>,

    /// Channel name → sinks bindings.
    pub channels: BTreeMap<String, ChannelConfig>,

    /// Metrics settings.
    pub observability: ObservabilityConfig,

    /// Simulated business scenarios.
    pub scenarios: ScenarioConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            sinks: default_sinks(),
            channels: default_channels(),
            observability: ObservabilityConfig::default(),
            scenarios: ScenarioConfig::default(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Allow cross-origin requests from any origin.
    pub cors_enabled: bool,

    /// Stamped as `source` on every event.
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            cors_enabled: true,
            service_name: "api_microservice".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory file sink paths are relative to.
    pub directory: String,

    /// Diagnostic log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Kind of destination a sink writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    File,
    Console,
}

/// A single sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkConfig {
    /// Unique sink name referenced by channel bindings.
    pub name: String,

    pub kind: SinkKind,

    /// File name, relative to `logging.directory`. Required for file sinks.
    #[serde(default)]
    pub path: Option<String>,

    /// Severity floor.
    #[serde(default = "default_level")]
    pub level: Level,

    #[serde(default = "default_encoding")]
    pub encoding: Encoding,

    /// Rotation threshold in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Rotated generations to keep.
    #[serde(default = "default_backup_count")]
    pub backup_count: u32,
}

impl SinkConfig {
    /// A JSON file sink with default rotation.
    pub fn file(name: &str, path: &str, level: Level) -> Self {
        Self {
            name: name.to_string(),
            kind: SinkKind::File,
            path: Some(path.to_string()),
            level,
            encoding: Encoding::Json,
            max_bytes: DEFAULT_CAPACITY_BYTES,
            backup_count: DEFAULT_MAX_GENERATIONS,
        }
    }

    /// A plain stdout sink.
    pub fn console(name: &str, level: Level) -> Self {
        Self {
            name: name.to_string(),
            kind: SinkKind::Console,
            path: None,
            level,
            encoding: Encoding::Plain,
            max_bytes: DEFAULT_CAPACITY_BYTES,
            backup_count: DEFAULT_MAX_GENERATIONS,
        }
    }
}

/// Binding of one channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Sink names, in delivery order.
    pub sinks: Vec<String>,

    /// Channel severity floor, applied before routing.
    #[serde(default = "default_level")]
    pub level: Level,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Knobs for the simulated business scenarios.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Probability that data processing fails (0.0 ..= 1.0).
    pub processing_failure_rate: f64,

    /// Simulated processing time bounds in milliseconds.
    pub processing_min_ms: u64,
    pub processing_max_ms: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            processing_failure_rate: 0.2,
            processing_min_ms: 100,
            processing_max_ms: 2000,
        }
    }
}

fn default_level() -> Level {
    Level::Info
}

fn default_encoding() -> Encoding {
    Encoding::Json
}

fn default_max_bytes() -> u64 {
    DEFAULT_CAPACITY_BYTES
}

fn default_backup_count() -> u32 {
    DEFAULT_MAX_GENERATIONS
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![
        SinkConfig::file("file_all", "api_all.log", Level::Info),
        SinkConfig::file("file_errors", "api_errors.log", Level::Warning),
        SinkConfig::file("file_security", "api_security.log", Level::Info),
        SinkConfig::console("console", Level::Info),
    ]
}

fn default_channels() -> BTreeMap<String, ChannelConfig> {
    let binding = |sinks: &[&str], level| ChannelConfig {
        sinks: sinks.iter().map(|s| s.to_string()).collect(),
        level,
    };
    BTreeMap::from([
        (Channel::Api.to_string(), binding(&["file_all", "console"], Level::Info)),
        (Channel::Security.to_string(), binding(&["file_security", "file_all"], Level::Info)),
        (Channel::Errors.to_string(), binding(&["file_errors", "file_all"], Level::Warning)),
    ])
}
