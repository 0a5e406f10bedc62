//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (channels reference defined sinks)
//! - Validate value ranges (rotation sizes, failure rates)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};

use crate::config::schema::{ServiceConfig, SinkKind};
use crate::observability::event::Channel;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("sink {0} is defined more than once")]
    DuplicateSink(String),

    #[error("file sink {0} has no path")]
    MissingPath(String),

    #[error("file sinks {first} and {second} share path {path}")]
    DuplicatePath {
        first: String,
        second: String,
        path: String,
    },

    #[error("sink {0} has max_bytes = 0")]
    ZeroCapacity(String),

    #[error("unknown channel {0}")]
    UnknownChannel(String),

    #[error("channel {0} is not bound to any sink")]
    UnboundChannel(Channel),

    #[error("channel {channel} references undefined sink {sink}")]
    UndefinedSink { channel: String, sink: String },

    #[error("processing_failure_rate {0} is outside 0.0..=1.0")]
    FailureRate(f64),

    #[error("processing_min_ms {min} exceeds processing_max_ms {max}")]
    ProcessingWindow { min: u64, max: u64 },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    let mut paths: HashMap<&str, &str> = HashMap::new();
    for sink in &config.sinks {
        if !names.insert(sink.name.as_str()) {
            errors.push(ValidationError::DuplicateSink(sink.name.clone()));
        }
        if sink.kind == SinkKind::File {
            match sink.path.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                None => errors.push(ValidationError::MissingPath(sink.name.clone())),
                Some(path) => {
                    if let Some(first) = paths.insert(path, sink.name.as_str()) {
                        errors.push(ValidationError::DuplicatePath {
                            first: first.to_string(),
                            second: sink.name.clone(),
                            path: path.to_string(),
                        });
                    }
                }
            }
            if sink.max_bytes == 0 {
                errors.push(ValidationError::ZeroCapacity(sink.name.clone()));
            }
        }
    }

    for (name, binding) in &config.channels {
        if name.parse::<Channel>().is_err() {
            errors.push(ValidationError::UnknownChannel(name.clone()));
        }
        for sink in &binding.sinks {
            if !names.contains(sink.as_str()) {
                errors.push(ValidationError::UndefinedSink {
                    channel: name.clone(),
                    sink: sink.clone(),
                });
            }
        }
    }

    for channel in Channel::ALL {
        let bound = config
            .channels
            .get(channel.as_str())
            .is_some_and(|b| !b.sinks.is_empty());
        if !bound {
            errors.push(ValidationError::UnboundChannel(channel));
        }
    }

    let scenarios = &config.scenarios;
    if !(0.0..=1.0).contains(&scenarios.processing_failure_rate) {
        errors.push(ValidationError::FailureRate(scenarios.processing_failure_rate));
    }
    if scenarios.processing_min_ms > scenarios.processing_max_ms {
        errors.push(ValidationError::ProcessingWindow {
            min: scenarios.processing_min_ms,
            max: scenarios.processing_max_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
