//! Event model.
//!
//! # Responsibilities
//! - Define the closed set of channels and the ordered severity levels
//! - Hold one immutable, enriched event record
//! - Encode an event as a structured (JSON) or plain line
//!
//! # Design Decisions
//! - Core fields are strongly typed; caller context is an open JSON map
//! - Core keys win over caller fields of the same name when encoding
//! - Encoding only reads the event; sinks never mutate it

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::observability::correlation::CorrelationId;
use crate::observability::error::ConfigurationError;

/// Open set of caller-supplied context fields.
pub type Fields = Map<String, Value>;

/// Turn a JSON object into event fields; any other value yields none.
pub fn into_fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Named event category controlling routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// General API traffic: requests, responses, registrations, warnings.
    Api,
    /// Authentication and other security-relevant events.
    Security,
    /// Application and system failures.
    Errors,
}

impl Channel {
    /// Every channel, in declaration order.
    pub const ALL: [Channel; 3] = [Channel::Api, Channel::Security, Channel::Errors];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Security => "security",
            Self::Errors => "errors",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(Self::Api),
            "security" => Ok(Self::Security),
            "errors" => Ok(Self::Errors),
            _ => Err(ConfigurationError::UnknownChannel(s.to_string())),
        }
    }
}

/// Ordered event severity (`Info < Warning < Error`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warning", alias = "WARN", alias = "warn")]
    Warning,
    #[serde(alias = "error")]
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line encoding used by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// One self-describing JSON object per line.
    Json,
    /// `YYYY-MM-DD HH:MM:SS [LEVEL] channel: message`
    Plain,
}

/// One structured event. Immutable once built.
#[derive(Debug, Clone)]
pub struct Event {
    timestamp: DateTime<Utc>,
    channel: Channel,
    level: Level,
    message: String,
    fields: Fields,
    correlation_id: CorrelationId,
    source: String,
}

impl Event {
    pub fn new(
        timestamp: DateTime<Utc>,
        channel: Channel,
        level: Level,
        message: impl Into<String>,
        fields: Fields,
        correlation_id: CorrelationId,
        source: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            channel,
            level,
            message: message.into(),
            fields,
            correlation_id,
            source: source.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Encode as a single line, without the trailing separator.
    pub fn encode(&self, encoding: Encoding) -> String {
        match encoding {
            Encoding::Json => self.to_json_line(),
            Encoding::Plain => self.to_plain_line(),
        }
    }

    fn to_json_line(&self) -> String {
        let mut record = self.fields.clone();
        record.insert(
            "timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        record.insert("channel".into(), Value::String(self.channel.as_str().into()));
        record.insert("level".into(), Value::String(self.level.as_str().into()));
        record.insert("message".into(), Value::String(self.message.clone()));
        record.insert(
            "correlation_id".into(),
            Value::String(self.correlation_id.to_string()),
        );
        record.insert("source".into(), Value::String(self.source.clone()));

        // A JSON map of strings and values always serializes; the fallback
        // only exists so encoding stays infallible.
        serde_json::to_string(&Value::Object(record)).unwrap_or_else(|_| {
            format!(
                "{{\"level\":\"{}\",\"channel\":\"{}\",\"message\":\"unencodable event\"}}",
                self.level, self.channel
            )
        })
    }

    fn to_plain_line(&self) -> String {
        // Messages are single-line in the plain feed.
        let message = self.message.replace(['\n', '\r'], " ");
        format!(
            "{} [{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.channel,
            message
        )
    }
}
