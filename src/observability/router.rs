//! Channel routing table.
//!
//! # Responsibilities
//! - Map each channel to its ordered list of sinks
//! - Hold the per-channel severity floor
//! - Reject channels that were never bound
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (no locking on reads)
//! - Sinks are shared by `Arc`; the combined sink appears in several bindings
//! - Resolution order is the configured order

use std::collections::HashMap;
use std::sync::Arc;

use crate::observability::error::ConfigurationError;
use crate::observability::event::{Channel, Level};
use crate::observability::sink::Sink;

/// The sinks and severity floor of one channel.
#[derive(Debug)]
pub struct ChannelBinding {
    floor: Level,
    sinks: Vec<Arc<Sink>>,
}

impl ChannelBinding {
    /// Minimum level an event needs to be routed at all.
    pub fn floor(&self) -> Level {
        self.floor
    }

    pub fn sinks(&self) -> &[Arc<Sink>] {
        &self.sinks
    }
}

/// Static channel → sinks table.
#[derive(Debug)]
pub struct ChannelRouter {
    bindings: HashMap<Channel, ChannelBinding>,
    sinks: Vec<Arc<Sink>>,
}

impl ChannelRouter {
    pub fn builder() -> ChannelRouterBuilder {
        ChannelRouterBuilder::default()
    }

    /// Resolve a channel to its binding.
    pub fn resolve(&self, channel: Channel) -> Result<&ChannelBinding, ConfigurationError> {
        self.bindings
            .get(&channel)
            .ok_or(ConfigurationError::UnroutedChannel(channel))
    }

    /// Every registered sink, in registration order, each once.
    pub fn sinks(&self) -> &[Arc<Sink>] {
        &self.sinks
    }

    /// Look up a registered sink by name.
    pub fn sink(&self, name: &str) -> Option<&Arc<Sink>> {
        self.sinks.iter().find(|s| s.name() == name)
    }

    /// Fail unless every channel in the closed set is bound.
    pub fn ensure_complete(&self) -> Result<(), ConfigurationError> {
        match Channel::ALL.into_iter().find(|c| !self.bindings.contains_key(c)) {
            Some(channel) => Err(ConfigurationError::UnroutedChannel(channel)),
            None => Ok(()),
        }
    }
}

/// Collects sinks and bindings, then checks their references.
#[derive(Default)]
pub struct ChannelRouterBuilder {
    sinks: Vec<Arc<Sink>>,
    bindings: Vec<(Channel, Level, Vec<String>)>,
}

impl ChannelRouterBuilder {
    /// Register a sink under its own name.
    pub fn sink(mut self, sink: Sink) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Bind a channel to sinks by name, in delivery order.
    pub fn bind<I, S>(mut self, channel: Channel, floor: Level, sinks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bindings
            .push((channel, floor, sinks.into_iter().map(Into::into).collect()));
        self
    }

    pub fn build(self) -> Result<ChannelRouter, ConfigurationError> {
        let mut by_name: HashMap<&str, &Arc<Sink>> = HashMap::new();
        for sink in &self.sinks {
            if by_name.insert(sink.name(), sink).is_some() {
                return Err(ConfigurationError::DuplicateSink(sink.name().to_string()));
            }
        }

        let mut bindings = HashMap::new();
        for (channel, floor, names) in &self.bindings {
            if names.is_empty() {
                return Err(ConfigurationError::UnroutedChannel(*channel));
            }
            let sinks = names
                .iter()
                .map(|name| {
                    by_name
                        .get(name.as_str())
                        .map(|sink| Arc::clone(sink))
                        .ok_or_else(|| ConfigurationError::UnknownSink {
                            channel: *channel,
                            sink: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            bindings.insert(*channel, ChannelBinding { floor: *floor, sinks });
        }

        Ok(ChannelRouter {
            bindings,
            sinks: self.sinks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::event::Encoding;
    use crate::observability::rotation::Console;

    fn sink(name: &str, floor: Level) -> Sink {
        Sink::new(name, floor, Encoding::Json, Box::new(Console::new(std::io::sink())))
    }

    fn reference_router() -> ChannelRouter {
        ChannelRouter::builder()
            .sink(sink("file_all", Level::Info))
            .sink(sink("file_errors", Level::Warning))
            .sink(sink("file_security", Level::Info))
            .sink(sink("console", Level::Info))
            .bind(Channel::Api, Level::Info, ["file_all", "console"])
            .bind(Channel::Security, Level::Info, ["file_security", "file_all"])
            .bind(Channel::Errors, Level::Warning, ["file_errors", "file_all"])
            .build()
            .unwrap()
    }

    fn names(binding: &ChannelBinding) -> Vec<&str> {
        binding.sinks().iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_resolve_is_ordered_and_deterministic() {
        let router = reference_router();
        router.ensure_complete().unwrap();

        for _ in 0..3 {
            assert_eq!(names(router.resolve(Channel::Api).unwrap()), ["file_all", "console"]);
            assert_eq!(names(router.resolve(Channel::Security).unwrap()), ["file_security", "file_all"]);
            assert_eq!(names(router.resolve(Channel::Errors).unwrap()), ["file_errors", "file_all"]);
        }
        assert_eq!(router.resolve(Channel::Errors).unwrap().floor(), Level::Warning);
    }

    #[test]
    fn test_shared_sink_is_one_instance() {
        let router = reference_router();
        let from_security = &router.resolve(Channel::Security).unwrap().sinks()[1];
        let from_errors = &router.resolve(Channel::Errors).unwrap().sinks()[1];
        assert!(Arc::ptr_eq(from_security, from_errors));
        assert_eq!(router.sinks().len(), 4);
        assert!(router.sink("console").is_some());
    }

    #[test]
    fn test_unbound_channel_is_configuration_error() {
        let router = ChannelRouter::builder()
            .sink(sink("file_all", Level::Info))
            .bind(Channel::Api, Level::Info, ["file_all"])
            .build()
            .unwrap();

        let err = router.resolve(Channel::Security).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnroutedChannel(Channel::Security)));
        assert!(router.ensure_complete().is_err());
    }

    #[test]
    fn test_build_rejects_bad_references() {
        let err = ChannelRouter::builder()
            .sink(sink("file_all", Level::Info))
            .bind(Channel::Api, Level::Info, ["file_all", "missing"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownSink { ref sink, .. } if sink == "missing"));

        let err = ChannelRouter::builder()
            .sink(sink("dup", Level::Info))
            .sink(sink("dup", Level::Info))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateSink(_)));

        let err = ChannelRouter::builder()
            .bind(Channel::Errors, Level::Info, Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnroutedChannel(Channel::Errors)));
    }
}
