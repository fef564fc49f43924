// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-event transformation into HEC-style JSON events.
//!
//! Each CloudWatch log event becomes one JSON object:
//!
//! ```json
//! {"time":1510109208016,"index":"prod","source":"/aws/lambda/checkout","sourcetype":"aws:cloudwatch:json","event":{"k":1}}
//! ```
//!
//! Objects are written back to back with no delimiter; each one is
//! self-delimiting.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::Config;
use crate::envelope::LogEvent;

/// How the `event` field was derived from the log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The message parsed as JSON and is embedded as structured data.
    Structured,
    /// The message is embedded verbatim as a string.
    Raw,
}

impl EventKind {
    fn suffix(self) -> &'static str {
        match self {
            EventKind::Structured => "json",
            EventKind::Raw => "raw",
        }
    }
}

/// Maps log events to serialized output events using the process configuration.
#[derive(Debug, Clone)]
pub struct EventTransformer {
    config: Arc<Config>,
}

impl EventTransformer {
    pub fn new(config: Arc<Config>) -> Self {
        EventTransformer { config }
    }

    /// Serializes one log event. Never fails: messages that are not JSON are
    /// kept as raw strings.
    pub fn transform(
        &self,
        log_event: &LogEvent,
        log_group: &str,
        subscription_filters: &[String],
    ) -> String {
        let (event, kind) = parse_message(&log_event.message);
        // Field order of the emitted object follows insertion order.
        json!({
            "time": log_event.timestamp,
            "index": self.resolve_index(subscription_filters),
            "source": log_group,
            "sourcetype": format!("{}:{}", self.config.sourcetype, kind.suffix()),
            "event": event,
        })
        .to_string()
    }

    /// Routing key for an envelope: the last `-` segment of the first
    /// subscription filter name when it is allowed, the default otherwise.
    pub fn resolve_index<'a>(&'a self, subscription_filters: &'a [String]) -> &'a str {
        subscription_filters
            .first()
            .and_then(|filter| filter.rsplit('-').next())
            .filter(|candidate| self.config.allowed_indexes.contains(*candidate))
            .unwrap_or(self.config.default_index.as_str())
    }
}

/// Parses a log message as JSON, falling back to the raw string.
pub fn parse_message(message: &str) -> (Value, EventKind) {
    match serde_json::from_str::<Value>(message) {
        Ok(value) => (value, EventKind::Structured),
        Err(_) => (Value::String(message.to_string()), EventKind::Raw),
    }
}
