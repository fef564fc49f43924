// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS,
    MAX_SUBMISSION_ATTEMPTS,
};
use crate::error::ConfigError;
use crate::reingest::RetryStrategy;

/// Process-wide configuration, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Routing key used when the subscription filter does not name an allowed one
    pub default_index: String,
    /// Routing keys that may be derived from a subscription filter name
    pub allowed_indexes: BTreeSet<String>,
    /// Prefix of the `sourcetype` field; `:json` or `:raw` is appended per event
    pub sourcetype: String,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// Overrides the regional Firehose endpoint
    pub firehose_endpoint_url: Option<String>,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Timeout for each PutRecordBatch request, in seconds
    pub request_timeout_secs: u64,
    /// Base backoff between reingestion attempts, in milliseconds
    pub retry_base_delay_ms: u64,
    /// Cap on the backoff between reingestion attempts, in milliseconds
    pub retry_max_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_index: String::new(),
            allowed_indexes: BTreeSet::new(),
            sourcetype: String::new(),
            log_level: "info".to_string(),
            firehose_endpoint_url: None,
            https_proxy: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl Config {
    /// Builds a configuration whose allow-set only contains `default_index`.
    pub fn new(default_index: &str, sourcetype: &str) -> Self {
        Self {
            default_index: default_index.to_string(),
            allowed_indexes: BTreeSet::from([default_index.to_string()]),
            sourcetype: sourcetype.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_allowed_indexes<I, S>(mut self, indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_indexes = indexes.into_iter().map(Into::into).collect();
        self
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_index =
            env::var("DEFAULT_INDEX").map_err(|_| ConfigError::MissingVariable("DEFAULT_INDEX"))?;
        let sourcetype =
            env::var("SOURCETYPE").map_err(|_| ConfigError::MissingVariable("SOURCETYPE"))?;

        let allowed_indexes = match env::var("ALLOWED_INDEXES") {
            Ok(val) => parse_index_list(&val),
            Err(_) => BTreeSet::from([default_index.clone()]),
        };

        let log_level = env::var("LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());
        let firehose_endpoint_url = env::var("FIREHOSE_ENDPOINT_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let https_proxy = env::var("HTTPS_PROXY").ok();

        let config = Self {
            default_index,
            allowed_indexes,
            sourcetype,
            log_level,
            firehose_endpoint_url,
            https_proxy,
            request_timeout_secs: parse_u64_var(
                "FIREHOSE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            retry_base_delay_ms: parse_u64_var(
                "REINGEST_RETRY_BASE_DELAY_MS",
                DEFAULT_RETRY_BASE_DELAY_MS,
            ),
            retry_max_delay_ms: parse_u64_var(
                "REINGEST_RETRY_MAX_DELAY_MS",
                DEFAULT_RETRY_MAX_DELAY_MS,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_index.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "DEFAULT_INDEX cannot be empty".to_string(),
            ));
        }

        if self.sourcetype.trim().is_empty() {
            return Err(ConfigError::Invalid("SOURCETYPE cannot be empty".to_string()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "REINGEST_RETRY_MAX_DELAY_MS ({}) must not be lower than REINGEST_RETRY_BASE_DELAY_MS ({})",
                self.retry_max_delay_ms, self.retry_base_delay_ms
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry strategy for reingestion, bounded by [`MAX_SUBMISSION_ATTEMPTS`].
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::ExponentialBackoff {
            max_attempts: MAX_SUBMISSION_ATTEMPTS,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
        }
    }
}

/// Splits a comma-separated list, trimming entries and skipping empty ones.
fn parse_index_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|index| !index.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_u64_var(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
