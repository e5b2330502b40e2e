// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch configuration
//!
//! Loaded from TOML with human-readable durations:
//!
//! ```toml
//! max_attempts = 5
//! base_delay = "10ms"
//! backoff_factor = 2.0
//! delivery_timeout = "5s"
//! max_in_flight = 64
//! dedup_window = "5m"
//! audit_retention = "5m"
//! ```

use crate::backoff::Backoff;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the dispatcher and delivery client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum delivery attempts per (event, rule) pair
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Multiplier applied to the delay on each further retry
    pub backoff_factor: f64,
    /// Timeout for a single target invocation
    #[serde(with = "humantime_serde")]
    pub delivery_timeout: Duration,
    /// Cap on concurrently in-flight delivery tasks
    pub max_in_flight: usize,
    /// How long a published event id is remembered for duplicate rejection
    #[serde(with = "humantime_serde")]
    pub dedup_window: Duration,
    /// Overall deadline per event; elapsed deadlines cancel remaining retries
    #[serde(with = "humantime_serde")]
    pub event_deadline: Option<Duration>,
    /// How long settled audit records are kept before pruning
    #[serde(with = "humantime_serde")]
    pub audit_retention: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            backoff_factor: 2.0,
            delivery_timeout: Duration::from_secs(5),
            max_in_flight: 64,
            dedup_window: Duration::from_secs(300),
            event_deadline: None,
            audit_retention: Duration::from_secs(300),
        }
    }
}

impl DispatchConfig {
    /// Parse from TOML text and validate
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.backoff_factor < 1.0 {
            return Err(ConfigError::Invalid(
                "backoff_factor must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }

    /// Backoff sequence implied by this config
    pub fn backoff(&self) -> Backoff {
        Backoff::exponential(
            self.base_delay,
            self.max_attempts.saturating_sub(1),
            self.backoff_factor,
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
