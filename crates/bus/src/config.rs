//! Concurrent bus configuration.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Environment variable overriding [`ConcurrentBusConfig::timeout`], in milliseconds.
pub const TIMEOUT_ENV: &str = "CQRS_EDA_BUS_TIMEOUT_MS";
/// Environment variable overriding [`ConcurrentBusConfig::concurrency_limit`].
pub const CONCURRENCY_LIMIT_ENV: &str = "CQRS_EDA_BUS_CONCURRENCY_LIMIT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrencyLimit,

    #[error("concurrency limit must be at most {max}")]
    ConcurrencyLimitTooLarge { max: usize },

    #[error("dispatch timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Concurrent bus configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrentBusConfig {
    /// Deadline applied to every dispatched call (intersected with the caller's own).
    pub timeout: Duration,
    /// Maximum number of handler executions in flight.
    pub concurrency_limit: usize,
}

impl Default for ConcurrentBusConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            concurrency_limit: 8,
        }
    }
}

impl ConcurrentBusConfig {
    pub fn new(timeout: Duration, concurrency_limit: usize) -> Self {
        Self {
            timeout,
            concurrency_limit,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Defaults overridden by [`TIMEOUT_ENV`] and [`CONCURRENCY_LIMIT_ENV`] when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(TIMEOUT_ENV) {
            let millis = parse_env(TIMEOUT_ENV, &value)?;
            config.timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(CONCURRENCY_LIMIT_ENV) {
            config.concurrency_limit = parse_env(CONCURRENCY_LIMIT_ENV, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrencyLimit);
        }
        if self.concurrency_limit > Semaphore::MAX_PERMITS {
            return Err(ConfigError::ConcurrencyLimitTooLarge {
                max: Semaphore::MAX_PERMITS,
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
