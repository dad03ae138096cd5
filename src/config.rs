use crate::error::ConfigError;

use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Limits applied by a [`Limiter`](crate::Limiter). Immutable once the limiter is built.
///
/// Deserializes from the usual option record, with `window` given in milliseconds:
///
/// ```
/// # use async_window_limiter::Config;
/// # use std::time::Duration;
/// let config: Config = serde_json::from_str(r#"{ "limit": 2, "window": 1000 }"#).unwrap();
///
/// assert_eq!(config.window, Duration::from_secs(1));
/// assert_eq!(config.concurrency, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Max calls within `window`. Ignored when `window` is zero.
    pub limit: usize,
    /// Rolling window for `limit`. Zero disables the window check.
    #[serde(deserialize_with = "deserialize_millis")]
    pub window: Duration,
    /// Max calls in flight at once.
    pub concurrency: usize,
    /// Max tries per submitted call before its failure is reported.
    pub attempts: usize,
    /// Keeps the work queue in its cyclic form for long running processes.
    #[serde(alias = "runforever")]
    pub run_forever: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limit: 0,
            window: Duration::ZERO,
            concurrency: 1,
            attempts: 1,
            run_forever: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        if self.attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }

        if self.has_window() && self.limit == 0 {
            return Err(ConfigError::ZeroLimitWithWindow {
                window: self.window,
            });
        }

        Ok(())
    }

    pub fn has_window(&self) -> bool {
        !self.window.is_zero()
    }
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
