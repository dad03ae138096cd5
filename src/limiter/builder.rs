use super::Limiter;
use crate::{
    config::Config,
    error::ConfigError,
    traits::{CallError, CallResult},
};

use std::time::Duration;

#[derive(Debug, Default)]
pub struct LimiterBuilder {
    pub(crate) config: Config,
}

impl LimiterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }
    pub fn with_window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.config.attempts = attempts;
        self
    }
    pub fn with_run_forever(mut self, run_forever: bool) -> Self {
        self.config.run_forever = run_forever;
        self
    }

    pub fn build<T: CallResult, E: CallError>(self) -> Result<Limiter<T, E>, ConfigError> {
        Limiter::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_every_option() {
        let builder = LimiterBuilder::new()
            .with_limit(3)
            .with_window(Duration::from_secs(2))
            .with_concurrency(4)
            .with_attempts(5)
            .with_run_forever(true);

        assert_eq!(
            builder.config,
            Config {
                limit: 3,
                window: Duration::from_secs(2),
                concurrency: 4,
                attempts: 5,
                run_forever: true,
            }
        );
    }

    #[test]
    fn validates_before_spawning() {
        let result = LimiterBuilder::new()
            .with_concurrency(0)
            .build::<(), ()>();

        assert_eq!(result.err(), Some(ConfigError::ZeroConcurrency));
    }
}
