use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("attempts must be at least 1")]
    ZeroAttempts,
    #[error("a window of {window:?} with a limit of 0 would never admit a call")]
    ZeroLimitWithWindow { window: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the limiter's dispatcher is no longer running")]
pub struct DispatcherGone;
