#![doc = include_str!("../README.md")]

mod active;
mod admission;
mod config;
mod dispatcher;
mod error;
mod limiter;
mod queue;
mod request;
mod retry;
mod timestamps;
mod traits;

pub use config::Config;
pub use error::{ConfigError, DispatcherGone};
pub use limiter::{Limiter, LimiterBuilder, LimiterStatus};
pub use traits::{CallError, CallParams, CallResult};
