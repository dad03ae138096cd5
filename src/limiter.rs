mod builder;

pub use builder::LimiterBuilder;

use crate::{
    config::Config,
    dispatcher::{Command, Dispatcher},
    error::{ConfigError, DispatcherGone},
    request::Call,
    traits::{CallError, CallParams, CallResult},
};

use tokio::sync::oneshot;
use tracing::Span;

/// Point-in-time view of a limiter's scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterStatus {
    /// Calls currently in flight.
    pub active: usize,
    /// Calls waiting to be admitted, retries included.
    pub queued: usize,
    /// Calls counted against the current window.
    pub recent_calls: usize,
}

/// Handle to a limiter. Clones share the same limits and queue.
///
/// Queued calls keep running after the last handle is dropped.
pub struct Limiter<T: CallResult, E: CallError> {
    config: Config,
    commands: flume::Sender<Command<T, E>>,
}

impl<T: CallResult, E: CallError> Clone for Limiter<T, E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            commands: self.commands.clone(),
        }
    }
}

impl Limiter<(), ()> {
    pub fn builder() -> LimiterBuilder {
        LimiterBuilder::default()
    }
}

impl<T: CallResult, E: CallError> Limiter<T, E> {
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let commands = Dispatcher::spawn(&config);

        Ok(Self { config, commands })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `operation(params)` once the limits allow it, retrying failures up to the configured
    /// attempts. `callback` receives the first success or the last failure.
    pub fn submit<A, F, Fut, C>(&self, operation: F, params: A, callback: C)
    where
        A: CallParams,
        F: Fn(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        C: FnOnce(Result<T, E>) + Send + 'static,
    {
        self.submit_in_scope(operation, params, callback, Span::current());
    }

    /// Like [`submit`](Self::submit), with the operation instrumented by and the callback run
    /// inside `scope`.
    pub fn submit_in_scope<A, F, Fut, C>(&self, operation: F, params: A, callback: C, scope: Span)
    where
        A: CallParams,
        F: Fn(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        C: FnOnce(Result<T, E>) + Send + 'static,
    {
        let call = Call::new(operation, params, callback, scope);

        if self.commands.send(Command::Submit(call)).is_err() {
            tracing::error!("dispatcher is gone, call dropped");
        }
    }

    /// Like [`submit`](Self::submit), but hands the outcome back through a channel. The receiver
    /// errors only if the operation panicked.
    pub fn queue<A, F, Fut>(&self, operation: F, params: A) -> oneshot::Receiver<Result<T, E>>
    where
        A: CallParams,
        F: Fn(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (send, recv) = oneshot::channel();

        self.submit(operation, params, move |outcome| {
            let _ = send.send(outcome);
        });

        recv
    }

    pub async fn status(&self) -> Result<LimiterStatus, DispatcherGone> {
        let (send, recv) = oneshot::channel();

        self.commands
            .send_async(Command::Status(send))
            .await
            .map_err(|_| DispatcherGone)?;

        recv.await.map_err(|_| DispatcherGone)
    }
}
