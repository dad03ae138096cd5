use crate::traits::{CallError, CallParams, CallResult};

use futures::{FutureExt, future::BoxFuture};
use std::fmt;
use tracing::{Instrument, Span};

type Operation<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send>;
type Callback<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CallId(u64);

impl CallId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A submitted call as it leaves the caller: the operation bound to its params, and where the
/// outcome goes.
pub(crate) struct Call<T, E> {
    operation: Operation<T, E>,
    callback: Callback<T, E>,
    scope: Span,
}

impl<T: CallResult, E: CallError> Call<T, E> {
    pub fn new<A, F, Fut, C>(operation: F, params: A, callback: C, scope: Span) -> Self
    where
        A: CallParams,
        F: Fn(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        C: FnOnce(Result<T, E>) + Send + 'static,
    {
        Self {
            operation: Box::new(move || operation(params.clone()).boxed()),
            callback: Box::new(callback),
            scope,
        }
    }
}

/// A call owned by the dispatcher. Every attempt runs the same request, so two requests are
/// never the same call even when their params match.
pub(crate) struct CallRequest<T, E> {
    pub(crate) id: CallId,
    pub(crate) attempts_made: usize,
    call: Call<T, E>,
}

impl<T: CallResult, E: CallError> CallRequest<T, E> {
    pub fn new(id: CallId, call: Call<T, E>) -> Self {
        Self {
            id,
            attempts_made: 0,
            call,
        }
    }

    pub fn invoke(&self) -> BoxFuture<'static, Result<T, E>> {
        let scope = &self.call.scope;

        scope
            .in_scope(|| (self.call.operation)())
            .instrument(scope.clone())
            .boxed()
    }

    pub fn deliver(self, outcome: Result<T, E>) {
        let Call {
            callback, scope, ..
        } = self.call;

        scope.in_scope(|| callback(outcome));
    }
}

impl<T, E> fmt::Debug for CallRequest<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRequest")
            .field("id", &self.id)
            .field("attempts_made", &self.attempts_made)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn every_invocation_gets_the_params() {
        let calls = Arc::new(AtomicUsize::new(0));
        let request = CallRequest::new(
            CallId::new(7),
            Call::new(
                {
                    let calls = calls.clone();
                    move |(a, b): (u32, &'static str)| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async move { Ok::<_, ()>(format!("{a}{b}")) }
                    }
                },
                (4, "2"),
                |_| {},
                Span::none(),
            ),
        );

        assert_eq!(request.invoke().await, Ok("42".to_string()));
        assert_eq!(request.invoke().await, Ok("42".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn deliver_hands_over_the_outcome() {
        let (sender, receiver) = oneshot::channel();
        let request = CallRequest::new(
            CallId::new(0),
            Call::new(
                |()| async { Err::<(), _>("boom") },
                (),
                move |outcome| {
                    let _ = sender.send(outcome);
                },
                Span::none(),
            ),
        );

        let outcome = request.invoke().await;
        request.deliver(outcome);

        assert_eq!(receiver.await.unwrap(), Err("boom"));
    }
}
