/// What to do with a call once its operation has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Hand the outcome to the caller.
    Deliver,
    /// Requeue the call without telling the caller.
    Retry,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    attempts: usize,
}

impl RetryPolicy {
    pub fn new(attempts: usize) -> Self {
        Self { attempts }
    }

    /// `attempts_made` counts the tries before the one that just finished.
    pub fn judge<T, E>(&self, attempts_made: usize, outcome: &Result<T, E>) -> Verdict {
        match outcome {
            Ok(_) => Verdict::Deliver,
            Err(_) if attempts_made + 1 < self.attempts => Verdict::Retry,
            Err(_) => Verdict::Deliver,
        }
    }
}
