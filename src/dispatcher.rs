use crate::{
    active::ActiveCalls,
    admission::{Admission, AdmissionController, Blocked},
    config::Config,
    limiter::LimiterStatus,
    queue::WorkQueue,
    request::{Call, CallId, CallRequest},
    retry::{RetryPolicy, Verdict},
    timestamps::TimestampLog,
    traits::{CallError, CallResult},
};

use futures::FutureExt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::{
    sync::oneshot,
    time::{Instant, sleep_until},
};
use tracing::{debug, error, trace, warn};

pub(crate) enum Command<T, E> {
    Submit(Call<T, E>),
    Status(oneshot::Sender<LimiterStatus>),
}

struct Completion<T, E> {
    request: CallRequest<T, E>,
    // None when the operation panicked.
    outcome: Option<Result<T, E>>,
}

/// Sole owner of the scheduling state. Submissions, completions and the window timer are all
/// handled on its task, one at a time.
pub(crate) struct Dispatcher<T, E> {
    admission: AdmissionController,
    retry: RetryPolicy,
    active: ActiveCalls,
    log: TimestampLog,
    queue: WorkQueue<CallRequest<T, E>>,
    timer: Option<Instant>,
    next_id: u64,
    completion_sender: flume::Sender<Completion<T, E>>,
}

impl<T: CallResult, E: CallError> Dispatcher<T, E> {
    pub fn spawn(config: &Config) -> flume::Sender<Command<T, E>> {
        let (command_sender, command_receiver) = flume::unbounded();
        let (completion_sender, completion_receiver) = flume::unbounded();

        let dispatcher = Self {
            admission: AdmissionController::new(config),
            retry: RetryPolicy::new(config.attempts),
            active: ActiveCalls::new(config.concurrency),
            log: TimestampLog::new(config.window),
            queue: WorkQueue::new(config.run_forever),
            timer: None,
            next_id: 0,
            completion_sender,
        };

        tokio::spawn(dispatcher.run(command_receiver, completion_receiver));

        command_sender
    }

    async fn run(
        mut self,
        commands: flume::Receiver<Command<T, E>>,
        completions: flume::Receiver<Completion<T, E>>,
    ) {
        let mut accepting = true;

        loop {
            let timer = self.timer;

            tokio::select! {
                biased;

                completion = completions.recv_async() => {
                    if let Ok(completion) = completion {
                        self.complete(completion);
                    }
                },
                command = commands.recv_async(), if accepting => {
                    match command {
                        Ok(command) => self.handle(command),
                        Err(_) => {
                            debug!(
                                queued = self.queue.len(),
                                active = self.active.count(),
                                "all limiter handles dropped, finishing remaining calls"
                            );
                            accepting = false;
                        }
                    }
                },
                _ = sleep_until(timer.unwrap_or_else(Instant::now)), if timer.is_some() => {
                    self.timer = None;
                    trace!(queued = self.queue.len(), "window timer fired");
                    self.release();
                }
            }

            if !accepting && self.queue.is_empty() && self.active.is_idle() {
                break;
            }
        }

        debug!("dispatcher stopped");
    }

    fn handle(&mut self, command: Command<T, E>) {
        match command {
            Command::Submit(call) => {
                let request = CallRequest::new(CallId::new(self.next_id), call);
                self.next_id += 1;

                debug!(call = %request.id, queued = self.queue.len(), "call submitted");

                self.queue.push(request);
                self.release();
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn status(&mut self) -> LimiterStatus {
        self.log.prune(Instant::now());

        LimiterStatus {
            active: self.active.count(),
            queued: self.queue.len(),
            recent_calls: self.log.len(),
        }
    }

    /// Starts queued calls from the head for as long as they are admitted.
    fn release(&mut self) {
        while !self.queue.is_empty() {
            let now = Instant::now();

            match self.admission.check(now, &mut self.log, &self.active) {
                Admission::Admit => match self.queue.pop() {
                    Some(request) => self.start(request, now),
                    None => break,
                },
                Admission::Blocked(Blocked::InFlight) => {
                    trace!(queued = self.queue.len(), "waiting for a call to finish");
                    break;
                }
                Admission::Blocked(Blocked::Window { until }) => {
                    self.arm_timer(until);
                    break;
                }
            }
        }
    }

    fn arm_timer(&mut self, until: Instant) {
        if self.timer.is_none_or(|armed| until < armed) {
            debug!(
                in_ms = until.saturating_duration_since(Instant::now()).as_millis() as u64,
                queued = self.queue.len(),
                "window full, armed timer"
            );
            self.timer = Some(until);
        }
    }

    fn start(&mut self, request: CallRequest<T, E>, now: Instant) {
        self.active.acquire();
        self.log.record_start(request.id, now);

        debug!(
            call = %request.id,
            attempt = request.attempts_made + 1,
            active = self.active.count(),
            "call admitted"
        );

        let completion_sender = self.completion_sender.clone();

        // Invoked on the call's own task. Panics before and after the future is returned are caught.
        tokio::spawn(async move {
            let job = catch_unwind(AssertUnwindSafe(|| request.invoke()));
            let outcome = match job {
                Ok(job) => AssertUnwindSafe(job).catch_unwind().await.ok(),
                Err(_) => None,
            };
            let _ = completion_sender.send(Completion { request, outcome });
        });
    }

    fn complete(&mut self, Completion { mut request, outcome }: Completion<T, E>) {
        self.active.release();
        self.log.record_completion(request.id, Instant::now());

        match outcome {
            None => {
                error!(call = %request.id, "operation panicked, dropping call");
            }
            Some(outcome) => match self.retry.judge(request.attempts_made, &outcome) {
                Verdict::Retry => {
                    request.attempts_made += 1;
                    debug!(
                        call = %request.id,
                        attempts_made = request.attempts_made,
                        "call failed, requeueing"
                    );
                    self.queue.push(request);
                }
                Verdict::Deliver => {
                    let id = request.id;

                    if outcome.is_err() {
                        warn!(call = %id, attempts = request.attempts_made + 1, "call failed");
                    } else {
                        debug!(call = %id, attempts = request.attempts_made + 1, "call succeeded");
                    }

                    if catch_unwind(AssertUnwindSafe(|| request.deliver(outcome))).is_err() {
                        error!(call = %id, "callback panicked");
                    }
                }
            },
        }

        self.release();
    }
}
