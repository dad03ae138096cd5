use crate::{active::ActiveCalls, config::Config, timestamps::TimestampLog};

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Admit,
    Blocked(Blocked),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Blocked {
    /// Waiting on a call in flight. Its completion will trigger a recheck.
    InFlight,
    /// Too many calls within the window. Nothing may complete, so recheck at `until`.
    Window { until: Instant },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct AdmissionController {
    limit: usize,
    windowed: bool,
}

impl AdmissionController {
    pub fn new(config: &Config) -> Self {
        Self {
            limit: config.limit,
            windowed: config.has_window(),
        }
    }

    pub fn check(
        &self,
        now: Instant,
        log: &mut TimestampLog,
        active: &ActiveCalls,
    ) -> Admission {
        if self.windowed {
            log.prune(now);

            if log.len() >= self.limit {
                return Admission::Blocked(match log.frees_up_at() {
                    Some(until) => Blocked::Window { until },
                    None => Blocked::InFlight,
                });
            }
        }

        if active.has_capacity() {
            Admission::Admit
        } else {
            Admission::Blocked(Blocked::InFlight)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CallId;
    use std::time::Duration;

    fn controller(
        limit: usize,
        window: u64,
        concurrency: usize,
    ) -> (AdmissionController, TimestampLog, ActiveCalls) {
        let config = Config {
            limit,
            window: Duration::from_millis(window),
            concurrency,
            ..Default::default()
        };

        (
            AdmissionController::new(&config),
            TimestampLog::new(config.window),
            ActiveCalls::new(config.concurrency),
        )
    }

    #[test]
    fn admits_up_to_concurrency() {
        let (admission, mut log, mut active) = controller(0, 0, 2);
        let now = Instant::now();

        assert_eq!(admission.check(now, &mut log, &active), Admission::Admit);
        active.acquire();
        assert_eq!(admission.check(now, &mut log, &active), Admission::Admit);
        active.acquire();
        assert_eq!(
            admission.check(now, &mut log, &active),
            Admission::Blocked(Blocked::InFlight)
        );
    }

    #[test]
    fn blocks_on_full_window_until_oldest_expires() {
        let (admission, mut log, active) = controller(2, 1000, 5);
        let start = Instant::now();

        log.record_start(CallId::new(0), start);
        log.record_completion(CallId::new(0), start);
        log.record_start(CallId::new(1), start + Duration::from_millis(300));
        log.record_completion(CallId::new(1), start + Duration::from_millis(300));

        assert_eq!(
            admission.check(start + Duration::from_millis(400), &mut log, &active),
            Admission::Blocked(Blocked::Window {
                until: start + Duration::from_millis(1000)
            })
        );
        assert_eq!(
            admission.check(start + Duration::from_millis(1000), &mut log, &active),
            Admission::Admit
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn window_takes_precedence_so_a_timer_gets_armed() {
        let (admission, mut log, mut active) = controller(1, 1000, 1);
        let start = Instant::now();

        log.record_start(CallId::new(0), start);
        log.record_completion(CallId::new(0), start);
        active.acquire();

        assert!(matches!(
            admission.check(start, &mut log, &active),
            Admission::Blocked(Blocked::Window { .. })
        ));
    }

    #[test]
    fn full_window_of_running_calls_waits_for_a_completion() {
        let (admission, mut log, mut active) = controller(1, 1000, 5);
        let start = Instant::now();

        log.record_start(CallId::new(0), start);
        active.acquire();

        assert_eq!(
            admission.check(start + Duration::from_secs(5), &mut log, &active),
            Admission::Blocked(Blocked::InFlight)
        );
    }
}
