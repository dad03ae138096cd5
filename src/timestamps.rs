use crate::request::CallId;

use std::{collections::VecDeque, time::Duration};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    // Set while the call is in flight; cleared once its start is replaced by its completion.
    call: Option<CallId>,
    at: Instant,
}

/// Recent call times, oldest first, used to cap calls per window.
#[derive(Debug)]
pub(crate) struct TimestampLog {
    window: Duration,
    stamps: VecDeque<Stamp>,
}

impl TimestampLog {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            stamps: VecDeque::new(),
        }
    }

    fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Drops finished calls that have left the window. Calls still in flight keep their slot.
    pub fn prune(&mut self, now: Instant) {
        let before = self.stamps.len();
        let window = self.window;

        self.stamps.retain(|stamp| {
            stamp.call.is_some() || now.saturating_duration_since(stamp.at) < window
        });

        let pruned = before - self.stamps.len();
        if pruned > 0 {
            tracing::trace!(pruned, remaining = self.stamps.len(), "pruned call timestamps");
        }
    }

    /// When the oldest finished call leaves the window. `None` if every stamp is still in flight.
    pub fn frees_up_at(&self) -> Option<Instant> {
        self.stamps
            .iter()
            .find(|stamp| stamp.call.is_none())
            .map(|oldest| oldest.at + self.window)
    }

    pub fn record_start(&mut self, call: CallId, now: Instant) {
        if self.is_enabled() {
            self.stamps.push_back(Stamp {
                call: Some(call),
                at: now,
            });
        }
    }

    /// Swaps the call's start stamp for `now`, so it holds its slot for its whole duration.
    pub fn record_completion(&mut self, call: CallId, now: Instant) {
        if !self.is_enabled() {
            return;
        }

        if let Some(index) = self
            .stamps
            .iter()
            .position(|stamp| stamp.call == Some(call))
        {
            self.stamps.remove(index);
        }

        self.stamps.push_back(Stamp { call: None, at: now });
    }
}
