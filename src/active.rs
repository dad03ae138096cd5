/// Calls currently in flight, capped at the configured concurrency.
#[derive(Debug)]
pub(crate) struct ActiveCalls {
    count: usize,
    concurrency: usize,
}

impl ActiveCalls {
    pub fn new(concurrency: usize) -> Self {
        Self {
            count: 0,
            concurrency,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn has_capacity(&self) -> bool {
        self.count < self.concurrency
    }

    pub fn is_idle(&self) -> bool {
        self.count == 0
    }

    pub fn acquire(&mut self) {
        debug_assert!(self.has_capacity(), "admitted past concurrency");
        self.count += 1;
    }

    pub fn release(&mut self) {
        debug_assert!(self.count > 0, "released an idle slot");
        self.count = self.count.saturating_sub(1);
    }
}
