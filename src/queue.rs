use std::collections::VecDeque;

const INITIAL_RING_CAPACITY: usize = 16;

/// Holding area for calls that could not be admitted when they arrived. FIFO in both modes.
#[derive(Debug)]
pub(crate) enum WorkQueue<R> {
    /// Shrinks as the backlog clears, handing memory back.
    Draining(VecDeque<R>),
    /// Reuses its slots for the lifetime of the limiter.
    Cyclic(Ring<R>),
}

impl<R> WorkQueue<R> {
    pub fn new(run_forever: bool) -> Self {
        if run_forever {
            Self::Cyclic(Ring::with_capacity(INITIAL_RING_CAPACITY))
        } else {
            Self::Draining(VecDeque::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Draining(items) => items.len(),
            Self::Cyclic(ring) => ring.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, item: R) {
        match self {
            Self::Draining(items) => items.push_back(item),
            Self::Cyclic(ring) => ring.push(item),
        }
    }

    pub fn pop(&mut self) -> Option<R> {
        match self {
            Self::Draining(items) => {
                let item = items.pop_front();
                if items.is_empty() {
                    items.shrink_to_fit();
                }
                item
            }
            Self::Cyclic(ring) => ring.pop(),
        }
    }
}

/// Fixed slots read through a wrapping index. Consumed slots are reclaimed by later pushes,
/// and the slots only grow when every one of them is occupied.
#[derive(Debug)]
pub(crate) struct Ring<R> {
    slots: Vec<Option<R>>,
    head: usize,
    len: usize,
}

impl<R> Ring<R> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity.max(1)).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }

    pub fn push(&mut self, item: R) {
        if self.len == self.slots.len() {
            self.grow();
        }

        let tail = self.slot(self.len);
        self.slots[tail] = Some(item);
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<R> {
        if self.len == 0 {
            return None;
        }

        let item = self.slots[self.head].take();
        self.head = self.slot(1);
        self.len -= 1;
        item
    }

    // Unrolls the ring into a larger one so the oldest item lands back at index 0.
    fn grow(&mut self) {
        let capacity = self.slots.len() * 2;
        let mut slots = Vec::with_capacity(capacity);

        for offset in 0..self.len {
            let index = self.slot(offset);
            slots.push(self.slots[index].take());
        }
        slots.resize_with(capacity, || None);

        self.slots = slots;
        self.head = 0;
    }
}
