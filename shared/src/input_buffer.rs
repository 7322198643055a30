//! Fixed-capacity ring buffer of sequenced moves.
//!
//! Used by the client for its pending (unacknowledged) predictions and by the server as the
//! per-connection input queue. Entries must be enqueued in strictly increasing `seq` order;
//! `drop_up_to` relies on that to stop at the first newer entry.
//!
//! When full, `enqueue` overwrites the oldest entry. That is lossy on purpose: freshness of
//! the newest input wins over completeness, and memory stays bounded under flooding.

/// Monotonic per-connection input sequence number.
pub type Seq = u32;

/// Records stored in an [`InputMoveBuffer`].
pub trait Sequenced {
    fn seq(&self) -> Seq;
}

#[derive(Clone, Debug)]
pub struct InputMoveBuffer<T> {
    slots: Vec<Option<T>>,
    /// Index of the oldest live entry.
    head: usize,
    len: usize,
}

impl<T: Sequenced> InputMoveBuffer<T> {
    /// Create an empty buffer. A capacity of zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append `item` as the newest entry.
    ///
    /// Returns the evicted oldest entry when the buffer was already full.
    pub fn enqueue(&mut self, item: T) -> Option<T> {
        let cap = self.capacity();
        if self.len == cap {
            let evicted = self.slots[self.head].replace(item);
            self.head = (self.head + 1) % cap;
            return evicted;
        }

        let tail = (self.head + self.len) % cap;
        self.slots[tail] = Some(item);
        self.len += 1;
        None
    }

    /// Remove entries from the front while `entry.seq() <= seq`.
    ///
    /// Returns how many entries were removed.
    pub fn drop_up_to(&mut self, seq: Seq) -> usize {
        let mut dropped = 0;
        while let Some(front) = self.front() {
            if front.seq() > seq {
                break;
            }
            self.pop_front();
            dropped += 1;
        }
        dropped
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Entry at logical position `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[(self.head + index) % self.capacity()].as_ref()
    }

    /// Logical reset. Stale slots are overwritten lazily by later enqueues.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Iterate oldest to newest without removing anything.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Mutable oldest-to-newest iteration (used to refresh predictions during replay).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        let cap = self.capacity();
        let (head, len) = (self.head, self.len);
        let (wrapped, straight) = self.slots.split_at_mut(head);
        let first_len = len.min(cap - head);
        straight
            .iter_mut()
            .take(first_len)
            .chain(wrapped.iter_mut().take(len - first_len))
            .filter_map(Option::as_mut)
    }
}
