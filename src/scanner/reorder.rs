use std::collections::VecDeque;

/// Fixed-capacity window that hands back completions in submission order
///
/// Each submitted item reserves the next sequence number. Completions may
/// arrive in any order; only the contiguous completed run at the front of the
/// window can be popped.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    /// Sequence number of the front slot
    base: usize,
    slots: VecDeque<Option<T>>,
    capacity: usize,
}

impl<T> ReorderBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            base: 0,
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Reserves the next slot, or `None` when the window is full
    pub fn reserve(&mut self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let index = self.base + self.slots.len();
        self.slots.push_back(None);
        Some(index)
    }

    /// Stores the value for a reserved slot
    ///
    /// Returns `false` for indices outside the window or already completed.
    pub fn complete(&mut self, index: usize, value: T) -> bool {
        let Some(offset) = index.checked_sub(self.base) else {
            return false;
        };
        match self.slots.get_mut(offset) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Pops the front value if it has completed
    pub fn pop_ready(&mut self) -> Option<T> {
        match self.slots.front() {
            Some(Some(_)) => {
                self.base += 1;
                self.slots.pop_front().flatten()
            }
            _ => None,
        }
    }

    /// Number of reserved slots, completed or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
