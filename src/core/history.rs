//! Fixed-capacity rolling history of confidence scores.
//!
//! Backed by a ring buffer: once full, each push overwrites the oldest
//! entry in place instead of shifting the whole sequence.

use serde::{Deserialize, Serialize};

/// Ring buffer of the most recent confidence values, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceHistory {
    slots: Vec<f64>,
    capacity: usize,
    /// Index the next push writes to once the buffer is full
    next: usize,
}

impl ConfidenceHistory {
    /// Create an empty history. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    /// Append a value, evicting the oldest one when full.
    pub fn push(&mut self, value: f64) {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
        } else {
            self.slots[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed value.
    pub fn latest(&self) -> Option<f64> {
        self.iter().last()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + '_ {
        let len = self.slots.len();
        let oldest = if len < self.capacity { 0 } else { self.next };
        (0..len).map(move |i| self.slots[(oldest + i) % self.capacity])
    }

    /// The last `n` values (fewer if the history is shorter), oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = f64> + '_ {
        self.iter().skip(self.len().saturating_sub(n))
    }

    /// Mean of the last `n` values, or `None` if the history is empty.
    pub fn recent_mean(&self, n: usize) -> Option<f64> {
        let count = n.min(self.len());
        if count == 0 {
            return None;
        }
        Some(self.recent(n).sum::<f64>() / count as f64)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.next = 0;
    }
}
