#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Bounded running averages over recent conflicts.

use std::collections::VecDeque;

/// A fixed-capacity queue keeping both a windowed average over the most
/// recent elements and a lifetime average over everything ever pushed.
#[derive(Debug, Clone, Default)]
pub struct BoundedQueue {
    elems: VecDeque<u32>,
    cap: usize,
    sum: u64,
    total_sum: u64,
    total_count: u64,
}

impl BoundedQueue {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            elems: VecDeque::with_capacity(cap),
            cap,
            sum: 0,
            total_sum: 0,
            total_count: 0,
        }
    }

    pub fn push(&mut self, x: u32) {
        if self.elems.len() == self.cap {
            let old = self.elems.pop_front().expect("capacity > 0");
            self.sum -= u64::from(old);
        }
        self.elems.push_back(x);
        self.sum += u64::from(x);
        self.total_sum += u64::from(x);
        self.total_count += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.elems.len() == self.cap
    }

    /// Average over the window; 0 when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg(&self) -> f64 {
        if self.elems.is_empty() {
            0.0
        } else {
            self.sum as f64 / self.elems.len() as f64
        }
    }

    /// Average over everything ever pushed; 0 before the first push.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_all(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.total_sum as f64 / self.total_count as f64
        }
    }

    /// Empties the window while keeping the lifetime statistics.
    pub fn fast_clear(&mut self) {
        self.elems.clear();
        self.sum = 0;
    }
}
