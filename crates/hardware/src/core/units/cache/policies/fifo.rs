//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Each set keeps its ways in installation order. Hits leave the order alone; an
//! installation moves the way to the back, and the victim is the way at the front.

use std::collections::VecDeque;

use super::ReplacementPolicy;

/// FIFO state: installation order per set, oldest first.
#[derive(Clone, Debug)]
pub struct FifoPolicy {
    order: Vec<VecDeque<usize>>,
}

impl FifoPolicy {
    /// Creates FIFO state for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            order: vec![(0..ways.max(1)).collect(); sets],
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn touch(&mut self, _set: usize, _way: usize) {}

    fn insert(&mut self, set: usize, way: usize) {
        let Some(queue) = self.order.get_mut(set) else {
            return;
        };
        queue.retain(|&w| w != way);
        queue.push_back(way);
    }

    fn victim(&self, set: usize) -> usize {
        self.order
            .get(set)
            .and_then(|queue| queue.front().copied())
            .unwrap_or(0)
    }
}
