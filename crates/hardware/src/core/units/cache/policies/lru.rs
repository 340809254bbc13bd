//! Least Recently Used (LRU) Replacement Policy.
//!
//! Every way carries the tick of its last access. The victim is the way with the
//! oldest tick. At reset the ticks are staggered so that the highest way is evicted
//! first, matching the order in which invalid ways are filled.

use super::ReplacementPolicy;

/// LRU state: one access tick per way.
#[derive(Clone, Debug)]
pub struct LruPolicy {
    last_use: Vec<Vec<u64>>,
    clock: u64,
}

impl LruPolicy {
    /// Creates LRU state for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        let ways = ways.max(1);
        Self {
            last_use: vec![(0..ways).map(|w| (ways - w) as u64).collect(); sets],
            clock: ways as u64,
        }
    }
}

impl ReplacementPolicy for LruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        self.clock += 1;
        if let Some(tick) = self.last_use.get_mut(set).and_then(|s| s.get_mut(way)) {
            *tick = self.clock;
        }
    }

    fn victim(&self, set: usize) -> usize {
        self.last_use
            .get(set)
            .and_then(|ticks| {
                ticks
                    .iter()
                    .enumerate()
                    .min_by_key(|&(_, tick)| *tick)
                    .map(|(way, _)| way)
            })
            .unwrap_or(0)
    }
}
