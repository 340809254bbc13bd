//! Pseudo-LRU (PLRU) Replacement Policy.
//!
//! One MRU flag per way. An access raises the flag of its way. When that would leave
//! every flag of the set raised, only the accessed way keeps its flag. The victim is
//! the lowest way whose flag is down.

use super::ReplacementPolicy;

/// PLRU state: MRU flags per set.
#[derive(Clone, Debug)]
pub struct PlruPolicy {
    mru: Vec<Vec<bool>>,
}

impl PlruPolicy {
    /// Creates PLRU state for `sets` sets of `ways` ways, all flags down.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            mru: vec![vec![false; ways.max(1)]; sets],
        }
    }
}

impl ReplacementPolicy for PlruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        let Some(flags) = self.mru.get_mut(set) else {
            return;
        };
        if way >= flags.len() {
            return;
        }
        flags[way] = true;
        if flags.iter().all(|&f| f) {
            flags.iter_mut().for_each(|f| *f = false);
            flags[way] = true;
        }
    }

    fn victim(&self, set: usize) -> usize {
        self.mru
            .get(set)
            .and_then(|flags| flags.iter().position(|&f| !f))
            .unwrap_or(0)
    }
}
