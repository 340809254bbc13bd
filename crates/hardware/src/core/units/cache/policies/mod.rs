//! Cache Replacement Policies.
//!
//! Implements the algorithms that choose which way of a full set is evicted on a miss.
//! Invalid ways are always filled first; a policy is consulted only when every way
//! of the set holds a valid line.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out.
//! - `Lru`: Least Recently Used.
//! - `Plru`: Pseudo-LRU (one MRU bit per way).

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Pseudo-LRU (MRU-bit) replacement policy.
pub mod plru;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use plru::PlruPolicy;

/// Victim selection for a set-associative cache.
///
/// The cache reports hits through `touch` and fills through `insert`, and asks for a
/// victim only when a set has no invalid way left.
pub trait ReplacementPolicy: Send + std::fmt::Debug {
    /// Records a hit on `way` of `set`.
    fn touch(&mut self, set: usize, way: usize);

    /// Records that a new line was installed in `way` of `set`.
    ///
    /// Defaults to a touch; installation-order policies override it.
    fn insert(&mut self, set: usize, way: usize) {
        self.touch(set, way);
    }

    /// Selects the way to evict from a full set.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn victim(&self, set: usize) -> usize;
}
