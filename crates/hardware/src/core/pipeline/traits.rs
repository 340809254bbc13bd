//! Pipeline Latch Interfaces.
//!
//! This module defines the common traits for pipeline registers. It provides:
//! 1. **Entry Interface:** The program counter every in-flight instruction carries.
//! 2. **Latch Interface:** Flushing and the empty check used by the cycle stepper.

/// An instruction resident in a pipeline latch.
pub trait LatchEntry {
    /// Program counter of the instruction.
    fn pc(&self) -> u64;
}

/// A register between two stages holding either one instruction or a bubble.
pub trait PipelineLatch {
    /// Invalidates the latch contents.
    ///
    /// Flushing an already-empty latch is a no-op.
    fn flush(&mut self);

    /// Returns `true` when the latch holds a bubble.
    fn is_empty(&self) -> bool;
}
