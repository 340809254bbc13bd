//! Memory Access Types.
//!
//! This module defines how memory accesses are classified throughout the model.
//! These types are used for the following:
//! 1. **Fault Generation:** Choosing between instruction, load, and store fault causes.
//! 2. **Routing:** Rejecting stores to read-only backing stores.
//! 3. **Data Path Sizing:** Selecting byte, half, word, or double-word transfers.

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access from the fetch stage.
    Fetch,

    /// Data read access from a load in the memory stage.
    Read,

    /// Data write access from a store in the memory stage.
    Write,
}

/// Width of a single memory transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    /// One byte.
    Byte,
    /// Two bytes.
    Half,
    /// Four bytes.
    Word,
    /// Eight bytes.
    Double,
}

impl Width {
    /// Number of bytes moved by a transfer of this width.
    #[inline]
    pub const fn bytes(self) -> u64 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
            Self::Double => 8,
        }
    }

    /// Returns `true` if `addr` is naturally aligned for this width.
    #[inline]
    pub const fn is_aligned(self, addr: u64) -> bool {
        addr & (self.bytes() - 1) == 0
    }

    /// Mask covering the low `bytes() * 8` bits of a value.
    #[inline]
    pub const fn mask(self) -> u64 {
        match self {
            Self::Double => u64::MAX,
            w => (1u64 << (w.bytes() * 8)) - 1,
        }
    }
}
