//! RISC-V General-Purpose Register File.
//!
//! This module implements the integer register file. It performs the following:
//! 1. **Storage:** Maintains 32 integer registers (`x0`-`x31`).
//! 2. **Invariant Enforcement:** Register `x0` reads as zero and discards writes.
//! 3. **Debugging:** Renders the complete register state for trace output.

use std::fmt::Write as _;

/// General-Purpose Register file.
///
/// Values are stored in the canonical form of the configured `xlen`; the write-back
/// stage is the only writer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gpr {
    regs: [u64; 32],
}

impl Gpr {
    /// Creates a register file with every register cleared.
    pub const fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// Reads register `idx`. `x0` always reads as zero.
    #[inline]
    pub const fn read(&self, idx: usize) -> u64 {
        if idx == 0 { 0 } else { self.regs[idx & 0x1F] }
    }

    /// Writes register `idx`. Writes to `x0` are discarded.
    #[inline]
    pub const fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            self.regs[idx & 0x1F] = val;
        }
    }

    /// Renders all registers, two per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..32).step_by(2) {
            let _ = writeln!(
                out,
                "x{:<2}={:#018x} x{:<2}={:#018x}",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            );
        }
        out
    }
}
