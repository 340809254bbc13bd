//! Pipeline latch structures for inter-stage communication.
//!
//! This module defines the entry types carried between the five stages:
//! Fetch → Decode → Execute → Memory → Writeback.
//!
//! 1. **Instruction Flow:** One optional entry per stage boundary; `None` is a bubble.
//! 2. **Trap Propagation:** A faulting instruction keeps flowing with its trap attached and
//!    executes nothing further until the trap is taken at write-back.
//! 3. **Stall and Flush:** A latch either takes the upstream stage's output, holds its
//!    contents, or is cleared, once per cycle.

use crate::common::Trap;
use crate::core::pipeline::signals::ControlSignals;
use crate::core::pipeline::traits::{LatchEntry, PipelineLatch};

/// Entry in the IF/ID latch (Fetch to Decode).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IfIdEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding (zero if the fetch faulted).
    pub inst: u32,
    /// Trap raised during fetch, if any.
    pub trap: Option<Trap>,
}

/// Entry in the ID/EX latch (Decode to Execute).
///
/// Register operands are not read here; they are read and forwarded in execute.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IdExEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// Destination register index.
    pub rd: usize,
    /// Sign-extended immediate (the zero-extended `uimm` for immediate CSR forms).
    pub imm: i64,
    /// Control signals for downstream stages.
    pub ctrl: ControlSignals,
    /// Trap raised during fetch or decode, if any.
    pub trap: Option<Trap>,
}

/// Entry in the EX/MEM latch (Execute to Memory).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ExMemEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Destination register index.
    pub rd: usize,
    /// ALU result, effective address, link address, or CSR source operand.
    pub alu: u64,
    /// Data to be stored (rs2 value).
    pub store_data: u64,
    /// Control signals.
    pub ctrl: ControlSignals,
    /// Trap raised up to and including execute, if any.
    pub trap: Option<Trap>,
}

/// Entry in the MEM/WB latch (Memory to Writeback).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct MemWbEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Destination register index.
    pub rd: usize,
    /// ALU result or CSR source operand.
    pub alu: u64,
    /// Data returned by a load, already extended.
    pub load_data: u64,
    /// Control signals.
    pub ctrl: ControlSignals,
    /// Trap raised up to and including memory, if any.
    pub trap: Option<Trap>,
}

macro_rules! impl_latch_entry {
    ($($ty:ty),*) => {
        $(
            impl LatchEntry for $ty {
                fn pc(&self) -> u64 {
                    self.pc
                }
            }
        )*
    };
}

impl_latch_entry!(IfIdEntry, IdExEntry, ExMemEntry, MemWbEntry);

/// A pipeline register holding at most one instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Latch<T> {
    slot: Option<T>,
}

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T: LatchEntry> Latch<T> {
    /// Creates an empty (invalid) latch.
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Returns the held entry, if valid.
    pub const fn get(&self) -> Option<&T> {
        self.slot.as_ref()
    }

    /// Overwrites the latch with the upstream stage's output.
    pub fn load(&mut self, entry: Option<T>) {
        self.slot = entry;
    }
}

impl<T: LatchEntry> PipelineLatch for Latch<T> {
    fn flush(&mut self) {
        self.slot = None;
    }

    fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
