//! Operand Forwarding.
//!
//! Operands are read in the execute stage. For each source register the forwarding
//! unit picks between the register file and the results of the two older instructions
//! still in flight:
//! 1. **Memory stage (EX/MEM):** The most recent producer; wins over write-back.
//! 2. **Write-back stage (MEM/WB):** The value being written this very cycle, which the
//!    register file read does not see yet.
//!
//! `x0` is never forwarded. Instructions carrying a trap produce nothing. Loads and CSR
//! reads in EX/MEM have no value yet; the hazard unit guarantees that no consumer reaches
//! execute directly behind one, so they are not offered as producers.

use crate::core::pipeline::latches::{ExMemEntry, MemWbEntry};

/// Where an operand value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ForwardSource {
    /// Architectural register file.
    #[default]
    RegFile,
    /// Result of the instruction in the memory stage.
    Memory,
    /// Result of the instruction in the write-back stage.
    Writeback,
}

/// An in-flight instruction that will write a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Producer {
    /// Destination register index (never 0).
    pub rd: usize,
    /// Result value.
    pub value: u64,
}

impl Producer {
    /// Producer offered by the instruction in the memory stage.
    pub const fn from_ex_mem(entry: &ExMemEntry) -> Option<Self> {
        if entry.trap.is_some()
            || !entry.ctrl.reg_write
            || entry.rd == 0
            || entry.ctrl.late_result()
        {
            return None;
        }
        Some(Self {
            rd: entry.rd,
            value: entry.alu,
        })
    }

    /// Producer offered by the instruction in write-back.
    ///
    /// # Arguments
    ///
    /// * `entry` - The MEM/WB latch contents.
    /// * `value` - The value write-back computed for `rd` this cycle (ALU result, load
    ///   data, or the old CSR value).
    pub const fn from_mem_wb(entry: &MemWbEntry, value: u64) -> Option<Self> {
        if entry.trap.is_some() || !entry.ctrl.reg_write || entry.rd == 0 {
            return None;
        }
        Some(Self {
            rd: entry.rd,
            value,
        })
    }
}

/// Forwarding unit.
#[derive(Debug, Clone, Copy)]
pub struct ForwardingUnit;

impl ForwardingUnit {
    /// Chooses the source of one operand.
    ///
    /// # Arguments
    ///
    /// * `src` - Source register index.
    /// * `mem` - Producer in the memory stage, if any.
    /// * `wb` - Producer in the write-back stage, if any.
    ///
    /// # Returns
    ///
    /// The nearest producer of `src`, or the register file.
    pub const fn select(src: usize, mem: Option<Producer>, wb: Option<Producer>) -> ForwardSource {
        if src == 0 {
            return ForwardSource::RegFile;
        }
        if let Some(p) = mem {
            if p.rd == src {
                return ForwardSource::Memory;
            }
        }
        if let Some(p) = wb {
            if p.rd == src {
                return ForwardSource::Writeback;
            }
        }
        ForwardSource::RegFile
    }

    /// Resolves the value of one operand.
    ///
    /// # Arguments
    ///
    /// * `src` - Source register index.
    /// * `reg` - Value read from the register file.
    /// * `mem` - Producer in the memory stage, if any.
    /// * `wb` - Producer in the write-back stage, if any.
    ///
    /// # Returns
    ///
    /// `(value, source)`.
    pub const fn operand(
        src: usize,
        reg: u64,
        mem: Option<Producer>,
        wb: Option<Producer>,
    ) -> (u64, ForwardSource) {
        let source = Self::select(src, mem, wb);
        let value = match (source, mem, wb) {
            (ForwardSource::Memory, Some(p), _) | (ForwardSource::Writeback, _, Some(p)) => {
                p.value
            }
            _ => reg,
        };
        (value, source)
    }
}
