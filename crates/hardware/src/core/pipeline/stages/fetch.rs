//! Instruction Fetch (IF) Stage.
//!
//! This module implements the first stage of the instruction pipeline. It reads the
//! 32-bit word at the program counter. Instruction fetch is a combinational port into
//! ROM and RAM; a copy of the line held in the data cache takes precedence so that
//! instructions written by earlier stores are seen even while the line is dirty.

use tracing::trace;

use crate::common::{AccessType, Trap, Width};
use crate::core::Cpu;
use crate::core::pipeline::latches::IfIdEntry;

/// Executes the instruction fetch stage of the pipeline.
///
/// # Arguments
///
/// * `cpu` - The CPU state at the start of the cycle.
///
/// # Returns
///
/// The IF/ID entry for the word at `cpu.pc`. An unaligned PC or an address outside
/// ROM/RAM produces an entry that carries the fetch trap instead of an instruction.
pub fn fetch_stage(cpu: &Cpu) -> IfIdEntry {
    let pc = cpu.pc;
    let fetched = if pc & 0b11 != 0 {
        Err(Trap::InstructionAddressMisaligned(pc))
    } else if let Some(inst) = cpu.cache.as_ref().and_then(|cache| {
        cache
            .lookup(pc)
            .map(|(set, way)| cache.read(set, way, pc, Width::Word) as u32)
    }) {
        Ok(inst)
    } else {
        cpu.controller
            .fetch(pc)
            .map_err(|fault| fault.into_trap(AccessType::Fetch))
    };

    match fetched {
        Ok(inst) => {
            if cpu.trace {
                trace!(pc = format_args!("{pc:#x}"), inst = format_args!("{inst:#010x}"), "IF");
            }
            IfIdEntry {
                pc,
                inst,
                trap: None,
            }
        }
        Err(trap) => {
            if cpu.trace {
                trace!(pc = format_args!("{pc:#x}"), %trap, "IF fault");
            }
            IfIdEntry {
                pc,
                inst: 0,
                trap: Some(trap),
            }
        }
    }
}
