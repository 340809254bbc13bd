//! Instruction Decode (ID) Stage.
//!
//! This module implements the second stage of the instruction pipeline. It runs the
//! control unit over the fetched word, extracts register indices, and extends the
//! immediate. Register values are not read here; operands are collected in execute,
//! where the forwarding unit sees every older producer.

use tracing::trace;

use crate::common::Trap;
use crate::core::Cpu;
use crate::core::pipeline::control::ControlUnit;
use crate::core::pipeline::latches::{IdExEntry, IfIdEntry};
use crate::core::pipeline::signals::{CsrOp, OpBSrc};
use crate::isa::decode::{ImmFormat, extend};
use crate::isa::instruction::InstructionBits;

/// Executes the instruction decode stage of the pipeline.
///
/// # Arguments
///
/// * `cpu` - The CPU state at the start of the cycle (ISA descriptor and privilege mode).
/// * `entry` - The IF/ID latch contents.
///
/// # Returns
///
/// The ID/EX entry. Fetch traps pass through unchanged; a decode trap replaces the
/// control signals with a no-op that carries the trap.
pub fn decode_stage(cpu: &Cpu, entry: &IfIdEntry) -> IdExEntry {
    let inst = entry.inst;
    let mut out = IdExEntry {
        pc: entry.pc,
        inst,
        trap: entry.trap,
        ..IdExEntry::default()
    };
    if out.trap.is_some() {
        return out;
    }

    match ControlUnit::decode(inst, &cpu.config.isa, cpu.privileged.mode) {
        Ok(ctrl) => {
            out.rs1 = if ctrl.uses_rs1 { inst.rs1() } else { 0 };
            out.rs2 = if ctrl.uses_rs2 { inst.rs2() } else { 0 };
            out.rd = if ctrl.reg_write { inst.rd() } else { 0 };
            out.imm = if ctrl.csr != CsrOp::None && ctrl.b_src == OpBSrc::Imm {
                inst.rs1() as i64
            } else {
                extend(inst, ImmFormat::for_opcode(inst.opcode()))
            };
            out.ctrl = ctrl;
        }
        Err(Trap::Breakpoint(_)) => out.trap = Some(Trap::Breakpoint(entry.pc)),
        Err(trap) => out.trap = Some(trap),
    }

    if cpu.trace {
        trace!(
            pc = format_args!("{:#x}", out.pc),
            rd = out.rd,
            rs1 = out.rs1,
            rs2 = out.rs2,
            imm = out.imm,
            trap = ?out.trap,
            "ID"
        );
    }
    out
}
