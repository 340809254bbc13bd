//! Writeback (WB) Stage.
//!
//! This module implements the final stage of the instruction pipeline. Every
//! architectural effect of an instruction is decided here, in program order:
//! 1. **Interrupts:** A pending, enabled interrupt is taken against the instruction in
//!    this stage, which then does not commit. An instruction that already accessed memory
//!    retires instead, and the handler returns to the instruction after it.
//! 2. **Traps:** An instruction carrying a trap enters the handler (or halts the core on a
//!    requested stop or a double fault).
//! 3. **Trap Return:** `MRET` restores the saved privilege and redirects to `mepc`.
//! 4. **Commit:** Register results, load data, and CSR read-modify-write.
//!
//! The stage returns what to commit; the CPU applies it after the hazard decision.

use tracing::trace;

use crate::common::Trap;
use crate::core::Cpu;
use crate::core::cpu::HaltReason;
use crate::core::pipeline::control::csr_writes;
use crate::core::pipeline::forwarding::Producer;
use crate::core::pipeline::latches::MemWbEntry;
use crate::core::pipeline::signals::{CsrOp, MemOp, SystemOp};

/// Result of evaluating the write-back stage for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WritebackOutput {
    /// Register write, also offered to the forwarding unit.
    pub reg_write: Option<Producer>,
    /// CSR write as `(address, value)`.
    pub csr_write: Option<(u16, u64)>,
    /// The instruction retires this cycle.
    pub retired: bool,
    /// Trap (or interrupt) to enter, with the PC saved into `mepc`.
    pub trap: Option<(Trap, u64)>,
    /// Perform `MRET`.
    pub mret: bool,
    /// Fetch redirect for a trap entry or trap return.
    pub redirect: Option<u64>,
    /// Stop the core.
    pub halt: Option<HaltReason>,
}

/// Decides how a trap raised by the instruction at `pc` is handled.
fn take_trap(cpu: &Cpu, trap: Trap, pc: u64) -> WritebackOutput {
    if cpu.config.general.halt_on_ecall && trap.is_requested() {
        return WritebackOutput {
            halt: Some(HaltReason::Requested { trap, pc }),
            ..WritebackOutput::default()
        };
    }
    if cpu.privileged.would_double_fault(&trap) {
        let first = cpu.last_trap.map_or(trap, |frame| frame.trap);
        return WritebackOutput {
            halt: Some(HaltReason::DoubleFault {
                pc,
                first,
                second: trap,
            }),
            ..WritebackOutput::default()
        };
    }
    WritebackOutput {
        trap: Some((trap, pc)),
        redirect: Some(cpu.privileged.vector(&trap)),
        ..WritebackOutput::default()
    }
}

/// Executes the writeback stage of the pipeline.
///
/// # Arguments
///
/// * `cpu` - The CPU state at the start of the cycle.
/// * `entry` - The MEM/WB latch contents.
///
/// # Returns
///
/// The effects to commit at the end of the cycle.
pub fn wb_stage(cpu: &Cpu, entry: &MemWbEntry) -> WritebackOutput {
    if !cpu.uncached.is_active() {
        if let Some(irq) = cpu.privileged.pending_interrupt() {
            if cpu.trace {
                trace!(pc = format_args!("{:#x}", entry.pc), %irq, "WB interrupt");
            }
            if entry.trap.is_some() || entry.ctrl.mem == MemOp::None {
                return take_trap(cpu, irq, entry.pc);
            }
            // The access happened in MEM and cannot be repeated.
            let next = cpu.config.isa.xlen.addr(entry.pc.wrapping_add(4));
            let entered = take_trap(cpu, irq, next);
            return WritebackOutput {
                trap: entered.trap,
                redirect: entered.redirect,
                halt: entered.halt,
                ..retire(cpu, entry)
            };
        }
    }

    if let Some(trap) = entry.trap {
        if cpu.trace {
            trace!(pc = format_args!("{:#x}", entry.pc), %trap, "WB trap");
        }
        return take_trap(cpu, trap, entry.pc);
    }

    let ctrl = &entry.ctrl;
    if ctrl.system == SystemOp::Mret {
        if !cpu.privileged.may_return() {
            return take_trap(cpu, Trap::IllegalInstruction(entry.inst), entry.pc);
        }
        return WritebackOutput {
            retired: true,
            mret: true,
            redirect: Some(cpu.privileged.return_target()),
            ..WritebackOutput::default()
        };
    }

    retire(cpu, entry)
}

/// Register and CSR effects of an instruction that completes normally.
fn retire(cpu: &Cpu, entry: &MemWbEntry) -> WritebackOutput {
    let ctrl = &entry.ctrl;
    let xlen = cpu.config.isa.xlen;
    let mut out = WritebackOutput {
        retired: true,
        ..WritebackOutput::default()
    };
    let value = if ctrl.csr == CsrOp::None {
        if ctrl.mem.is_load() {
            entry.load_data
        } else {
            entry.alu
        }
    } else {
        let old = cpu.privileged.csrs.read(ctrl.csr_addr);
        let src = entry.alu;
        if csr_writes(ctrl.csr, entry.inst) {
            let new = match ctrl.csr {
                CsrOp::Set => old | src,
                CsrOp::Clear => old & !src,
                CsrOp::Write | CsrOp::None => src,
            };
            out.csr_write = Some((ctrl.csr_addr, new));
        }
        old
    };
    if ctrl.reg_write && entry.rd != 0 {
        out.reg_write = Some(Producer {
            rd: entry.rd,
            value: xlen.canonical(value),
        });
    }

    if cpu.trace {
        trace!(
            pc = format_args!("{:#x}", entry.pc),
            inst = format_args!("{:#010x}", entry.inst),
            reg = ?out.reg_write.map(|p| (p.rd, p.value)),
            csr = ?out.csr_write,
            "WB retire"
        );
    }
    out
}
