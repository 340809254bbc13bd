//! Execute (EX) Stage.
//!
//! This module implements the third stage of the instruction pipeline. It performs
//! the following:
//! 1. **Operand Collection:** Reads `rs1`/`rs2` from the register file and overrides
//!    them with the nearest in-flight producer chosen by the forwarding unit.
//! 2. **ALU:** Computes the arithmetic result, effective address, or CSR source operand.
//! 3. **Branch Resolution:** Decides taken branches and jumps and computes the target.
//!    A misaligned target becomes a trap on this instruction and no redirect happens.

use tracing::trace;

use crate::core::Cpu;
use crate::core::pipeline::forwarding::{ForwardSource, ForwardingUnit, Producer};
use crate::core::pipeline::latches::{ExMemEntry, IdExEntry};
use crate::core::pipeline::signals::{FlowOp, OpASrc, OpBSrc};
use crate::core::units::alu::Alu;
use crate::core::units::bru::BranchUnit;

/// Result of evaluating the execute stage for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecuteOutput {
    /// Entry to latch into EX/MEM.
    pub entry: ExMemEntry,
    /// Fetch redirect requested by a taken branch or jump.
    pub redirect: Option<u64>,
    /// Where `rs1` and `rs2` were taken from.
    pub forwarded: (ForwardSource, ForwardSource),
}

/// Executes the execute stage of the pipeline.
///
/// # Arguments
///
/// * `cpu` - The CPU state at the start of the cycle.
/// * `entry` - The ID/EX latch contents.
/// * `wb` - The register write write-back performs this cycle, if any.
///
/// # Returns
///
/// The EX/MEM entry and any branch redirect.
pub fn execute_stage(cpu: &Cpu, entry: &IdExEntry, wb: Option<Producer>) -> ExecuteOutput {
    let mut out = ExMemEntry {
        pc: entry.pc,
        inst: entry.inst,
        rd: entry.rd,
        ctrl: entry.ctrl,
        trap: entry.trap,
        ..ExMemEntry::default()
    };
    if entry.trap.is_some() {
        return ExecuteOutput {
            entry: out,
            redirect: None,
            forwarded: (ForwardSource::RegFile, ForwardSource::RegFile),
        };
    }

    let xlen = cpu.config.isa.xlen;
    let mem = cpu.ex_mem.get().and_then(Producer::from_ex_mem);
    let (rs1, src1) = ForwardingUnit::operand(entry.rs1, cpu.regs.read(entry.rs1), mem, wb);
    let (rs2, src2) = ForwardingUnit::operand(entry.rs2, cpu.regs.read(entry.rs2), mem, wb);

    let ctrl = &entry.ctrl;
    let a = match ctrl.a_src {
        OpASrc::Reg1 => rs1,
        OpASrc::Pc => entry.pc,
        OpASrc::Zero => 0,
    };
    let b = match ctrl.b_src {
        OpBSrc::Imm => entry.imm as u64,
        OpBSrc::Reg2 => rs2,
        OpBSrc::Zero => 0,
    };
    out.alu = xlen.canonical(Alu::execute(ctrl.alu, a, b, ctrl.word));
    out.store_data = rs2;

    let outcome = BranchUnit::resolve(ctrl.flow, entry.pc, rs1, rs2, entry.imm, xlen);
    if matches!(ctrl.flow, FlowOp::Jal | FlowOp::Jalr) {
        out.alu = xlen.canonical(entry.pc.wrapping_add(4));
    }
    out.trap = outcome.trap();
    let redirect = outcome.redirect();

    if cpu.trace {
        trace!(
            pc = format_args!("{:#x}", entry.pc),
            rs1 = format_args!("{rs1:#x}"),
            rs2 = format_args!("{rs2:#x}"),
            src1 = ?src1,
            src2 = ?src2,
            result = format_args!("{:#x}", out.alu),
            redirect = ?redirect,
            "EX"
        );
    }

    ExecuteOutput {
        entry: out,
        redirect,
        forwarded: (src1, src2),
    }
}
