//! Branch Resolution Unit (BRU).
//!
//! Resolves conditional branches and jumps in the execute stage. There is no
//! prediction: fetch always continues at `pc + 4`, and a taken transfer redirects
//! fetch and flushes the two younger instructions behind it. The unit provides:
//! 1. **Condition Evaluation:** The six comparisons of the base ISA.
//! 2. **Target Computation:** PC-relative and register-indirect targets.
//! 3. **Alignment Check:** A taken transfer to a target that is not four-byte aligned
//!    raises `InstructionAddressMisaligned` instead of redirecting.

use crate::common::Trap;
use crate::config::Xlen;
use crate::core::pipeline::signals::{BranchCond, FlowOp};

/// Result of resolving a control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchOutcome {
    /// Not a transfer, or a branch that is not taken.
    NotTaken,
    /// Redirect fetch to the target.
    Taken(u64),
    /// Taken, but the target is misaligned. Carries the target.
    Misaligned(u64),
}

impl BranchOutcome {
    /// Redirect target, if fetch must be redirected.
    pub const fn redirect(self) -> Option<u64> {
        match self {
            Self::Taken(target) => Some(target),
            _ => None,
        }
    }

    /// Trap raised by the transfer, if any.
    pub const fn trap(self) -> Option<Trap> {
        match self {
            Self::Misaligned(target) => Some(Trap::InstructionAddressMisaligned(target)),
            _ => None,
        }
    }
}

/// Branch resolution unit.
#[derive(Debug, Clone, Copy)]
pub struct BranchUnit;

impl BranchUnit {
    /// Evaluates a branch condition on canonical register values.
    pub const fn condition(cond: BranchCond, a: u64, b: u64) -> bool {
        match cond {
            BranchCond::Eq => a == b,
            BranchCond::Ne => a != b,
            BranchCond::Lt => (a as i64) < (b as i64),
            BranchCond::Ge => (a as i64) >= (b as i64),
            BranchCond::Ltu => a < b,
            BranchCond::Geu => a >= b,
        }
    }

    /// Resolves the control transfer of one instruction.
    ///
    /// # Arguments
    ///
    /// * `flow` - Transfer class from the control signals.
    /// * `pc` - Program counter of the instruction.
    /// * `rs1` - Forwarded value of `rs1`.
    /// * `rs2` - Forwarded value of `rs2`.
    /// * `imm` - Sign-extended immediate.
    /// * `xlen` - Address width the target is truncated to.
    ///
    /// # Returns
    ///
    /// Whether the transfer is taken, and where to.
    pub const fn resolve(
        flow: FlowOp,
        pc: u64,
        rs1: u64,
        rs2: u64,
        imm: i64,
        xlen: Xlen,
    ) -> BranchOutcome {
        let target = match flow {
            FlowOp::Next => return BranchOutcome::NotTaken,
            FlowOp::Branch(cond) => {
                if !Self::condition(cond, rs1, rs2) {
                    return BranchOutcome::NotTaken;
                }
                pc.wrapping_add(imm as u64)
            }
            FlowOp::Jal => pc.wrapping_add(imm as u64),
            FlowOp::Jalr => rs1.wrapping_add(imm as u64) & !1,
        };
        let target = xlen.addr(target);
        if target & 0b11 != 0 {
            BranchOutcome::Misaligned(target)
        } else {
            BranchOutcome::Taken(target)
        }
    }
}
