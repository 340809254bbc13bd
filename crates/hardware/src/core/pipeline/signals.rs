//! Pipeline control signals and operation types.
//!
//! This module defines the control-signal vector produced by the control unit. It performs:
//! 1. **Operation Classification:** ALU, memory, branch, CSR, and system operations.
//! 2. **Operand Selection:** Sources for the ALU inputs (registers, PC, immediate, zero).
//! 3. **Memory Control:** Access width and sign extension for loads and stores.
//! 4. **System Control:** Trap-related instructions and CSR access.

use crate::common::Width;

/// Integer ALU operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AluOp {
    /// Addition (also address generation and pass-through).
    #[default]
    Add,
    /// Subtraction.
    Sub,
    /// Shift left logical.
    Sll,
    /// Set less than, signed.
    Slt,
    /// Set less than, unsigned.
    Sltu,
    /// Exclusive or.
    Xor,
    /// Shift right logical.
    Srl,
    /// Shift right arithmetic.
    Sra,
    /// Inclusive or.
    Or,
    /// And.
    And,
    /// Multiply, low half.
    Mul,
    /// Multiply, high half, signed x signed.
    Mulh,
    /// Multiply, high half, signed x unsigned.
    Mulhsu,
    /// Multiply, high half, unsigned x unsigned.
    Mulhu,
    /// Divide, signed.
    Div,
    /// Divide, unsigned.
    Divu,
    /// Remainder, signed.
    Rem,
    /// Remainder, unsigned.
    Remu,
}

/// Memory operation performed in the memory stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemOp {
    /// No memory access.
    #[default]
    None,
    /// Load of `width` bytes, sign- or zero-extended.
    Load {
        /// Transfer width.
        width: Width,
        /// Sign-extend the loaded value.
        signed: bool,
    },
    /// Store of the low `width` bytes of rs2.
    Store {
        /// Transfer width.
        width: Width,
    },
}

impl MemOp {
    /// Returns `true` for loads.
    pub const fn is_load(self) -> bool {
        matches!(self, Self::Load { .. })
    }

    /// Returns `true` for stores.
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Store { .. })
    }
}

/// Condition of a conditional branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchCond {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than, signed.
    Lt,
    /// Greater or equal, signed.
    Ge,
    /// Less than, unsigned.
    Ltu,
    /// Greater or equal, unsigned.
    Geu,
}

/// Control-transfer class of an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowOp {
    /// Falls through to `pc + 4`.
    #[default]
    Next,
    /// Conditional branch to `pc + imm`.
    Branch(BranchCond),
    /// `JAL`: jump to `pc + imm`, link `pc + 4`.
    Jal,
    /// `JALR`: jump to `(rs1 + imm) & !1`, link `pc + 4`.
    Jalr,
}

/// Source for ALU operand A.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpASrc {
    /// `rs1` value.
    #[default]
    Reg1,
    /// Program counter.
    Pc,
    /// Zero.
    Zero,
}

/// Source for ALU operand B.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpBSrc {
    /// Sign-extended immediate.
    #[default]
    Imm,
    /// `rs2` value.
    Reg2,
    /// Zero.
    Zero,
}

/// CSR access performed at write-back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CsrOp {
    /// No CSR access.
    #[default]
    None,
    /// Replace with the source.
    Write,
    /// Set the bits of the source.
    Set,
    /// Clear the bits of the source.
    Clear,
}

/// System instruction class.
///
/// `ECALL` and `EBREAK` never execute; decode turns them into traps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SystemOp {
    /// Not a system instruction.
    #[default]
    None,
    /// `MRET`.
    Mret,
    /// `WFI`, executed as a no-op.
    Wfi,
    /// `FENCE` / `FENCE.I`, executed as no-ops in a single in-order core.
    Fence,
}

/// Control-signal vector for one instruction.
///
/// Produced by the control unit in decode and carried down the pipeline unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlSignals {
    /// Write `rd` at write-back.
    pub reg_write: bool,
    /// Instruction reads `rs1`.
    pub uses_rs1: bool,
    /// Instruction reads `rs2`.
    pub uses_rs2: bool,
    /// ALU operation.
    pub alu: AluOp,
    /// Evaluate the ALU on 32-bit operands (RV32, or RV64 `*W`).
    pub word: bool,
    /// ALU operand A source.
    pub a_src: OpASrc,
    /// ALU operand B source.
    pub b_src: OpBSrc,
    /// Memory-stage operation.
    pub mem: MemOp,
    /// Control-transfer class.
    pub flow: FlowOp,
    /// CSR operation.
    pub csr: CsrOp,
    /// CSR address for CSR operations.
    pub csr_addr: u16,
    /// System instruction class.
    pub system: SystemOp,
}

impl ControlSignals {
    /// Returns `true` if the result only becomes available after the memory stage
    /// (loads) or at write-back (CSR reads), so it cannot be forwarded from EX/MEM.
    pub const fn late_result(&self) -> bool {
        self.mem.is_load() || !matches!(self.csr, CsrOp::None)
    }

    /// Returns `true` for branches and jumps.
    pub const fn is_control_transfer(&self) -> bool {
        !matches!(self.flow, FlowOp::Next)
    }
}
