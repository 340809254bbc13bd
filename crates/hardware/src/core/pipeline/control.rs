//! Control Unit.
//!
//! Maps an instruction word onto the control-signal vector consumed by the datapath and
//! the hazard logic. Decoding is a pure function of the instruction bits, the ISA variant
//! descriptor, and the current privilege mode. It performs:
//! 1. **Opcode Dispatch:** One decode routine per major opcode.
//! 2. **Variant Gating:** RV64-only encodings, the M extension, and Zicsr are accepted only
//!    when the descriptor enables them.
//! 3. **CSR Legality:** Existence, privilege, and read-only checks for CSR instructions.
//! 4. **Illegal Instructions:** Every other encoding maps to `Trap::IllegalInstruction`.
//!
//! Checking CSR privilege here is exact because every privilege change goes through
//! write-back and flushes the pipeline behind it.

use crate::common::{Trap, Width};
use crate::config::{IsaConfig, Xlen};
use crate::core::arch::csr;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::pipeline::signals::{
    AluOp, BranchCond, ControlSignals, CsrOp, FlowOp, MemOp, OpASrc, OpBSrc, SystemOp,
};
use crate::isa::base::{funct3, funct7, opcodes};
use crate::isa::instruction::InstructionBits;
use crate::isa::mext;
use crate::isa::privileged::opcodes as sys;

/// Instruction decoder producing control signals.
#[derive(Debug, Clone, Copy)]
pub struct ControlUnit;

/// Returns `true` if a CSR instruction writes its CSR.
///
/// `CSRRS`/`CSRRC` with `rs1 = x0` and the immediate set/clear forms with a zero
/// immediate only read.
pub const fn csr_writes(op: CsrOp, inst: u32) -> bool {
    match op {
        CsrOp::None => false,
        CsrOp::Write => true,
        CsrOp::Set | CsrOp::Clear => (inst >> 15) & 0x1F != 0,
    }
}

impl ControlUnit {
    /// Decodes an instruction into control signals.
    ///
    /// # Arguments
    ///
    /// * `inst` - Raw 32-bit instruction word.
    /// * `isa` - ISA variant descriptor.
    /// * `mode` - Privilege mode the instruction will execute in.
    ///
    /// # Returns
    ///
    /// The control-signal vector, or the trap the instruction raises at decode
    /// (`IllegalInstruction`, or the environment-call and breakpoint traps).
    pub fn decode(inst: u32, isa: &IsaConfig, mode: PrivilegeMode) -> Result<ControlSignals, Trap> {
        let illegal = Trap::IllegalInstruction(inst);
        if !inst.is_full_width() {
            return Err(illegal);
        }
        let rv64 = matches!(isa.xlen, Xlen::Rv64);
        let word = !rv64;

        let ctrl = match inst.opcode() {
            opcodes::OP_LUI => ControlSignals {
                reg_write: true,
                a_src: OpASrc::Zero,
                b_src: OpBSrc::Imm,
                word,
                ..ControlSignals::default()
            },
            opcodes::OP_AUIPC => ControlSignals {
                reg_write: true,
                a_src: OpASrc::Pc,
                b_src: OpBSrc::Imm,
                word,
                ..ControlSignals::default()
            },
            opcodes::OP_JAL => ControlSignals {
                reg_write: true,
                flow: FlowOp::Jal,
                a_src: OpASrc::Pc,
                word,
                ..ControlSignals::default()
            },
            opcodes::OP_JALR if inst.funct3() == 0 => ControlSignals {
                reg_write: true,
                uses_rs1: true,
                flow: FlowOp::Jalr,
                word,
                ..ControlSignals::default()
            },
            opcodes::OP_BRANCH => {
                let cond = match inst.funct3() {
                    funct3::BEQ => BranchCond::Eq,
                    funct3::BNE => BranchCond::Ne,
                    funct3::BLT => BranchCond::Lt,
                    funct3::BGE => BranchCond::Ge,
                    funct3::BLTU => BranchCond::Ltu,
                    funct3::BGEU => BranchCond::Geu,
                    _ => return Err(illegal),
                };
                ControlSignals {
                    uses_rs1: true,
                    uses_rs2: true,
                    flow: FlowOp::Branch(cond),
                    a_src: OpASrc::Pc,
                    word,
                    ..ControlSignals::default()
                }
            }
            opcodes::OP_LOAD => {
                let (width, signed) = match inst.funct3() {
                    funct3::LB => (Width::Byte, true),
                    funct3::LH => (Width::Half, true),
                    funct3::LW => (Width::Word, true),
                    funct3::LBU => (Width::Byte, false),
                    funct3::LHU => (Width::Half, false),
                    funct3::LD if rv64 => (Width::Double, true),
                    funct3::LWU if rv64 => (Width::Word, false),
                    _ => return Err(illegal),
                };
                ControlSignals {
                    reg_write: true,
                    uses_rs1: true,
                    mem: MemOp::Load { width, signed },
                    word,
                    ..ControlSignals::default()
                }
            }
            opcodes::OP_STORE => {
                let width = match inst.funct3() {
                    funct3::SB => Width::Byte,
                    funct3::SH => Width::Half,
                    funct3::SW => Width::Word,
                    funct3::SD if rv64 => Width::Double,
                    _ => return Err(illegal),
                };
                ControlSignals {
                    uses_rs1: true,
                    uses_rs2: true,
                    mem: MemOp::Store { width },
                    word,
                    ..ControlSignals::default()
                }
            }
            opcodes::OP_IMM => {
                let alu = Self::imm_op(inst, isa.xlen).ok_or(illegal)?;
                ControlSignals {
                    reg_write: true,
                    uses_rs1: true,
                    alu,
                    word,
                    ..ControlSignals::default()
                }
            }
            opcodes::OP_IMM_32 if rv64 => {
                let alu = Self::imm_op(inst, Xlen::Rv32).ok_or(illegal)?;
                if !matches!(alu, AluOp::Add | AluOp::Sll | AluOp::Srl | AluOp::Sra) {
                    return Err(illegal);
                }
                ControlSignals {
                    reg_write: true,
                    uses_rs1: true,
                    alu,
                    word: true,
                    ..ControlSignals::default()
                }
            }
            opcodes::OP_REG => {
                let alu = Self::reg_op(inst, isa).ok_or(illegal)?;
                ControlSignals {
                    reg_write: true,
                    uses_rs1: true,
                    uses_rs2: true,
                    alu,
                    b_src: OpBSrc::Reg2,
                    word,
                    ..ControlSignals::default()
                }
            }
            opcodes::OP_REG_32 if rv64 => {
                let alu = Self::reg_op(inst, isa).ok_or(illegal)?;
                if !matches!(
                    alu,
                    AluOp::Add
                        | AluOp::Sub
                        | AluOp::Sll
                        | AluOp::Srl
                        | AluOp::Sra
                        | AluOp::Mul
                        | AluOp::Div
                        | AluOp::Divu
                        | AluOp::Rem
                        | AluOp::Remu
                ) {
                    return Err(illegal);
                }
                ControlSignals {
                    reg_write: true,
                    uses_rs1: true,
                    uses_rs2: true,
                    alu,
                    b_src: OpBSrc::Reg2,
                    word: true,
                    ..ControlSignals::default()
                }
            }
            opcodes::OP_MISC_MEM => match inst.funct3() {
                funct3::FENCE | funct3::FENCE_I => ControlSignals {
                    system: SystemOp::Fence,
                    ..ControlSignals::default()
                },
                _ => return Err(illegal),
            },
            sys::OP_SYSTEM if isa.zicsr => return Self::system(inst, isa.xlen, mode),
            _ => return Err(illegal),
        };
        Ok(ctrl)
    }

    /// Register-immediate ALU group, shared by `OP-IMM` and `OP-IMM-32`.
    ///
    /// `xlen` bounds the shift amount: bit 5 of `shamt` is only legal on RV64 `OP-IMM`.
    fn imm_op(inst: u32, xlen: Xlen) -> Option<AluOp> {
        let op = match inst.funct3() {
            funct3::ADD_SUB => AluOp::Add,
            funct3::SLT => AluOp::Slt,
            funct3::SLTU => AluOp::Sltu,
            funct3::XOR => AluOp::Xor,
            funct3::OR => AluOp::Or,
            funct3::AND => AluOp::And,
            funct3::SLL | funct3::SRL_SRA => {
                // Bits above the shift amount must match SLLI/SRLI/SRAI exactly.
                let shamt_bits = xlen.shamt_mask().count_ones();
                let upper = inst >> (20 + shamt_bits);
                let expected_alt = funct7::ALT >> (shamt_bits - 5);
                match (inst.funct3(), upper) {
                    (funct3::SLL, 0) => AluOp::Sll,
                    (funct3::SRL_SRA, 0) => AluOp::Srl,
                    (funct3::SRL_SRA, u) if u == expected_alt => AluOp::Sra,
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(op)
    }

    /// Register-register ALU group, shared by `OP` and `OP-32`.
    fn reg_op(inst: u32, isa: &IsaConfig) -> Option<AluOp> {
        let op = match (inst.funct7(), inst.funct3()) {
            (funct7::DEFAULT, funct3::ADD_SUB) => AluOp::Add,
            (funct7::ALT, funct3::ADD_SUB) => AluOp::Sub,
            (funct7::DEFAULT, funct3::SLL) => AluOp::Sll,
            (funct7::DEFAULT, funct3::SLT) => AluOp::Slt,
            (funct7::DEFAULT, funct3::SLTU) => AluOp::Sltu,
            (funct7::DEFAULT, funct3::XOR) => AluOp::Xor,
            (funct7::DEFAULT, funct3::SRL_SRA) => AluOp::Srl,
            (funct7::ALT, funct3::SRL_SRA) => AluOp::Sra,
            (funct7::DEFAULT, funct3::OR) => AluOp::Or,
            (funct7::DEFAULT, funct3::AND) => AluOp::And,
            (mext::FUNCT7_MULDIV, f3) if isa.m_extension => match f3 {
                mext::funct3::MUL => AluOp::Mul,
                mext::funct3::MULH => AluOp::Mulh,
                mext::funct3::MULHSU => AluOp::Mulhsu,
                mext::funct3::MULHU => AluOp::Mulhu,
                mext::funct3::DIV => AluOp::Div,
                mext::funct3::DIVU => AluOp::Divu,
                mext::funct3::REM => AluOp::Rem,
                _ => AluOp::Remu,
            },
            _ => return None,
        };
        Some(op)
    }

    /// SYSTEM opcode: trap instructions, `MRET`, `WFI`, and CSR access.
    fn system(inst: u32, xlen: Xlen, mode: PrivilegeMode) -> Result<ControlSignals, Trap> {
        let illegal = Trap::IllegalInstruction(inst);
        let csr = match inst.funct3() {
            sys::PRIV => {
                let system = match inst {
                    sys::ECALL => {
                        return Err(match mode {
                            PrivilegeMode::User => Trap::EnvironmentCallFromUMode,
                            PrivilegeMode::Machine => Trap::EnvironmentCallFromMMode,
                        });
                    }
                    // The decode stage substitutes the program counter.
                    sys::EBREAK => return Err(Trap::Breakpoint(0)),
                    sys::MRET => SystemOp::Mret,
                    sys::WFI => SystemOp::Wfi,
                    _ => return Err(illegal),
                };
                return Ok(ControlSignals {
                    system,
                    ..ControlSignals::default()
                });
            }
            sys::CSRRW | sys::CSRRWI => CsrOp::Write,
            sys::CSRRS | sys::CSRRSI => CsrOp::Set,
            sys::CSRRC | sys::CSRRCI => CsrOp::Clear,
            _ => return Err(illegal),
        };

        let immediate = inst.funct3() & 0b100 != 0;
        let addr = inst.csr();
        if !csr::access_allowed(addr, xlen, mode, csr_writes(csr, inst)) {
            return Err(illegal);
        }

        let (a_src, b_src) = if immediate {
            (OpASrc::Zero, OpBSrc::Imm)
        } else {
            (OpASrc::Reg1, OpBSrc::Zero)
        };
        Ok(ControlSignals {
            reg_write: true,
            uses_rs1: !immediate,
            a_src,
            b_src,
            csr,
            csr_addr: addr,
            ..ControlSignals::default()
        })
    }
}
