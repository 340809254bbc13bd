//! Immediate-value extender and field decoder.
//!
//! Reassembles the scattered immediate bits of the I, S, B, U and J formats and
//! sign-extends them to 64 bits. The format is chosen from the major opcode alone,
//! so this is a pure function that is safe to evaluate every cycle.

use crate::isa::base::opcodes;
use crate::isa::instruction::{Decoded, InstructionBits};

/// Immediate layout of an encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImmFormat {
    /// `imm[11:0]` in bits 31..20.
    I,
    /// `imm[11:5]` in bits 31..25, `imm[4:0]` in bits 11..7.
    S,
    /// `imm[12|10:5]` in bits 31..25, `imm[4:1|11]` in bits 11..7.
    B,
    /// `imm[31:12]` in bits 31..12.
    U,
    /// `imm[20|10:1|11|19:12]` in bits 31..12.
    J,
    /// No immediate (R-type, SYSTEM).
    None,
}

impl ImmFormat {
    /// Selects the immediate layout for a major opcode.
    pub const fn for_opcode(opcode: u32) -> Self {
        match opcode {
            opcodes::OP_IMM | opcodes::OP_IMM_32 | opcodes::OP_LOAD | opcodes::OP_JALR => Self::I,
            opcodes::OP_STORE => Self::S,
            opcodes::OP_BRANCH => Self::B,
            opcodes::OP_LUI | opcodes::OP_AUIPC => Self::U,
            opcodes::OP_JAL => Self::J,
            _ => Self::None,
        }
    }
}

/// Sign-extends the low `bits` bits of `value`.
#[inline]
pub const fn sign_extend(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Extracts `len` bits of `inst` starting at bit `lo`.
#[inline]
const fn field(inst: u32, lo: u32, len: u32) -> u64 {
    ((inst >> lo) & ((1 << len) - 1)) as u64
}

/// Extends the immediate of `inst` according to `format`.
///
/// # Arguments
///
/// * `inst` - Raw instruction word.
/// * `format` - Immediate layout to apply.
///
/// # Returns
///
/// The immediate sign-extended to 64 bits. U-type values are already shifted into
/// bits 31..12.
pub const fn extend(inst: u32, format: ImmFormat) -> i64 {
    match format {
        ImmFormat::I => sign_extend(field(inst, 20, 12), 12),
        ImmFormat::S => sign_extend((field(inst, 25, 7) << 5) | field(inst, 7, 5), 12),
        ImmFormat::B => sign_extend(
            (field(inst, 31, 1) << 12)
                | (field(inst, 7, 1) << 11)
                | (field(inst, 25, 6) << 5)
                | (field(inst, 8, 4) << 1),
            13,
        ),
        ImmFormat::U => sign_extend((inst & 0xFFFF_F000) as u64, 32),
        ImmFormat::J => sign_extend(
            (field(inst, 31, 1) << 20)
                | (field(inst, 12, 8) << 12)
                | (field(inst, 20, 1) << 11)
                | (field(inst, 21, 10) << 1),
            21,
        ),
        ImmFormat::None => 0,
    }
}

/// Splits an instruction word into its fields and extended immediate.
pub fn decode(inst: u32) -> Decoded {
    let opcode = inst.opcode();
    Decoded {
        raw: inst,
        opcode,
        rd: inst.rd(),
        rs1: inst.rs1(),
        rs2: inst.rs2(),
        funct3: inst.funct3(),
        funct7: inst.funct7(),
        imm: extend(inst, ImmFormat::for_opcode(opcode)),
    }
}
