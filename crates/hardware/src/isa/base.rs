//! Base integer instruction set (RV32I / RV64I) encodings.
//!
//! The 32-bit and 64-bit base sets share every encoding. The `*_32` opcodes and the
//! double-word loads and stores only exist when `xlen` is 64; the control unit rejects
//! them on RV32.

/// Major opcodes (bits 6..0).
pub mod opcodes {
    /// LB, LH, LW, LD, LBU, LHU, LWU.
    pub const OP_LOAD: u32 = 0b000_0011;
    /// FENCE and FENCE.I.
    pub const OP_MISC_MEM: u32 = 0b000_1111;
    /// ADDI, SLTI, XORI, SLLI and the rest of the register-immediate group.
    pub const OP_IMM: u32 = 0b001_0011;
    /// AUIPC.
    pub const OP_AUIPC: u32 = 0b001_0111;
    /// ADDIW, SLLIW, SRLIW, SRAIW (RV64 only).
    pub const OP_IMM_32: u32 = 0b001_1011;
    /// SB, SH, SW, SD.
    pub const OP_STORE: u32 = 0b010_0011;
    /// Register-register arithmetic, plus the M extension when funct7 = 1.
    pub const OP_REG: u32 = 0b011_0011;
    /// LUI.
    pub const OP_LUI: u32 = 0b011_0111;
    /// ADDW, SUBW, SLLW, SRLW, SRAW and the M extension word forms (RV64 only).
    pub const OP_REG_32: u32 = 0b011_1011;
    /// BEQ, BNE, BLT, BGE, BLTU, BGEU.
    pub const OP_BRANCH: u32 = 0b110_0011;
    /// JALR.
    pub const OP_JALR: u32 = 0b110_0111;
    /// JAL.
    pub const OP_JAL: u32 = 0b110_1111;
}

/// Minor opcodes (bits 14..12).
pub mod funct3 {
    /// Load byte, sign-extended.
    pub const LB: u32 = 0b000;
    /// Load half, sign-extended.
    pub const LH: u32 = 0b001;
    /// Load word, sign-extended.
    pub const LW: u32 = 0b010;
    /// Load double (RV64).
    pub const LD: u32 = 0b011;
    /// Load byte, zero-extended.
    pub const LBU: u32 = 0b100;
    /// Load half, zero-extended.
    pub const LHU: u32 = 0b101;
    /// Load word, zero-extended (RV64).
    pub const LWU: u32 = 0b110;

    /// Store byte.
    pub const SB: u32 = 0b000;
    /// Store half.
    pub const SH: u32 = 0b001;
    /// Store word.
    pub const SW: u32 = 0b010;
    /// Store double (RV64).
    pub const SD: u32 = 0b011;

    /// Branch if equal.
    pub const BEQ: u32 = 0b000;
    /// Branch if not equal.
    pub const BNE: u32 = 0b001;
    /// Branch if less than, signed.
    pub const BLT: u32 = 0b100;
    /// Branch if greater or equal, signed.
    pub const BGE: u32 = 0b101;
    /// Branch if less than, unsigned.
    pub const BLTU: u32 = 0b110;
    /// Branch if greater or equal, unsigned.
    pub const BGEU: u32 = 0b111;

    /// ADD or SUB (funct7 selects).
    pub const ADD_SUB: u32 = 0b000;
    /// Shift left logical.
    pub const SLL: u32 = 0b001;
    /// Set if less than, signed.
    pub const SLT: u32 = 0b010;
    /// Set if less than, unsigned.
    pub const SLTU: u32 = 0b011;
    /// Exclusive or.
    pub const XOR: u32 = 0b100;
    /// SRL or SRA (funct7 selects).
    pub const SRL_SRA: u32 = 0b101;
    /// Inclusive or.
    pub const OR: u32 = 0b110;
    /// And.
    pub const AND: u32 = 0b111;

    /// FENCE.
    pub const FENCE: u32 = 0b000;
    /// FENCE.I.
    pub const FENCE_I: u32 = 0b001;
}

/// Upper function field (bits 31..25).
pub mod funct7 {
    /// ADD, SRL and the other primary encodings.
    pub const DEFAULT: u32 = 0b000_0000;
    /// SUB and SRA.
    pub const ALT: u32 = 0b010_0000;
}
