//! Integer multiply/divide extension (M) encodings.
//!
//! Shares `OP_REG` and `OP_REG_32` with the base set and is selected by funct7 = 1.

/// funct7 value selecting the M extension.
pub const FUNCT7_MULDIV: u32 = 0b000_0001;

/// Minor opcodes (bits 14..12) within the M extension.
pub mod funct3 {
    /// Low half of the product.
    pub const MUL: u32 = 0b000;
    /// High half, signed x signed.
    pub const MULH: u32 = 0b001;
    /// High half, signed x unsigned.
    pub const MULHSU: u32 = 0b010;
    /// High half, unsigned x unsigned.
    pub const MULHU: u32 = 0b011;
    /// Signed quotient.
    pub const DIV: u32 = 0b100;
    /// Unsigned quotient.
    pub const DIVU: u32 = 0b101;
    /// Signed remainder.
    pub const REM: u32 = 0b110;
    /// Unsigned remainder.
    pub const REMU: u32 = 0b111;
}
