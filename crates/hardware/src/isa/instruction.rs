//! Instruction field extraction.
//!
//! Provides bit-field accessors on raw 32-bit encodings and the `Decoded`
//! view the control unit consumes.

/// Mask of a 5-bit register index field.
const REG_MASK: u32 = 0x1F;
/// Mask of the funct3 field.
const FUNCT3_MASK: u32 = 0x7;
/// Mask of the funct7 field.
const FUNCT7_MASK: u32 = 0x7F;
/// Mask of the 12-bit CSR address field.
const CSR_MASK: u32 = 0xFFF;

/// Field accessors for a raw instruction word.
pub trait InstructionBits {
    /// Major opcode, bits 6..0.
    fn opcode(&self) -> u32;
    /// Destination register index, bits 11..7.
    fn rd(&self) -> usize;
    /// First source register index, bits 19..15. Also the `uimm` of immediate CSR forms.
    fn rs1(&self) -> usize;
    /// Second source register index, bits 24..20.
    fn rs2(&self) -> usize;
    /// funct3, bits 14..12.
    fn funct3(&self) -> u32;
    /// funct7, bits 31..25.
    fn funct7(&self) -> u32;
    /// CSR address, bits 31..20.
    fn csr(&self) -> u16;
    /// Returns `true` when the low two bits mark a 32-bit encoding.
    fn is_full_width(&self) -> bool;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self & 0x7F
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 7) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        ((self >> 15) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        ((self >> 20) & REG_MASK) as usize
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        (self >> 12) & FUNCT3_MASK
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        (self >> 25) & FUNCT7_MASK
    }

    #[inline(always)]
    fn csr(&self) -> u16 {
        ((self >> 20) & CSR_MASK) as u16
    }

    #[inline(always)]
    fn is_full_width(&self) -> bool {
        self & 0b11 == 0b11
    }
}

/// An instruction split into its fields with the immediate already extended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Raw 32-bit encoding.
    pub raw: u32,
    /// Major opcode.
    pub opcode: u32,
    /// Destination register index.
    pub rd: usize,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// funct3.
    pub funct3: u32,
    /// funct7.
    pub funct7: u32,
    /// Sign-extended immediate, zero for formats without one.
    pub imm: i64,
}
