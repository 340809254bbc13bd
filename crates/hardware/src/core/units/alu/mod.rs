//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used in the Execute stage. It is a pure
//! combinational function of its operands. Operations are organized by category:
//! - [`arithmetic`]: Add, Sub, and the M extension (Mul, Mulh*, Div*, Rem*)
//! - [`logic`]:      Or, And, Xor, Slt, Sltu
//! - [`shifts`]:     Sll, Srl, Sra
//!
//! Word-width evaluation serves both the RV64 `*W` instructions and every RV32
//! instruction: operands are taken from bits 31..0 and results are sign-extended
//! from bit 31.

/// Integer arithmetic operations (add, subtract, multiply, divide).
pub mod arithmetic;
/// Bitwise logical and comparison operations.
pub mod logic;
/// Shift operations.
pub mod shifts;

use crate::core::pipeline::signals::AluOp;

/// Sign-extends a 32-bit result to the 64-bit register representation.
#[inline(always)]
pub(crate) const fn sext32(value: u32) -> u64 {
    value as i32 as i64 as u64
}

/// Arithmetic Logic Unit for integer operations.
#[derive(Debug, Clone, Copy)]
pub struct Alu;

impl Alu {
    /// Executes an integer ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op`   - The operation to perform.
    /// * `a`    - First operand.
    /// * `b`    - Second operand (also the shift amount).
    /// * `word` - Evaluate on 32-bit operands and sign-extend the result.
    ///
    /// # Returns
    ///
    /// The 64-bit result.
    ///
    /// # Examples
    ///
    /// ```
    /// use rvpipe_core::core::units::alu::Alu;
    /// use rvpipe_core::core::pipeline::signals::AluOp;
    ///
    /// assert_eq!(Alu::execute(AluOp::Add, 42, 8, false), 50);
    /// assert_eq!(Alu::execute(AluOp::Add, 0xFFFF_FFFF, 1, true), 0);
    /// assert_eq!(Alu::execute(AluOp::Divu, 100, 0, false), u64::MAX);
    /// ```
    pub const fn execute(op: AluOp, a: u64, b: u64, word: bool) -> u64 {
        match op {
            AluOp::Add
            | AluOp::Sub
            | AluOp::Mul
            | AluOp::Mulh
            | AluOp::Mulhsu
            | AluOp::Mulhu
            | AluOp::Div
            | AluOp::Divu
            | AluOp::Rem
            | AluOp::Remu => arithmetic::execute(op, a, b, word),
            AluOp::Or | AluOp::And | AluOp::Xor | AluOp::Slt | AluOp::Sltu => {
                logic::execute(op, a, b, word)
            }
            AluOp::Sll | AluOp::Srl | AluOp::Sra => shifts::execute(op, a, b, word),
        }
    }
}
