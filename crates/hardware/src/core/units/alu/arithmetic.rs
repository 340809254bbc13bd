//! ALU arithmetic operations.
//!
//! Addition, subtraction, and the M-extension multiply/divide family. Division by
//! zero and signed overflow never trap: they produce the architecturally defined
//! results (all ones quotient, dividend remainder, wrapped quotient).

use super::sext32;
use crate::core::pipeline::signals::AluOp;

/// Executes an arithmetic operation; non-arithmetic ops yield zero.
pub const fn execute(op: AluOp, a: u64, b: u64, word: bool) -> u64 {
    if word {
        return execute_word(op, a as u32, b as u32);
    }
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Mulh => ((a as i64 as i128 * b as i64 as i128) >> 64) as u64,
        AluOp::Mulhsu => ((a as i64 as i128).wrapping_mul(b as i128) >> 64) as u64,
        AluOp::Mulhu => ((a as u128 * b as u128) >> 64) as u64,
        AluOp::Div => match b {
            0 => u64::MAX,
            _ => (a as i64).wrapping_div(b as i64) as u64,
        },
        AluOp::Divu => match b {
            0 => u64::MAX,
            _ => a / b,
        },
        AluOp::Rem => match b {
            0 => a,
            _ => (a as i64).wrapping_rem(b as i64) as u64,
        },
        AluOp::Remu => match b {
            0 => a,
            _ => a % b,
        },
        _ => 0,
    }
}

/// 32-bit evaluation. The high-half multiplies return bits 63..32 of the 64-bit product.
const fn execute_word(op: AluOp, a: u32, b: u32) -> u64 {
    match op {
        AluOp::Add => sext32(a.wrapping_add(b)),
        AluOp::Sub => sext32(a.wrapping_sub(b)),
        AluOp::Mul => sext32(a.wrapping_mul(b)),
        AluOp::Mulh => sext32(((a as i32 as i64 * b as i32 as i64) >> 32) as u32),
        AluOp::Mulhsu => sext32(((a as i32 as i64 * b as i64) >> 32) as u32),
        AluOp::Mulhu => sext32(((a as u64 * b as u64) >> 32) as u32),
        AluOp::Div => match b {
            0 => u64::MAX,
            _ => sext32((a as i32).wrapping_div(b as i32) as u32),
        },
        AluOp::Divu => match b {
            0 => u64::MAX,
            _ => sext32(a / b),
        },
        AluOp::Rem => match b {
            0 => sext32(a),
            _ => sext32((a as i32).wrapping_rem(b as i32) as u32),
        },
        AluOp::Remu => match b {
            0 => sext32(a),
            _ => sext32(a % b),
        },
        _ => 0,
    }
}
