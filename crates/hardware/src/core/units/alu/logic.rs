//! ALU logic and comparison operations.

use crate::core::pipeline::signals::AluOp;

/// Executes a logic or set-less-than operation; other ops yield zero.
///
/// Bitwise results need no word handling: canonical operands produce canonical results.
pub const fn execute(op: AluOp, a: u64, b: u64, word: bool) -> u64 {
    match op {
        AluOp::Or => a | b,
        AluOp::And => a & b,
        AluOp::Xor => a ^ b,
        AluOp::Slt if word => ((a as i32) < (b as i32)) as u64,
        AluOp::Slt => ((a as i64) < (b as i64)) as u64,
        AluOp::Sltu if word => ((a as u32) < (b as u32)) as u64,
        AluOp::Sltu => (a < b) as u64,
        _ => 0,
    }
}
