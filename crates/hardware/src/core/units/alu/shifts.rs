//! ALU shift operations.
//!
//! The shift amount is taken from the low 6 bits of `b`, or the low 5 bits for
//! word-width shifts.

use super::sext32;
use crate::core::pipeline::signals::AluOp;

/// Executes a shift; other ops yield zero.
pub const fn execute(op: AluOp, a: u64, b: u64, word: bool) -> u64 {
    if word {
        let sh = (b & 0x1F) as u32;
        let a = a as u32;
        return match op {
            AluOp::Sll => sext32(a << sh),
            AluOp::Srl => sext32(a >> sh),
            AluOp::Sra => sext32(((a as i32) >> sh) as u32),
            _ => 0,
        };
    }
    let sh = (b & 0x3F) as u32;
    match op {
        AluOp::Sll => a << sh,
        AluOp::Srl => a >> sh,
        AluOp::Sra => ((a as i64) >> sh) as u64,
        _ => 0,
    }
}
