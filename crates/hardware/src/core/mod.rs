//! Core processor implementation.
//!
//! This module contains the CPU simulation context, the instruction pipeline, the
//! execution units, and the architectural state they update.

/// Architecture-specific components (CSRs, register file, privilege modes, traps).
pub mod arch;

/// CPU context and the two-phase cycle.
pub mod cpu;

/// Instruction pipeline (stages, latches, control, forwarding, hazards).
pub mod pipeline;

/// Execution units (ALU, branch unit, data cache).
pub mod units;

pub use self::cpu::Cpu;
