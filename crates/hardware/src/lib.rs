//! Cycle-accurate five-stage pipelined RISC-V core model.
//!
//! This crate models a classic in-order RISC-V core clock cycle by clock cycle:
//! 1. **Core:** IF, ID, EX, MEM, and WB stages with forwarding, hazard detection, and
//!    precise traps taken at write-back.
//! 2. **Memory:** A set-associative write-back data cache and a single-transaction memory
//!    controller with configurable latencies.
//! 3. **ISA:** RV32I/RV64I with the M extension, Zicsr, and machine/user privilege.
//! 4. **SoC:** ROM, RAM, the CLINT timer, and pluggable MMIO devices.
//! 5. **Simulation:** Image loading, configuration, and statistics collection.

/// Common types (traps, memory faults, access widths).
pub mod common;
/// Simulator configuration (defaults, ISA variant, memory map, cache geometry).
pub mod config;
/// CPU core (arch state, execution units, pipeline, cycle stepping).
pub mod core;
/// Instruction set (encoding fields, opcodes, immediates).
pub mod isa;
/// Simulator driver and image loader.
pub mod sim;
/// System-on-chip (memory controller, backing stores, devices).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Main CPU type; holds the pipeline, cache, memory controller, and stats.
pub use crate::core::Cpu;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
