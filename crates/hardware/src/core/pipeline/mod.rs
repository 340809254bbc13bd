//! Instruction pipeline implementation.
//!
//! This module contains the five-stage in-order pipeline (IF, ID, EX, MEM, WB).
//! It includes the following components:
//! 1. **Control:** The control unit that decodes instruction words into signals.
//! 2. **Forwarding:** Operand bypass from the memory and write-back stages.
//! 3. **Hazards:** The per-cycle stall/flush/redirect decision.
//! 4. **Latches:** The four inter-stage pipeline registers.
//! 5. **Signals:** Control signals generated during instruction decoding.
//! 6. **Stages:** Combinational evaluation of each stage.
//! 7. **Traits:** Common interfaces for latches and their entries.

/// Control unit: instruction word to control signals.
pub mod control;

/// Operand forwarding unit.
pub mod forwarding;

/// Pipeline hazard detection and resolution.
pub mod hazards;

/// Inter-stage pipeline latches (IF/ID, ID/EX, EX/MEM, MEM/WB).
pub mod latches;

/// Control signals generated during instruction decode.
pub mod signals;

/// Pipeline stage implementations (fetch, decode, execute, memory, writeback).
pub mod stages;

/// Traits for pipeline latches.
pub mod traits;
