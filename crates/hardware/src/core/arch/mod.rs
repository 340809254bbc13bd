//! RISC-V architectural state.
//!
//! This module contains the programmer-visible state of the core:
//! 1. **GPRs:** The integer register file with `x0` hard-wired to zero.
//! 2. **CSRs:** Control and status register storage and access rules.
//! 3. **Modes:** Privilege levels.
//! 4. **Traps:** The privileged unit that performs trap entry and trap return.

/// Control and Status Register (CSR) definitions and access logic.
pub mod csr;

/// General-Purpose Register file implementation.
pub mod gpr;

/// Privilege mode definitions.
pub mod mode;

/// Privileged unit: trap entry, trap return, and interrupt selection.
pub mod trap;
