//! Execution units and functional components.
//!
//! This module contains the stateless and stateful units the pipeline stages drive:
//! the integer ALU, the branch resolution unit, and the data cache.

/// Arithmetic Logic Unit for integer operations.
pub mod alu;

/// Branch resolution: condition evaluation and target computation.
pub mod bru;

/// Write-back data cache with replacement policies.
pub mod cache;
