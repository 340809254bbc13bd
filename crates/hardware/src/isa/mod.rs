//! Instruction Set Architecture (ISA) definitions.
//!
//! Contains encodings, field extraction, and the immediate extender, organized by
//! extension.
//!
//! # Extensions
//!
//! * `base`: RV32I / RV64I base integer set.
//! * `mext`: Integer multiplication and division.
//! * `privileged`: Zicsr, trap return, and trap cause codes.

/// Base integer instruction set encodings.
pub mod base;

/// Immediate extender and field decoder.
pub mod decode;

/// Instruction field accessors.
pub mod instruction;

/// Multiply/divide extension encodings.
pub mod mext;

/// Privileged architecture encodings and cause codes.
pub mod privileged;
