//! Common types shared by every part of the core model.
//!
//! This module provides the small vocabulary the rest of the crate is written in:
//! 1. **Memory Access:** The classification of an access (fetch, load, store) and its width.
//! 2. **Error Handling:** Architectural traps and memory-side faults.

/// Memory access type and width definitions.
pub mod data;

/// Trap and memory fault definitions.
pub mod error;

pub use data::{AccessType, Width};
pub use error::{MemFault, Trap};
