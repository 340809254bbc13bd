//! System-on-Chip (SoC) Components.
//!
//! This module organizes everything outside the pipeline that the core talks to:
//! the memory controller, the ROM/RAM backing stores, and memory-mapped devices.

/// Memory-mapped I/O device implementations.
pub mod devices;

/// Backing stores and the memory controller.
pub mod memory;

/// Device trait definitions for MMIO access.
pub mod traits;

pub use memory::controller::MemoryController;
