//! Device trait for memory-mapped I/O.
//!
//! This module defines the `Device` trait implemented by everything the memory controller
//! routes to. It provides:
//! 1. **Identification:** `name` and `address_range` for routing.
//! 2. **Access:** Width-typed read and write at device-relative offsets, failing with a
//!    `MemFault` that the pipeline turns into an access-fault trap.
//! 3. **Lifecycle:** An optional per-cycle `tick` that reports the device's interrupt line.

use crate::common::{MemFault, Width};

/// A memory-mapped component attached to the memory controller.
pub trait Device: Send + std::fmt::Debug {
    /// Returns a short name for this device (e.g., `"RAM"`, `"CLINT"`).
    fn name(&self) -> &str;

    /// Returns `(base_address, size_in_bytes)` of the region this device decodes.
    fn address_range(&self) -> (u64, u64);

    /// Reads `width` bytes (little-endian) at a device-relative offset.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset from the base of `address_range`.
    /// * `width` - Transfer width.
    ///
    /// # Returns
    ///
    /// The zero-extended value, or the fault the access raises.
    fn read(&mut self, offset: u64, width: Width) -> Result<u64, MemFault>;

    /// Writes the low `width` bytes of `value` (little-endian) at a device-relative offset.
    fn write(&mut self, offset: u64, width: Width, value: u64) -> Result<(), MemFault>;

    /// Advances device state by one cycle.
    ///
    /// # Returns
    ///
    /// The level of the device's interrupt output, OR-ed into the external interrupt line.
    fn tick(&mut self) -> bool {
        false
    }

    /// Returns `true` if `[addr, addr + len)` lies inside this device.
    fn contains(&self, addr: u64, len: u64) -> bool {
        let (base, size) = self.address_range();
        addr >= base && addr.checked_add(len).is_some_and(|end| end <= base + size)
    }
}
