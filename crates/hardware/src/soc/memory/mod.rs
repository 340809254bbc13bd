//! Backing Stores (ROM and RAM).
//!
//! This module implements the byte-addressable stores behind the memory controller. It provides:
//! 1. **Memory:** A flat little-endian byte array mapped at a base address.
//! 2. **Write Protection:** ROM rejects stores from the pipeline; the loader writes through
//!    the backdoor instead.
//! 3. **Controller:** Routing, latency, and the single in-flight transaction.

/// Memory controller: routing, latency, and transaction serialization.
pub mod controller;

use crate::common::{MemFault, Width};
use crate::soc::traits::Device;

/// A contiguous backing store.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    name: &'static str,
    base: u64,
    data: Vec<u8>,
    read_only: bool,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("name", &self.name)
            .field("base", &format_args!("{:#x}", self.base))
            .field("size", &self.data.len())
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl Memory {
    /// Creates a zero-filled store.
    ///
    /// # Arguments
    ///
    /// * `name` - Name used in routing logs.
    /// * `base` - Physical base address.
    /// * `size` - Size in bytes.
    /// * `read_only` - Reject writes arriving through [`Device::write`].
    pub fn new(name: &'static str, base: u64, size: usize, read_only: bool) -> Self {
        Self {
            name,
            base,
            data: vec![0; size],
            read_only,
        }
    }

    fn range(&self, offset: u64, len: usize) -> Result<std::ops::Range<usize>, MemFault> {
        let fault = MemFault::Unmapped(self.base.wrapping_add(offset));
        let start = usize::try_from(offset).map_err(|_| fault)?;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(fault)?;
        Ok(start..end)
    }

    /// Copies bytes out of the store.
    pub fn read_bytes(&self, offset: u64, buf: &mut [u8]) -> Result<(), MemFault> {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    /// Copies bytes into the store, ignoring write protection.
    ///
    /// Used by the image loader and by cache write-backs, which only ever carry lines
    /// that were filled from the same store.
    pub fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<(), MemFault> {
        let range = self.range(offset, bytes.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }
}

impl Device for Memory {
    fn name(&self) -> &str {
        self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.data.len() as u64)
    }

    fn read(&mut self, offset: u64, width: Width) -> Result<u64, MemFault> {
        let mut buf = [0u8; 8];
        let len = width.bytes() as usize;
        self.read_bytes(offset, &mut buf[..len])?;
        Ok(u64::from_le_bytes(buf))
    }

    fn write(&mut self, offset: u64, width: Width, value: u64) -> Result<(), MemFault> {
        if self.read_only {
            return Err(MemFault::ReadOnly(self.base.wrapping_add(offset)));
        }
        let len = width.bytes() as usize;
        self.write_bytes(offset, &value.to_le_bytes()[..len])
    }
}
