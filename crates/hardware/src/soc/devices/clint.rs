//! Core Local Interruptor (CLINT).
//!
//! The CLINT block holds the memory-mapped registers behind the machine software and
//! timer interrupts. Both registers are 64 bits wide and accept word or double-word
//! accesses; a word access selects the half at `offset & 4`.
//!
//! # Memory Map
//!
//! * `0x0000`: MSIP (Machine Software Interrupt Pending, bit 0 only)
//! * `0x4000`: MTIMECMP (Machine Time Compare)
//! * `0xBFF8`: MTIME (Machine Time)

use crate::common::{MemFault, Width};
use crate::config::ClintConfig;
use crate::soc::traits::Device;

/// Offset for the Machine Software Interrupt Pending register.
pub const MSIP_OFFSET: u64 = 0x0000;
/// Offset for the Machine Time Compare register.
pub const MTIMECMP_OFFSET: u64 = 0x4000;
/// Offset for the Machine Time register.
pub const MTIME_OFFSET: u64 = 0xBFF8;

/// CLINT device structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clint {
    /// Base physical address of the device.
    base_addr: u64,
    /// Current machine time counter.
    mtime: u64,
    /// Machine time compare register.
    mtimecmp: u64,
    /// Machine software interrupt pending register.
    msip: u64,
    /// Cycles per `mtime` increment.
    divider: u64,
    /// Cycles elapsed since the last increment.
    counter: u64,
}

impl Clint {
    /// Creates a new CLINT with `mtimecmp` at its maximum so no timer interrupt is pending.
    ///
    /// # Arguments
    ///
    /// * `config` - Base address and `mtime` divider.
    pub fn new(config: &ClintConfig) -> Self {
        Self {
            base_addr: config.base,
            mtime: 0,
            mtimecmp: u64::MAX,
            msip: 0,
            divider: config.divider.max(1),
            counter: 0,
        }
    }

    /// Current value of `mtime`.
    pub const fn mtime(&self) -> u64 {
        self.mtime
    }

    /// MTIP: `mtime >= mtimecmp`.
    pub const fn timer_pending(&self) -> bool {
        self.mtime >= self.mtimecmp
    }

    /// MSIP: bit 0 of the `msip` register.
    pub const fn software_pending(&self) -> bool {
        self.msip & 1 != 0
    }

    /// Selects the 64-bit register at `offset` and the bit position of the accessed part.
    const fn register(offset: u64, width: Width) -> Option<(u64, u32)> {
        let reg = offset & !7;
        let shift = ((offset & 7) * 8) as u32;
        let ok_width = match width {
            Width::Double => shift == 0,
            Width::Word => shift == 0 || shift == 32,
            Width::Byte | Width::Half => false,
        };
        if !ok_width {
            return None;
        }
        match reg {
            MSIP_OFFSET | MTIMECMP_OFFSET | MTIME_OFFSET => Some((reg, shift)),
            _ => None,
        }
    }
}

impl Device for Clint {
    fn name(&self) -> &str {
        "CLINT"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, ClintConfig::REGION_SIZE)
    }

    fn read(&mut self, offset: u64, width: Width) -> Result<u64, MemFault> {
        let (reg, shift) =
            Self::register(offset, width).ok_or(MemFault::Unmapped(self.base_addr + offset))?;
        let value = match reg {
            MSIP_OFFSET => self.msip,
            MTIMECMP_OFFSET => self.mtimecmp,
            _ => self.mtime,
        };
        Ok((value >> shift) & width.mask())
    }

    fn write(&mut self, offset: u64, width: Width, value: u64) -> Result<(), MemFault> {
        let (reg, shift) =
            Self::register(offset, width).ok_or(MemFault::Unmapped(self.base_addr + offset))?;
        let mask = width.mask() << shift;
        let merge = |old: u64| (old & !mask) | ((value << shift) & mask);
        match reg {
            MSIP_OFFSET => self.msip = merge(self.msip) & 1,
            MTIMECMP_OFFSET => self.mtimecmp = merge(self.mtimecmp),
            _ => self.mtime = merge(self.mtime),
        }
        Ok(())
    }

    /// Advances `mtime` once every `divider` cycles.
    ///
    /// The CLINT drives MTIP and MSIP directly; it never raises the external line.
    fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.divider {
            self.mtime = self.mtime.wrapping_add(1);
            self.counter = 0;
        }
        false
    }
}
