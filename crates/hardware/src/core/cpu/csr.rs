//! Counter and Interrupt-Line Updates.
//!
//! This module performs the end-of-cycle CSR bookkeeping. It performs the following:
//! 1. **Counters:** `mcycle` every cycle, `minstret` per retired instruction, and the
//!    `time` shadow from the CLINT. An explicit CSR write in the same cycle wins.
//! 2. **Interrupt Lines:** Ticks devices and samples the external line, the devices'
//!    interrupt outputs, and the CLINT into the externally driven `mip` bits.

use super::Cpu;

impl Cpu {
    /// Advances the counters and applies a CSR write from write-back.
    ///
    /// # Arguments
    ///
    /// * `retired` - An instruction retired this cycle.
    /// * `write` - CSR write committed by write-back, as `(address, value)`.
    pub(crate) fn update_csrs(&mut self, retired: bool, write: Option<(u16, u64)>) {
        let csrs = &mut self.privileged.csrs;
        csrs.mcycle = csrs.mcycle.wrapping_add(1);
        if retired {
            csrs.minstret = csrs.minstret.wrapping_add(1);
        }
        if let Some((addr, value)) = write {
            csrs.write(addr, value);
        }
    }

    /// Ticks the CLINT and devices and drives `mip`.
    pub(crate) fn sample_interrupts(&mut self) {
        let device_irq = self.controller.tick_devices();
        let (software, timer, mtime) = self
            .controller
            .clint()
            .map_or((false, false, self.privileged.csrs.mcycle), |clint| {
                (clint.software_pending(), clint.timer_pending(), clint.mtime())
            });
        self.privileged.csrs.time = mtime;
        self.privileged
            .set_pending(self.external_irq || device_irq, software, timer);
    }
}
