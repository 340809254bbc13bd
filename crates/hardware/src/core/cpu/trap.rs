//! Write-Back Commit.
//!
//! This module applies the effects selected by the write-back stage. It performs the
//! following:
//! 1. **Halts:** Records a requested stop or a double fault and freezes the core.
//! 2. **Trap Entry:** Hands the trap to the privileged unit and keeps the saved frame. An
//!    interrupt taken after a memory instruction also retires that instruction.
//! 3. **Trap Return:** Performs `MRET`.
//! 4. **Retirement:** Writes the destination register and counts the instruction.

use tracing::{info, warn};

use super::{Cpu, HaltReason};
use crate::core::pipeline::latches::MemWbEntry;
use crate::core::pipeline::stages::WritebackOutput;

impl Cpu {
    /// Commits the write-back stage's output.
    ///
    /// CSR writes are applied later, together with the counters, so that an explicit
    /// write of `mcycle` or `minstret` is not overwritten by the increment.
    pub(crate) fn commit_writeback(&mut self, entry: &MemWbEntry, out: &WritebackOutput) {
        if let Some(reason) = out.halt {
            match reason {
                HaltReason::Requested { trap, pc } => {
                    info!(%trap, pc = format_args!("{pc:#x}"), "halt requested");
                }
                HaltReason::DoubleFault { pc, first, second } => {
                    warn!(pc = format_args!("{pc:#x}"), %first, %second, "double fault");
                }
            }
            self.halted = Some(reason);
            return;
        }

        if let Some((trap, epc)) = out.trap {
            let frame = self.privileged.enter(trap, epc);
            self.last_trap = Some(frame);
            if trap.is_interrupt() {
                self.stats.interrupts_taken += 1;
            } else {
                self.stats.traps_taken += 1;
            }
            if !out.retired {
                return;
            }
        }

        if out.mret {
            let resumed = self.privileged.trap_return();
            if out.redirect != Some(resumed) {
                warn!(
                    resumed = format_args!("{resumed:#x}"),
                    fetch = ?out.redirect,
                    "MRET target differs from the fetch redirect"
                );
            }
        }
        if let Some(producer) = out.reg_write {
            self.regs.write(producer.rd, producer.value);
        }
        if out.retired {
            self.stats.record_retire(&entry.ctrl);
        }
    }
}
