//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, the simulation context that owns
//! every piece of state of one core. It coordinates the following:
//! 1. **State Management:** Registers, program counter, privileged unit, and halt state.
//! 2. **Pipeline Control:** The four inter-stage latches.
//! 3. **Memory Side:** The data cache, the uncached port, and the memory controller.
//! 4. **Reset:** Returns the core to its architectural reset state without touching memory.
//!
//! There is no global state; several `Cpu` instances can be simulated side by side.

/// Counter updates and interrupt line sampling.
pub mod csr;

/// The two-phase cycle: evaluate every stage, then commit.
pub mod execution;

/// Cache and uncached-port bookkeeping on the memory side.
pub mod memory;

/// Application of write-back trap entry, trap return, and halts.
pub mod trap;

use crate::common::{MemFault, Trap};
use crate::config::Config;
use crate::core::arch::gpr::Gpr;
use crate::core::arch::trap::{PrivilegedUnit, TrapFrame};
use crate::core::pipeline::latches::{ExMemEntry, IdExEntry, IfIdEntry, Latch, MemWbEntry};
use crate::core::pipeline::traits::PipelineLatch;
use crate::core::units::cache::Cache;
use crate::soc::MemoryController;
use crate::stats::SimStats;

pub use self::memory::UncachedPort;

/// Why the core stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// `ECALL` or `EBREAK` reached write-back with `halt_on_ecall` set.
    Requested {
        /// The requested trap.
        trap: Trap,
        /// PC of the instruction.
        pc: u64,
    },
    /// A synchronous trap was raised while a handler was still active.
    DoubleFault {
        /// PC of the instruction raising the second trap.
        pc: u64,
        /// The trap that entered the active handler.
        first: Trap,
        /// The trap that could not be taken.
        second: Trap,
    },
}

/// Main CPU structure containing all processor state and components.
///
/// The CPU moves instructions through the five-stage pipeline, drives the data cache
/// and memory controller, takes traps, and tracks performance statistics.
#[derive(Debug)]
pub struct Cpu {
    /// Configuration the core was built from.
    pub config: Config,
    /// General-purpose registers.
    pub regs: Gpr,
    /// Program counter of the next fetch.
    pub pc: u64,
    /// CSR file, privilege mode, and trap state.
    pub privileged: PrivilegedUnit,

    /// IF/ID latch.
    pub if_id: Latch<IfIdEntry>,
    /// ID/EX latch.
    pub id_ex: Latch<IdExEntry>,
    /// EX/MEM latch.
    pub ex_mem: Latch<ExMemEntry>,
    /// MEM/WB latch.
    pub mem_wb: Latch<MemWbEntry>,

    /// Data cache, when enabled.
    pub cache: Option<Cache>,
    /// Memory controller, backing stores, and devices.
    pub controller: MemoryController,
    /// Uncached transaction owned by the memory stage.
    pub uncached: UncachedPort,

    /// Emit per-stage trace events.
    pub trace: bool,
    /// Performance counters.
    pub stats: SimStats,
    /// Set once the core stops.
    pub halted: Option<HaltReason>,
    /// Frame of the most recent trap entry.
    pub last_trap: Option<TrapFrame>,
    /// Level of the external interrupt input.
    pub external_irq: bool,

    /// The access in the memory stage already missed; do not count its final hit.
    mem_missed: bool,
}

impl Cpu {
    /// Creates a CPU in its reset state.
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration.
    pub fn new(config: &Config) -> Self {
        let cache = config.cache.enabled.then(|| Cache::new(&config.cache));
        Self {
            config: config.clone(),
            regs: Gpr::new(),
            pc: config.isa.xlen.addr(config.general.boot_pc),
            privileged: PrivilegedUnit::new(&config.isa),
            if_id: Latch::new(),
            id_ex: Latch::new(),
            ex_mem: Latch::new(),
            mem_wb: Latch::new(),
            cache,
            controller: MemoryController::new(config),
            uncached: UncachedPort::default(),
            trace: config.general.trace_pipeline,
            stats: SimStats::default(),
            halted: None,
            last_trap: None,
            external_irq: false,
            mem_missed: false,
        }
    }

    /// Applies the reset signal.
    ///
    /// The PC returns to the boot address, every latch becomes invalid, the CSRs take
    /// their reset values, and the cache is invalidated. Backing-store contents are kept.
    pub fn reset(&mut self) {
        self.regs = Gpr::new();
        self.pc = self.config.isa.xlen.addr(self.config.general.boot_pc);
        self.privileged = PrivilegedUnit::new(&self.config.isa);
        self.if_id.flush();
        self.id_ex.flush();
        self.ex_mem.flush();
        self.mem_wb.flush();
        if let Some(cache) = self.cache.as_mut() {
            cache.reset();
        }
        self.controller.reset();
        self.uncached = UncachedPort::default();
        self.stats = SimStats::default();
        self.halted = None;
        self.last_trap = None;
        self.mem_missed = false;
    }

    /// Drives the external interrupt line.
    pub const fn set_external_interrupt(&mut self, level: bool) {
        self.external_irq = level;
    }

    /// Returns `true` once the core has stopped.
    pub const fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Reads memory as the program sees it: backing store overlaid with dirty cache lines.
    pub fn read_memory(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemFault> {
        self.controller.read_bytes(addr, buf)?;
        if let Some(cache) = self.cache.as_ref() {
            let end = addr + buf.len() as u64;
            for (line, data) in cache.dirty_lines() {
                let line_end = line + data.len() as u64;
                let lo = addr.max(line);
                let hi = end.min(line_end);
                if lo < hi {
                    buf[(lo - addr) as usize..(hi - addr) as usize]
                        .copy_from_slice(&data[(lo - line) as usize..(hi - line) as usize]);
                }
            }
        }
        Ok(())
    }

    /// Renders the PC and registers for diagnostics.
    pub fn dump_state(&self) -> String {
        format!("pc = {:#018x}\n{}", self.pc, self.regs.dump())
    }
}
