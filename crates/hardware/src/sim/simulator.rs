//! Simulator: owns the CPU simulation context and drives it cycle by cycle.
//!
//! The simulator adds the outer surface around a `Cpu`:
//! 1. **Construction:** Validates the configuration before building the core.
//! 2. **Loading:** Places images and raw programs into ROM or RAM.
//! 3. **Running:** Steps the clock until a cycle limit or a halt, and turns a double fault
//!    into an error.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use super::loader::{self, ImageFormat, LoadError, LoadedImage};
use crate::common::Trap;
use crate::config::{Config, ConfigError};
use crate::core::Cpu;
use crate::core::cpu::HaltReason;
use crate::stats::SimStats;

/// Top-level simulator failures.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An image could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A synchronous trap was raised inside a trap handler.
    #[error("double fault at {pc:#x}: {second} raised while handling {first}")]
    DoubleFault {
        /// PC of the instruction raising the second trap.
        pc: u64,
        /// The trap being handled.
        first: Trap,
        /// The trap that could not be taken.
        second: Trap,
    },

    /// Host I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How a run ended without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The cycle budget was used up.
    CycleLimit,
    /// The program stopped itself with `ECALL` or `EBREAK`.
    Halted {
        /// The requesting trap.
        cause: Trap,
        /// PC of the requesting instruction.
        pc: u64,
    },
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    /// The simulated core with its memory system.
    pub cpu: Cpu,
}

impl Simulator {
    /// Validates `config` and builds a simulator in its reset state.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            cpu: Cpu::new(config),
        })
    }

    /// Applies reset. Memory contents survive.
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Advances one clock cycle.
    pub fn step(&mut self) {
        self.cpu.tick();
    }

    /// Runs until the core halts or `max_cycles` cycles have elapsed in this call.
    ///
    /// # Returns
    ///
    /// The outcome, or `SimError::DoubleFault` if the program faulted inside its handler.
    pub fn run(&mut self, max_cycles: u64) -> Result<RunOutcome, SimError> {
        self.run_until(max_cycles, |_| false)
    }

    /// Runs like [`Simulator::run`], also stopping as soon as `stop` returns `true` after a
    /// cycle. A predicate stop reports `CycleLimit`.
    pub fn run_until<F>(&mut self, max_cycles: u64, mut stop: F) -> Result<RunOutcome, SimError>
    where
        F: FnMut(&Cpu) -> bool,
    {
        for _ in 0..max_cycles {
            if let Some(reason) = self.cpu.halted {
                return Self::outcome(reason);
            }
            self.cpu.tick();
            if stop(&self.cpu) {
                break;
            }
        }
        match self.cpu.halted {
            Some(reason) => Self::outcome(reason),
            None => Ok(RunOutcome::CycleLimit),
        }
    }

    fn outcome(reason: HaltReason) -> Result<RunOutcome, SimError> {
        match reason {
            HaltReason::Requested { trap, pc } => Ok(RunOutcome::Halted { cause: trap, pc }),
            HaltReason::DoubleFault { pc, first, second } => {
                Err(SimError::DoubleFault { pc, first, second })
            }
        }
    }

    /// Drives the external interrupt input.
    pub const fn set_external_interrupt(&mut self, level: bool) {
        self.cpu.set_external_interrupt(level);
    }

    /// Loads an image file. Binary and hex images go to the boot address; an ELF entry
    /// point becomes the new PC.
    pub fn load_image(&mut self, path: &Path, format: ImageFormat) -> Result<LoadedImage, SimError> {
        let base = self.cpu.config.general.boot_pc;
        let image = loader::load_image(&mut self.cpu.controller, path, format, base)?;
        if let Some(entry) = image.entry {
            if entry % 4 != 0 {
                warn!(entry = format_args!("{entry:#x}"), "misaligned entry point");
            }
            self.cpu.pc = self.cpu.config.isa.xlen.addr(entry);
            info!(entry = format_args!("{entry:#x}"), "entry point set");
        }
        Ok(image)
    }

    /// Copies raw bytes to `addr`.
    pub fn load_bytes(&mut self, addr: u64, bytes: &[u8]) -> Result<(), SimError> {
        let _ = loader::load_binary(&mut self.cpu.controller, addr, bytes)?;
        Ok(())
    }

    /// Copies instruction words to `addr` in little-endian order.
    pub fn load_program(&mut self, addr: u64, words: &[u32]) -> Result<(), SimError> {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.load_bytes(addr, &bytes)
    }

    /// Performance counters collected so far.
    pub const fn stats(&self) -> &SimStats {
        &self.cpu.stats
    }
}
