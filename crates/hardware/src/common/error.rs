//! Trap and Memory Fault definitions.
//!
//! This module defines the error handling vocabulary of the core. It provides:
//! 1. **Trap Representation:** Every synchronous exception and asynchronous interrupt the
//!    pipeline can deliver to the privileged unit, each carrying its trap value.
//! 2. **Memory Faults:** Failures reported by the memory controller and backing stores,
//!    converted into the matching trap by the stage that observed them.

use thiserror::Error;

use super::data::AccessType;
use crate::isa::privileged::cause::{exception, interrupt};

/// RISC-V trap types representing exceptions and interrupts.
///
/// Every fault the pipeline detects is funnelled into one of these variants and
/// recorded against the faulting instruction's pipeline slot. The associated value
/// becomes `mtval` on trap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Trap {
    /// Branch or jump target not aligned to four bytes. Carries the target.
    #[error("instruction address misaligned ({0:#x})")]
    InstructionAddressMisaligned(u64),

    /// Fetch from an address with no backing store. Carries the address.
    #[error("instruction access fault ({0:#x})")]
    InstructionAccessFault(u64),

    /// Malformed or unsupported encoding. Carries the instruction bits.
    #[error("illegal instruction ({0:#010x})")]
    IllegalInstruction(u32),

    /// `EBREAK` executed. Carries the program counter.
    #[error("breakpoint ({0:#x})")]
    Breakpoint(u64),

    /// Load not naturally aligned. Carries the address.
    #[error("load address misaligned ({0:#x})")]
    LoadAddressMisaligned(u64),

    /// Load outside any backing store. Carries the address.
    #[error("load access fault ({0:#x})")]
    LoadAccessFault(u64),

    /// Store not naturally aligned. Carries the address.
    #[error("store address misaligned ({0:#x})")]
    StoreAddressMisaligned(u64),

    /// Store outside any writable backing store. Carries the address.
    #[error("store access fault ({0:#x})")]
    StoreAccessFault(u64),

    /// `ECALL` executed in user mode.
    #[error("environment call from U-mode")]
    EnvironmentCallFromUMode,

    /// `ECALL` executed in machine mode.
    #[error("environment call from M-mode")]
    EnvironmentCallFromMMode,

    /// Machine software interrupt (CLINT `msip`).
    #[error("machine software interrupt")]
    MachineSoftwareInterrupt,

    /// Machine timer interrupt (CLINT `mtime >= mtimecmp`).
    #[error("machine timer interrupt")]
    MachineTimerInterrupt,

    /// Machine external interrupt (external interrupt line).
    #[error("machine external interrupt")]
    MachineExternalInterrupt,
}

impl Trap {
    /// Returns `(is_interrupt, code)` as written into `mcause`.
    pub const fn cause(&self) -> (bool, u64) {
        match self {
            Self::InstructionAddressMisaligned(_) => {
                (false, exception::INSTRUCTION_ADDRESS_MISALIGNED)
            }
            Self::InstructionAccessFault(_) => (false, exception::INSTRUCTION_ACCESS_FAULT),
            Self::IllegalInstruction(_) => (false, exception::ILLEGAL_INSTRUCTION),
            Self::Breakpoint(_) => (false, exception::BREAKPOINT),
            Self::LoadAddressMisaligned(_) => (false, exception::LOAD_ADDRESS_MISALIGNED),
            Self::LoadAccessFault(_) => (false, exception::LOAD_ACCESS_FAULT),
            Self::StoreAddressMisaligned(_) => (false, exception::STORE_ADDRESS_MISALIGNED),
            Self::StoreAccessFault(_) => (false, exception::STORE_ACCESS_FAULT),
            Self::EnvironmentCallFromUMode => (false, exception::ENVIRONMENT_CALL_FROM_U_MODE),
            Self::EnvironmentCallFromMMode => (false, exception::ENVIRONMENT_CALL_FROM_M_MODE),
            Self::MachineSoftwareInterrupt => (true, interrupt::MACHINE_SOFTWARE),
            Self::MachineTimerInterrupt => (true, interrupt::MACHINE_TIMER),
            Self::MachineExternalInterrupt => (true, interrupt::MACHINE_EXTERNAL),
        }
    }

    /// Returns the trap value written into `mtval`.
    pub const fn value(&self) -> u64 {
        match *self {
            Self::InstructionAddressMisaligned(v)
            | Self::InstructionAccessFault(v)
            | Self::Breakpoint(v)
            | Self::LoadAddressMisaligned(v)
            | Self::LoadAccessFault(v)
            | Self::StoreAddressMisaligned(v)
            | Self::StoreAccessFault(v) => v,
            Self::IllegalInstruction(inst) => inst as u64,
            _ => 0,
        }
    }

    /// Returns `true` for asynchronous interrupts.
    pub const fn is_interrupt(&self) -> bool {
        self.cause().0
    }

    /// Returns `true` for traps explicitly requested by software (`ECALL`, `EBREAK`).
    pub const fn is_requested(&self) -> bool {
        matches!(
            self,
            Self::Breakpoint(_) | Self::EnvironmentCallFromUMode | Self::EnvironmentCallFromMMode
        )
    }
}

/// Failures reported by the memory side of the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MemFault {
    /// No backing store or device claims the address.
    #[error("address {0:#x} is not mapped")]
    Unmapped(u64),

    /// The backing store at this address cannot be written from the pipeline.
    #[error("address {0:#x} is read-only")]
    ReadOnly(u64),

    /// The access is not naturally aligned.
    #[error("address {0:#x} is misaligned")]
    Misaligned(u64),

    /// A transaction is already in flight.
    #[error("memory controller busy")]
    Busy,
}

impl MemFault {
    /// Converts the fault into the trap raised for an access of kind `kind`.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which pipeline access observed the fault.
    ///
    /// # Returns
    ///
    /// The architectural trap to record against the faulting instruction.
    pub const fn into_trap(self, kind: AccessType) -> Trap {
        let addr = match self {
            Self::Unmapped(a) | Self::ReadOnly(a) | Self::Misaligned(a) => a,
            Self::Busy => 0,
        };
        match (self, kind) {
            (Self::Misaligned(_), AccessType::Fetch) => Trap::InstructionAddressMisaligned(addr),
            (Self::Misaligned(_), AccessType::Read) => Trap::LoadAddressMisaligned(addr),
            (Self::Misaligned(_), AccessType::Write) => Trap::StoreAddressMisaligned(addr),
            (_, AccessType::Fetch) => Trap::InstructionAccessFault(addr),
            (_, AccessType::Read) => Trap::LoadAccessFault(addr),
            (_, AccessType::Write) => Trap::StoreAccessFault(addr),
        }
    }
}
