//! Privileged Unit.
//!
//! This module owns the privileged state of the core and the transitions between its
//! two states. It performs the following:
//! 1. **Trap Entry:** Saves the pre-trap program counter and privilege, records cause and
//!    value, disables interrupts, and selects the vector address.
//! 2. **Trap Return:** `MRET` restores the saved pair and re-enables interrupts atomically.
//! 3. **Interrupt Selection:** Picks the highest-priority pending and enabled interrupt.
//! 4. **Nesting Policy:** A synchronous trap while a handler is still running is a double fault.

use tracing::info;

use super::csr::{
    self, CsrFile, MIP_MEIP, MIP_MSIP, MIP_MTIP, MSTATUS_MIE, MSTATUS_MPIE, MSTATUS_MPP,
    MSTATUS_MPP_SHIFT, MTVEC_MODE_MASK, MTVEC_MODE_VECTORED,
};
use super::mode::PrivilegeMode;
use crate::common::Trap;
use crate::config::{IsaConfig, Xlen};

/// State of the privileged unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TrapState {
    /// No trap handler is active.
    #[default]
    Normal,
    /// A trap has been entered and not yet returned from.
    Trapped,
}

/// Saved context produced by one trap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapFrame {
    /// The trap taken.
    pub trap: Trap,
    /// Program counter saved into `mepc`.
    pub epc: u64,
    /// Privilege the core was running at.
    pub from: PrivilegeMode,
    /// Vector address fetch resumes at.
    pub target: u64,
}

/// CSR file, current privilege, and trap state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivilegedUnit {
    /// Control and status registers.
    pub csrs: CsrFile,
    /// Current privilege mode.
    pub mode: PrivilegeMode,
    /// Trap state machine.
    pub state: TrapState,
}

impl PrivilegedUnit {
    /// Creates the unit in its reset state: machine mode, `NORMAL`, interrupts disabled.
    pub fn new(isa: &IsaConfig) -> Self {
        Self {
            csrs: CsrFile::new(isa),
            mode: PrivilegeMode::Machine,
            state: TrapState::Normal,
        }
    }

    /// Value of the `mcause` register for `trap` at the configured width.
    pub const fn mcause(&self, trap: &Trap) -> u64 {
        let (interrupt, code) = trap.cause();
        if !interrupt {
            return code;
        }
        match self.csrs.xlen() {
            Xlen::Rv32 => (1 << 31) | code,
            Xlen::Rv64 => (1 << 63) | code,
        }
    }

    /// Vector address a trap would redirect fetch to, computed from current state.
    ///
    /// Vectored mode adds `4 * cause` for interrupts; exceptions always use the base.
    pub const fn vector(&self, trap: &Trap) -> u64 {
        let mtvec = self.csrs.mtvec;
        let base = mtvec & !MTVEC_MODE_MASK;
        let (interrupt, code) = trap.cause();
        if interrupt && mtvec & MTVEC_MODE_MASK == MTVEC_MODE_VECTORED {
            self.csrs.xlen().addr(base + 4 * code)
        } else {
            base
        }
    }

    /// Returns `true` if taking `trap` now would nest inside an unfinished handler.
    pub const fn would_double_fault(&self, trap: &Trap) -> bool {
        matches!(self.state, TrapState::Trapped) && !trap.is_interrupt()
    }

    /// Enters a trap.
    ///
    /// # Arguments
    ///
    /// * `trap` - The trap being taken.
    /// * `epc` - Program counter of the instruction the trap is recorded against.
    ///
    /// # Returns
    ///
    /// The saved frame, including the vector address fetch must resume at.
    pub fn enter(&mut self, trap: Trap, epc: u64) -> TrapFrame {
        let target = self.vector(&trap);
        let from = self.mode;

        self.csrs.mepc = epc & !0b11;
        self.csrs.mcause = self.mcause(&trap);
        self.csrs.mtval = self.csrs.xlen().addr(trap.value());

        let mut status = self.csrs.mstatus;
        status = if status & MSTATUS_MIE != 0 {
            status | MSTATUS_MPIE
        } else {
            status & !MSTATUS_MPIE
        };
        status = (status & !MSTATUS_MPP) | (from.to_bits() << MSTATUS_MPP_SHIFT);
        status &= !MSTATUS_MIE;
        self.csrs.mstatus = status;

        self.mode = PrivilegeMode::Machine;
        self.state = TrapState::Trapped;

        info!(%trap, epc = format_args!("{epc:#x}"), target = format_args!("{target:#x}"), from = %from, "trap entry");
        TrapFrame {
            trap,
            epc,
            from,
            target,
        }
    }

    /// Performs `MRET`.
    ///
    /// Restores the privilege saved in `MPP`, copies `MPIE` into `MIE`, sets `MPIE`,
    /// resets `MPP` to the least privileged implemented mode, and leaves `TRAPPED`.
    ///
    /// # Returns
    ///
    /// The program counter to resume at (`mepc`).
    pub fn trap_return(&mut self) -> u64 {
        let status = self.csrs.mstatus;
        let restored =
            PrivilegeMode::from_bits(status >> MSTATUS_MPP_SHIFT, self.csrs.user_mode());
        let least = if self.csrs.user_mode() {
            PrivilegeMode::User
        } else {
            PrivilegeMode::Machine
        };

        let mut next = status & !(MSTATUS_MIE | MSTATUS_MPP);
        if status & MSTATUS_MPIE != 0 {
            next |= MSTATUS_MIE;
        }
        next |= MSTATUS_MPIE | (least.to_bits() << MSTATUS_MPP_SHIFT);
        self.csrs.mstatus = next;

        self.mode = restored;
        self.state = TrapState::Normal;

        let target = self.csrs.mepc;
        info!(
            target = format_args!("{target:#x}"),
            mode = %restored,
            "trap return"
        );
        target
    }

    /// Selects the interrupt to take this cycle, if any.
    ///
    /// An interrupt is taken only when it is both pending and enabled in `mie`, when
    /// `mstatus.MIE` is set or the core runs below machine mode, and when no handler is
    /// active. Priority is external, then software, then timer.
    pub const fn pending_interrupt(&self) -> Option<Trap> {
        if matches!(self.state, TrapState::Trapped) {
            return None;
        }
        let globally_enabled = matches!(self.mode, PrivilegeMode::User)
            || self.csrs.mstatus & MSTATUS_MIE != 0;
        if !globally_enabled {
            return None;
        }
        let ready = self.csrs.mip & self.csrs.mie;
        if ready & MIP_MEIP != 0 {
            Some(Trap::MachineExternalInterrupt)
        } else if ready & MIP_MSIP != 0 {
            Some(Trap::MachineSoftwareInterrupt)
        } else if ready & MIP_MTIP != 0 {
            Some(Trap::MachineTimerInterrupt)
        } else {
            None
        }
    }

    /// Drives the externally owned `mip` bits.
    pub const fn set_pending(&mut self, external: bool, software: bool, timer: bool) {
        let mut mip = 0;
        if external {
            mip |= MIP_MEIP;
        }
        if software {
            mip |= MIP_MSIP;
        }
        if timer {
            mip |= MIP_MTIP;
        }
        self.csrs.mip = mip;
    }

    /// Returns `true` if the current mode may execute `MRET`.
    pub const fn may_return(&self) -> bool {
        matches!(self.mode, PrivilegeMode::Machine)
    }

    /// Convenience for the CSR access check at the current privilege.
    pub const fn csr_allowed(&self, addr: u16, write: bool) -> bool {
        self.csrs.access_allowed(addr, self.mode, write)
    }

    /// Reads `mepc`, the `MRET` target under the current state.
    pub const fn return_target(&self) -> u64 {
        self.csrs.read(csr::MEPC)
    }
}
