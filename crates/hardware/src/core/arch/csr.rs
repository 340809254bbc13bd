//! Control and Status Register (CSR) definitions and operations.
//!
//! This module implements the CSR file of the privileged unit. It provides:
//! 1. **Address Definitions:** Constants for the machine-mode and counter CSRs.
//! 2. **Field Masks:** Bitmasks and shifts for `mstatus`, `mie`, `mip`, and `mtvec`.
//! 3. **Register Storage:** The `CsrFile` struct holding the architectural state.
//! 4. **Access Logic:** Privilege and read-only checks plus WARL masking on write.

use crate::config::{IsaConfig, Xlen};

use super::mode::PrivilegeMode;

/// Machine vendor ID.
pub const MVENDORID: u16 = 0xF11;
/// Machine architecture ID.
pub const MARCHID: u16 = 0xF12;
/// Machine implementation ID.
pub const MIMPID: u16 = 0xF13;
/// Hart ID.
pub const MHARTID: u16 = 0xF14;

/// Machine status.
pub const MSTATUS: u16 = 0x300;
/// Machine ISA register (read-only here).
pub const MISA: u16 = 0x301;
/// Machine interrupt enable.
pub const MIE: u16 = 0x304;
/// Machine trap vector base address.
pub const MTVEC: u16 = 0x305;
/// Machine scratch register.
pub const MSCRATCH: u16 = 0x340;
/// Machine exception program counter.
pub const MEPC: u16 = 0x341;
/// Machine trap cause.
pub const MCAUSE: u16 = 0x342;
/// Machine trap value.
pub const MTVAL: u16 = 0x343;
/// Machine interrupt pending.
pub const MIP: u16 = 0x344;

/// Machine cycle counter.
pub const MCYCLE: u16 = 0xB00;
/// Machine instructions-retired counter.
pub const MINSTRET: u16 = 0xB02;
/// Upper half of `mcycle` (RV32 only).
pub const MCYCLEH: u16 = 0xB80;
/// Upper half of `minstret` (RV32 only).
pub const MINSTRETH: u16 = 0xB82;

/// Cycle counter shadow (read-only).
pub const CYCLE: u16 = 0xC00;
/// Real-time counter shadow of the CLINT `mtime` (read-only).
pub const TIME: u16 = 0xC01;
/// Instructions-retired shadow (read-only).
pub const INSTRET: u16 = 0xC02;
/// Upper half of `cycle` (RV32 only).
pub const CYCLEH: u16 = 0xC80;
/// Upper half of `time` (RV32 only).
pub const TIMEH: u16 = 0xC81;
/// Upper half of `instret` (RV32 only).
pub const INSTRETH: u16 = 0xC82;

/// Machine interrupt enable bit in `mstatus`.
pub const MSTATUS_MIE: u64 = 1 << 3;
/// Machine previous interrupt enable bit in `mstatus`.
pub const MSTATUS_MPIE: u64 = 1 << 7;
/// Machine previous privilege field in `mstatus`.
pub const MSTATUS_MPP: u64 = 3 << MSTATUS_MPP_SHIFT;
/// Bit position of `mstatus.MPP`.
pub const MSTATUS_MPP_SHIFT: u64 = 11;

/// Machine software interrupt enable bit in `mie`.
pub const MIE_MSIE: u64 = 1 << 3;
/// Machine timer interrupt enable bit in `mie`.
pub const MIE_MTIE: u64 = 1 << 7;
/// Machine external interrupt enable bit in `mie`.
pub const MIE_MEIE: u64 = 1 << 11;

/// Machine software interrupt pending bit in `mip`.
pub const MIP_MSIP: u64 = 1 << 3;
/// Machine timer interrupt pending bit in `mip`.
pub const MIP_MTIP: u64 = 1 << 7;
/// Machine external interrupt pending bit in `mip`.
pub const MIP_MEIP: u64 = 1 << 11;

/// `mtvec` mode field.
pub const MTVEC_MODE_MASK: u64 = 0b11;
/// `mtvec` vectored mode.
pub const MTVEC_MODE_VECTORED: u64 = 0b01;

/// Returns `true` if `addr` names a CSR implemented at register width `xlen`.
pub const fn csr_exists(addr: u16, xlen: Xlen) -> bool {
    match addr {
        MVENDORID | MARCHID | MIMPID | MHARTID | MSTATUS | MISA | MIE | MTVEC | MSCRATCH
        | MEPC | MCAUSE | MTVAL | MIP | MCYCLE | MINSTRET | CYCLE | TIME | INSTRET => true,
        MCYCLEH | MINSTRETH | CYCLEH | TIMEH | INSTRETH => matches!(xlen, Xlen::Rv32),
        _ => false,
    }
}

/// Checks whether `mode` may access `addr`, and, for a write, that it is writable.
///
/// # Arguments
///
/// * `addr` - CSR address.
/// * `xlen` - Register width; the `*H` counter halves exist only on RV32.
/// * `mode` - Privilege of the accessing instruction.
/// * `write` - Whether the instruction will actually write the CSR.
///
/// # Returns
///
/// `true` if the access is legal; an illegal access raises an illegal-instruction trap.
pub const fn access_allowed(addr: u16, xlen: Xlen, mode: PrivilegeMode, write: bool) -> bool {
    let required = (addr >> 8) & 0b11;
    let read_only = (addr >> 10) & 0b11 == 0b11;
    csr_exists(addr, xlen) && (mode as u16) >= required && !(write && read_only)
}

/// Control and Status Register file.
///
/// The interrupt-pending bits and the `time` shadow are inputs driven every cycle
/// by the cycle stepper; software writes to them are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsrFile {
    /// Machine status.
    pub mstatus: u64,
    /// Machine interrupt enable.
    pub mie: u64,
    /// Machine trap vector.
    pub mtvec: u64,
    /// Machine scratch.
    pub mscratch: u64,
    /// Saved program counter of the trapping instruction.
    pub mepc: u64,
    /// Cause of the last trap.
    pub mcause: u64,
    /// Trap value of the last trap.
    pub mtval: u64,
    /// Pending interrupt lines.
    pub mip: u64,
    /// Cycle counter.
    pub mcycle: u64,
    /// Retired instruction counter.
    pub minstret: u64,
    /// Shadow of the CLINT `mtime` register.
    pub time: u64,
    misa: u64,
    xlen: Xlen,
    user_mode: bool,
}

impl CsrFile {
    /// Creates a CSR file in its architectural reset state.
    ///
    /// # Arguments
    ///
    /// * `isa` - ISA variant; fixes `misa`, the register width, and whether MPP may hold U.
    pub fn new(isa: &IsaConfig) -> Self {
        Self {
            mstatus: PrivilegeMode::Machine.to_bits() << MSTATUS_MPP_SHIFT,
            misa: match isa.xlen {
                Xlen::Rv32 => isa.misa() & 0xFFFF_FFFF,
                Xlen::Rv64 => isa.misa(),
            },
            xlen: isa.xlen,
            user_mode: isa.user_mode,
            ..Self::default()
        }
    }

    /// Returns `true` if `addr` names an implemented CSR.
    pub const fn exists(&self, addr: u16) -> bool {
        csr_exists(addr, self.xlen)
    }

    /// Checks whether `mode` may access `addr`. See [`access_allowed`].
    pub const fn access_allowed(&self, addr: u16, mode: PrivilegeMode, write: bool) -> bool {
        access_allowed(addr, self.xlen, mode, write)
    }

    /// Reads a CSR. Unknown addresses read as zero; legality is checked by `access_allowed`.
    pub const fn read(&self, addr: u16) -> u64 {
        let value = match addr {
            MSTATUS => self.mstatus,
            MISA => self.misa,
            MIE => self.mie,
            MTVEC => self.mtvec,
            MSCRATCH => self.mscratch,
            MEPC => self.mepc,
            MCAUSE => self.mcause,
            MTVAL => self.mtval,
            MIP => self.mip,
            MCYCLE | CYCLE => self.mcycle,
            MINSTRET | INSTRET => self.minstret,
            TIME => self.time,
            MCYCLEH | CYCLEH => self.mcycle >> 32,
            MINSTRETH | INSTRETH => self.minstret >> 32,
            TIMEH => self.time >> 32,
            _ => 0,
        };
        self.xlen.addr(value)
    }

    /// Writes a CSR, applying the WARL rules of each register.
    ///
    /// Read-only registers and the externally driven `mip` bits ignore the write.
    pub const fn write(&mut self, addr: u16, value: u64) {
        let value = self.xlen.addr(value);
        match addr {
            MSTATUS => {
                let mpp = PrivilegeMode::from_bits(value >> MSTATUS_MPP_SHIFT, self.user_mode);
                self.mstatus = (value & (MSTATUS_MIE | MSTATUS_MPIE))
                    | (mpp.to_bits() << MSTATUS_MPP_SHIFT);
            }
            MIE => self.mie = value & (MIE_MSIE | MIE_MTIE | MIE_MEIE),
            MTVEC => {
                let mode = if value & MTVEC_MODE_MASK == MTVEC_MODE_VECTORED {
                    MTVEC_MODE_VECTORED
                } else {
                    0
                };
                self.mtvec = (value & !MTVEC_MODE_MASK) | mode;
            }
            MSCRATCH => self.mscratch = value,
            MEPC => self.mepc = value & !0b11,
            MCAUSE => self.mcause = value,
            MTVAL => self.mtval = value,
            MCYCLE => self.mcycle = self.merge_low(self.mcycle, value),
            MINSTRET => self.minstret = self.merge_low(self.minstret, value),
            MCYCLEH => self.mcycle = (self.mcycle & 0xFFFF_FFFF) | (value << 32),
            MINSTRETH => self.minstret = (self.minstret & 0xFFFF_FFFF) | (value << 32),
            _ => {}
        }
    }

    /// On RV32 a write to the low counter half keeps the high half.
    const fn merge_low(&self, old: u64, value: u64) -> u64 {
        match self.xlen {
            Xlen::Rv32 => (old & !0xFFFF_FFFF) | value,
            Xlen::Rv64 => value,
        }
    }

    /// Configured register width.
    pub const fn xlen(&self) -> Xlen {
        self.xlen
    }

    /// Whether U-mode is implemented.
    pub const fn user_mode(&self) -> bool {
        self.user_mode
    }
}
