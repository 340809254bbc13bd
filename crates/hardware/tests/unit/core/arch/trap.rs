//! Privileged Unit Tests.
//!
//! Trap entry and return bookkeeping, vector selection, interrupt arbitration, and the
//! nesting policy, driven directly without a pipeline.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpipe_core::common::Trap;
use rvpipe_core::config::IsaConfig;
use rvpipe_core::core::arch::csr;
use rvpipe_core::core::arch::mode::PrivilegeMode;
use rvpipe_core::core::arch::trap::{PrivilegedUnit, TrapState};

fn unit() -> PrivilegedUnit {
    let mut unit = PrivilegedUnit::new(&IsaConfig::default());
    unit.csrs.mtvec = 0x1000;
    unit
}

#[test]
fn entry_records_cause_value_and_epc() {
    let mut unit = unit();
    let frame = unit.enter(Trap::LoadAccessFault(0xDEAD_0000), 0x8000_0010);

    assert_eq!(frame.target, 0x1000);
    assert_eq!(frame.from, PrivilegeMode::Machine);
    assert_eq!(unit.csrs.read(csr::MEPC), 0x8000_0010);
    assert_eq!(unit.csrs.read(csr::MCAUSE), 5);
    assert_eq!(unit.csrs.read(csr::MTVAL), 0xDEAD_0000);
    assert_eq!(unit.state, TrapState::Trapped);
}

#[test]
fn entry_from_user_mode_saves_user_in_mpp() {
    let mut unit = unit();
    unit.mode = PrivilegeMode::User;
    unit.csrs.mstatus = 0;

    let _ = unit.enter(Trap::EnvironmentCallFromUMode, 0x40);

    assert_eq!(unit.mode, PrivilegeMode::Machine);
    assert_eq!(unit.csrs.mstatus & csr::MSTATUS_MPP, 0);
    assert_eq!(unit.csrs.read(csr::MCAUSE), 8);
}

#[rstest]
#[case::enabled_before(csr::MSTATUS_MIE, csr::MSTATUS_MPIE)]
#[case::disabled_before(0, 0)]
fn entry_moves_mie_into_mpie(#[case] before: u64, #[case] mpie: u64) {
    let mut unit = unit();
    unit.csrs.mstatus = csr::MSTATUS_MPP | before;

    let _ = unit.enter(Trap::IllegalInstruction(0), 0);

    assert_eq!(unit.csrs.mstatus & csr::MSTATUS_MIE, 0);
    assert_eq!(unit.csrs.mstatus & csr::MSTATUS_MPIE, mpie);
}

#[test]
fn return_restores_interrupt_enable_and_resets_mpp() {
    let mut unit = unit();
    unit.mode = PrivilegeMode::User;
    unit.csrs.mstatus = csr::MSTATUS_MIE;
    let _ = unit.enter(Trap::EnvironmentCallFromUMode, 0x2000);

    let target = unit.trap_return();

    assert_eq!(target, 0x2000);
    assert_eq!(unit.mode, PrivilegeMode::User);
    assert_eq!(unit.state, TrapState::Normal);
    assert_eq!(unit.csrs.mstatus & csr::MSTATUS_MIE, csr::MSTATUS_MIE);
    assert_eq!(unit.csrs.mstatus & csr::MSTATUS_MPIE, csr::MSTATUS_MPIE);
    // MPP drops to the least privileged implemented mode.
    assert_eq!(unit.csrs.mstatus & csr::MSTATUS_MPP, 0);
}

#[test]
fn return_without_user_mode_stays_in_machine() {
    let mut unit = PrivilegedUnit::new(&IsaConfig {
        user_mode: false,
        ..IsaConfig::default()
    });
    unit.csrs.write(csr::MSTATUS, 0);

    let _ = unit.trap_return();

    assert_eq!(unit.mode, PrivilegeMode::Machine);
    assert_eq!(unit.csrs.mstatus & csr::MSTATUS_MPP, csr::MSTATUS_MPP);
}

#[rstest]
#[case::exception_direct(0x1000, Trap::IllegalInstruction(0), 0x1000)]
#[case::exception_vectored(0x1001, Trap::IllegalInstruction(0), 0x1000)]
#[case::interrupt_direct(0x1000, Trap::MachineTimerInterrupt, 0x1000)]
#[case::timer_vectored(0x1001, Trap::MachineTimerInterrupt, 0x101C)]
#[case::software_vectored(0x1001, Trap::MachineSoftwareInterrupt, 0x100C)]
#[case::external_vectored(0x1001, Trap::MachineExternalInterrupt, 0x102C)]
fn vector_address(#[case] mtvec: u64, #[case] trap: Trap, #[case] target: u64) {
    let mut unit = unit();
    unit.csrs.mtvec = mtvec;
    assert_eq!(unit.vector(&trap), target);
}

#[test]
fn interrupt_priority_is_external_software_timer() {
    let mut unit = unit();
    unit.csrs.mstatus |= csr::MSTATUS_MIE;
    unit.csrs.mie = csr::MIE_MEIE | csr::MIE_MSIE | csr::MIE_MTIE;

    unit.set_pending(true, true, true);
    assert_eq!(unit.pending_interrupt(), Some(Trap::MachineExternalInterrupt));
    unit.set_pending(false, true, true);
    assert_eq!(unit.pending_interrupt(), Some(Trap::MachineSoftwareInterrupt));
    unit.set_pending(false, false, true);
    assert_eq!(unit.pending_interrupt(), Some(Trap::MachineTimerInterrupt));
    unit.set_pending(false, false, false);
    assert_eq!(unit.pending_interrupt(), None);
}

#[test]
fn interrupts_need_enable_bits() {
    let mut unit = unit();
    unit.set_pending(true, false, false);

    // Pending but not enabled in mie.
    unit.csrs.mstatus |= csr::MSTATUS_MIE;
    assert_eq!(unit.pending_interrupt(), None);

    // Enabled in mie, globally disabled in machine mode.
    unit.csrs.mie = csr::MIE_MEIE;
    unit.csrs.mstatus &= !csr::MSTATUS_MIE;
    assert_eq!(unit.pending_interrupt(), None);

    // User mode ignores mstatus.MIE.
    unit.mode = PrivilegeMode::User;
    assert_eq!(unit.pending_interrupt(), Some(Trap::MachineExternalInterrupt));
}

#[test]
fn trapped_state_blocks_interrupts_and_double_faults_exceptions() {
    let mut unit = unit();
    unit.csrs.mstatus |= csr::MSTATUS_MIE;
    unit.csrs.mie = csr::MIE_MEIE;
    unit.set_pending(true, false, false);
    assert!(!unit.would_double_fault(&Trap::IllegalInstruction(0)));

    let _ = unit.enter(Trap::IllegalInstruction(0), 0);

    assert_eq!(unit.pending_interrupt(), None);
    assert!(unit.would_double_fault(&Trap::LoadAccessFault(0)));
    assert!(!unit.would_double_fault(&Trap::MachineExternalInterrupt));
}

#[test]
fn only_machine_mode_may_return() {
    let mut unit = unit();
    assert!(unit.may_return());
    unit.mode = PrivilegeMode::User;
    assert!(!unit.may_return());
    assert!(!unit.csr_allowed(csr::MEPC, false));
    assert!(unit.csr_allowed(csr::CYCLE, false));
}
