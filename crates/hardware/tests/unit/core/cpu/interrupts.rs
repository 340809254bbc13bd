//! Interrupt Tests.
//!
//! Interrupts are sampled at write-back against the instruction in that stage. These
//! programs arm the CLINT timer, the CLINT software interrupt, and the external line,
//! then spin until the handler reports the cause. A device store in write-back retires
//! before the handler runs, so returning from the handler never repeats it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rvpipe_core::common::Trap;
use rvpipe_core::core::arch::csr;
use rvpipe_core::sim::RunOutcome;

use crate::common::builder::instruction::{asm, ecall, mret};
use crate::common::harness::TestContext;
use crate::common::mocks::mmio::{MockMmio, SyncMmioDevice};

const INTERRUPT: u64 = 1 << 63;

/// Handler reporting `mcause` in x10 and `mepc` in x11.
fn report_handler() -> [u32; 3] {
    [
        asm().csrr(10, csr::MCAUSE).build(),
        asm().csrr(11, csr::MEPC).build(),
        ecall(),
    ]
}

#[test]
fn timer_interrupt_is_taken_at_the_spin_loop() {
    // 0x00..0x1C set up mtvec, mtimecmp = 50, mie.MTIE, and mstatus.MIE.
    // 0x20 spins.
    let mut ctx = TestContext::new()
        .load_program(
            0,
            &[
                asm().addi(5, 0, 0x100).build(),
                asm().csrw(csr::MTVEC, 5).build(),
                asm().lui(1, 0x2004).build(),
                asm().addi(2, 0, 50).build(),
                asm().sd(1, 2, 0).build(),
                asm().addi(3, 0, 0x80).build(),
                asm().csrrs(0, csr::MIE, 3).build(),
                asm().csrrsi(0, csr::MSTATUS, 8).build(),
                asm().jal(0, 0).build(),
            ],
        )
        .load_at(0x100, &report_handler());

    let outcome = ctx.run_to_halt();

    assert_eq!(
        outcome,
        RunOutcome::Halted {
            cause: Trap::EnvironmentCallFromMMode,
            pc: 0x108
        }
    );
    assert_eq!(ctx.get_reg(10), INTERRUPT | 7);
    assert_eq!(ctx.get_reg(11), 0x20);
    assert_eq!(ctx.cpu().stats.interrupts_taken, 1);
    assert_eq!(ctx.cpu().stats.traps_taken, 0);
    assert!(ctx.csr(csr::TIME) >= 50);
}

#[test]
fn vectored_mode_dispatches_external_interrupt() {
    // mtvec = 0x100 | vectored; external cause 11 lands at 0x100 + 4 * 11.
    let mut ctx = TestContext::new()
        .load_program(
            0,
            &[
                asm().addi(5, 0, 0x101).build(),
                asm().csrw(csr::MTVEC, 5).build(),
                asm().addi(3, 0, 1).build(),
                asm().slli(3, 3, 11).build(),
                asm().csrrs(0, csr::MIE, 3).build(),
                asm().csrrsi(0, csr::MSTATUS, 8).build(),
                asm().jal(0, 0).build(),
            ],
        )
        .load_at(0x12C, &report_handler());
    ctx.sim.set_external_interrupt(true);

    let outcome = ctx.run_to_halt();

    assert_eq!(
        outcome,
        RunOutcome::Halted {
            cause: Trap::EnvironmentCallFromMMode,
            pc: 0x134
        }
    );
    assert_eq!(ctx.get_reg(10), INTERRUPT | 11);
    assert_eq!(ctx.get_reg(11), 0x18);
}

#[test]
fn software_interrupt_through_clint_msip() {
    let mut ctx = TestContext::new()
        .load_program(
            0,
            &[
                asm().addi(5, 0, 0x100).build(),
                asm().csrw(csr::MTVEC, 5).build(),
                asm().lui(1, 0x2000).build(),
                asm().addi(2, 0, 1).build(),
                asm().sw(1, 2, 0).build(),
                asm().csrrsi(0, csr::MIE, 8).build(),
                asm().csrrsi(0, csr::MSTATUS, 8).build(),
                asm().jal(0, 0).build(),
            ],
        )
        .load_at(0x100, &report_handler());

    let _ = ctx.run_to_halt();

    assert_eq!(ctx.get_reg(10), INTERRUPT | 3);
    assert_eq!(ctx.get_reg(11), 0x1C);
}

#[test]
fn external_wins_over_software_when_both_pend() {
    let mut ctx = TestContext::new()
        .load_program(
            0,
            &[
                asm().addi(5, 0, 0x100).build(),
                asm().csrw(csr::MTVEC, 5).build(),
                asm().lui(1, 0x2000).build(),
                asm().addi(2, 0, 1).build(),
                asm().sw(1, 2, 0).build(),
                asm().addi(3, 0, 1).build(),
                asm().slli(3, 3, 11).build(),
                asm().addi(3, 3, 8).build(),
                asm().csrrs(0, csr::MIE, 3).build(),
                asm().csrrsi(0, csr::MSTATUS, 8).build(),
                asm().jal(0, 0).build(),
            ],
        )
        .load_at(0x100, &report_handler());
    ctx.sim.set_external_interrupt(true);

    let _ = ctx.run_to_halt();

    assert_eq!(ctx.get_reg(10), INTERRUPT | 11);
}

#[test]
fn pending_interrupt_is_ignored_while_globally_disabled() {
    let mut ctx = TestContext::new()
        .load_program(
            0,
            &[
                asm().addi(3, 0, 1).build(),
                asm().slli(3, 3, 11).build(),
                asm().csrrs(0, csr::MIE, 3).build(),
                asm().csrr(4, csr::MIP).build(),
                asm().jal(0, 0).build(),
            ],
        );
    ctx.sim.set_external_interrupt(true);

    let outcome = ctx.run(200).unwrap();

    assert_eq!(outcome, RunOutcome::CycleLimit);
    assert_eq!(ctx.cpu().stats.interrupts_taken, 0);
    assert_eq!(ctx.get_reg(4) & csr::MIP_MEIP, csr::MIP_MEIP);
}

#[test]
fn lowering_the_line_clears_the_pending_bit() {
    let mut ctx = TestContext::new().load_program(0, &[asm().jal(0, 0).build()]);

    ctx.sim.set_external_interrupt(true);
    let _ = ctx.run(3).unwrap();
    assert_eq!(ctx.csr(csr::MIP) & csr::MIP_MEIP, csr::MIP_MEIP);

    ctx.sim.set_external_interrupt(false);
    let _ = ctx.run(1).unwrap();
    assert_eq!(ctx.csr(csr::MIP), 0);
}

#[test]
fn interrupts_are_not_nested_inside_a_handler() {
    // The handler spins with the external line still high; trap state blocks re-entry.
    let mut ctx = TestContext::new()
        .load_program(
            0,
            &[
                asm().addi(5, 0, 0x100).build(),
                asm().csrw(csr::MTVEC, 5).build(),
                asm().addi(3, 0, 1).build(),
                asm().slli(3, 3, 11).build(),
                asm().csrrs(0, csr::MIE, 3).build(),
                asm().csrrsi(0, csr::MSTATUS, 8).build(),
                asm().jal(0, 0).build(),
            ],
        )
        .load_at(0x100, &[asm().jal(0, 0).build()]);
    ctx.sim.set_external_interrupt(true);

    let _ = ctx.run(300).unwrap();

    assert_eq!(ctx.cpu().stats.interrupts_taken, 1);
    assert_eq!(ctx.csr(csr::MSTATUS) & csr::MSTATUS_MIE, 0);
}

#[test]
fn device_store_is_not_repeated_after_the_handler_returns() {
    let writes = Arc::new(AtomicUsize::new(0));
    let mut mock = MockMmio::new();
    let seen = Arc::clone(&writes);
    // The device raises its line once it has been written and keeps it high.
    mock.expect_tick()
        .returning(move || seen.load(Ordering::SeqCst) > 0);
    let counter = Arc::clone(&writes);
    mock.expect_write().returning(move |_, _, _| {
        let _ = counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let device = SyncMmioDevice::new(mock, 0x1000_0000, 0x100);

    // The handler reports mcause/mepc, masks MEIE, and returns.
    let mut ctx = TestContext::new()
        .load_program(
            0,
            &[
                asm().addi(5, 0, 0x100).build(),
                asm().csrw(csr::MTVEC, 5).build(),
                asm().addi(3, 0, 1).build(),
                asm().slli(3, 3, 11).build(),
                asm().csrrs(0, csr::MIE, 3).build(),
                asm().csrrsi(0, csr::MSTATUS, 8).build(),
                asm().lui(1, 0x10000).build(),
                asm().addi(2, 0, 0x55).build(),
                asm().sw(1, 2, 4).build(),
                asm().addi(6, 0, 1).build(),
                ecall(),
            ],
        )
        .load_at(
            0x100,
            &[
                asm().csrr(10, csr::MCAUSE).build(),
                asm().csrr(11, csr::MEPC).build(),
                asm().csrrc(0, csr::MIE, 3).build(),
                mret(),
            ],
        );
    ctx.cpu_mut()
        .controller
        .attach(Box::new(device))
        .unwrap();

    let outcome = ctx.run_to_halt();

    assert_eq!(
        outcome,
        RunOutcome::Halted {
            cause: Trap::EnvironmentCallFromMMode,
            pc: 0x28
        }
    );
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.get_reg(10), INTERRUPT | 11);
    assert_eq!(ctx.get_reg(11), 0x24, "handler resumes after the store");
    assert_eq!(ctx.get_reg(6), 1);
    assert_eq!(ctx.cpu().stats.interrupts_taken, 1);
    assert_eq!(ctx.cpu().stats.inst_store, 1);
}
