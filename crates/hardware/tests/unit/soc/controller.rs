//! Memory Controller Tests.
//!
//! Routing and access checks, transaction latency per target, the single in-flight
//! slot, and device attachment.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpipe_core::common::{AccessType, MemFault, Width};
use rvpipe_core::config::{Config, ConfigError};
use rvpipe_core::soc::MemoryController;
use rvpipe_core::soc::devices::clint::MTIME_OFFSET;
use rvpipe_core::soc::memory::Memory;
use rvpipe_core::soc::memory::controller::{Completion, Request, Response, Target};

use crate::common::mocks::mmio::{MockMmio, SyncMmioDevice};

const RAM: u64 = 0x8000_0000;
const CLINT: u64 = 0x0200_0000;

fn controller() -> MemoryController {
    MemoryController::new(&Config::default())
}

/// Ticks until the in-flight transaction completes; returns it and the cycles taken.
fn drain(ctrl: &mut MemoryController) -> (Completion, u64) {
    for cycle in 1..=100 {
        if let Some(done) = ctrl.tick() {
            return (done, cycle);
        }
    }
    panic!("transaction never completed");
}

#[rstest]
#[case::rom(0x100, Some(Target::Rom))]
#[case::ram(RAM + 0x100, Some(Target::Ram))]
#[case::clint(CLINT + 0x4000, Some(Target::Clint))]
#[case::hole(0x4000_0000, None)]
#[case::straddles_rom_end(0xFFFE, None)]
fn routing(#[case] addr: u64, #[case] target: Option<Target>) {
    assert_eq!(controller().route(addr, 4), target);
}

#[rstest]
#[case::misaligned(RAM + 2, Width::Word, AccessType::Read, Err(MemFault::Misaligned(RAM + 2)))]
#[case::rom_write(0x40, Width::Word, AccessType::Write, Err(MemFault::ReadOnly(0x40)))]
#[case::rom_read(0x40, Width::Word, AccessType::Read, Ok(Target::Rom))]
#[case::unmapped(0x4000_0000, Width::Byte, AccessType::Read, Err(MemFault::Unmapped(0x4000_0000)))]
#[case::clint_data(CLINT, Width::Double, AccessType::Write, Ok(Target::Clint))]
#[case::clint_fetch(CLINT, Width::Word, AccessType::Fetch, Err(MemFault::Unmapped(CLINT)))]
#[case::ram_fetch(RAM, Width::Word, AccessType::Fetch, Ok(Target::Ram))]
fn access_checks(
    #[case] addr: u64,
    #[case] width: Width,
    #[case] kind: AccessType,
    #[case] expected: Result<Target, MemFault>,
) {
    assert_eq!(controller().check(addr, width, kind), expected);
}

#[test]
fn only_rom_and_ram_are_cacheable() {
    assert!(Target::Rom.is_cacheable());
    assert!(Target::Ram.is_cacheable());
    assert!(!Target::Clint.is_cacheable());
    assert!(!Target::Device(0).is_cacheable());
}

#[rstest]
#[case::ram_fill(Request::Fill { addr: RAM, len: 32 }, 8)]
#[case::rom_fill(Request::Fill { addr: 0, len: 32 }, 2)]
#[case::mmio_read(Request::Read { addr: CLINT + MTIME_OFFSET, width: Width::Double }, 1)]
fn latency_depends_on_target(#[case] request: Request, #[case] cycles: u64) {
    let mut ctrl = controller();
    ctrl.issue(request).unwrap();
    let (_, taken) = drain(&mut ctrl);
    assert_eq!(taken, cycles);
    assert!(!ctrl.is_busy());
    assert_eq!(ctrl.transactions(), 1);
}

#[test]
fn one_transaction_at_a_time() {
    let mut ctrl = controller();
    ctrl.issue(Request::Fill { addr: RAM, len: 32 }).unwrap();
    assert!(ctrl.is_busy());
    assert_eq!(
        ctrl.issue(Request::Read {
            addr: RAM,
            width: Width::Word
        }),
        Err(MemFault::Busy)
    );
    assert_eq!(ctrl.transactions(), 1);
}

#[test]
fn write_back_applies_only_on_completion() {
    let mut ctrl = controller();
    ctrl.issue(Request::WriteBack {
        addr: RAM + 0x20,
        data: vec![0x5A; 32],
    })
    .unwrap();

    let mut buf = [0u8; 4];
    ctrl.read_bytes(RAM + 0x20, &mut buf).unwrap();
    assert_eq!(buf, [0; 4]);

    let (done, _) = drain(&mut ctrl);
    assert_eq!(done.result, Ok(Response::Ack));
    ctrl.read_bytes(RAM + 0x3C, &mut buf).unwrap();
    assert_eq!(buf, [0x5A; 4]);
}

#[test]
fn fill_returns_line_contents() {
    let mut ctrl = controller();
    ctrl.load(RAM + 0x40, &[1, 2, 3, 4]).unwrap();
    ctrl.issue(Request::Fill {
        addr: RAM + 0x40,
        len: 8,
    })
    .unwrap();

    let (done, _) = drain(&mut ctrl);

    assert_eq!(done.result, Ok(Response::Line(vec![1, 2, 3, 4, 0, 0, 0, 0])));
}

#[test]
fn uncached_write_to_rom_completes_with_fault() {
    let mut ctrl = controller();
    ctrl.issue(Request::Write {
        addr: 0x10,
        width: Width::Word,
        value: 1,
    })
    .unwrap();

    let (done, _) = drain(&mut ctrl);

    assert_eq!(done.result, Err(MemFault::ReadOnly(0x10)));
}

#[test]
fn fetch_and_loader_bypass_the_transaction_slot() {
    let mut ctrl = controller();
    ctrl.load(0x8, &0x0010_0093u32.to_le_bytes()).unwrap();
    ctrl.issue(Request::Fill { addr: RAM, len: 32 }).unwrap();

    assert_eq!(ctrl.fetch(0x8), Ok(0x0010_0093));
    assert_eq!(ctrl.fetch(0x6), Err(MemFault::Misaligned(0x6)));
    assert_eq!(ctrl.load(0x4000_0000, &[0]), Err(MemFault::Unmapped(0x4000_0000)));
}

#[test]
fn clint_timer_runs_with_device_ticks() {
    let mut ctrl = controller();
    for _ in 0..5 {
        let _ = ctrl.tick_devices();
    }
    assert_eq!(ctrl.clint().map(|c| c.mtime()), Some(5));

    ctrl.issue(Request::Read {
        addr: CLINT + MTIME_OFFSET,
        width: Width::Double,
    })
    .unwrap();
    let (done, _) = drain(&mut ctrl);
    assert_eq!(done.result, Ok(Response::Data(5)));
}

#[test]
fn disabled_clint_leaves_a_hole() {
    let mut config = Config::default();
    config.clint.enabled = false;
    let ctrl = MemoryController::new(&config);
    assert!(ctrl.clint().is_none());
    assert_eq!(ctrl.route(CLINT, 8), None);
}

#[test]
fn attached_device_is_routed_and_ticked() {
    let mut mock = MockMmio::new();
    mock.expect_tick().times(1).returning(|| true);
    mock.expect_read()
        .withf(|offset, width| *offset == 0x8 && *width == Width::Half)
        .returning(|_, _| Ok(0xBEEF));
    let device = SyncMmioDevice::new(mock, 0x1000_0000, 0x100);

    let mut ctrl = controller();
    ctrl.attach(Box::new(device.clone())).unwrap();

    assert_eq!(ctrl.route(0x1000_0008, 2), Some(Target::Device(0)));
    assert!(ctrl.tick_devices(), "device raised its interrupt line");
    ctrl.issue(Request::Read {
        addr: 0x1000_0008,
        width: Width::Half,
    })
    .unwrap();
    let (done, cycles) = drain(&mut ctrl);
    assert_eq!(done.result, Ok(Response::Data(0xBEEF)));
    assert_eq!(cycles, 1);
    device.checkpoint();
}

#[rstest]
#[case::over_ram(RAM + 0x1000, 0x100)]
#[case::over_clint(CLINT, 0x10)]
#[case::zero_sized(0x1000_0000, 0)]
fn overlapping_attach_is_rejected(#[case] base: u64, #[case] size: usize) {
    let mut ctrl = controller();
    let err = ctrl
        .attach(Box::new(Memory::new("EXTRA", base, size, false)))
        .unwrap_err();
    assert!(matches!(err, ConfigError::DeviceOverlap { base: b, .. } if b == base));
}

#[test]
fn second_device_may_not_overlap_the_first() {
    let mut ctrl = controller();
    ctrl.attach(Box::new(Memory::new("A", 0x1000_0000, 0x100, false)))
        .unwrap();
    assert!(
        ctrl.attach(Box::new(Memory::new("B", 0x1000_0080, 0x100, false)))
            .is_err()
    );
    ctrl.attach(Box::new(Memory::new("C", 0x1000_0100, 0x100, false)))
        .unwrap();
    assert_eq!(ctrl.route(0x1000_0100, 4), Some(Target::Device(1)));
}

#[test]
fn reset_drops_the_in_flight_transaction() {
    let mut ctrl = controller();
    ctrl.issue(Request::Fill { addr: RAM, len: 32 }).unwrap();
    ctrl.reset();
    assert!(!ctrl.is_busy());
    assert_eq!(ctrl.tick(), None);
}
