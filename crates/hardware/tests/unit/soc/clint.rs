//! CLINT Tests.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpipe_core::common::{MemFault, Width};
use rvpipe_core::config::ClintConfig;
use rvpipe_core::soc::devices::Clint;
use rvpipe_core::soc::devices::clint::{MSIP_OFFSET, MTIME_OFFSET, MTIMECMP_OFFSET};
use rvpipe_core::soc::traits::Device;

fn clint() -> Clint {
    Clint::new(&ClintConfig::default())
}

#[test]
fn reset_state_has_nothing_pending() {
    let mut clint = clint();
    assert_eq!(clint.mtime(), 0);
    assert!(!clint.timer_pending());
    assert!(!clint.software_pending());
    assert_eq!(clint.read(MTIMECMP_OFFSET, Width::Double), Ok(u64::MAX));
    assert_eq!(clint.address_range(), (0x0200_0000, ClintConfig::REGION_SIZE));
}

#[test]
fn timer_fires_when_mtime_reaches_compare() {
    let mut clint = clint();
    clint.write(MTIMECMP_OFFSET, Width::Double, 3).unwrap();
    for _ in 0..2 {
        assert!(!clint.tick(), "the CLINT never drives the external line");
    }
    assert!(!clint.timer_pending());
    let _ = clint.tick();
    assert!(clint.timer_pending());

    // Pushing the compare value out clears the condition.
    clint.write(MTIMECMP_OFFSET, Width::Double, 100).unwrap();
    assert!(!clint.timer_pending());
}

#[test]
fn software_interrupt_keeps_only_bit_zero() {
    let mut clint = clint();
    clint.write(MSIP_OFFSET, Width::Word, 0xFFFF_FFFE).unwrap();
    assert!(!clint.software_pending());
    assert_eq!(clint.read(MSIP_OFFSET, Width::Word), Ok(0));

    clint.write(MSIP_OFFSET, Width::Word, 3).unwrap();
    assert!(clint.software_pending());
    assert_eq!(clint.read(MSIP_OFFSET, Width::Double), Ok(1));
}

#[test]
fn mtime_is_writable_in_halves() {
    let mut clint = clint();
    clint.write(MTIME_OFFSET + 4, Width::Word, 0x1).unwrap();
    clint.write(MTIME_OFFSET, Width::Word, 0xFFFF_FFFF).unwrap();
    assert_eq!(clint.mtime(), 0x1_FFFF_FFFF);

    let _ = clint.tick();
    assert_eq!(clint.read(MTIME_OFFSET, Width::Word), Ok(0));
    assert_eq!(clint.read(MTIME_OFFSET + 4, Width::Word), Ok(2));
}

#[rstest]
#[case::byte(MSIP_OFFSET, Width::Byte)]
#[case::half(MTIMECMP_OFFSET, Width::Half)]
#[case::misplaced_double(MTIME_OFFSET + 4, Width::Double)]
#[case::hole(0x1000, Width::Word)]
fn unsupported_accesses_fault(#[case] offset: u64, #[case] width: Width) {
    let mut clint = clint();
    assert_eq!(
        clint.read(offset, width),
        Err(MemFault::Unmapped(0x0200_0000 + offset))
    );
    assert_eq!(
        clint.write(offset, width, 0),
        Err(MemFault::Unmapped(0x0200_0000 + offset))
    );
}

#[test]
fn contains_covers_the_whole_region() {
    let clint = clint();
    assert!(clint.contains(0x0200_0000, 8));
    assert!(clint.contains(0x0200_FFF8, 8));
    assert!(!clint.contains(0x0200_FFFC, 8));
    assert!(!clint.contains(0x01FF_FFFC, 4));
}
