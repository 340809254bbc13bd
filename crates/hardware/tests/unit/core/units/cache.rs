//! Data Cache Tests.
//!
//! Drives the miss state machine by hand with controller completions, and checks
//! each replacement policy in isolation and through the cache.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpipe_core::common::{MemFault, Width};
use rvpipe_core::config::{CacheConfig, ReplacementPolicy as PolicyType};
use rvpipe_core::core::units::cache::policies::{
    FifoPolicy, LruPolicy, PlruPolicy, ReplacementPolicy,
};
use rvpipe_core::core::units::cache::{Cache, MissState, Probe};
use rvpipe_core::soc::memory::controller::{Completion, Request, Response};

/// Two sets of two 32-byte ways: lines 0x00, 0x40, 0x80 share set 0.
fn cache(policy: PolicyType) -> Cache {
    Cache::new(&CacheConfig {
        enabled: true,
        size_bytes: 128,
        line_bytes: 32,
        ways: 2,
        policy,
    })
}

/// Services a full miss on `addr`, acknowledging any write-back, and fills with `byte`.
/// Returns the write-back request if one was needed.
fn fill(cache: &mut Cache, addr: u64, byte: u8) -> Option<Request> {
    let first = cache.start_miss(addr);
    let (writeback, request) = match first {
        Request::WriteBack { .. } => {
            let next = cache
                .complete(Completion {
                    request: first.clone(),
                    result: Ok(Response::Ack),
                })
                .unwrap()
                .unwrap();
            (Some(first), next)
        }
        fill => (None, fill),
    };
    let len = cache.line_bytes();
    let done = cache
        .complete(Completion {
            request,
            result: Ok(Response::Line(vec![byte; len])),
        })
        .unwrap();
    assert_eq!(done, None);
    writeback
}

fn hit(cache: &Cache, addr: u64) -> (usize, usize) {
    match cache.probe(addr) {
        Probe::Hit { set, way } => (set, way),
        other => panic!("expected hit at {addr:#x}, got {other:?}"),
    }
}

#[test]
fn miss_state_machine_without_victim() {
    let mut cache = cache(PolicyType::Lru);
    assert_eq!(cache.probe(0x24), Probe::Miss);

    let request = cache.start_miss(0x24);
    assert_eq!(request, Request::Fill { addr: 0x20, len: 32 });
    assert_eq!(
        cache.state(),
        MissState::Fill {
            set: 1,
            way: 0,
            addr: 0x20
        }
    );
    assert!(cache.is_busy());
    assert_eq!(cache.probe(0x24), Probe::Busy);
    // The line is not visible until the fill completes.
    assert_eq!(cache.lookup(0x24), None);

    let mut data = vec![0u8; 32];
    data[4..8].copy_from_slice(&0x1122_3344u32.to_le_bytes());
    let next = cache
        .complete(Completion {
            request,
            result: Ok(Response::Line(data)),
        })
        .unwrap();

    assert_eq!(next, None);
    assert_eq!(cache.state(), MissState::Idle);
    let (set, way) = hit(&cache, 0x24);
    assert_eq!(cache.read(set, way, 0x24, Width::Word), 0x1122_3344);
    assert_eq!(cache.read(set, way, 0x26, Width::Half), 0x1122);
    assert_eq!(cache.read(set, way, 0x27, Width::Byte), 0x11);
}

#[test]
fn store_hit_marks_line_dirty() {
    let mut cache = cache(PolicyType::Lru);
    let _ = fill(&mut cache, 0x40, 0);
    assert_eq!(cache.dirty_lines().count(), 0);

    let (set, way) = hit(&cache, 0x48);
    cache.write(set, way, 0x48, Width::Double, 0x0102_0304_0506_0708);

    let dirty: Vec<_> = cache.dirty_lines().collect();
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0].0, 0x40);
    assert_eq!(&dirty[0].1[8..16], &0x0102_0304_0506_0708u64.to_le_bytes());
    assert_eq!(cache.read(set, way, 0x48, Width::Double), 0x0102_0304_0506_0708);
}

#[test]
fn dirty_victim_goes_through_write_back_state() {
    let mut cache = cache(PolicyType::Lru);
    let _ = fill(&mut cache, 0x00, 0);
    let _ = fill(&mut cache, 0x40, 0);
    let (set, way) = hit(&cache, 0x00);
    cache.write(set, way, 0x00, Width::Byte, 0xEE);
    // 0x40 is now the LRU way; make 0x00 the LRU and dirty instead.
    let (set, way) = hit(&cache, 0x40);
    cache.touch(set, way);

    let request = cache.start_miss(0x80);
    let Request::WriteBack { addr, ref data } = request else {
        panic!("expected write-back, got {request:?}");
    };
    assert_eq!(addr, 0x00);
    assert_eq!(data[0], 0xEE);
    assert!(matches!(cache.state(), MissState::WriteBack { fill: 0x80, .. }));

    let next = cache
        .complete(Completion {
            request,
            result: Ok(Response::Ack),
        })
        .unwrap();
    assert_eq!(next, Some(Request::Fill { addr: 0x80, len: 32 }));
    assert!(matches!(cache.state(), MissState::Fill { addr: 0x80, .. }));
}

#[rstest]
#[case::lru(PolicyType::Lru, 0x40)]
#[case::fifo(PolicyType::Fifo, 0x00)]
#[case::plru(PolicyType::Plru, 0x40)]
fn policy_selects_victim_in_full_set(#[case] policy: PolicyType, #[case] evicted: u64) {
    let mut cache = cache(policy);
    let _ = fill(&mut cache, 0x00, 1);
    let _ = fill(&mut cache, 0x40, 2);
    let (set, way) = hit(&cache, 0x00);
    cache.touch(set, way);

    let _ = fill(&mut cache, 0x80, 3);

    assert_eq!(cache.lookup(evicted), None);
    assert!(cache.lookup(0x80).is_some());
    assert!(cache.lookup(0x40 - evicted).is_some());
}

#[test]
fn failed_write_back_aborts_miss() {
    let mut cache = cache(PolicyType::Lru);
    let _ = fill(&mut cache, 0x00, 0);
    let _ = fill(&mut cache, 0x40, 0);
    let (set, way) = hit(&cache, 0x00);
    cache.write(set, way, 0, Width::Byte, 1);
    let (set, way) = hit(&cache, 0x40);
    cache.touch(set, way);

    let request = cache.start_miss(0x80);
    let result = cache.complete(Completion {
        request,
        result: Err(MemFault::Unmapped(0)),
    });

    assert_eq!(result, Err(MemFault::Unmapped(0)));
    assert_eq!(cache.state(), MissState::Idle);
}

#[test]
fn reset_discards_lines_and_outstanding_miss() {
    let mut cache = cache(PolicyType::Lru);
    let _ = fill(&mut cache, 0x20, 0);
    let _ = cache.start_miss(0x00);

    cache.reset();

    assert!(!cache.is_busy());
    assert_eq!(cache.probe(0x20), Probe::Miss);
}

#[test]
fn lru_evicts_least_recently_used() {
    let mut lru = LruPolicy::new(1, 4);
    assert_eq!(lru.victim(0), 3);
    lru.touch(0, 3);
    lru.touch(0, 2);
    assert_eq!(lru.victim(0), 1);
    lru.touch(0, 1);
    assert_eq!(lru.victim(0), 0);
}

#[test]
fn fifo_ignores_hits() {
    let mut fifo = FifoPolicy::new(1, 4);
    for way in 0..4 {
        fifo.insert(0, way);
    }
    fifo.touch(0, 0);
    assert_eq!(fifo.victim(0), 0);
    fifo.insert(0, 0);
    assert_eq!(fifo.victim(0), 1);
}

#[test]
fn plru_resets_mru_bits_when_all_set() {
    let mut plru = PlruPolicy::new(1, 4);
    plru.touch(0, 0);
    plru.touch(0, 1);
    plru.touch(0, 2);
    assert_eq!(plru.victim(0), 3);
    plru.touch(0, 3);
    // Only way 3 keeps its bit.
    assert_eq!(plru.victim(0), 0);
}

#[test]
fn policies_keep_sets_independent() {
    let mut lru = LruPolicy::new(2, 2);
    lru.touch(0, 1);
    assert_eq!(lru.victim(0), 0);
    assert_eq!(lru.victim(1), 1);
}
