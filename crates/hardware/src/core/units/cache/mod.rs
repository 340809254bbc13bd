//! Write-Back Data Cache.
//!
//! A set-associative, write-back, write-allocate cache in front of the memory
//! controller. It provides:
//! 1. **Lookup:** A side-effect-free probe used while the pipeline evaluates a cycle.
//! 2. **Miss Handling:** A small state machine (`Idle` → `WriteBack` → `Fill` → `Idle`).
//!    A dirty victim is written back as one controller transaction before the refill is
//!    issued as a second one. The new line is installed only when the fill completes, so a
//!    line is never visible half-written.
//! 3. **Replacement:** Pluggable victim selection (LRU, FIFO, PLRU). Invalid ways are filled first.
//!
//! While a miss is outstanding every access reports `Busy` and the requesting stage stalls.

/// Cache replacement policies.
pub mod policies;

use tracing::{debug, warn};

use self::policies::{FifoPolicy, LruPolicy, PlruPolicy, ReplacementPolicy};
use crate::common::{MemFault, Width};
use crate::config::{CacheConfig, ReplacementPolicy as PolicyType};
use crate::soc::memory::controller::{Completion, Request, Response};

/// One line of the cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Tag bits of the cached address.
    pub tag: u64,
    /// Line holds data.
    pub valid: bool,
    /// Line differs from memory.
    pub dirty: bool,
    /// Line contents.
    pub data: Vec<u8>,
}

/// Miss-handling state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissState {
    /// No miss outstanding.
    #[default]
    Idle,
    /// The dirty victim is being written back.
    WriteBack {
        /// Set being refilled.
        set: usize,
        /// Way being replaced.
        way: usize,
        /// Line address to fill afterwards.
        fill: u64,
    },
    /// The requested line is being read.
    Fill {
        /// Set being refilled.
        set: usize,
        /// Way being replaced.
        way: usize,
        /// Line address being filled.
        addr: u64,
    },
}

/// Result of probing the cache for an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// The line is present.
    Hit {
        /// Set index.
        set: usize,
        /// Way index.
        way: usize,
    },
    /// The line is absent and no miss is outstanding.
    Miss,
    /// A miss is being serviced; retry later.
    Busy,
    /// The last miss on this line failed in the controller.
    Fault(MemFault),
}

/// The data cache.
#[derive(Debug)]
pub struct Cache {
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    line_bytes: usize,
    policy: Box<dyn ReplacementPolicy>,
    state: MissState,
    failed: Option<(u64, MemFault)>,
}

impl Cache {
    /// Creates an empty cache with the configured geometry.
    ///
    /// # Arguments
    ///
    /// * `config` - Size, line size, associativity, and policy. Geometry is assumed validated.
    pub fn new(config: &CacheConfig) -> Self {
        let num_sets = config.num_sets().max(1);
        let ways = config.ways.max(1);
        let policy: Box<dyn ReplacementPolicy> = match config.policy {
            PolicyType::Lru => Box::new(LruPolicy::new(num_sets, ways)),
            PolicyType::Fifo => Box::new(FifoPolicy::new(num_sets, ways)),
            PolicyType::Plru => Box::new(PlruPolicy::new(num_sets, ways)),
        };
        Self {
            lines: vec![CacheLine::default(); num_sets * ways],
            num_sets,
            ways,
            line_bytes: config.line_bytes.max(8),
            policy,
            state: MissState::Idle,
            failed: None,
        }
    }

    /// Line size in bytes.
    pub const fn line_bytes(&self) -> usize {
        self.line_bytes
    }

    /// Current miss-handling state.
    pub const fn state(&self) -> MissState {
        self.state
    }

    /// Returns `true` while a miss is outstanding.
    pub const fn is_busy(&self) -> bool {
        !matches!(self.state, MissState::Idle)
    }

    /// Address of the line containing `addr`.
    pub const fn line_addr(&self, addr: u64) -> u64 {
        addr & !(self.line_bytes as u64 - 1)
    }

    fn index(&self, addr: u64) -> (usize, u64) {
        let line = addr / self.line_bytes as u64;
        let set = (line % self.num_sets as u64) as usize;
        let tag = line / self.num_sets as u64;
        (set, tag)
    }

    fn line(&self, set: usize, way: usize) -> &CacheLine {
        &self.lines[set * self.ways + way]
    }

    fn line_mut(&mut self, set: usize, way: usize) -> &mut CacheLine {
        &mut self.lines[set * self.ways + way]
    }

    /// Finds the way holding `addr`, ignoring any outstanding miss.
    pub fn lookup(&self, addr: u64) -> Option<(usize, usize)> {
        let (set, tag) = self.index(addr);
        (0..self.ways)
            .find(|&way| {
                let line = self.line(set, way);
                line.valid && line.tag == tag
            })
            .map(|way| (set, way))
    }

    /// Probes for a data access without changing any state.
    pub fn probe(&self, addr: u64) -> Probe {
        if self.is_busy() {
            return Probe::Busy;
        }
        if let Some((line, fault)) = self.failed {
            if line == self.line_addr(addr) {
                return Probe::Fault(fault);
            }
        }
        match self.lookup(addr) {
            Some((set, way)) => Probe::Hit { set, way },
            None => Probe::Miss,
        }
    }

    /// Reads `width` bytes at `addr` from a line found by [`Cache::probe`] or [`Cache::lookup`].
    ///
    /// # Returns
    ///
    /// The zero-extended little-endian value.
    pub fn read(&self, set: usize, way: usize, addr: u64, width: Width) -> u64 {
        let offset = (addr as usize) & (self.line_bytes - 1);
        let len = width.bytes() as usize;
        let mut buf = [0u8; 8];
        buf[..len].copy_from_slice(&self.line(set, way).data[offset..offset + len]);
        u64::from_le_bytes(buf)
    }

    /// Records a load hit with the replacement policy.
    pub fn touch(&mut self, set: usize, way: usize) {
        self.policy.touch(set, way);
    }

    /// Merges a store into a present line and marks it dirty.
    pub fn write(&mut self, set: usize, way: usize, addr: u64, width: Width, value: u64) {
        let offset = (addr as usize) & (self.line_bytes - 1);
        let len = width.bytes() as usize;
        let line = self.line_mut(set, way);
        line.data[offset..offset + len].copy_from_slice(&value.to_le_bytes()[..len]);
        line.dirty = true;
        self.policy.touch(set, way);
    }

    /// Begins servicing a miss on `addr`.
    ///
    /// Chooses a victim (an invalid way if one exists), and returns the first transaction:
    /// a write-back of a dirty victim, or the fill itself.
    pub fn start_miss(&mut self, addr: u64) -> Request {
        let (set, _) = self.index(addr);
        let fill = self.line_addr(addr);
        self.failed = None;
        let way = (0..self.ways)
            .find(|&w| !self.line(set, w).valid)
            .unwrap_or_else(|| self.policy.victim(set));
        let victim = self.line(set, way);
        if victim.valid && victim.dirty {
            let victim_addr =
                (victim.tag * self.num_sets as u64 + set as u64) * self.line_bytes as u64;
            debug!(
                set,
                way,
                victim = format_args!("{victim_addr:#x}"),
                fill = format_args!("{fill:#x}"),
                "cache miss with dirty victim"
            );
            let data = victim.data.clone();
            self.state = MissState::WriteBack { set, way, fill };
            Request::WriteBack {
                addr: victim_addr,
                data,
            }
        } else {
            debug!(set, way, fill = format_args!("{fill:#x}"), "cache miss");
            self.state = MissState::Fill {
                set,
                way,
                addr: fill,
            };
            Request::Fill {
                addr: fill,
                len: self.line_bytes,
            }
        }
    }

    /// Consumes the completion of a transaction this cache issued.
    ///
    /// # Returns
    ///
    /// The next transaction to issue (the fill after a write-back), `None` once the line
    /// is installed, or the fault that aborted the miss. A fault returns the cache to idle
    /// and is reported by the next probe of the line being filled.
    pub fn complete(&mut self, completion: Completion) -> Result<Option<Request>, MemFault> {
        let state = self.state;
        match (state, completion.result) {
            (MissState::WriteBack { set, way, fill }, Ok(_)) => {
                let line = self.line_mut(set, way);
                line.dirty = false;
                line.valid = false;
                self.state = MissState::Fill {
                    set,
                    way,
                    addr: fill,
                };
                Ok(Some(Request::Fill {
                    addr: fill,
                    len: self.line_bytes,
                }))
            }
            (MissState::Fill { set, way, addr }, Ok(Response::Line(data))) => {
                let (_, tag) = self.index(addr);
                *self.line_mut(set, way) = CacheLine {
                    tag,
                    valid: true,
                    dirty: false,
                    data,
                };
                self.policy.insert(set, way);
                self.state = MissState::Idle;
                debug!(set, way, addr = format_args!("{addr:#x}"), "cache line installed");
                Ok(None)
            }
            (_, Err(fault)) => {
                warn!(?state, ?fault, "cache transaction failed");
                self.fail(fault);
                Err(fault)
            }
            (_, Ok(response)) => {
                warn!(?state, ?response, "unexpected completion for cache");
                let fault = MemFault::Unmapped(completion.request.addr());
                self.fail(fault);
                Err(fault)
            }
        }
    }

    fn fail(&mut self, fault: MemFault) {
        let line = match self.state {
            MissState::WriteBack { fill, .. } => Some(fill),
            MissState::Fill { addr, .. } => Some(addr),
            MissState::Idle => None,
        };
        self.failed = line.map(|line| (line, fault));
        self.state = MissState::Idle;
    }

    /// Drops a miss whose transaction the controller did not accept.
    ///
    /// A victim already written back stays invalid; the next probe misses again.
    pub fn abort_miss(&mut self) {
        if self.is_busy() {
            debug!(state = ?self.state, "cache miss abandoned before issue");
        }
        self.state = MissState::Idle;
    }

    /// Forgets a fault once it has been raised against an instruction.
    pub const fn clear_fault(&mut self) {
        self.failed = None;
    }

    /// Abandons any outstanding miss and invalidates every line. Dirty data is discarded.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            *line = CacheLine::default();
        }
        self.state = MissState::Idle;
        self.failed = None;
    }

    /// Iterates over the dirty lines as `(line address, data)`.
    pub fn dirty_lines(&self) -> impl Iterator<Item = (u64, &[u8])> + '_ {
        self.lines.iter().enumerate().filter_map(move |(i, line)| {
            (line.valid && line.dirty).then(|| {
                let set = (i / self.ways) as u64;
                let addr = (line.tag * self.num_sets as u64 + set) * self.line_bytes as u64;
                (addr, line.data.as_slice())
            })
        })
    }
}
