//! Memory Access (MEM) Stage.
//!
//! This module implements the fourth stage of the instruction pipeline. It performs
//! the following:
//! 1. **Address Check:** Alignment, routing, and write protection. Failures become the
//!    matching load/store trap on the instruction.
//! 2. **Cached Access:** ROM and RAM accesses probe the data cache. A hit completes in
//!    this cycle; a miss requests a line fill and stalls until the line is installed. A
//!    fill the controller could not serve becomes an access fault.
//! 3. **Uncached Access:** Device accesses (and every access while the cache is disabled)
//!    go through the uncached port as single transactions and stall until they complete.
//!
//! The stage only describes what must happen. The returned [`MemAction`] is applied by
//! the CPU after the hazard decision, and dropped if the stage is flushed.

use tracing::trace;

use crate::common::{AccessType, Trap, Width};
use crate::core::Cpu;
use crate::core::pipeline::latches::{ExMemEntry, MemWbEntry};
use crate::core::pipeline::signals::MemOp;
use crate::core::units::cache::Probe;
use crate::isa::decode::sign_extend;
use crate::soc::memory::controller::{Request, Response};

/// Side effect requested by the memory stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemAction {
    /// Nothing to commit.
    None,
    /// A load hit; update the replacement state.
    Touch {
        /// Set index.
        set: usize,
        /// Way index.
        way: usize,
    },
    /// A store hit; merge the data into the line.
    Store {
        /// Set index.
        set: usize,
        /// Way index.
        way: usize,
        /// Store address.
        addr: u64,
        /// Store width.
        width: Width,
        /// Store data.
        value: u64,
    },
    /// Begin a cache miss on this address.
    Miss(u64),
    /// Issue an uncached transaction.
    Issue(Request),
    /// The uncached response was consumed.
    Consume,
    /// A failed line fill was raised as a trap.
    ClearFault,
}

/// Result of evaluating the memory stage for one cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryOutput {
    /// Entry to latch into MEM/WB; meaningless while `stall` is set.
    pub entry: MemWbEntry,
    /// The access has not completed; hold this stage.
    pub stall: bool,
    /// Side effect to commit if the stage is not flushed.
    pub action: MemAction,
}

impl MemoryOutput {
    const fn done(entry: MemWbEntry, action: MemAction) -> Self {
        Self {
            entry,
            stall: false,
            action,
        }
    }

    const fn wait(entry: MemWbEntry, action: MemAction) -> Self {
        Self {
            entry,
            stall: true,
            action,
        }
    }
}

/// Sign- or zero-extends loaded data to register width.
fn extend_load(value: u64, width: Width, signed: bool) -> u64 {
    if signed && width != Width::Double {
        sign_extend(value, (width.bytes() * 8) as u32) as u64
    } else {
        value & width.mask()
    }
}

/// Executes the memory access stage of the pipeline.
///
/// # Arguments
///
/// * `cpu` - The CPU state at the start of the cycle.
/// * `entry` - The EX/MEM latch contents.
///
/// # Returns
///
/// The MEM/WB entry, whether the stage must stall, and the side effect to commit.
pub fn mem_stage(cpu: &Cpu, entry: &ExMemEntry) -> MemoryOutput {
    let mut out = MemWbEntry {
        pc: entry.pc,
        inst: entry.inst,
        rd: entry.rd,
        alu: entry.alu,
        ctrl: entry.ctrl,
        trap: entry.trap,
        ..MemWbEntry::default()
    };
    if entry.trap.is_some() {
        return MemoryOutput::done(out, MemAction::None);
    }

    let (width, signed, kind) = match entry.ctrl.mem {
        MemOp::None => return MemoryOutput::done(out, MemAction::None),
        MemOp::Load { width, signed } => (width, signed, AccessType::Read),
        MemOp::Store { width } => (width, false, AccessType::Write),
    };
    let addr = cpu.config.isa.xlen.addr(entry.alu);
    let value = entry.store_data & width.mask();

    let target = match cpu.controller.check(addr, width, kind) {
        Ok(target) => target,
        Err(fault) => {
            out.trap = Some(fault.into_trap(kind));
            if cpu.trace {
                trace!(pc = format_args!("{:#x}", entry.pc), addr = format_args!("{addr:#x}"), ?fault, "MEM fault");
            }
            return MemoryOutput::done(out, MemAction::None);
        }
    };

    if let Some(cache) = cpu.cache.as_ref().filter(|_| target.is_cacheable()) {
        return match cache.probe(addr) {
            Probe::Hit { set, way } => {
                if cpu.trace {
                    trace!(pc = format_args!("{:#x}", entry.pc), addr = format_args!("{addr:#x}"), "MEM hit");
                }
                if kind == AccessType::Read {
                    out.load_data = extend_load(cache.read(set, way, addr, width), width, signed);
                    MemoryOutput::done(out, MemAction::Touch { set, way })
                } else {
                    MemoryOutput::done(
                        out,
                        MemAction::Store {
                            set,
                            way,
                            addr,
                            width,
                            value,
                        },
                    )
                }
            }
            Probe::Fault(fault) => {
                if cpu.trace {
                    trace!(pc = format_args!("{:#x}", entry.pc), addr = format_args!("{addr:#x}"), ?fault, "MEM fill fault");
                }
                out.trap = Some(match kind {
                    AccessType::Write => Trap::StoreAccessFault(addr),
                    _ => Trap::LoadAccessFault(addr),
                });
                MemoryOutput::done(out, MemAction::ClearFault)
            }
            Probe::Miss if !cpu.controller.is_busy() => {
                MemoryOutput::wait(out, MemAction::Miss(addr))
            }
            Probe::Miss | Probe::Busy => MemoryOutput::wait(out, MemAction::None),
        };
    }

    let request = match kind {
        AccessType::Write => Request::Write { addr, width, value },
        _ => Request::Read { addr, width },
    };
    if let Some(completion) = cpu.uncached.response.as_ref().filter(|c| c.request == request) {
        match &completion.result {
            Ok(Response::Data(data)) => out.load_data = extend_load(*data, width, signed),
            Ok(_) => {}
            Err(fault) => out.trap = Some(fault.into_trap(kind)),
        }
        if cpu.trace {
            trace!(pc = format_args!("{:#x}", entry.pc), addr = format_args!("{addr:#x}"), "MEM uncached done");
        }
        return MemoryOutput::done(out, MemAction::Consume);
    }
    if cpu.uncached.pending || cpu.controller.is_busy() {
        return MemoryOutput::wait(out, MemAction::None);
    }
    MemoryOutput::wait(out, MemAction::Issue(request))
}
