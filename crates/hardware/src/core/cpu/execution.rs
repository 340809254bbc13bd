//! Main Execution Loop.
//!
//! This module implements one clock cycle of the core as two phases:
//! 1. **Evaluate:** Every stage computes its outputs from the state latched at the end of
//!    the previous cycle. Write-back is evaluated first so that the value it writes can be
//!    forwarded to execute in the same cycle. Nothing is mutated.
//! 2. **Commit:** The hazard unit's decision is applied. The memory controller advances,
//!    memory-side requests are issued, latches advance, stall, or flush, the PC moves,
//!    and register, CSR, and counter state update together.
//!
//! Because no component observes another's new state within a cycle, the order in which
//! the commit steps are written does not change the result.

use tracing::trace;

use super::Cpu;
use crate::core::pipeline::hazards::{
    HazardCause, HazardDecision, HazardInputs, HazardUnit, PcAction, StageAction,
};
use crate::core::pipeline::latches::{IdExEntry, IfIdEntry, Latch};
use crate::core::pipeline::stages::{
    ExecuteOutput, MemAction, MemoryOutput, WritebackOutput, decode_stage, execute_stage,
    fetch_stage, mem_stage, wb_stage,
};
use crate::core::pipeline::traits::{LatchEntry, PipelineLatch};

/// Everything the evaluate phase produced for one cycle.
#[derive(Clone, Debug)]
struct CycleOutputs {
    wb: Option<WritebackOutput>,
    mem: Option<MemoryOutput>,
    ex: Option<ExecuteOutput>,
    id: Option<IdExEntry>,
    fetch: IfIdEntry,
    decision: HazardDecision,
}

/// Applies one stage action to a latch.
fn apply<T: LatchEntry>(latch: &mut Latch<T>, action: StageAction, next: Option<T>) {
    match action {
        StageAction::Advance => latch.load(next),
        StageAction::Stall => {}
        StageAction::Flush => latch.flush(),
    }
}

impl Cpu {
    /// Advances the core by one clock cycle. Does nothing once halted.
    pub fn tick(&mut self) {
        if self.halted.is_some() {
            return;
        }
        let outputs = self.evaluate();
        self.commit(outputs);
    }

    /// Evaluate phase: combinational outputs of every stage and the hazard decision.
    fn evaluate(&self) -> CycleOutputs {
        let wb = self.mem_wb.get().map(|entry| wb_stage(self, entry));
        let forward = wb.and_then(|out| out.reg_write);
        let mem = self.ex_mem.get().map(|entry| mem_stage(self, entry));
        let ex = self
            .id_ex
            .get()
            .map(|entry| execute_stage(self, entry, forward));
        let id = self.if_id.get().map(|entry| decode_stage(self, entry));
        let fetch = fetch_stage(self);

        let load_use = id.as_ref().is_some_and(|entry| {
            entry.trap.is_none()
                && HazardUnit::load_use(self.id_ex.get(), &entry.ctrl, entry.rs1, entry.rs2)
        });
        let inputs = HazardInputs {
            wb_redirect: wb.and_then(|out| out.redirect),
            halt: wb.is_some_and(|out| out.halt.is_some()),
            mem_stall: mem.as_ref().is_some_and(|out| out.stall),
            ex_redirect: ex.and_then(|out| out.redirect),
            load_use,
        };
        let decision = HazardUnit::decide(&inputs);

        CycleOutputs {
            wb,
            mem,
            ex,
            id,
            fetch,
            decision,
        }
    }

    /// Commit phase: applies a cycle's outputs to the architectural and pipeline state.
    fn commit(&mut self, outputs: CycleOutputs) {
        let CycleOutputs {
            wb,
            mem,
            ex,
            id,
            fetch,
            decision,
        } = outputs;

        self.tick_controller();

        let killed = decision.cause == HazardCause::Writeback;
        let (mem_entry, mem_action) = match mem {
            Some(out) => (Some(out.entry), out.action),
            None => (None, MemAction::None),
        };
        self.commit_memory(mem_action, killed);
        if decision.ex_mem != StageAction::Stall {
            self.retire_access();
        }

        let mut retired = false;
        let mut csr_write = None;
        if let (Some(entry), Some(out)) = (self.mem_wb.get().copied(), wb) {
            self.commit_writeback(&entry, &out);
            retired = out.retired && out.halt.is_none();
            if retired {
                csr_write = out.csr_write;
            }
        }

        apply(&mut self.mem_wb, decision.mem_wb, mem_entry);
        apply(&mut self.ex_mem, decision.ex_mem, ex.map(|out| out.entry));
        apply(&mut self.id_ex, decision.id_ex, id);
        apply(&mut self.if_id, decision.if_id, Some(fetch));

        let xlen = self.config.isa.xlen;
        self.pc = match decision.pc {
            PcAction::Next => xlen.addr(self.pc.wrapping_add(4)),
            PcAction::Hold => self.pc,
            PcAction::Redirect(target) => xlen.addr(target),
        };

        self.update_csrs(retired, csr_write);
        self.sample_interrupts();

        let stats = &mut self.stats;
        stats.cycles += 1;
        stats.transactions = self.controller.transactions();
        match decision.cause {
            HazardCause::LoadUse => stats.stalls_load_use += 1,
            HazardCause::MemoryStall => stats.stalls_mem += 1,
            HazardCause::Branch => stats.branch_flushes += 1,
            HazardCause::None | HazardCause::Writeback => {}
        }

        if self.trace {
            trace!(
                cycle = self.stats.cycles,
                pc = format_args!("{:#x}", self.pc),
                if_id = ?self.if_id.get().map(LatchEntry::pc),
                id_ex = ?self.id_ex.get().map(LatchEntry::pc),
                ex_mem = ?self.ex_mem.get().map(LatchEntry::pc),
                mem_wb = ?self.mem_wb.get().map(LatchEntry::pc),
                "cycle"
            );
        }
    }
}
