//! Hazard Unit.
//!
//! Decides once per cycle, from the outputs every stage computed against the current
//! latch contents, which latches advance, hold, or are cleared, and where fetch goes
//! next. Priority, highest first:
//! 1. **Trap, interrupt, trap return, or halt at write-back:** Every latch is flushed and
//!    fetch redirects to the vector or return address.
//! 2. **Memory-stage stall:** A cache miss, a busy cache, or a pending uncached access
//!    holds the memory stage and everything younger; a bubble enters write-back.
//!    A taken branch held in execute waits and redirects when it finally leaves.
//! 3. **Taken branch or jump in execute:** The two younger instructions are flushed and
//!    fetch redirects to the target.
//! 4. **Load-use hazard:** The consumer is held in decode and a bubble enters execute.
//! 5. **Otherwise:** Every latch advances.
//!
//! Stall and flush are mutually exclusive per latch by construction.

use tracing::debug;

use crate::core::pipeline::latches::IdExEntry;
use crate::core::pipeline::signals::ControlSignals;

/// What a latch does at the end of the cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageAction {
    /// Take the upstream stage's output.
    Advance,
    /// Hold the current contents.
    Stall,
    /// Clear to a bubble.
    Flush,
}

/// What the program counter does at the end of the cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PcAction {
    /// Sequential fetch, `pc + 4`.
    Next,
    /// Fetch the same address again.
    Hold,
    /// Redirect to the given address.
    Redirect(u64),
}

/// Which rule produced a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardCause {
    /// No hazard.
    None,
    /// Write-back redirect or halt.
    Writeback,
    /// Memory-stage stall.
    MemoryStall,
    /// Taken branch or jump.
    Branch,
    /// Load-use or CSR-use dependency.
    LoadUse,
}

/// Per-cycle hazard signals gathered from the stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HazardInputs {
    /// Write-back redirects fetch (trap entry, interrupt, or `MRET`).
    pub wb_redirect: Option<u64>,
    /// Write-back stops the machine.
    pub halt: bool,
    /// The memory stage cannot complete its access this cycle.
    pub mem_stall: bool,
    /// Execute resolved a taken branch or jump.
    pub ex_redirect: Option<u64>,
    /// The instruction in decode needs a late result from the instruction in execute.
    pub load_use: bool,
}

/// Per-latch actions and the PC update for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HazardDecision {
    /// IF/ID latch.
    pub if_id: StageAction,
    /// ID/EX latch.
    pub id_ex: StageAction,
    /// EX/MEM latch.
    pub ex_mem: StageAction,
    /// MEM/WB latch.
    pub mem_wb: StageAction,
    /// Program counter.
    pub pc: PcAction,
    /// Rule that fired.
    pub cause: HazardCause,
}

impl HazardDecision {
    const fn uniform(action: StageAction, pc: PcAction, cause: HazardCause) -> Self {
        Self {
            if_id: action,
            id_ex: action,
            ex_mem: action,
            mem_wb: action,
            pc,
            cause,
        }
    }
}

/// Hazard detection and resolution.
#[derive(Debug, Clone, Copy)]
pub struct HazardUnit;

impl HazardUnit {
    /// Applies the priority rules to one cycle's hazard signals.
    pub fn decide(inputs: &HazardInputs) -> HazardDecision {
        let decision = if inputs.halt {
            HazardDecision::uniform(StageAction::Flush, PcAction::Hold, HazardCause::Writeback)
        } else if let Some(target) = inputs.wb_redirect {
            HazardDecision::uniform(
                StageAction::Flush,
                PcAction::Redirect(target),
                HazardCause::Writeback,
            )
        } else if inputs.mem_stall {
            HazardDecision {
                mem_wb: StageAction::Flush,
                ..HazardDecision::uniform(
                    StageAction::Stall,
                    PcAction::Hold,
                    HazardCause::MemoryStall,
                )
            }
        } else if let Some(target) = inputs.ex_redirect {
            HazardDecision {
                if_id: StageAction::Flush,
                id_ex: StageAction::Flush,
                ..HazardDecision::uniform(
                    StageAction::Advance,
                    PcAction::Redirect(target),
                    HazardCause::Branch,
                )
            }
        } else if inputs.load_use {
            HazardDecision {
                if_id: StageAction::Stall,
                id_ex: StageAction::Flush,
                ..HazardDecision::uniform(StageAction::Advance, PcAction::Hold, HazardCause::LoadUse)
            }
        } else {
            HazardDecision::uniform(StageAction::Advance, PcAction::Next, HazardCause::None)
        };

        if decision.cause != HazardCause::None {
            debug!(cause = ?decision.cause, pc = ?decision.pc, "hazard");
        }
        decision
    }

    /// Detects a dependency on a result that will not be forwardable in time.
    ///
    /// The consumer is the instruction in decode; the producer is the instruction in
    /// execute. Loads and CSR reads only produce their value in a later stage.
    ///
    /// # Arguments
    ///
    /// * `producer` - ID/EX latch contents.
    /// * `consumer` - Control signals decoded for the instruction in IF/ID.
    /// * `rs1` - First source register of the consumer.
    /// * `rs2` - Second source register of the consumer.
    ///
    /// # Returns
    ///
    /// `true` if the consumer must wait one cycle in decode.
    pub const fn load_use(
        producer: Option<&IdExEntry>,
        consumer: &ControlSignals,
        rs1: usize,
        rs2: usize,
    ) -> bool {
        let Some(p) = producer else {
            return false;
        };
        if p.trap.is_some() || !p.ctrl.reg_write || p.rd == 0 || !p.ctrl.late_result() {
            return false;
        }
        (consumer.uses_rs1 && rs1 == p.rd) || (consumer.uses_rs2 && rs2 == p.rd)
    }
}
