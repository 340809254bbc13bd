//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics of the pipeline model. It provides:
//! 1. **Cycle and IPC:** Total cycles, retired instructions, and derived metrics (CPI, IPC).
//! 2. **Instruction mix:** Retired counts by category (ALU, load, store, branch, system).
//! 3. **Hazards:** Load-use stall cycles, memory stall cycles, and branch flushes.
//! 4. **Traps:** Synchronous traps and interrupts taken.
//! 5. **Memory:** Data cache hits, misses, write-backs, and controller transactions.

use std::fmt::Write as _;
use std::time::Instant;

use serde::Serialize;

use crate::core::pipeline::signals::{ControlSignals, CsrOp, FlowOp, SystemOp};

/// Simulation statistics structure tracking all performance metrics.
#[derive(Clone, Debug, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_retired: u64,

    /// Count of load instructions retired.
    pub inst_load: u64,
    /// Count of store instructions retired.
    pub inst_store: u64,
    /// Count of branch/jump instructions retired.
    pub inst_branch: u64,
    /// Count of ALU (non-load/store/branch/system) instructions retired.
    pub inst_alu: u64,
    /// Count of system (CSR, MRET, FENCE, WFI) instructions retired.
    pub inst_system: u64,

    /// Cycles decode waited behind a load or CSR read.
    pub stalls_load_use: u64,
    /// Cycles the memory stage waited on the cache or the controller.
    pub stalls_mem: u64,
    /// Taken branches and jumps that flushed the front of the pipeline.
    pub branch_flushes: u64,

    /// Number of synchronous traps taken.
    pub traps_taken: u64,
    /// Number of interrupts taken.
    pub interrupts_taken: u64,

    /// Data cache hit count.
    pub dcache_hits: u64,
    /// Data cache miss count.
    pub dcache_misses: u64,
    /// Dirty lines written back.
    pub dcache_writebacks: u64,
    /// Memory controller transactions issued.
    pub transactions: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_alu: 0,
            inst_system: 0,
            stalls_load_use: 0,
            stalls_mem: 0,
            branch_flushes: 0,
            traps_taken: 0,
            interrupts_taken: 0,
            dcache_hits: 0,
            dcache_misses: 0,
            dcache_writebacks: 0,
            transactions: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"hazards"`, `"instruction_mix"`, `"traps"`, `"memory"`.
pub const STATS_SECTIONS: &[&str] = &["summary", "hazards", "instruction_mix", "traps", "memory"];

impl SimStats {
    /// Counts one retired instruction in its mix category.
    pub const fn record_retire(&mut self, ctrl: &ControlSignals) {
        self.instructions_retired += 1;
        if ctrl.mem.is_load() {
            self.inst_load += 1;
        } else if ctrl.mem.is_store() {
            self.inst_store += 1;
        } else if !matches!(ctrl.flow, FlowOp::Next) {
            self.inst_branch += 1;
        } else if !matches!(ctrl.csr, CsrOp::None) || !matches!(ctrl.system, SystemOp::None) {
            self.inst_system += 1;
        } else {
            self.inst_alu += 1;
        }
    }

    /// Cycles per retired instruction (0 before anything retires).
    pub fn cpi(&self) -> f64 {
        if self.instructions_retired == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions_retired as f64
        }
    }

    /// Retired instructions per cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_retired as f64 / self.cycles as f64
        }
    }

    /// Renders the requested sections.
    ///
    /// # Arguments
    ///
    /// * `sections` - Section names from [`STATS_SECTIONS`], or empty for all of them.
    pub fn report(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let cyc = self.cycles.max(1) as f64;
        let instr = self.instructions_retired.max(1) as f64;
        let pct = |n: u64, of: f64| (n as f64 / of) * 100.0;
        let mut out = String::new();

        let _ = writeln!(out, "==========================================================");
        let _ = writeln!(out, "RISC-V PIPELINE SIMULATION STATISTICS");
        let _ = writeln!(out, "==========================================================");
        if want("summary") {
            let seconds = self.start_time.elapsed().as_secs_f64();
            let _ = writeln!(out, "host_seconds             {seconds:.4} s");
            let _ = writeln!(out, "sim_cycles               {}", self.cycles);
            let _ = writeln!(out, "sim_insts                {}", self.instructions_retired);
            let _ = writeln!(out, "sim_ipc                  {:.4}", self.ipc());
            let _ = writeln!(out, "sim_cpi                  {:.4}", self.cpi());
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("hazards") {
            let _ = writeln!(out, "HAZARDS");
            let _ = writeln!(
                out,
                "  stalls.load_use        {} ({:.2}%)",
                self.stalls_load_use,
                pct(self.stalls_load_use, cyc)
            );
            let _ = writeln!(
                out,
                "  stalls.memory          {} ({:.2}%)",
                self.stalls_mem,
                pct(self.stalls_mem, cyc)
            );
            let _ = writeln!(out, "  flushes.branch         {}", self.branch_flushes);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("instruction_mix") {
            let _ = writeln!(out, "INSTRUCTION MIX");
            for (name, count) in [
                ("op.alu", self.inst_alu),
                ("op.load", self.inst_load),
                ("op.store", self.inst_store),
                ("op.branch", self.inst_branch),
                ("op.system", self.inst_system),
            ] {
                let _ = writeln!(out, "  {name:<22} {count} ({:.2}%)", pct(count, instr));
            }
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("traps") {
            let _ = writeln!(out, "TRAPS");
            let _ = writeln!(out, "  traps.exceptions       {}", self.traps_taken);
            let _ = writeln!(out, "  traps.interrupts       {}", self.interrupts_taken);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("memory") {
            let total = self.dcache_hits + self.dcache_misses;
            let miss_rate = if total > 0 {
                pct(self.dcache_misses, total as f64)
            } else {
                0.0
            };
            let _ = writeln!(out, "MEMORY");
            let _ = writeln!(
                out,
                "  L1-D   accesses: {:<10} | hits: {:<10} | miss_rate: {miss_rate:.2}%",
                total, self.dcache_hits
            );
            let _ = writeln!(out, "  L1-D   writebacks: {}", self.dcache_writebacks);
            let _ = writeln!(out, "  controller transactions: {}", self.transactions);
        }
        let _ = writeln!(out, "==========================================================");
        out
    }

    /// Prints only the requested statistics sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.report(sections));
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
