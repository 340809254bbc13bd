//! Statistics Tests.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpipe_core::common::Width;
use rvpipe_core::core::pipeline::signals::{
    BranchCond, ControlSignals, CsrOp, FlowOp, MemOp, SystemOp,
};
use rvpipe_core::stats::{STATS_SECTIONS, SimStats};

use crate::common::builder::instruction::{asm, ecall};
use crate::common::harness::{RAM, TestContext};

#[test]
fn rates_before_anything_runs_are_zero() {
    let stats = SimStats::default();
    assert_eq!(stats.cpi(), 0.0);
    assert_eq!(stats.ipc(), 0.0);
}

#[test]
fn cpi_and_ipc_are_reciprocal() {
    let mut stats = SimStats::default();
    stats.cycles = 10;
    stats.instructions_retired = 4;
    assert_eq!(stats.cpi(), 2.5);
    assert_eq!(stats.ipc(), 0.4);
}

#[rstest]
#[case::store(ControlSignals { mem: MemOp::Store { width: Width::Byte }, ..ControlSignals::default() }, "store")]
#[case::branch(ControlSignals { flow: FlowOp::Branch(BranchCond::Eq), ..ControlSignals::default() }, "branch")]
#[case::jal(ControlSignals { flow: FlowOp::Jal, ..ControlSignals::default() }, "branch")]
#[case::csr(ControlSignals { csr: CsrOp::Set, ..ControlSignals::default() }, "system")]
#[case::mret(ControlSignals { system: SystemOp::Mret, ..ControlSignals::default() }, "system")]
#[case::alu(ControlSignals::default(), "alu")]
fn instruction_mix_category(#[case] ctrl: ControlSignals, #[case] category: &str) {
    let mut stats = SimStats::default();
    stats.record_retire(&ctrl);
    let counts = [
        ("alu", stats.inst_alu),
        ("store", stats.inst_store),
        ("branch", stats.inst_branch),
        ("system", stats.inst_system),
    ];
    for (name, count) in counts {
        assert_eq!(count, u64::from(name == category), "{name}");
    }
    assert_eq!(stats.inst_load, 0);
}

#[test]
fn full_report_has_every_section() {
    let text = SimStats::default().report(&[]);
    for header in ["sim_cycles", "HAZARDS", "INSTRUCTION MIX", "TRAPS", "MEMORY"] {
        assert!(text.contains(header), "missing {header}");
    }
    assert_eq!(STATS_SECTIONS.len(), 5);
}

#[test]
fn report_reflects_a_run() {
    let mut ctx = TestContext::new().load_program(
        0,
        &[
            asm().addi(1, 0, 1).build(),
            asm().slli(1, 1, 31).build(),
            asm().lw(2, 1, 0).build(),
            asm().addi(3, 2, 1).build(),
            ecall(),
        ],
    );
    ctx = ctx.load_data(RAM, &[7, 0, 0, 0]);

    let _ = ctx.run_to_halt();
    let stats = ctx.sim.stats();

    assert_eq!(ctx.get_reg(3), 8);
    assert_eq!(stats.inst_load, 1);
    assert_eq!(stats.dcache_misses, 1);
    assert_eq!(stats.transactions, 1);
    assert!(stats.stalls_load_use >= 1);

    let text = stats.report(&["memory".to_owned(), "summary".to_owned()]);
    assert!(text.contains("controller transactions: 1"));
    let insts = text.lines().find(|l| l.starts_with("sim_insts")).unwrap();
    assert!(insts.ends_with(&stats.instructions_retired.to_string()));
    assert!(!text.contains("HAZARDS"));
}

#[test]
fn stats_serialize_without_the_host_clock() {
    let json = serde_json::to_value(SimStats::default()).unwrap();
    assert_eq!(json["cycles"], 0);
    assert!(json.get("start_time").is_none());
}
