//! Forwarding Unit Tests.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpipe_core::core::pipeline::forwarding::{ForwardSource, ForwardingUnit, Producer};

use crate::common::builder::pipeline_state::EntryBuilder;

fn producer(rd: usize, value: u64) -> Option<Producer> {
    Some(Producer { rd, value })
}

#[rstest]
#[case::no_producers(5, None, None, ForwardSource::RegFile)]
#[case::memory_match(5, producer(5, 1), None, ForwardSource::Memory)]
#[case::writeback_match(5, None, producer(5, 2), ForwardSource::Writeback)]
#[case::memory_beats_writeback(5, producer(5, 1), producer(5, 2), ForwardSource::Memory)]
#[case::other_register(5, producer(6, 1), producer(7, 2), ForwardSource::RegFile)]
#[case::x0_never_forwarded(0, producer(0, 1), producer(0, 2), ForwardSource::RegFile)]
fn source_selection(
    #[case] src: usize,
    #[case] mem: Option<Producer>,
    #[case] wb: Option<Producer>,
    #[case] expected: ForwardSource,
) {
    assert_eq!(ForwardingUnit::select(src, mem, wb), expected);
}

#[test]
fn operand_takes_value_of_selected_source() {
    assert_eq!(
        ForwardingUnit::operand(3, 100, producer(3, 7), producer(3, 8)),
        (7, ForwardSource::Memory)
    );
    assert_eq!(
        ForwardingUnit::operand(3, 100, producer(4, 7), producer(3, 8)),
        (8, ForwardSource::Writeback)
    );
    assert_eq!(
        ForwardingUnit::operand(3, 100, None, None),
        (100, ForwardSource::RegFile)
    );
}

#[test]
fn alu_result_in_ex_mem_is_a_producer() {
    let entry = EntryBuilder::alu(4).value(0x55).ex_mem();
    assert_eq!(Producer::from_ex_mem(&entry), producer(4, 0x55));
}

#[rstest]
#[case::load(EntryBuilder::load(4))]
#[case::csr_read(EntryBuilder::csr(4, 0x300))]
#[case::store(EntryBuilder::store())]
#[case::writes_x0(EntryBuilder::alu(0))]
#[case::trapped(EntryBuilder::alu(4).trapped())]
fn ex_mem_entries_without_a_ready_value(#[case] builder: EntryBuilder) {
    assert_eq!(Producer::from_ex_mem(&builder.value(1).ex_mem()), None);
}

#[test]
fn loads_and_csr_reads_forward_from_write_back() {
    let load = EntryBuilder::load(9).mem_wb();
    assert_eq!(Producer::from_mem_wb(&load, 0xAB), producer(9, 0xAB));

    let csr = EntryBuilder::csr(9, 0xB00).mem_wb();
    assert_eq!(Producer::from_mem_wb(&csr, 12), producer(9, 12));

    let trapped = EntryBuilder::load(9).trapped().mem_wb();
    assert_eq!(Producer::from_mem_wb(&trapped, 0xAB), None);
}
