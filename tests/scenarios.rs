//! End-to-end scenarios exercising the engine against raw byte streams,
//! without going through the CLI or ROM file loading.

use snes_disasm::address::RomMode;
use snes_disasm::annotations::AnnotationLoader;
use snes_disasm::decoder::RomBytes;
use snes_disasm::engine::Engine;
use snes_disasm::request::{Request, RequestProperties, RequestType};
use snes_disasm::sink::{Record, RecordCollectorSink};

fn run_asm(bytes: Vec<u8>, accum_16: bool) -> Vec<Record> {
    let mut engine = Engine::new(RomMode::LoRom);
    let end = bytes.len() as u16;
    let mut source = RomBytes::new(bytes);
    let props = RequestProperties::new()
        .with_range(0x00, 0x8000, 0x00, 0x8000 + end)
        .with_widths(accum_16, false);
    let request = Request::new(RequestType::Asm, props);
    let mut sink = RecordCollectorSink::new();
    engine.run(&request, &mut source, &mut sink).unwrap();
    sink.records
}

#[test]
fn five_nops_produce_five_plain_lines() {
    let records = run_asm(vec![0xEA; 5], false);
    assert_eq!(records.len(), 5);
    for record in &records {
        match record {
            Record::Instruction { mnemonic, label, .. } => {
                assert_eq!(mnemonic, "NOP");
                assert!(label.is_none());
            }
            other => panic!("expected an instruction record, got {other:?}"),
        }
    }
}

#[test]
fn sixteen_bit_accumulator_reads_a_two_byte_immediate() {
    let records = run_asm(vec![0xA9, 0x34, 0x12], true);
    assert_eq!(records.len(), 1);
    match &records[0] {
        Record::Instruction { mnemonic, operand, .. } => {
            assert_eq!(mnemonic, "LDA");
            assert_eq!(operand, "#$1234");
        }
        other => panic!("expected an instruction record, got {other:?}"),
    }
}

#[test]
fn eight_bit_accumulator_leaves_the_third_byte_as_its_own_instruction() {
    // A9 34 = LDA #$34 (one operand byte, 8-bit accumulator); the stray
    // 0x12 decodes as ORA (dp) and needs exactly one more operand byte —
    // padded here so the decoder has something to read.
    let records = run_asm(vec![0xA9, 0x34, 0x12, 0x00], false);
    assert_eq!(records.len(), 2);
    match &records[0] {
        Record::Instruction { mnemonic, operand, .. } => {
            assert_eq!(mnemonic, "LDA");
            assert_eq!(operand, "#$34");
        }
        other => panic!("expected an instruction record, got {other:?}"),
    }
    // the stray 0x12 is ORA (dp) — the decoder must consume exactly the
    // one operand byte DpIndirect advertises, not guess at LDA's width.
    match &records[1] {
        Record::Instruction { mnemonic, bytes, .. } => {
            assert_eq!(mnemonic, "ORA");
            assert_eq!(bytes.len(), 2);
        }
        other => panic!("expected an instruction record, got {other:?}"),
    }
}

#[test]
fn self_branch_discovers_and_emits_a_synthesized_label() {
    let records = run_asm(vec![0x80, 0xFE], false);
    assert_eq!(records.len(), 1);
    match &records[0] {
        Record::Instruction { mnemonic, operand, label, .. } => {
            assert_eq!(mnemonic, "BRA");
            assert_eq!(operand, "ADDR_008000");
            assert_eq!(label.as_deref(), Some("ADDR_008000"));
        }
        other => panic!("expected an instruction record, got {other:?}"),
    }
}

#[test]
fn annotated_data_region_emits_a_single_labelled_data_line() {
    let mut engine = Engine::new(RomMode::LoRom);
    let annotation = {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "008010 008014 1\n").unwrap();
        file
    };
    AnnotationLoader::load_data(engine.map_mut(), annotation.path()).unwrap();

    let mut rom = vec![0u8; 0x10];
    rom.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    let mut source = RomBytes::new(rom);
    let props = RequestProperties::new().with_range(0x00, 0x8010, 0x00, 0x8014);
    let request = Request::new(RequestType::Dcb, props);
    let mut sink = RecordCollectorSink::new();
    engine.run(&request, &mut source, &mut sink).unwrap();

    assert_eq!(sink.records.len(), 1);
    match &sink.records[0] {
        Record::Data { bytes, .. } => assert_eq!(bytes, &[0xDE, 0xAD, 0xBE, 0xEF]),
        other => panic!("expected a data record, got {other:?}"),
    }
    let index = engine.map().index_of(0x00, 0x8010);
    assert_eq!(engine.map().get(index).label.as_deref(), Some("DATA_008010"));
}

#[test]
fn annotated_pointer_table_resolves_both_entries_against_a_labelled_target() {
    let mut engine = Engine::new(RomMode::LoRom);
    let data_annotation = {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "008020 008024 2\n").unwrap();
        file
    };
    AnnotationLoader::load_data(engine.map_mut(), data_annotation.path()).unwrap();
    let symbols = {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "008000 ENTRY_POINT\n").unwrap();
        file
    };
    AnnotationLoader::load_symbols(engine.map_mut(), symbols.path()).unwrap();

    let mut rom = vec![0u8; 0x20];
    rom.extend_from_slice(&[0x00, 0x80, 0x34, 0x12]);
    let mut source = RomBytes::new(rom);
    let mut props = RequestProperties::new().with_range(0x00, 0x8020, 0x00, 0x8024).two_pass();
    props.use_extern_symbols = true;
    let request = Request::new(RequestType::Ptr, props);
    let mut sink = RecordCollectorSink::new();
    engine.run(&request, &mut source, &mut sink).unwrap();

    assert_eq!(sink.records.len(), 2);
    match &sink.records[0] {
        Record::Pointer { target, label, is_long, .. } => {
            assert_eq!(*target, 0x008000);
            assert!(!is_long);
            assert_eq!(label.as_deref(), Some("ENTRY_POINT"));
        }
        other => panic!("expected a pointer record, got {other:?}"),
    }
    match &sink.records[1] {
        Record::Pointer { target, is_long, .. } => {
            assert_eq!(*target, 0x001234);
            assert!(!is_long);
        }
        other => panic!("expected a pointer record, got {other:?}"),
    }
}
