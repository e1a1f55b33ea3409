//! Static opcode table (spec §4.C).
//!
//! Built once, keyed by a 9-bit opcode: the 256 real 65816 opcodes plus
//! two synthetic pointer-emission pseudo-ops (`0x100`, `0x101`). The
//! table is total over `0..=0x101` by construction, so looking up an
//! opcode byte can never fail.

use bitflags::bitflags;

bitflags! {
    /// Per-instruction metadata bits (`proto.h`'s `ALWAYS_USE_LABEL` / `NO_ADDR_LABEL`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InstructionFlags: u8 {
        /// Always resolve a label for this instruction's operand, even
        /// when it wouldn't otherwise be considered label-worthy.
        const ALWAYS_LABEL = 0b01;
        /// Never resolve an address label for this instruction's operand
        /// (used for the Accumulator addressing mode, which has no address).
        const NO_ADDR_LABEL = 0b10;
    }
}

/// Addressing modes a decode handler must support (spec §4.E, exhaustive list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ImmediateXY,
    ImmediateSep,
    ImmediateRep,
    Absolute,
    AbsoluteLong,
    AbsoluteIndexedX,
    AbsoluteIndexedY,
    AbsoluteLongIndexedX,
    AbsoluteIndirect,
    AbsoluteIndirectLong,
    AbsoluteIndexedIndirect,
    DirectPage,
    DpIndexedX,
    DpIndexedY,
    DpIndirect,
    DpIndirectLong,
    DpIndirectIndexedY,
    DpIndirectLongIndexedY,
    DpIndexedIndirectX,
    StackRelative,
    SrIndirectIndexedY,
    ProgramCounterRelative,
    ProgramCounterRelativeLong,
    StackPcRelativeLong,
    StackDpIndirect,
    BlockMove,
    LongPointer,
}

/// Metadata for one opcode: mnemonic, addressing mode, flag bits.
#[derive(Debug, Clone, Copy)]
pub struct InstructionMeta {
    pub mnemonic: &'static str,
    pub opcode: u16,
    pub mode: AddressingMode,
    pub flags: InstructionFlags,
}

impl InstructionMeta {
    const fn new(mnemonic: &'static str, opcode: u16, mode: AddressingMode) -> Self {
        Self {
            mnemonic,
            opcode,
            mode,
            flags: InstructionFlags::empty(),
        }
    }

    const fn with_flags(mut self, flags: InstructionFlags) -> Self {
        self.flags = flags;
        self
    }

    /// `RTS` / `RTL` / `RTI` — valid `stop_at_rts` terminators.
    pub fn is_return(&self) -> bool {
        matches!(self.opcode, 0x40 | 0x60 | 0x6B)
    }

    /// Branch instructions use the current bank, never the operand bank,
    /// when resolving their target label (spec §4.G key policy).
    pub fn is_branch(&self) -> bool {
        matches!(
            self.mode,
            AddressingMode::ProgramCounterRelative | AddressingMode::ProgramCounterRelativeLong
        )
    }

    /// Display name, applying the `.W` suffix convention (original
    /// source `proto.h` — accumulator-mode opcodes render as `OP.W` when
    /// the accumulator is in 16-bit mode at decode time).
    pub fn display_name(&self, accum_16: bool) -> String {
        if matches!(self.mode, AddressingMode::Accumulator) && accum_16 {
            format!("{}.W", self.mnemonic)
        } else {
            self.mnemonic.to_string()
        }
    }
}

/// Opcode used by the pointer emitter for 16-bit pointer table entries.
pub const PSEUDO_OPCODE_SHORT_PTR: u16 = 0x100;
/// Opcode used by the pointer emitter for 24-bit pointer table entries.
pub const PSEUDO_OPCODE_LONG_PTR: u16 = 0x101;

/// The 256-entry (+2 synthetic) opcode table.
pub struct OpcodeTable {
    entries: Vec<InstructionMeta>,
}

impl OpcodeTable {
    /// Build the table. Every real opcode `0x00..=0xFF` is present;
    /// `0x100`/`0x101` are the synthetic pointer pseudo-ops.
    pub fn new() -> Self {
        let mut entries = vec![InstructionMeta::new("???", 0, AddressingMode::Implied); 0x102];
        for meta in REAL_OPCODES {
            entries[meta.opcode as usize] = *meta;
        }
        entries[PSEUDO_OPCODE_SHORT_PTR as usize] =
            InstructionMeta::new(".dw", PSEUDO_OPCODE_SHORT_PTR, AddressingMode::Absolute);
        entries[PSEUDO_OPCODE_LONG_PTR as usize] =
            InstructionMeta::new(".dw", PSEUDO_OPCODE_LONG_PTR, AddressingMode::LongPointer);
        Self { entries }
    }

    /// Look up opcode metadata. Total over `0..=0x101`; never fails.
    pub fn get(&self, opcode: u16) -> &InstructionMeta {
        &self.entries[opcode as usize]
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

use AddressingMode::*;

/// The full 65816 opcode table, transcribed from the original
/// `initialize_instruction_lookup` (one entry per real opcode byte).
const REAL_OPCODES: &[InstructionMeta] = &[
    InstructionMeta::new("ADC", 0x69, Immediate),
    InstructionMeta::new("ADC", 0x6D, Absolute),
    InstructionMeta::new("ADC", 0x6F, AbsoluteLong),
    InstructionMeta::new("ADC", 0x65, DirectPage),
    InstructionMeta::new("ADC", 0x71, DpIndirectIndexedY),
    InstructionMeta::new("ADC", 0x77, DpIndirectLongIndexedY),
    InstructionMeta::new("ADC", 0x61, DpIndexedIndirectX),
    InstructionMeta::new("ADC", 0x75, DpIndexedX),
    InstructionMeta::new("ADC", 0x7D, AbsoluteIndexedX),
    InstructionMeta::new("ADC", 0x7F, AbsoluteLongIndexedX),
    InstructionMeta::new("ADC", 0x79, AbsoluteIndexedY),
    InstructionMeta::new("ADC", 0x72, DpIndirect),
    InstructionMeta::new("ADC", 0x67, DpIndirectLong),
    InstructionMeta::new("ADC", 0x63, StackRelative),
    InstructionMeta::new("ADC", 0x73, SrIndirectIndexedY),
    InstructionMeta::new("AND", 0x29, Immediate),
    InstructionMeta::new("AND", 0x2D, Absolute),
    InstructionMeta::new("AND", 0x2F, AbsoluteLong),
    InstructionMeta::new("AND", 0x25, DirectPage),
    InstructionMeta::new("AND", 0x31, DpIndirectIndexedY),
    InstructionMeta::new("AND", 0x37, DpIndirectLongIndexedY),
    InstructionMeta::new("AND", 0x21, DpIndexedIndirectX),
    InstructionMeta::new("AND", 0x35, DpIndexedX),
    InstructionMeta::new("AND", 0x3D, AbsoluteIndexedX),
    InstructionMeta::new("AND", 0x3F, AbsoluteLongIndexedX),
    InstructionMeta::new("AND", 0x39, AbsoluteIndexedY),
    InstructionMeta::new("AND", 0x32, DpIndirect),
    InstructionMeta::new("AND", 0x27, DpIndirectLong),
    InstructionMeta::new("AND", 0x23, StackRelative),
    InstructionMeta::new("AND", 0x33, SrIndirectIndexedY),
    InstructionMeta::new("ASL", 0x0E, Absolute),
    InstructionMeta::new("ASL", 0x06, DirectPage),
    InstructionMeta::new("ASL", 0x0A, Accumulator),
    InstructionMeta::new("ASL", 0x16, DpIndexedX),
    InstructionMeta::new("ASL", 0x1E, AbsoluteIndexedX),
    InstructionMeta::new("BCC", 0x90, ProgramCounterRelative),
    InstructionMeta::new("BCS", 0xB0, ProgramCounterRelative),
    InstructionMeta::new("BEQ", 0xF0, ProgramCounterRelative),
    InstructionMeta::new("BMI", 0x30, ProgramCounterRelative),
    InstructionMeta::new("BNE", 0xD0, ProgramCounterRelative),
    InstructionMeta::new("BPL", 0x10, ProgramCounterRelative),
    InstructionMeta::new("BRA", 0x80, ProgramCounterRelative),
    InstructionMeta::new("BRL", 0x82, ProgramCounterRelativeLong),
    InstructionMeta::new("BVC", 0x50, ProgramCounterRelative),
    InstructionMeta::new("BVS", 0x70, ProgramCounterRelative),
    InstructionMeta::new("BIT", 0x89, Immediate),
    InstructionMeta::new("BIT", 0x2C, Absolute),
    InstructionMeta::new("BIT", 0x24, DirectPage),
    InstructionMeta::new("BIT", 0x34, DpIndexedX),
    InstructionMeta::new("BIT", 0x3C, AbsoluteIndexedX),
    InstructionMeta::new("BRK", 0x00, Implied),
    InstructionMeta::new("CLC", 0x18, Implied),
    InstructionMeta::new("CLD", 0xD8, Implied),
    InstructionMeta::new("CLI", 0x58, Implied),
    InstructionMeta::new("CLV", 0xB8, Implied),
    InstructionMeta::new("CMP", 0xC9, Immediate),
    InstructionMeta::new("CMP", 0xCD, Absolute),
    InstructionMeta::new("CMP", 0xCF, AbsoluteLong),
    InstructionMeta::new("CMP", 0xC5, DirectPage),
    InstructionMeta::new("CMP", 0xD1, DpIndirectIndexedY),
    InstructionMeta::new("CMP", 0xD7, DpIndirectLongIndexedY),
    InstructionMeta::new("CMP", 0xC1, DpIndexedIndirectX),
    InstructionMeta::new("CMP", 0xD5, DpIndexedX),
    InstructionMeta::new("CMP", 0xDD, AbsoluteIndexedX),
    InstructionMeta::new("CMP", 0xDF, AbsoluteLongIndexedX),
    InstructionMeta::new("CMP", 0xD9, AbsoluteIndexedY),
    InstructionMeta::new("CMP", 0xD2, DpIndirect),
    InstructionMeta::new("CMP", 0xC7, DpIndirectLong),
    InstructionMeta::new("CMP", 0xC3, StackRelative),
    InstructionMeta::new("CMP", 0xD3, SrIndirectIndexedY),
    InstructionMeta::new("CPX", 0xE0, ImmediateXY),
    InstructionMeta::new("CPX", 0xEC, Absolute),
    InstructionMeta::new("CPX", 0xE4, DirectPage),
    InstructionMeta::new("CPY", 0xC0, ImmediateXY),
    InstructionMeta::new("CPY", 0xCC, Absolute),
    InstructionMeta::new("CPY", 0xC4, DirectPage),
    InstructionMeta::new("DEC", 0xCE, Absolute),
    InstructionMeta::new("DEC", 0xC6, DirectPage),
    InstructionMeta::new("DEC", 0x3A, Accumulator),
    InstructionMeta::new("DEC", 0xD6, DpIndexedX),
    InstructionMeta::new("DEC", 0xDE, AbsoluteIndexedX),
    InstructionMeta::new("DEX", 0xCA, Implied),
    InstructionMeta::new("DEY", 0x88, Implied),
    InstructionMeta::new("EOR", 0x49, Immediate),
    InstructionMeta::new("EOR", 0x4D, Absolute),
    InstructionMeta::new("EOR", 0x4F, AbsoluteLong),
    InstructionMeta::new("EOR", 0x45, DirectPage),
    InstructionMeta::new("EOR", 0x51, DpIndirectIndexedY),
    InstructionMeta::new("EOR", 0x57, DpIndirectLongIndexedY),
    InstructionMeta::new("EOR", 0x41, DpIndexedIndirectX),
    InstructionMeta::new("EOR", 0x55, DpIndexedX),
    InstructionMeta::new("EOR", 0x5D, AbsoluteIndexedX),
    InstructionMeta::new("EOR", 0x5F, AbsoluteLongIndexedX),
    InstructionMeta::new("EOR", 0x59, AbsoluteIndexedY),
    InstructionMeta::new("EOR", 0x52, DpIndirect),
    InstructionMeta::new("EOR", 0x47, DpIndirectLong),
    InstructionMeta::new("EOR", 0x43, StackRelative),
    InstructionMeta::new("EOR", 0x53, SrIndirectIndexedY),
    InstructionMeta::new("INC", 0xEE, Absolute),
    InstructionMeta::new("INC", 0xE6, DirectPage),
    InstructionMeta::new("INC", 0x1A, Accumulator),
    InstructionMeta::new("INC", 0xF6, DpIndexedX),
    InstructionMeta::new("INC", 0xFE, AbsoluteIndexedX),
    InstructionMeta::new("INX", 0xE8, Implied),
    InstructionMeta::new("INY", 0xC8, Implied),
    InstructionMeta::new("JMP", 0x5C, AbsoluteLong),
    InstructionMeta::new("JMP", 0xDC, AbsoluteIndirectLong),
    InstructionMeta::new("JMP", 0x4C, Absolute),
    InstructionMeta::new("JMP", 0x6C, AbsoluteIndirect),
    InstructionMeta::new("JMP", 0x7C, AbsoluteIndexedIndirect),
    InstructionMeta::new("JSL", 0x22, AbsoluteLong),
    InstructionMeta::new("JSR", 0x20, Absolute),
    InstructionMeta::new("JSR", 0xFC, AbsoluteIndexedIndirect),
    InstructionMeta::new("LDA", 0xA9, Immediate),
    InstructionMeta::new("LDA", 0xAD, Absolute),
    InstructionMeta::new("LDA", 0xAF, AbsoluteLong),
    InstructionMeta::new("LDA", 0xA5, DirectPage),
    InstructionMeta::new("LDA", 0xB1, DpIndirectIndexedY),
    InstructionMeta::new("LDA", 0xB7, DpIndirectLongIndexedY),
    InstructionMeta::new("LDA", 0xA1, DpIndexedIndirectX),
    InstructionMeta::new("LDA", 0xB5, DpIndexedX),
    InstructionMeta::new("LDA", 0xBD, AbsoluteIndexedX),
    InstructionMeta::new("LDA", 0xBF, AbsoluteLongIndexedX),
    InstructionMeta::new("LDA", 0xB9, AbsoluteIndexedY),
    InstructionMeta::new("LDA", 0xB2, DpIndirect),
    InstructionMeta::new("LDA", 0xA7, DpIndirectLong),
    InstructionMeta::new("LDA", 0xA3, StackRelative),
    InstructionMeta::new("LDA", 0xB3, SrIndirectIndexedY),
    InstructionMeta::new("LDX", 0xA2, ImmediateXY),
    InstructionMeta::new("LDX", 0xAE, Absolute),
    InstructionMeta::new("LDX", 0xA6, DirectPage),
    InstructionMeta::new("LDX", 0xB6, DpIndexedY),
    InstructionMeta::new("LDX", 0xBE, AbsoluteIndexedY),
    InstructionMeta::new("LDY", 0xA0, ImmediateXY),
    InstructionMeta::new("LDY", 0xAC, Absolute),
    InstructionMeta::new("LDY", 0xA4, DirectPage),
    InstructionMeta::new("LDY", 0xB4, DpIndexedX),
    InstructionMeta::new("LDY", 0xBC, AbsoluteIndexedX),
    InstructionMeta::new("LSR", 0x4E, Absolute),
    InstructionMeta::new("LSR", 0x46, DirectPage),
    InstructionMeta::new("LSR", 0x4A, Accumulator),
    InstructionMeta::new("LSR", 0x56, DpIndexedX),
    InstructionMeta::new("LSR", 0x5E, AbsoluteIndexedX),
    InstructionMeta::new("NOP", 0xEA, Implied),
    InstructionMeta::new("ORA", 0x09, Immediate),
    InstructionMeta::new("ORA", 0x0D, Absolute),
    InstructionMeta::new("ORA", 0x0F, AbsoluteLong),
    InstructionMeta::new("ORA", 0x05, DirectPage),
    InstructionMeta::new("ORA", 0x11, DpIndirectIndexedY),
    InstructionMeta::new("ORA", 0x17, DpIndirectLongIndexedY),
    InstructionMeta::new("ORA", 0x01, DpIndexedIndirectX),
    InstructionMeta::new("ORA", 0x15, DpIndexedX),
    InstructionMeta::new("ORA", 0x1D, AbsoluteIndexedX),
    InstructionMeta::new("ORA", 0x1F, AbsoluteLongIndexedX),
    InstructionMeta::new("ORA", 0x19, AbsoluteIndexedY),
    InstructionMeta::new("ORA", 0x12, DpIndirect),
    InstructionMeta::new("ORA", 0x07, DpIndirectLong),
    InstructionMeta::new("ORA", 0x03, StackRelative),
    InstructionMeta::new("ORA", 0x13, SrIndirectIndexedY),
    InstructionMeta::new("PEA", 0xF4, StackPcRelativeLong),
    InstructionMeta::new("PEI", 0xD4, StackDpIndirect),
    InstructionMeta::new("PER", 0x62, StackPcRelativeLong),
    InstructionMeta::new("PHA", 0x48, Implied),
    InstructionMeta::new("PHB", 0x8B, Implied),
    InstructionMeta::new("PHD", 0x0B, Implied),
    InstructionMeta::new("PHK", 0x4B, Implied),
    InstructionMeta::new("PHP", 0x08, Implied),
    InstructionMeta::new("PHX", 0xDA, Implied),
    InstructionMeta::new("PHY", 0x5A, Implied),
    InstructionMeta::new("PLA", 0x68, Implied),
    InstructionMeta::new("PLB", 0xAB, Implied),
    InstructionMeta::new("PLD", 0x2B, Implied),
    InstructionMeta::new("PLP", 0x28, Implied),
    InstructionMeta::new("PLX", 0xFA, Implied),
    InstructionMeta::new("PLY", 0x7A, Implied),
    InstructionMeta::new("REP", 0xC2, ImmediateRep),
    InstructionMeta::new("ROL", 0x2E, Absolute),
    InstructionMeta::new("ROL", 0x26, DirectPage),
    InstructionMeta::new("ROL", 0x2A, Accumulator),
    InstructionMeta::new("ROL", 0x36, DpIndexedX),
    InstructionMeta::new("ROL", 0x3E, AbsoluteIndexedX),
    InstructionMeta::new("ROR", 0x6E, Absolute),
    InstructionMeta::new("ROR", 0x66, DirectPage),
    InstructionMeta::new("ROR", 0x6A, Accumulator),
    InstructionMeta::new("ROR", 0x76, DpIndexedX),
    InstructionMeta::new("ROR", 0x7E, AbsoluteIndexedX),
    InstructionMeta::new("RTI", 0x40, Implied),
    InstructionMeta::new("RTL", 0x6B, Implied),
    InstructionMeta::new("RTS", 0x60, Implied),
    InstructionMeta::new("SBC", 0xE9, Immediate),
    InstructionMeta::new("SBC", 0xED, Absolute),
    InstructionMeta::new("SBC", 0xEF, AbsoluteLong),
    InstructionMeta::new("SBC", 0xE5, DirectPage),
    InstructionMeta::new("SBC", 0xF1, DpIndirectIndexedY),
    InstructionMeta::new("SBC", 0xF7, DpIndirectLongIndexedY),
    InstructionMeta::new("SBC", 0xE1, DpIndexedIndirectX),
    InstructionMeta::new("SBC", 0xF5, DpIndexedX),
    InstructionMeta::new("SBC", 0xFD, AbsoluteIndexedX),
    InstructionMeta::new("SBC", 0xFF, AbsoluteLongIndexedX),
    InstructionMeta::new("SBC", 0xF9, AbsoluteIndexedY),
    InstructionMeta::new("SBC", 0xF2, DpIndirect),
    InstructionMeta::new("SBC", 0xE7, DpIndirectLong),
    InstructionMeta::new("SBC", 0xE3, StackRelative),
    InstructionMeta::new("SBC", 0xF3, SrIndirectIndexedY),
    InstructionMeta::new("SEC", 0x38, Implied),
    InstructionMeta::new("SED", 0xF8, Implied),
    InstructionMeta::new("SEI", 0x78, Implied),
    InstructionMeta::new("SEP", 0xE2, ImmediateSep),
    InstructionMeta::new("STA", 0x8D, Absolute),
    InstructionMeta::new("STA", 0x8F, AbsoluteLong),
    InstructionMeta::new("STA", 0x85, DirectPage),
    InstructionMeta::new("STA", 0x91, DpIndirectIndexedY),
    InstructionMeta::new("STA", 0x97, DpIndirectLongIndexedY),
    InstructionMeta::new("STA", 0x81, DpIndexedIndirectX),
    InstructionMeta::new("STA", 0x95, DpIndexedX),
    InstructionMeta::new("STA", 0x9D, AbsoluteIndexedX),
    InstructionMeta::new("STA", 0x9F, AbsoluteLongIndexedX),
    InstructionMeta::new("STA", 0x99, AbsoluteIndexedY),
    InstructionMeta::new("STA", 0x92, DpIndirect),
    InstructionMeta::new("STA", 0x87, DpIndirectLong),
    InstructionMeta::new("STA", 0x83, StackRelative),
    InstructionMeta::new("STA", 0x93, SrIndirectIndexedY),
    InstructionMeta::new("STP", 0xDB, Implied),
    InstructionMeta::new("STX", 0x8E, Absolute),
    InstructionMeta::new("STX", 0x86, DirectPage),
    InstructionMeta::new("STX", 0x96, DpIndexedX),
    InstructionMeta::new("STY", 0x8C, Absolute),
    InstructionMeta::new("STY", 0x84, DirectPage),
    InstructionMeta::new("STY", 0x94, DpIndexedX),
    InstructionMeta::new("STZ", 0x9C, Absolute),
    InstructionMeta::new("STZ", 0x64, DirectPage),
    InstructionMeta::new("STZ", 0x74, DpIndexedX),
    InstructionMeta::new("STZ", 0x9E, AbsoluteIndexedX),
    InstructionMeta::new("TAX", 0xAA, Implied),
    InstructionMeta::new("TAY", 0xA8, Implied),
    InstructionMeta::new("TCD", 0x5B, Implied),
    InstructionMeta::new("TCS", 0x1B, Implied),
    InstructionMeta::new("TDC", 0x7B, Implied),
    InstructionMeta::new("TRB", 0x1C, Absolute),
    InstructionMeta::new("TRB", 0x14, DirectPage),
    InstructionMeta::new("TSB", 0x0C, Absolute),
    InstructionMeta::new("TSB", 0x04, DirectPage),
    InstructionMeta::new("TSC", 0x3B, Implied),
    InstructionMeta::new("TSX", 0xBA, Implied),
    InstructionMeta::new("TXA", 0x8A, Implied),
    InstructionMeta::new("TXS", 0x9A, Implied),
    InstructionMeta::new("TXY", 0x9B, Implied),
    InstructionMeta::new("TYA", 0x98, Implied),
    InstructionMeta::new("TYX", 0xBB, Implied),
    InstructionMeta::new("WAI", 0xCB, Implied),
    InstructionMeta::new("XBA", 0xEB, Implied),
    InstructionMeta::new("XCE", 0xFB, Implied),
    InstructionMeta::new("COP", 0x02, Implied),
    InstructionMeta::new("MVN", 0x54, BlockMove),
    InstructionMeta::new("MVP", 0x44, BlockMove),
    // Software-trap prefix byte; no real mnemonic, decoded as Implied
    // so the decoder still advances by exactly one byte.
    InstructionMeta::new("???", 0x42, Implied),
];
