//! Decode handlers (spec §4.E): given an addressing mode, consume the
//! right number of operand bytes from a [`ByteSource`] and compute
//! whatever this crate needs for rendering and label resolution.
//!
//! Each handler returns the raw operand bytes (for a `.db`-style dump on
//! malformed input), a rendered operand string that does not yet know
//! about labels, and — when the operand names a ROM address the label
//! resolver might attach a symbol to — that address.

use crate::decoder::{ByteSource, DecoderState};
use crate::error::Result;
use crate::opcode::AddressingMode;

/// The result of decoding one instruction's operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Raw operand bytes, in file order (not including the opcode byte).
    pub bytes: Vec<u8>,
    /// Operand rendered without any label substitution, e.g. `"$1234"`,
    /// `"#$12"`, `"$12,X"`.
    pub text: String,
    /// A 24-bit address this operand names, if any — the label resolver
    /// (spec §4.G) looks this up to decide whether to substitute a
    /// symbol for the raw text.
    pub target: Option<u32>,
}

impl Decoded {
    fn new(bytes: Vec<u8>, text: String, target: Option<u32>) -> Self {
        Self { bytes, text, target }
    }
}

/// Decode the operand for `mode` at the current decoder position.
///
/// `state` is read-only here: applying `REP`/`SEP` side effects to the
/// decoder state is the engine's job, once it has the decoded immediate
/// value in hand (spec §4.E.4). `data_bank_hint` is the byte-property
/// map's override for the bank an absolute 16-bit operand resolves
/// into (spec §4.G key policy); branch-relative modes ignore it and
/// always use the current bank.
pub fn decode_operand(
    mode: AddressingMode,
    state: &DecoderState,
    source: &mut dyn ByteSource,
    data_bank_hint: u8,
) -> Result<Decoded> {
    use AddressingMode::*;
    match mode {
        Implied | Accumulator => Ok(Decoded::new(vec![], String::new(), None)),

        Immediate => {
            if state.accum_16() {
                let v = source.read_u16()?;
                Ok(Decoded::new(v.to_le_bytes().to_vec(), format!("#${v:04X}"), None))
            } else {
                let v = source.read_u8()?;
                Ok(Decoded::new(vec![v], format!("#${v:02X}"), None))
            }
        }
        ImmediateXY => {
            if state.index_16() {
                let v = source.read_u16()?;
                Ok(Decoded::new(v.to_le_bytes().to_vec(), format!("#${v:04X}"), None))
            } else {
                let v = source.read_u8()?;
                Ok(Decoded::new(vec![v], format!("#${v:02X}"), None))
            }
        }
        ImmediateRep | ImmediateSep => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("#${v:02X}"), None))
        }

        Absolute => {
            let addr16 = source.read_u16()?;
            let target = crate::address::join(data_bank_hint, addr16);
            Ok(Decoded::new(addr16.to_le_bytes().to_vec(), format!("${addr16:04X}"), Some(target)))
        }
        AbsoluteLong => {
            let addr24 = source.read_u24()?;
            let bytes = addr24.to_le_bytes()[..3].to_vec();
            Ok(Decoded::new(bytes, format!("${addr24:06X}"), Some(addr24)))
        }
        AbsoluteIndexedX => {
            let addr16 = source.read_u16()?;
            let target = crate::address::join(data_bank_hint, addr16);
            Ok(Decoded::new(addr16.to_le_bytes().to_vec(), format!("${addr16:04X},X"), Some(target)))
        }
        AbsoluteIndexedY => {
            let addr16 = source.read_u16()?;
            let target = crate::address::join(data_bank_hint, addr16);
            Ok(Decoded::new(addr16.to_le_bytes().to_vec(), format!("${addr16:04X},Y"), Some(target)))
        }
        AbsoluteLongIndexedX => {
            let addr24 = source.read_u24()?;
            let bytes = addr24.to_le_bytes()[..3].to_vec();
            Ok(Decoded::new(bytes, format!("${addr24:06X},X"), Some(addr24)))
        }
        AbsoluteIndirect => {
            let addr16 = source.read_u16()?;
            let target = crate::address::join(data_bank_hint, addr16);
            Ok(Decoded::new(addr16.to_le_bytes().to_vec(), format!("(${addr16:04X})"), Some(target)))
        }
        AbsoluteIndirectLong => {
            let addr16 = source.read_u16()?;
            let target = crate::address::join(data_bank_hint, addr16);
            Ok(Decoded::new(addr16.to_le_bytes().to_vec(), format!("[${addr16:04X}]"), Some(target)))
        }
        AbsoluteIndexedIndirect => {
            let addr16 = source.read_u16()?;
            let target = crate::address::join(data_bank_hint, addr16);
            Ok(Decoded::new(addr16.to_le_bytes().to_vec(), format!("(${addr16:04X},X)"), Some(target)))
        }

        DirectPage => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("${v:02X}"), None))
        }
        DpIndexedX => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("${v:02X},X"), None))
        }
        DpIndexedY => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("${v:02X},Y"), None))
        }
        DpIndirect => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("(${v:02X})"), None))
        }
        DpIndirectLong => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("[${v:02X}]"), None))
        }
        DpIndirectIndexedY => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("(${v:02X}),Y"), None))
        }
        DpIndirectLongIndexedY => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("[${v:02X}],Y"), None))
        }
        DpIndexedIndirectX => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("(${v:02X},X)"), None))
        }

        StackRelative => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("${v:02X},S"), None))
        }
        SrIndirectIndexedY => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("(${v:02X},S),Y"), None))
        }
        StackDpIndirect => {
            let v = source.read_u8()?;
            Ok(Decoded::new(vec![v], format!("(${v:02X})"), None))
        }

        ProgramCounterRelative => {
            let offset = source.read_u8()? as i8;
            let next_ip = state.addr16() as i32 + 2;
            let target16 = (next_ip + offset as i32) as u16;
            let target = crate::address::join(state.bank(), target16);
            Ok(Decoded::new(vec![offset as u8], format!("${target16:04X}"), Some(target)))
        }
        ProgramCounterRelativeLong => {
            let offset = source.read_u16()? as i16;
            let next_ip = state.addr16() as i32 + 3;
            let target16 = (next_ip + offset as i32) as u16;
            let target = crate::address::join(state.bank(), target16);
            Ok(Decoded::new(offset.to_le_bytes().to_vec(), format!("${target16:04X}"), Some(target)))
        }
        StackPcRelativeLong => {
            let offset = source.read_u16()? as i16;
            let next_ip = state.addr16() as i32 + 3;
            let target16 = (next_ip + offset as i32) as u16;
            let target = crate::address::join(state.bank(), target16);
            Ok(Decoded::new(offset.to_le_bytes().to_vec(), format!("${target16:04X}"), Some(target)))
        }

        BlockMove => {
            let dst_bank = source.read_u8()?;
            let src_bank = source.read_u8()?;
            Ok(Decoded::new(
                vec![dst_bank, src_bank],
                format!("${src_bank:02X},${dst_bank:02X}"),
                None,
            ))
        }

        LongPointer => {
            let addr24 = source.read_u24()?;
            let bytes = addr24.to_le_bytes()[..3].to_vec();
            Ok(Decoded::new(bytes, format!("${addr24:06X}"), Some(addr24)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::RomMode;
    use crate::decoder::RomBytes;

    fn state(accum_16: bool, index_16: bool) -> DecoderState {
        DecoderState::new(RomMode::LoRom, 0x00, 0x8000, accum_16, index_16)
    }

    #[test]
    fn immediate_sizes_with_accumulator_width() {
        let mut source = RomBytes::new(vec![0x42, 0x99]);
        let d8 = decode_operand(AddressingMode::Immediate, &state(false, false), &mut source, 0x00).unwrap();
        assert_eq!(d8.text, "#$42");
        assert_eq!(d8.bytes, vec![0x42]);

        let mut source16 = RomBytes::new(vec![0x34, 0x12]);
        let d16 = decode_operand(AddressingMode::Immediate, &state(true, false), &mut source16, 0x00).unwrap();
        assert_eq!(d16.text, "#$1234");
    }

    #[test]
    fn absolute_target_uses_data_bank_hint() {
        let mut source = RomBytes::new(vec![0x00, 0x90]);
        let decoded = decode_operand(AddressingMode::Absolute, &state(false, false), &mut source, 0x00).unwrap();
        assert_eq!(decoded.target, Some(0x009000));
        assert_eq!(decoded.text, "$9000");
    }

    #[test]
    fn absolute_target_ignores_current_bank_when_hint_differs() {
        let mut source = RomBytes::new(vec![0x00, 0x90]);
        let decoded = decode_operand(AddressingMode::Absolute, &state(false, false), &mut source, 0x7E).unwrap();
        assert_eq!(decoded.target, Some(0x7E9000));
    }

    #[test]
    fn branch_target_is_relative_to_next_instruction() {
        let mut source = RomBytes::new(vec![0x02]); // +2
        let decoded =
            decode_operand(AddressingMode::ProgramCounterRelative, &state(false, false), &mut source, 0x7E)
                .unwrap();
        // current addr16 0x8000, next_ip = 0x8002, +2 => 0x8004; branch ignores the hint
        assert_eq!(decoded.target, Some(0x008004));
    }

    #[test]
    fn branch_target_handles_negative_offset() {
        let mut source = RomBytes::new(vec![0xFE]); // -2
        let decoded =
            decode_operand(AddressingMode::ProgramCounterRelative, &state(false, false), &mut source, 0x00)
                .unwrap();
        // next_ip = 0x8002, -2 => 0x8000
        assert_eq!(decoded.target, Some(0x008000));
    }

    #[test]
    fn absolute_long_reads_three_bytes() {
        let mut source = RomBytes::new(vec![0x00, 0x80, 0x01]);
        let decoded = decode_operand(AddressingMode::AbsoluteLong, &state(false, false), &mut source, 0x00).unwrap();
        assert_eq!(decoded.target, Some(0x018000));
        assert_eq!(decoded.bytes.len(), 3);
    }

    #[test]
    fn absolute_indexed_x_and_y_target_via_data_bank_hint() {
        let mut source_x = RomBytes::new(vec![0x00, 0x90]);
        let x = decode_operand(AddressingMode::AbsoluteIndexedX, &state(false, false), &mut source_x, 0x7E).unwrap();
        assert_eq!(x.target, Some(0x7E9000));
        assert_eq!(x.text, "$9000,X");

        let mut source_y = RomBytes::new(vec![0x00, 0x90]);
        let y = decode_operand(AddressingMode::AbsoluteIndexedY, &state(false, false), &mut source_y, 0x7E).unwrap();
        assert_eq!(y.target, Some(0x7E9000));
        assert_eq!(y.text, "$9000,Y");
    }

    #[test]
    fn absolute_long_indexed_x_targets_its_own_24_bit_operand() {
        let mut source = RomBytes::new(vec![0x00, 0x80, 0x01]);
        let decoded =
            decode_operand(AddressingMode::AbsoluteLongIndexedX, &state(false, false), &mut source, 0x00).unwrap();
        assert_eq!(decoded.target, Some(0x018000));
        assert_eq!(decoded.text, "$018000,X");
    }

    #[test]
    fn implied_and_accumulator_consume_nothing() {
        let mut source = RomBytes::new(vec![0xFF]);
        let implied =
            decode_operand(AddressingMode::Implied, &state(false, false), &mut source, 0x00).unwrap();
        assert!(implied.bytes.is_empty());
        assert!(implied.target.is_none());
        // cursor untouched, next read still sees 0xFF
        assert_eq!(source.read_u8().unwrap(), 0xFF);
    }
}
