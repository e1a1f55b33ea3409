//! Decoder state and the byte-source capability (spec §4.D).
//!
//! `DecoderState` tracks the handful of things that change how the
//! *same* opcode byte is interpreted: current `(bank, addr16)`, and the
//! accumulator/index width flags. `ByteSource` is the minimal seek/read
//! capability the engine needs from a ROM image; it is a trait so tests
//! can exercise the decoder against an in-memory buffer instead of a
//! real file.

use byteorder::{ByteOrder, LittleEndian};

use crate::address::{self, RomMode};
use crate::byte_map::WidthReset;
use crate::error::{DisasmError, Result};

/// Bit assigned to the accumulator width in `REP`/`SEP`'s immediate operand.
pub const WIDTH_BIT_ACCUM: u8 = 0x20;
/// Bit assigned to the index-register width in `REP`/`SEP`'s immediate operand.
pub const WIDTH_BIT_INDEX: u8 = 0x10;

/// Mutable decode-time state: position plus register widths.
///
/// Width flags here mirror the 65816's `P` register bits but only the
/// two this crate needs to size immediate operands (spec §4.E.4); carry,
/// zero, and the other processor flags play no role in disassembly.
#[derive(Debug, Clone, Copy)]
pub struct DecoderState {
    mode: RomMode,
    bank: u8,
    addr16: u16,
    accum_16: bool,
    index_16: bool,
}

impl DecoderState {
    pub fn new(mode: RomMode, bank: u8, addr16: u16, accum_16: bool, index_16: bool) -> Self {
        Self {
            mode,
            bank,
            addr16,
            accum_16,
            index_16,
        }
    }

    pub fn mode(&self) -> RomMode {
        self.mode
    }

    pub fn bank(&self) -> u8 {
        self.bank
    }

    pub fn addr16(&self) -> u16 {
        self.addr16
    }

    pub fn accum_16(&self) -> bool {
        self.accum_16
    }

    pub fn index_16(&self) -> bool {
        self.index_16
    }

    /// Current position as a 24-bit address.
    pub fn current_address(&self) -> u32 {
        address::join(self.bank, self.addr16)
    }

    /// Current position as a linear index into a [`crate::byte_map::BytePropertyMap`].
    pub fn current_index(&self) -> usize {
        address::to_index(self.bank, self.addr16, self.mode)
    }

    pub fn set_address(&mut self, bank: u8, addr16: u16) {
        self.bank = bank;
        self.addr16 = addr16;
    }

    /// Advance the current position by `count` bytes, rolling over bank
    /// boundaries as `address::advance` defines.
    pub fn advance(&mut self, count: u16) {
        for _ in 0..count {
            let (bank, addr16) = address::advance(self.bank, self.addr16, self.mode);
            self.bank = bank;
            self.addr16 = addr16;
        }
    }

    /// Apply a `REP #mask` (clear the named width bits — wider operands).
    pub fn apply_rep(&mut self, mask: u8) {
        if mask & WIDTH_BIT_ACCUM != 0 {
            self.accum_16 = true;
        }
        if mask & WIDTH_BIT_INDEX != 0 {
            self.index_16 = true;
        }
    }

    /// Apply a `SEP #mask` (set the named width bits — narrower operands).
    pub fn apply_sep(&mut self, mask: u8) {
        if mask & WIDTH_BIT_ACCUM != 0 {
            self.accum_16 = false;
        }
        if mask & WIDTH_BIT_INDEX != 0 {
            self.index_16 = false;
        }
    }

    /// Apply an annotation-driven width override at an instruction boundary.
    /// `WidthReset::Unset` leaves the current flag untouched.
    pub fn apply_width_resets(&mut self, accum: WidthReset, index: WidthReset) {
        match accum {
            WidthReset::Bits8 => self.accum_16 = false,
            WidthReset::Bits16 => self.accum_16 = true,
            WidthReset::Unset => {}
        }
        match index {
            WidthReset::Bits8 => self.index_16 = false,
            WidthReset::Bits16 => self.index_16 = true,
            WidthReset::Unset => {}
        }
    }
}

/// Minimal seek/read capability over a ROM image, indexed by the same
/// linear file index `BytePropertyMap` uses.
pub trait ByteSource {
    /// Total number of bytes available.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the read cursor to `index`. Errors if `index > len()`.
    fn seek(&mut self, index: usize) -> Result<()>;

    /// Read one byte at the cursor and advance it by one.
    fn read_u8(&mut self) -> Result<u8>;

    /// Read a little-endian `u16` and advance the cursor by two.
    fn read_u16(&mut self) -> Result<u16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(LittleEndian::read_u16(&[lo, hi]))
    }

    /// Read a little-endian 24-bit value and advance the cursor by three.
    fn read_u24(&mut self) -> Result<u32> {
        let lo = self.read_u8()?;
        let mid = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(LittleEndian::read_u24(&[lo, mid, hi]))
    }
}

/// A ROM image held entirely in memory.
pub struct RomBytes {
    data: Vec<u8>,
    cursor: usize,
}

impl RomBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl ByteSource for RomBytes {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn seek(&mut self, index: usize) -> Result<()> {
        if index > self.data.len() {
            return Err(DisasmError::SeekPastEnd {
                index,
                len: self.data.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.cursor).ok_or(DisasmError::SeekPastEnd {
            index: self.cursor,
            len: self.data.len(),
        })?;
        self.cursor += 1;
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_widens_requested_bits_only() {
        let mut state = DecoderState::new(RomMode::LoRom, 0x00, 0x8000, false, false);
        state.apply_rep(WIDTH_BIT_ACCUM);
        assert!(state.accum_16());
        assert!(!state.index_16());
    }

    #[test]
    fn sep_narrows_requested_bits_only() {
        let mut state = DecoderState::new(RomMode::LoRom, 0x00, 0x8000, true, true);
        state.apply_sep(WIDTH_BIT_INDEX);
        assert!(state.accum_16());
        assert!(!state.index_16());
    }

    #[test]
    fn width_reset_unset_leaves_flags_untouched() {
        let mut state = DecoderState::new(RomMode::LoRom, 0x00, 0x8000, true, false);
        state.apply_width_resets(WidthReset::Unset, WidthReset::Unset);
        assert!(state.accum_16());
        assert!(!state.index_16());
    }

    #[test]
    fn rom_bytes_seek_past_end_errors() {
        let mut rom = RomBytes::new(vec![1, 2, 3]);
        assert!(rom.seek(3).is_ok());
        assert!(rom.seek(4).is_err());
    }

    #[test]
    fn rom_bytes_read_u16_is_little_endian() {
        let mut rom = RomBytes::new(vec![0x34, 0x12]);
        assert_eq!(rom.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn rom_bytes_read_past_end_errors() {
        let mut rom = RomBytes::new(vec![0xAB]);
        assert_eq!(rom.read_u8().unwrap(), 0xAB);
        assert!(rom.read_u8().is_err());
    }
}
