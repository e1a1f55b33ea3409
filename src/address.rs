//! Address arithmetic for the 65816's 24-bit banked address space.
//!
//! Pure functions only: converting between `(bank, addr16)` pairs, 24-bit
//! addresses, and the linear file index used to look up a [`crate::byte_map::BytePropertyMap`]
//! entry. No state, no I/O; callers are responsible for range validation.

/// Size, in bytes, of one 64 KiB chunk of the flat byte-property array.
///
/// This is the chunking unit used when initializing `data_bank_hint`
/// defaults (spec §4.B), not the size of a real 65816 bank under LoROM
/// (which only contributes 32 KiB of ROM per bank).
pub const ARRAY_BANK_SIZE: usize = 0x10000;

/// Size of the flat byte-property array: 8 MiB, enough to index any
/// SNES ROM image (including header) under either mapping.
pub const MAX_FILE_SIZE: usize = 8 * 1024 * 1024;

/// ROM-to-address-space mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomMode {
    /// Each bank exposes 32 KiB of ROM in its upper half (`$8000-$FFFF`).
    LoRom,
    /// Each bank exposes a full 64 KiB of ROM.
    HiRom,
}

impl RomMode {
    /// `addr16` at which a fresh bank begins under this mapping.
    pub fn bank_start_addr(self) -> u16 {
        match self {
            RomMode::LoRom => 0x8000,
            RomMode::HiRom => 0x0000,
        }
    }
}

/// Split a 24-bit address into its bank and 16-bit offset.
pub fn split(addr24: u32) -> (u8, u16) {
    let bank = (addr24 >> 16) as u8;
    let addr16 = (addr24 & 0xFFFF) as u16;
    (bank, addr16)
}

/// Join a bank and 16-bit offset into a 24-bit address.
pub fn join(bank: u8, addr16: u16) -> u32 {
    ((bank as u32) << 16) | addr16 as u32
}

/// Convert a `(bank, addr16)` pair to a linear file index under the given mapping.
///
/// Bijective only over the ROM portion of the address space (the upper
/// half of each bank under LoROM); low-half LoROM addresses still
/// produce a distinct, in-bounds index so every slot of the 8 MiB
/// byte-property array remains reachable, but they do not correspond to
/// actual ROM content.
pub fn to_index(bank: u8, addr16: u16, mode: RomMode) -> usize {
    let bank = bank as usize;
    match mode {
        RomMode::LoRom => {
            let offset = if addr16 >= 0x8000 {
                (addr16 - 0x8000) as usize
            } else {
                addr16 as usize
            };
            bank * 0x8000 + offset
        }
        RomMode::HiRom => bank * 0x10000 + addr16 as usize,
    }
}

/// Advance `(bank, addr16)` by one byte, rolling over into the next bank
/// when `addr16` overflows `0xFFFF`.
pub fn advance(bank: u8, addr16: u16, mode: RomMode) -> (u8, u16) {
    let next = addr16 as u32 + 1;
    if next > 0xFFFF {
        (bank.wrapping_add(1), mode.bank_start_addr())
    } else {
        (bank, next as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_join_round_trip() {
        for &addr24 in &[0x000000u32, 0x7E0100, 0x80FFFF, 0xC08000, 0xFFFFFF] {
            let (bank, addr16) = split(addr24);
            assert_eq!(join(bank, addr16), addr24);
        }
    }

    #[test]
    fn lorom_index_maps_upper_half() {
        assert_eq!(to_index(0x00, 0x8000, RomMode::LoRom), 0);
        assert_eq!(to_index(0x00, 0xFFFF, RomMode::LoRom), 0x7FFF);
        assert_eq!(to_index(0x01, 0x8000, RomMode::LoRom), 0x8000);
    }

    #[test]
    fn hirom_index_maps_full_bank() {
        assert_eq!(to_index(0x00, 0x0000, RomMode::HiRom), 0);
        assert_eq!(to_index(0x00, 0xFFFF, RomMode::HiRom), 0xFFFF);
        assert_eq!(to_index(0x01, 0x0000, RomMode::HiRom), 0x10000);
    }

    #[test]
    fn advance_wraps_bank_at_lorom_boundary() {
        let (bank, addr16) = advance(0x00, 0xFFFF, RomMode::LoRom);
        assert_eq!((bank, addr16), (0x01, 0x8000));
    }

    #[test]
    fn advance_wraps_bank_at_hirom_boundary() {
        let (bank, addr16) = advance(0x00, 0xFFFF, RomMode::HiRom);
        assert_eq!((bank, addr16), (0x01, 0x0000));
    }

    #[test]
    fn advance_n_times_matches_index_plus_n() {
        let mode = RomMode::HiRom;
        let (mut bank, mut addr16) = (0x00u8, 0x0000u16);
        let start_index = to_index(bank, addr16, mode);
        for n in 1..=300usize {
            let next = advance(bank, addr16, mode);
            bank = next.0;
            addr16 = next.1;
            assert_eq!(to_index(bank, addr16, mode), start_index + n);
        }
    }
}
