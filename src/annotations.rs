//! Sidecar annotation loaders (spec §4.F).
//!
//! Six whitespace-delimited text formats feed facts into a
//! [`BytePropertyMap`] before disassembly starts, each keyed by a single
//! 24-bit hex address field rather than separate bank/offset fields.
//! Every loader skips a malformed *line* and logs it (spec §7.1) except
//! the load-offset and accumulator-width loaders, where a malformed
//! value is fatal — those values change how subsequent bytes are
//! decoded, so silently ignoring one would make the rest of the
//! disassembly wrong rather than merely incomplete.

use std::fs;
use std::path::Path;

use crate::address;
use crate::byte_map::{BytePropertyMap, Classification, WidthReset};
use crate::error::{DisasmError, Result};

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| DisasmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

fn parse_hex(token: &str) -> Option<u32> {
    let token = token.trim().trim_start_matches('$').trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(token, 16).ok()
}

/// Data/comments/databanks remap an `addr16 < 0x8000` into the upper
/// half of the same bank (`disassembler.cpp`'s `get_data_address`) —
/// those sidecars only ever name ROM-resident bytes, which under LoROM
/// live at `$8000-$FFFF`.
fn get_data_address(bank: u8, addr16: u16) -> (u8, u16) {
    if addr16 < 0x8000 {
        (bank, addr16 + 0x8000)
    } else {
        (bank, addr16)
    }
}

/// Symbol loading remaps to the `$7E` WRAM mirror instead, and only
/// when the bank isn't already `$7F` (`disassembler.cpp`'s `load_symbols`).
fn wram_mirror(bank: u8, addr16: u16) -> u8 {
    if addr16 < 0x8000 && bank != 0x7F {
        0x7E
    } else {
        bank
    }
}

/// Loads the six sidecar annotation formats into a byte-property map.
pub struct AnnotationLoader;

impl AnnotationLoader {
    /// `symbols` format: `addr24 [label]`. When the label is omitted,
    /// synthesizes `RAM_xxxx` (addr16 below `$8000`) or `CODE_bbxxxx`
    /// (otherwise) before the WRAM-mirror remap is applied.
    pub fn load_symbols(map: &mut BytePropertyMap, path: &Path) -> Result<()> {
        for (lineno, line) in read_lines(path)?.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.splitn(2, char::is_whitespace);
            let Some(addr_tok) = fields.next() else {
                continue;
            };
            let Some(addr24) = parse_hex(addr_tok) else {
                tracing::warn!(line = lineno + 1, "symbols: skipping unparseable address");
                continue;
            };
            let (bank, addr16) = address::split(addr24);
            let label = fields
                .next()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if addr16 < 0x8000 {
                        format!("RAM_{addr16:04x}")
                    } else {
                        format!("CODE_{bank:02x}{addr16:04x}")
                    }
                });
            let bank = wram_mirror(bank, addr16);
            let index = map.index_of(bank, addr16);
            map.set_label(index, label);
        }
        Ok(())
    }

    /// Supplemented: bare 24-bit addresses, one per line, synthesizing a
    /// `CODE_bbxxxx` label. Never overwrites an existing label
    /// (`load_symbols2`, `disassembler.cpp:340`).
    pub fn load_addresses_only(map: &mut BytePropertyMap, path: &Path) -> Result<()> {
        for (lineno, line) in read_lines(path)?.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(addr24) = parse_hex(line) else {
                tracing::warn!(line = lineno + 1, "addresses: skipping unparseable address");
                continue;
            };
            let (bank, addr16) = address::split(addr24);
            let label = format!("CODE_{bank:02x}{addr16:04x}");
            let index = map.index_of(bank, addr16);
            map.set_label_if_empty(index, label);
        }
        Ok(())
    }

    /// `comments` format: `addr24 text…`.
    pub fn load_comments(map: &mut BytePropertyMap, path: &Path) -> Result<()> {
        for (lineno, line) in read_lines(path)?.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.splitn(2, char::is_whitespace);
            let (Some(addr_tok), Some(comment)) = (fields.next(), fields.next()) else {
                tracing::warn!(line = lineno + 1, "comments: skipping malformed line");
                continue;
            };
            let Some(addr24) = parse_hex(addr_tok) else {
                tracing::warn!(line = lineno + 1, "comments: skipping unparseable address");
                continue;
            };
            let (bank, addr16) = address::split(addr24);
            let (bank, addr16) = get_data_address(bank, addr16);
            let index = map.index_of(bank, addr16);
            map.set_comment(index, comment.trim().to_string());
        }
        Ok(())
    }

    /// `data` format: `start_addr24 [end_addr24] [flag [label]]`. `flag`
    /// is numeric: `1` raw data, `2` short (in-bank) pointer, `3` long
    /// pointer. `end_addr24` defaults to a single byte past `start`;
    /// the label defaults to a classification-specific prefix plus the
    /// start address.
    pub fn load_data(map: &mut BytePropertyMap, path: &Path) -> Result<()> {
        for (lineno, line) in read_lines(path)?.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(start_tok) = fields.next() else {
                continue;
            };
            let Some(start) = parse_hex(start_tok) else {
                tracing::warn!(line = lineno + 1, "data: skipping unparseable address");
                continue;
            };

            let remaining: Vec<&str> = fields.collect();
            let mut idx = 0;
            let end = remaining
                .first()
                .and_then(|tok| parse_hex(tok))
                .inspect(|_| idx += 1)
                .unwrap_or(start + 1);
            let flag = remaining
                .get(idx)
                .and_then(|tok| tok.parse::<u32>().ok())
                .inspect(|_| idx += 1)
                .unwrap_or(1);
            let label = remaining[idx..].join(" ");
            let label = (!label.is_empty()).then_some(label);

            let classification = match flag {
                1 => Classification::RawData,
                2 => Classification::ShortPointer,
                3 => Classification::LongPointer,
                other => {
                    tracing::warn!(line = lineno + 1, flag = other, "data: unknown flag, skipping");
                    continue;
                }
            };

            let (start_bank, start16) = address::split(start);
            let (start_bank, start16) = get_data_address(start_bank, start16);
            let (end_bank, end16) = address::split(end);
            let (_, end16) = get_data_address(end_bank, end16);
            let start_index = map.index_of(start_bank, start16);
            let end_index = map.index_of(start_bank, end16);
            map.set_classification_range(start_index, end_index, classification);

            let label = label.unwrap_or_else(|| match classification {
                Classification::ShortPointer => format!("Ptrs_{start_bank:02x}{start16:04x}"),
                Classification::LongPointer => format!("PtrsLong_{start_bank:02x}{start16:04x}"),
                _ => format!("DATA_{start_bank:02x}{start16:04x}"),
            });
            map.set_label_if_empty(start_index, label);
        }
        Ok(())
    }

    /// `databanks` format: `start_addr24 end_addr24 data_bank` — range
    /// based, distinct from the per-byte `data_bank_hint` default
    /// (`load_data_bank`, `disassembler.cpp:354`).
    pub fn load_data_banks(map: &mut BytePropertyMap, path: &Path) -> Result<()> {
        for (lineno, line) in read_lines(path)?.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(start_tok), Some(end_tok), Some(bank_tok)) =
                (fields.next(), fields.next(), fields.next())
            else {
                tracing::warn!(line = lineno + 1, "databanks: skipping malformed line");
                continue;
            };
            let (Some(start), Some(end), Some(data_bank)) =
                (parse_hex(start_tok), parse_hex(end_tok), parse_hex(bank_tok))
            else {
                tracing::warn!(line = lineno + 1, "databanks: skipping unparseable range");
                continue;
            };
            let (start_bank, start16) = address::split(start);
            let (end_bank, end16) = address::split(end);
            let mode = map.mode();
            let start_index = address::to_index(start_bank, start16, mode);
            let end_index = address::to_index(end_bank, end16, mode);
            map.set_data_bank_range(start_index, end_index, data_bank as u8);
        }
        Ok(())
    }

    /// `offsets` format: `addr24 signed_offset`. A malformed offset is
    /// fatal (spec §7.1): the value participates in address arithmetic
    /// for every later byte, so silently skipping it would make the
    /// rest of the output wrong without any indication.
    pub fn load_offsets(map: &mut BytePropertyMap, path: &Path) -> Result<()> {
        for (lineno, line) in read_lines(path)?.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(addr_tok), Some(offset_tok)) = (fields.next(), fields.next()) else {
                tracing::warn!(line = lineno + 1, "offsets: skipping malformed line");
                continue;
            };
            let Some(addr24) = parse_hex(addr_tok) else {
                tracing::warn!(line = lineno + 1, "offsets: skipping unparseable address");
                continue;
            };
            let offset: i32 = offset_tok.trim().parse().map_err(|_| DisasmError::InvalidLoadOffset {
                file: path.to_path_buf(),
                line: lineno + 1,
                value: offset_tok.to_string(),
            })?;
            let (bank, addr16) = address::split(addr24);
            let index = map.index_of(bank, addr16);
            map.set_load_offset(index, offset);
        }
        Ok(())
    }

    /// `accum-widths` format: `addr24 tag bytes`. `tag` is one of `A`
    /// (accumulator only), `I` (index only), `AI`/`IA` (both); `bytes`
    /// is `8` or `16` and names the width the tagged register(s) reset
    /// to at that address. A malformed tag or width is fatal for the
    /// same reason a malformed offset is: it changes how every later
    /// instruction in that region decodes.
    pub fn load_accum_widths(map: &mut BytePropertyMap, path: &Path) -> Result<()> {
        for (lineno, line) in read_lines(path)?.into_iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(addr_tok), Some(tag), Some(bytes_tok)) =
                (fields.next(), fields.next(), fields.next())
            else {
                tracing::warn!(line = lineno + 1, "accum-widths: skipping malformed line");
                continue;
            };
            let Some(addr24) = parse_hex(addr_tok) else {
                tracing::warn!(line = lineno + 1, "accum-widths: skipping unparseable address");
                continue;
            };
            let (touches_accum, touches_index) = match tag {
                "A" => (true, false),
                "I" => (false, true),
                "AI" | "IA" => (true, true),
                other => {
                    return Err(DisasmError::InvalidPointerSize {
                        file: path.to_path_buf(),
                        line: lineno + 1,
                        value: other.to_string(),
                    })
                }
            };
            let reset = match bytes_tok {
                "8" => WidthReset::Bits8,
                "16" => WidthReset::Bits16,
                other => {
                    return Err(DisasmError::InvalidPointerSize {
                        file: path.to_path_buf(),
                        line: lineno + 1,
                        value: other.to_string(),
                    })
                }
            };
            let (bank, addr16) = address::split(addr24);
            let index = map.index_of(bank, addr16);
            map.set_width_resets(
                index,
                touches_accum.then_some(reset),
                touches_index.then_some(reset),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::RomMode;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        use std::io::Write;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn load_symbols_sets_label_and_mirrors_wram() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("000100 RESET_HANDLER\n");
        AnnotationLoader::load_symbols(&mut map, file.path()).unwrap();
        let index = map.index_of(0x7E, 0x0100);
        assert_eq!(map.get(index).label.as_deref(), Some("RESET_HANDLER"));
    }

    #[test]
    fn load_symbols_synthesizes_default_when_label_omitted() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008000\n");
        AnnotationLoader::load_symbols(&mut map, file.path()).unwrap();
        let index = map.index_of(0x00, 0x8000);
        assert_eq!(map.get(index).label.as_deref(), Some("CODE_008000"));
    }

    #[test]
    fn load_symbols_skips_malformed_line() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("garbage stuff here\n008000 GOOD\n");
        AnnotationLoader::load_symbols(&mut map, file.path()).unwrap();
        let index = map.index_of(0x00, 0x8000);
        assert_eq!(map.get(index).label.as_deref(), Some("GOOD"));
    }

    #[test]
    fn load_addresses_only_never_overwrites() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let index = map.index_of(0x00, 0x8000);
        map.set_label(index, "EXISTING".into());
        let file = write_temp("008000\n");
        AnnotationLoader::load_addresses_only(&mut map, file.path()).unwrap();
        assert_eq!(map.get(index).label.as_deref(), Some("EXISTING"));
    }

    #[test]
    fn load_data_applies_flag_and_range() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008010 008014 1\n");
        AnnotationLoader::load_data(&mut map, file.path()).unwrap();
        let start = map.index_of(0x00, 0x8010);
        let mid = map.index_of(0x00, 0x8012);
        assert_eq!(map.get(start).classification, Classification::RawData);
        assert_eq!(map.get(mid).classification, Classification::RawData);
        assert_eq!(map.get(start).label.as_deref(), Some("DATA_008010"));
    }

    #[test]
    fn load_data_defaults_end_to_single_byte() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008020 2\n");
        AnnotationLoader::load_data(&mut map, file.path()).unwrap();
        let index = map.index_of(0x00, 0x8020);
        assert_eq!(map.get(index).classification, Classification::ShortPointer);
        assert_eq!(map.get(index).label.as_deref(), Some("Ptrs_008020"));
    }

    #[test]
    fn load_comments_reads_single_address_field() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008000 reset vector entry\n");
        AnnotationLoader::load_comments(&mut map, file.path()).unwrap();
        let index = map.index_of(0x00, 0x8000);
        assert_eq!(map.get(index).comment.as_deref(), Some("reset vector entry"));
    }

    #[test]
    fn load_offsets_errors_on_malformed_value() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008000 not_a_number\n");
        let result = AnnotationLoader::load_offsets(&mut map, file.path());
        assert!(result.is_err());
    }

    #[test]
    fn load_accum_widths_reads_tag_and_width_from_one_line() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008000 AI 16\n");
        AnnotationLoader::load_accum_widths(&mut map, file.path()).unwrap();
        let index = map.index_of(0x00, 0x8000);
        assert_eq!(map.get(index).reset_accum_to, WidthReset::Bits16);
        assert_eq!(map.get(index).reset_index_to, WidthReset::Bits16);
    }

    #[test]
    fn load_accum_widths_errors_on_unknown_tag() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008000 ZZZ 16\n");
        let result = AnnotationLoader::load_accum_widths(&mut map, file.path());
        assert!(result.is_err());
    }

    #[test]
    fn load_accum_widths_errors_on_unknown_width() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let file = write_temp("008000 A 32\n");
        let result = AnnotationLoader::load_accum_widths(&mut map, file.path());
        assert!(result.is_err());
    }

    #[test]
    fn load_data_banks_applies_to_range() {
        let mut map = BytePropertyMap::new(RomMode::HiRom);
        let file = write_temp("008000 00FFFF 05\n");
        AnnotationLoader::load_data_banks(&mut map, file.path()).unwrap();
        let index = map.index_of(0x00, 0x9000);
        assert_eq!(map.get(index).data_bank_hint, 0x05);
    }
}
