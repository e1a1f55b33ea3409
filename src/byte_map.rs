//! Per-byte sidecar table (spec §4.B).
//!
//! Backed by a flat vector covering the whole ROM address space. Reads
//! never fail. Writes fail-soft: attempting to overwrite a label,
//! comment, or load-offset that is already set logs a diagnostic and
//! keeps the first value (spec §7.2).

use crate::address::{self, RomMode, ARRAY_BANK_SIZE, MAX_FILE_SIZE};

/// Classification assigned to one ROM byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Classification {
    #[default]
    Code,
    RawData,
    ShortPointer,
    LongPointer,
}

/// Forced accumulator/index width at an instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthReset {
    #[default]
    Unset,
    Bits8,
    Bits16,
}

/// One byte's worth of annotation state.
#[derive(Debug, Clone)]
pub struct ByteProperty {
    pub classification: Classification,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub load_offset: i32,
    pub data_bank_hint: u8,
    pub reset_accum_to: WidthReset,
    pub reset_index_to: WidthReset,
}

impl ByteProperty {
    fn with_data_bank(data_bank_hint: u8) -> Self {
        Self {
            classification: Classification::default(),
            label: None,
            comment: None,
            load_offset: 0,
            data_bank_hint,
            reset_accum_to: WidthReset::Unset,
            reset_index_to: WidthReset::Unset,
        }
    }
}

/// The flat, process-lifetime byte-property map.
pub struct BytePropertyMap {
    entries: Vec<ByteProperty>,
    mode: RomMode,
}

impl BytePropertyMap {
    /// Allocate a fresh map. Every slot's `data_bank_hint` defaults to
    /// the 64 KiB array chunk it falls in (spec §4.B).
    pub fn new(mode: RomMode) -> Self {
        let mut entries = Vec::with_capacity(MAX_FILE_SIZE);
        for chunk in 0..(MAX_FILE_SIZE / ARRAY_BANK_SIZE) {
            let hint = chunk as u8;
            entries.extend((0..ARRAY_BANK_SIZE).map(|_| ByteProperty::with_data_bank(hint)));
        }
        Self { entries, mode }
    }

    /// ROM mapping this map was built for.
    pub fn mode(&self) -> RomMode {
        self.mode
    }

    /// Total number of addressable slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> &ByteProperty {
        &self.entries[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut ByteProperty {
        &mut self.entries[index]
    }

    pub fn index_of(&self, bank: u8, addr16: u16) -> usize {
        address::to_index(bank, addr16, self.mode)
    }

    /// Set a label at `index`. Returns `false` (and logs) if a label is
    /// already present there.
    pub fn set_label(&mut self, index: usize, label: String) -> bool {
        let entry = &mut self.entries[index];
        if entry.label.is_some() {
            tracing::warn!(index, %label, "conflict: label already set, keeping first value");
            return false;
        }
        entry.label = Some(label);
        true
    }

    /// Set a label only if empty, without logging a conflict — used by
    /// the non-overwriting `load_symbols2` path (spec supplement §3.1).
    pub fn set_label_if_empty(&mut self, index: usize, label: String) {
        let entry = &mut self.entries[index];
        if entry.label.is_none() {
            entry.label = Some(label);
        }
    }

    pub fn set_comment(&mut self, index: usize, comment: String) -> bool {
        let entry = &mut self.entries[index];
        if entry.comment.is_some() {
            tracing::warn!(index, "conflict: comment already set, keeping first value");
            return false;
        }
        entry.comment = Some(comment);
        true
    }

    pub fn set_load_offset(&mut self, index: usize, offset: i32) -> bool {
        let entry = &mut self.entries[index];
        if entry.load_offset != 0 {
            tracing::warn!(index, offset, "conflict: load offset already set, keeping first value");
            return false;
        }
        entry.load_offset = offset;
        true
    }

    /// Mark `[start, end)` with a classification. Fails soft per byte:
    /// a byte already carrying a non-default classification is left
    /// alone and logged (spec §7.2, invariant: no silent reclassification).
    pub fn set_classification_range(&mut self, start: usize, end: usize, classification: Classification) {
        for index in start..end.min(self.entries.len()) {
            let entry = &mut self.entries[index];
            if entry.classification != Classification::default() && entry.classification != classification {
                tracing::warn!(index, "conflict: byte already classified, keeping first value");
                continue;
            }
            entry.classification = classification;
        }
    }

    pub fn set_data_bank_range(&mut self, start: usize, end: usize, data_bank: u8) {
        for index in start..end.min(self.entries.len()) {
            self.entries[index].data_bank_hint = data_bank;
        }
    }

    pub fn set_width_resets(&mut self, index: usize, accum: Option<WidthReset>, idx_width: Option<WidthReset>) {
        let entry = &mut self.entries[index];
        if let Some(a) = accum {
            entry.reset_accum_to = a;
        }
        if let Some(i) = idx_width {
            entry.reset_index_to = i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_map_has_bank_hints_per_chunk() {
        let map = BytePropertyMap::new(RomMode::LoRom);
        assert_eq!(map.get(0).data_bank_hint, 0);
        assert_eq!(map.get(ARRAY_BANK_SIZE).data_bank_hint, 1);
        assert_eq!(map.get(ARRAY_BANK_SIZE * 2 + 5).data_bank_hint, 2);
    }

    #[test]
    fn set_label_conflict_keeps_first() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        assert!(map.set_label(10, "FIRST".into()));
        assert!(!map.set_label(10, "SECOND".into()));
        assert_eq!(map.get(10).label.as_deref(), Some("FIRST"));
    }

    #[test]
    fn classification_range_does_not_silently_overwrite() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        map.set_classification_range(0, 4, Classification::RawData);
        map.set_classification_range(2, 6, Classification::ShortPointer);
        assert_eq!(map.get(0).classification, Classification::RawData);
        assert_eq!(map.get(2).classification, Classification::RawData);
        assert_eq!(map.get(5).classification, Classification::ShortPointer);
    }
}
