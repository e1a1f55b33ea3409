//! Two-pass label resolution (spec §4.G).
//!
//! Pass 1 (`Phase::Discovering`) walks the range once, calling
//! [`LabelResolver::mark_used`] for every operand/target address a
//! branch, jump, or pointer entry names. Pass 2 (`Phase::Emitting`)
//! walks it again and calls [`LabelResolver::resolve`] while rendering;
//! only addresses marked used in pass 1 get a label in the output —
//! this is what guarantees no dead labels (spec §8).

use std::collections::{HashMap, HashSet};

use crate::byte_map::BytePropertyMap;

/// Which pass the resolver is currently serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovering,
    Emitting,
}

/// Tracks referenced addresses across a two-pass run and synthesizes
/// default label text for addresses with no explicit symbol.
pub struct LabelResolver {
    phase: Phase,
    used: HashSet<u32>,
    /// Optional fallback table for RAM addresses the byte-property map
    /// itself has no entry for (spec §4.G: "an optional RAM-label lookup").
    ram_lookup: HashMap<u32, String>,
    /// Addresses referenced but outside the requested range, collected
    /// for the end-of-run diagnostic report (spec supplement §3.3).
    unresolved: Vec<(u32, String)>,
}

impl LabelResolver {
    pub fn new() -> Self {
        Self {
            phase: Phase::Discovering,
            used: HashSet::new(),
            ram_lookup: HashMap::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn with_ram_lookup(ram_lookup: HashMap<u32, String>) -> Self {
        Self {
            ram_lookup,
            ..Self::new()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Record that `addr24` is the target of some branch/jump/pointer.
    /// A no-op outside `Phase::Discovering`.
    pub fn mark_used(&mut self, addr24: u32) {
        if self.phase == Phase::Discovering {
            self.used.insert(addr24);
        }
    }

    pub fn is_used(&self, addr24: u32) -> bool {
        self.used.contains(&addr24)
    }

    /// Synthetic label for a referenced address with no explicit symbol
    /// (spec §4.G): `ADDR_bbxxxx`, deterministic in `(bank, addr16)`
    /// alone so the same reference always synthesizes the same name.
    pub fn default_label(addr24: u32) -> String {
        let (bank, addr16) = crate::address::split(addr24);
        format!("ADDR_{bank:02x}{addr16:04x}")
    }

    /// Whether a reference to `addr24` is worth a label at all (spec
    /// §4.G): addresses in the upper half of a bank always are;
    /// addresses below `$8000` only are when the reference is a branch.
    /// Never true for banks `$7E`/`$7F` (those are RAM, not ROM code).
    pub fn is_label_worthy(addr24: u32, is_branch: bool) -> bool {
        let (bank, addr16) = crate::address::split(addr24);
        bank < 0x7E && (addr16 >= 0x8000 || is_branch)
    }

    /// Resolve a reference made during `Phase::Emitting`. Returns `None`
    /// if `addr24` was never marked used in pass 1 — callers should fall
    /// back to rendering the raw numeric operand in that case.
    ///
    /// `in_range` should be `false` when `addr24` falls outside the
    /// request's `[start, end)` window; if `use_extern_symbols` is also
    /// set, the reference is recorded for the end-of-run diagnostic
    /// instead of being silently dropped.
    pub fn resolve(
        &mut self,
        map: &BytePropertyMap,
        addr24: u32,
        in_range: bool,
        use_extern_symbols: bool,
    ) -> Option<String> {
        if !self.used.contains(&addr24) {
            return None;
        }
        let (bank, addr16) = crate::address::split(addr24);
        let index = map.index_of(bank, addr16);
        let label = map
            .get(index)
            .label
            .clone()
            .or_else(|| self.ram_lookup.get(&addr24).cloned())
            .unwrap_or_else(|| Self::default_label(addr24));

        if !in_range && use_extern_symbols {
            self.unresolved.push((addr24, label.clone()));
        }
        Some(label)
    }

    /// Take the accumulated out-of-range references, clearing the set.
    /// `Engine::run` drains this once at the end of a request and logs
    /// each entry via `tracing::warn!`.
    pub fn drain_unresolved(&mut self) -> Vec<(u32, String)> {
        std::mem::take(&mut self.unresolved)
    }
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::RomMode;

    #[test]
    fn unreferenced_address_resolves_to_none() {
        let map = BytePropertyMap::new(RomMode::LoRom);
        let mut resolver = LabelResolver::new();
        resolver.set_phase(Phase::Emitting);
        assert_eq!(resolver.resolve(&map, 0x008000, true, false), None);
    }

    #[test]
    fn referenced_address_resolves_with_default_label() {
        let map = BytePropertyMap::new(RomMode::LoRom);
        let mut resolver = LabelResolver::new();
        resolver.mark_used(0x008000);
        resolver.set_phase(Phase::Emitting);
        assert_eq!(
            resolver.resolve(&map, 0x008000, true, false),
            Some("ADDR_008000".to_string())
        );
    }

    #[test]
    fn explicit_label_wins_over_default() {
        let mut map = BytePropertyMap::new(RomMode::LoRom);
        let index = map.index_of(0x00, 0x8000);
        map.set_label(index, "RESET".into());
        let mut resolver = LabelResolver::new();
        resolver.mark_used(0x008000);
        resolver.set_phase(Phase::Emitting);
        assert_eq!(resolver.resolve(&map, 0x008000, true, false), Some("RESET".to_string()));
    }

    #[test]
    fn out_of_range_reference_is_collected_when_extern_symbols_on() {
        let map = BytePropertyMap::new(RomMode::LoRom);
        let mut resolver = LabelResolver::new();
        resolver.mark_used(0x018000);
        resolver.set_phase(Phase::Emitting);
        resolver.resolve(&map, 0x018000, false, true);
        let unresolved = resolver.drain_unresolved();
        assert_eq!(unresolved, vec![(0x018000, "ADDR_018000".to_string())]);
        assert!(resolver.drain_unresolved().is_empty());
    }

    #[test]
    fn low_half_address_is_worthy_only_for_branches() {
        assert!(!LabelResolver::is_label_worthy(0x000100, false));
        assert!(LabelResolver::is_label_worthy(0x000100, true));
        assert!(LabelResolver::is_label_worthy(0x008000, false));
    }

    #[test]
    fn wram_banks_are_never_worthy() {
        assert!(!LabelResolver::is_label_worthy(0x7E0100, true));
        assert!(!LabelResolver::is_label_worthy(0x7F8000, false));
    }

    #[test]
    fn marking_used_outside_discovering_phase_is_ignored() {
        let mut resolver = LabelResolver::new();
        resolver.set_phase(Phase::Emitting);
        resolver.mark_used(0x008000);
        assert!(!resolver.is_used(0x008000));
    }
}
