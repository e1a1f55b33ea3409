//! Range driver (spec §4.H): executes one [`Request`] against a
//! [`ByteSource`], running the fixed-point two-pass label algorithm
//! (spec §4.G, §8) and dispatching each byte range to the handler its
//! `RequestType` or, for `Smart`, its classification calls for.

use crate::address;
use crate::address::RomMode;
use crate::byte_map::BytePropertyMap;
use crate::decoder::{ByteSource, DecoderState};
use crate::error::{DisasmError, Result};
use crate::handlers::decode_operand;
use crate::labels::{LabelResolver, Phase};
use crate::opcode::{AddressingMode, OpcodeTable};
use crate::request::{Request, RequestProperties, RequestType};
use crate::sink::{OutputSink, Record};

/// A sink that discards everything; used to drive pass 1 (discovery)
/// without allocating real output.
struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _record: &Record) -> Result<()> {
        Ok(())
    }
}

/// Owns the byte-property map and opcode table for one disassembly
/// session; [`Engine::run`] executes requests against it.
pub struct Engine {
    map: BytePropertyMap,
    table: OpcodeTable,
    mode: RomMode,
    header_size: usize,
}

impl Engine {
    pub fn new(mode: RomMode) -> Self {
        Self {
            map: BytePropertyMap::new(mode),
            table: OpcodeTable::new(),
            mode,
            header_size: 0,
        }
    }

    /// Bytes of copier header to skip before the ROM-mode-dependent
    /// offset (spec §4.H Seek). Defaults to 0 (no header); callers that
    /// know their image carries a 512-byte copier header set it
    /// explicitly.
    pub fn with_header_size(mut self, header_size: usize) -> Self {
        self.header_size = header_size;
        self
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    pub fn map(&self) -> &BytePropertyMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut BytePropertyMap {
        &mut self.map
    }

    pub fn mode(&self) -> RomMode {
        self.mode
    }

    /// Logical (header-stripped) byte count available from `source`, the
    /// scale `state.current_index()` is expressed in.
    fn available_len(&self, source: &dyn ByteSource) -> usize {
        source.len().saturating_sub(self.header_size)
    }

    fn in_range(props: &RequestProperties, addr24: u32) -> bool {
        let start = address::join(props.start_bank, props.start_addr);
        let end = address::join(props.end_bank, props.end_addr);
        addr24 >= start && addr24 < end
    }

    /// Whether `addr24` already carries a user-provided label (spec §4.G
    /// Pass 1: the explicit-label lookup is unconditional — it wins over
    /// `is_label_worthy`, which only gates `ADDR_*` synthesis).
    fn has_explicit_label(&self, addr24: u32) -> bool {
        let (bank, addr16) = address::split(addr24);
        let index = self.map.index_of(bank, addr16);
        self.map.get(index).label.is_some()
    }

    /// Run `request` against `source`, writing records to `sink`.
    ///
    /// Executes `request.properties.passes` discovery sweeps (each a
    /// silent dry run that only marks referenced addresses), then one
    /// final sweep that actually emits through `sink` — labels only
    /// appear for addresses some earlier sweep marked as referenced.
    pub fn run(
        &mut self,
        request: &Request,
        source: &mut dyn ByteSource,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        if source.len() < self.header_size {
            return Err(DisasmError::RomTooSmall {
                actual: source.len(),
                required: self.header_size,
            });
        }
        let mut resolver = LabelResolver::new();
        let passes = request.properties.passes.max(1);
        for pass in 0..passes {
            resolver.set_phase(Phase::Discovering);
            let mut null_sink = NullSink;
            self.dispatch(request, source, &mut resolver, &mut null_sink)?;
            if pass + 1 == passes {
                resolver.set_phase(Phase::Emitting);
                self.dispatch(request, source, &mut resolver, sink)?;
            }
        }
        for (addr, label) in resolver.drain_unresolved() {
            tracing::warn!(addr = format!("{addr:06X}"), label, "reference outside requested range");
        }
        sink.finish()
    }

    fn dispatch(
        &self,
        request: &Request,
        source: &mut dyn ByteSource,
        resolver: &mut LabelResolver,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        let props = &request.properties;
        let start_index = self.map.index_of(props.start_bank, props.start_addr);
        let end_index = self.map.index_of(props.end_bank, props.end_addr);
        source.seek(self.header_size + start_index)?;
        let mut state = DecoderState::new(
            self.mode,
            props.start_bank,
            props.start_addr,
            props.start_accum_16,
            props.start_index_16,
        );

        match request.request_type {
            RequestType::Asm => self.do_asm(props, &mut state, source, resolver, sink, end_index),
            RequestType::Dcb => self.do_dcb(request, &mut state, source, sink, end_index),
            RequestType::Ptr => self.do_ptr(props, &mut state, source, resolver, sink, end_index, false),
            RequestType::PtrLong => self.do_ptr(props, &mut state, source, resolver, sink, end_index, true),
            RequestType::Smart => self.do_smart(request, &mut state, source, resolver, sink, end_index),
        }
    }

    fn do_asm(
        &self,
        props: &RequestProperties,
        state: &mut DecoderState,
        source: &mut dyn ByteSource,
        resolver: &mut LabelResolver,
        sink: &mut dyn OutputSink,
        end_index: usize,
    ) -> Result<()> {
        let emitting = resolver.phase() == Phase::Emitting;
        while state.current_index() < end_index {
            if state.current_index() >= self.available_len(source) {
                if emitting {
                    sink.emit(&Record::EndOfFile { addr: state.current_address() })?;
                }
                return Ok(());
            }

            let addr = state.current_address();
            let index = state.current_index();
            let entry = self.map.get(index);
            state.apply_width_resets(entry.reset_accum_to, entry.reset_index_to);
            let own_label = if resolver.is_used(addr) {
                Some(entry.label.clone().unwrap_or_else(|| LabelResolver::default_label(addr)))
            } else {
                None
            };
            let comment = entry.comment.clone();

            let data_bank_hint = entry.data_bank_hint;
            let load_offset = entry.load_offset;
            let opcode = source.read_u8()? as u16;
            let meta = self.table.get(opcode);
            let decoded = decode_operand(meta.mode, state, source, data_bank_hint)?;

            // `load_offset` rewrites the key a label is looked up under: the
            // annotation stores how far the operand drifted from the byte it
            // actually points at (spec §4.B, §4.H state machine step 6).
            let lookup_target = decoded.target.map(|target| (target as i64 - load_offset as i64) as u32);

            if let (Some(target), Phase::Discovering) = (lookup_target, resolver.phase()) {
                let in_range = Self::in_range(props, target);
                if in_range || props.use_extern_symbols {
                    let worthy = LabelResolver::is_label_worthy(target, meta.is_branch());
                    if self.has_explicit_label(target) || worthy {
                        resolver.mark_used(target);
                    }
                }
            }

            if emitting {
                let operand_text = match lookup_target {
                    Some(target) => resolver
                        .resolve(&self.map, target, Self::in_range(props, target), props.use_extern_symbols)
                        .map(|label| match load_offset.cmp(&0) {
                            std::cmp::Ordering::Greater => format!("{label}+{load_offset}"),
                            std::cmp::Ordering::Less => format!("{label}{load_offset}"),
                            std::cmp::Ordering::Equal => label,
                        })
                        .unwrap_or(decoded.text.clone()),
                    None => decoded.text.clone(),
                };
                let mut bytes = vec![opcode as u8];
                bytes.extend(&decoded.bytes);
                sink.emit(&Record::Instruction {
                    addr,
                    bytes,
                    mnemonic: meta.display_name(state.accum_16()),
                    operand: operand_text,
                    label: own_label,
                    comment,
                })?;
            }

            let total_len = 1 + decoded.bytes.len() as u16;
            if meta.opcode == 0xC2 {
                state.apply_rep(decoded.bytes.first().copied().unwrap_or(0));
            } else if meta.opcode == 0xE2 {
                state.apply_sep(decoded.bytes.first().copied().unwrap_or(0));
            }
            state.advance(total_len);

            if meta.is_return() && props.stop_at_rts {
                return Ok(());
            }
        }
        Ok(())
    }

    fn do_dcb(
        &self,
        request: &Request,
        state: &mut DecoderState,
        source: &mut dyn ByteSource,
        sink: &mut dyn OutputSink,
        end_index: usize,
    ) -> Result<()> {
        while state.current_index() < end_index {
            if state.current_index() >= self.available_len(source) {
                sink.emit(&Record::EndOfFile { addr: state.current_address() })?;
                return Ok(());
            }
            let addr = state.current_address();
            let leading_entry = self.map.get(state.current_index());
            let label = leading_entry.label.clone();
            let comment = leading_entry.comment.clone();
            let remaining = end_index - state.current_index();
            let line_len = request.bytes_per_line.min(remaining).max(1);
            let mut bytes = Vec::with_capacity(line_len);
            for offset in 0..line_len {
                if state.current_index() >= self.available_len(source) {
                    break;
                }
                // A label on a non-leading byte forces this line to end
                // before it, so the label gets its own record (spec §4.H).
                if offset > 0 && self.map.get(state.current_index()).label.is_some() {
                    break;
                }
                bytes.push(source.read_u8()?);
                state.advance(1);
            }
            sink.emit(&Record::Data { addr, bytes, label, comment })?;
        }
        Ok(())
    }

    fn do_ptr(
        &self,
        props: &RequestProperties,
        state: &mut DecoderState,
        source: &mut dyn ByteSource,
        resolver: &mut LabelResolver,
        sink: &mut dyn OutputSink,
        end_index: usize,
        is_long: bool,
    ) -> Result<()> {
        let emitting = resolver.phase() == Phase::Emitting;
        let mode = if is_long { AddressingMode::LongPointer } else { AddressingMode::Absolute };
        while state.current_index() < end_index {
            if state.current_index() >= self.available_len(source) {
                if emitting {
                    sink.emit(&Record::EndOfFile { addr: state.current_address() })?;
                }
                return Ok(());
            }
            let addr = state.current_address();
            let data_bank_hint = self.map.get(state.current_index()).data_bank_hint;
            let decoded = decode_operand(mode, state, source, data_bank_hint)?;
            let target = decoded.target.unwrap_or(addr);

            if resolver.phase() == Phase::Discovering {
                let in_range = Self::in_range(props, target);
                if in_range || props.use_extern_symbols {
                    if self.has_explicit_label(target) || LabelResolver::is_label_worthy(target, false) {
                        resolver.mark_used(target);
                    }
                }
            }

            if emitting {
                let label = resolver.resolve(&self.map, target, Self::in_range(props, target), props.use_extern_symbols);
                sink.emit(&Record::Pointer { addr, target, is_long, label })?;
            }

            state.advance(decoded.bytes.len() as u16);
        }
        Ok(())
    }

    fn do_smart(
        &self,
        request: &Request,
        state: &mut DecoderState,
        source: &mut dyn ByteSource,
        resolver: &mut LabelResolver,
        sink: &mut dyn OutputSink,
        end_index: usize,
    ) -> Result<()> {
        use crate::byte_map::Classification;
        while state.current_index() < end_index {
            if state.current_index() >= self.available_len(source) {
                break;
            }
            let index = state.current_index();
            let run_end = self.next_classification_boundary(index, end_index);
            let (end_bank, end_addr) = self.index_to_bank_addr(run_end);
            let sub_props = request
                .properties
                .with_range(state.bank(), state.addr16(), end_bank, end_addr)
                .with_widths(state.accum_16(), state.index_16());

            match self.map.get(index).classification {
                Classification::Code => self.do_asm(&sub_props, state, source, resolver, sink, run_end)?,
                Classification::RawData => {
                    let sub_request = Request::new(RequestType::Dcb, sub_props).with_bytes_per_line(request.bytes_per_line);
                    self.do_dcb(&sub_request, state, source, sink, run_end)?
                }
                Classification::ShortPointer => self.do_ptr(&sub_props, state, source, resolver, sink, run_end, false)?,
                Classification::LongPointer => self.do_ptr(&sub_props, state, source, resolver, sink, run_end, true)?,
            }
        }
        Ok(())
    }

    /// Find the next index (capped at `end_index`) whose classification
    /// differs from the one at `start`, so `do_smart` can hand off
    /// contiguous same-kind runs to the matching handler in one call.
    fn next_classification_boundary(&self, start: usize, end_index: usize) -> usize {
        let classification = self.map.get(start).classification;
        let mut index = start + 1;
        while index < end_index && self.map.get(index).classification == classification {
            index += 1;
        }
        index
    }

    fn index_to_bank_addr(&self, index: usize) -> (u8, u16) {
        match self.mode {
            RomMode::LoRom => {
                let bank = (index / 0x8000) as u8;
                let offset = (index % 0x8000) as u16;
                (bank, offset + 0x8000)
            }
            RomMode::HiRom => {
                let bank = (index / 0x10000) as u8;
                let offset = (index % 0x10000) as u16;
                (bank, offset)
            }
        }
    }
}
