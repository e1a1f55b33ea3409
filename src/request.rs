//! The disassembly request: spec.md's external interface contract,
//! independent of the [`crate::engine::Engine`] that consumes it
//! (spec §6, §9).

/// What an [`Engine`](crate::engine::Engine) does with a request's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// Disassemble as instructions, honoring `stop_at_rts`.
    Asm,
    /// Dump as raw `.db` bytes, `bytes_per_line` per line.
    Dcb,
    /// Treat the range as a table of 16-bit pointers (`.dw`).
    Ptr,
    /// Treat the range as a table of 24-bit pointers (`.dl`).
    PtrLong,
    /// Classify each byte via the map and dispatch to `Asm`/`Dcb`/`Ptr`
    /// per-byte, repeating for `passes` iterations (spec §4.H).
    Smart,
}

/// The authoritative request-properties superset (spec.md §9, resolved
/// in favor of `original_source/disasm/request.h` — see `SPEC_FULL.md` §0).
#[derive(Debug, Clone, Copy)]
pub struct RequestProperties {
    pub comment_level: u8,
    pub quiet: bool,
    pub start_accum_16: bool,
    pub start_index_16: bool,
    pub stop_at_rts: bool,
    pub use_extern_symbols: bool,
    pub print_data_addr: bool,
    pub start_bank: u8,
    pub start_addr: u16,
    pub end_bank: u8,
    pub end_addr: u16,
    pub passes: u8,
}

impl RequestProperties {
    /// Defaults mirroring the teacher's `ClassifierOptions::new()`:
    /// one comment level, one pass, every flag off, 8-bit register
    /// widths.
    pub fn new() -> Self {
        Self {
            comment_level: 1,
            quiet: false,
            start_accum_16: false,
            start_index_16: false,
            stop_at_rts: false,
            use_extern_symbols: false,
            print_data_addr: false,
            start_bank: 0,
            start_addr: 0,
            end_bank: 0,
            end_addr: 0,
            passes: 1,
        }
    }

    /// A single fixed-point pass (`RequestType::Smart`'s usual mode).
    pub fn single_pass(self) -> Self {
        Self { passes: 1, ..self }
    }

    /// Two passes, for ranges whose byte classification only stabilizes
    /// after labels discovered in the first pass feed back into the
    /// second (spec §4.H).
    pub fn two_pass(self) -> Self {
        Self { passes: 2, ..self }
    }

    pub fn with_range(self, start_bank: u8, start_addr: u16, end_bank: u8, end_addr: u16) -> Self {
        Self {
            start_bank,
            start_addr,
            end_bank,
            end_addr,
            ..self
        }
    }

    pub fn with_widths(self, accum_16: bool, index_16: bool) -> Self {
        Self {
            start_accum_16: accum_16,
            start_index_16: index_16,
            ..self
        }
    }
}

impl Default for RequestProperties {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of work for the engine: a range, a type, and the properties
/// governing how it's decoded and rendered.
#[derive(Debug, Clone, Copy)]
pub struct Request {
    pub request_type: RequestType,
    pub properties: RequestProperties,
    /// `.db` bytes emitted per line for `RequestType::Dcb` (spec.md §9's
    /// open question; resolved to 16 in `SPEC_FULL.md` §0).
    pub bytes_per_line: usize,
}

impl Request {
    pub fn new(request_type: RequestType, properties: RequestProperties) -> Self {
        Self {
            request_type,
            properties,
            bytes_per_line: 16,
        }
    }

    pub fn with_bytes_per_line(self, bytes_per_line: usize) -> Self {
        Self { bytes_per_line, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_match_original_baseline() {
        let props = RequestProperties::new();
        assert_eq!(props.comment_level, 1);
        assert_eq!(props.passes, 1);
        assert!(!props.stop_at_rts);
    }

    #[test]
    fn two_pass_overrides_passes_only() {
        let props = RequestProperties::new().with_range(0x00, 0x8000, 0x00, 0xFFFF).two_pass();
        assert_eq!(props.passes, 2);
        assert_eq!(props.start_addr, 0x8000);
    }

    #[test]
    fn request_defaults_to_sixteen_bytes_per_line() {
        let req = Request::new(RequestType::Dcb, RequestProperties::new());
        assert_eq!(req.bytes_per_line, 16);
    }
}
