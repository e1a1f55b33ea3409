//! Static disassembler for the 65816 CPU family used by the Super
//! Nintendo / Super Famicom.
//!
//! Given a ROM image and a [`Request`](request::Request) naming a
//! `(bank, addr16)` range, this crate decodes 65816 machine code into
//! readable assembly text, a raw `.db` dump, or a pointer table,
//! according to the request's type. Sidecar text files
//! ([`annotations`]) can seed labels, comments, data ranges, and
//! register-width hints ahead of time; anything not pre-annotated is
//! discovered from the code itself where that's possible (branch and
//! jump targets) and left as a numeric address otherwise.
//!
//! # Quick start
//!
//! ```
//! use snes_disasm::address::RomMode;
//! use snes_disasm::decoder::RomBytes;
//! use snes_disasm::engine::Engine;
//! use snes_disasm::request::{Request, RequestProperties, RequestType};
//! use snes_disasm::sink::RecordCollectorSink;
//!
//! let mut engine = Engine::new(RomMode::LoRom);
//! let mut rom = RomBytes::new(vec![0xA9, 0x01, 0x60]); // LDA #$01 ; RTS
//! let props = RequestProperties::new().with_range(0x00, 0x8000, 0x00, 0x8003);
//! let request = Request::new(RequestType::Asm, props);
//! let mut sink = RecordCollectorSink::new();
//! engine.run(&request, &mut rom, &mut sink).unwrap();
//! assert_eq!(sink.records.len(), 2);
//! ```
//!
//! # Module map
//!
//! | module | role |
//! |---|---|
//! | [`address`] | `(bank, addr16)` / 24-bit / linear-index conversions |
//! | [`byte_map`] | per-byte sidecar table (classification, labels, comments) |
//! | [`opcode`] | the static 65816 opcode table |
//! | [`decoder`] | decode-time register state and the ROM byte-source capability |
//! | [`handlers`] | per-addressing-mode operand decoding |
//! | [`annotations`] | sidecar annotation file loaders |
//! | [`labels`] | two-pass label discovery and resolution |
//! | [`request`] | the external request contract |
//! | [`engine`] | drives a request across a range |
//! | [`sink`] | pluggable output formats |

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod address;
pub mod annotations;
pub mod byte_map;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod labels;
pub mod opcode;
pub mod request;
pub mod sink;

pub use crate::error::{DisasmError, Result};

/// Crate version, for `--version` output and diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
