//! Output sink capability (spec §4.I).
//!
//! The engine never writes text directly; it emits [`Record`]s to
//! whatever [`OutputSink`] the caller chose. Grounded on the teacher's
//! `PayloadFormatter` trait (`formatter.rs`): one pluggable interface,
//! several concrete renderers selected by the caller rather than by the
//! engine.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::{DisasmError, Result};

/// One emitted line of disassembly output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// A label on its own line, with nothing else at that address yet.
    Label { addr: u32, name: String },
    /// One decoded instruction.
    Instruction {
        addr: u32,
        bytes: Vec<u8>,
        mnemonic: String,
        operand: String,
        label: Option<String>,
        comment: Option<String>,
    },
    /// One line of a `.db` data dump.
    Data {
        addr: u32,
        bytes: Vec<u8>,
        label: Option<String>,
        comment: Option<String>,
    },
    /// One pointer-table entry (`.dw`/`.dl`).
    Pointer {
        addr: u32,
        target: u32,
        is_long: bool,
        label: Option<String>,
    },
    /// A standalone comment line, not attached to any instruction.
    Comment { addr: u32, text: String },
    /// The original's literal end-of-file marker (spec supplement §3.5).
    EndOfFile { addr: u32 },
}

/// A sink records receive. Implementors decide how (or whether) to
/// render each variant; the engine only ever calls `emit`.
pub trait OutputSink {
    fn emit(&mut self, record: &Record) -> Result<()>;

    /// Called once after a request finishes. Default no-op; sinks that
    /// buffer (like `JsonSink`) use it to flush.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders an assembly-style listing: `.bank`/mnemonic/`.db` text, one
/// line per record, matching the shape spec.md §6 describes.
pub struct PlainTextSink<W: Write> {
    writer: W,
    current_bank: Option<u8>,
}

impl<W: Write> PlainTextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            current_bank: None,
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}").map_err(|source| DisasmError::Io {
            path: "<sink>".into(),
            source,
        })
    }

    fn maybe_emit_bank_directive(&mut self, addr: u32) -> Result<()> {
        let bank = (addr >> 16) as u8;
        if self.current_bank != Some(bank) {
            self.write_line(&format!(".bank ${bank:02X}"))?;
            self.current_bank = Some(bank);
        }
        Ok(())
    }
}

impl<W: Write> OutputSink for PlainTextSink<W> {
    fn emit(&mut self, record: &Record) -> Result<()> {
        match record {
            Record::Label { addr, name } => {
                self.maybe_emit_bank_directive(*addr)?;
                self.write_line(&format!("{name}:"))
            }
            Record::Instruction {
                addr,
                bytes,
                mnemonic,
                operand,
                label,
                comment,
            } => {
                self.maybe_emit_bank_directive(*addr)?;
                if let Some(label) = label {
                    self.write_line(&format!("{label}:"))?;
                }
                let mut line = format!("    {mnemonic}");
                if !operand.is_empty() {
                    line.push(' ');
                    line.push_str(operand);
                }
                if let Some(comment) = comment {
                    line.push_str("  ; ");
                    line.push_str(comment);
                }
                let _ = bytes;
                self.write_line(&line)
            }
            Record::Data { addr, bytes, label, comment } => {
                self.maybe_emit_bank_directive(*addr)?;
                if let Some(label) = label {
                    self.write_line(&format!("{label}:"))?;
                }
                let mut line = format!("    .db {}", format_bytes(bytes));
                if let Some(comment) = comment {
                    line.push_str("  ; ");
                    line.push_str(comment);
                }
                self.write_line(&line)
            }
            Record::Pointer {
                addr,
                target,
                is_long,
                label,
            } => {
                self.maybe_emit_bank_directive(*addr)?;
                let directive = if *is_long { ".dl" } else { ".dw" };
                let operand = label.clone().unwrap_or_else(|| format!("${target:06X}"));
                self.write_line(&format!("    {directive} {operand}"))
            }
            Record::Comment { text, .. } => self.write_line(&format!("    ; {text}")),
            Record::EndOfFile { .. } => self.write_line("    ; End of file."),
        }
    }
}

/// Serializes each record as one line of JSON, for tooling that wants
/// structured output (the teacher's `JsonFormatter` equivalent).
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputSink for JsonSink<W> {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let line = serde_json::to_string(record).expect("Record serialization is infallible");
        writeln!(self.writer, "{line}").map_err(|source| DisasmError::Io {
            path: "<sink>".into(),
            source,
        })
    }
}

/// Collects records in memory; lets tests assert on structure instead of
/// rendered text.
#[derive(Debug, Default)]
pub struct RecordCollectorSink {
    pub records: Vec<Record>,
}

impl RecordCollectorSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for RecordCollectorSink {
    fn emit(&mut self, record: &Record) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Adapter so `io::sink()`/`Vec<u8>` based sinks can report their
/// "writer produced no error" path through the crate's `Result`.
pub fn string_writer() -> impl Write {
    io::Cursor::new(Vec::<u8>::new())
}
