//! `snes-disasm` — disassemble one range of a 65816 ROM image.
//!
//! Builds exactly one [`Request`] from command-line flags and writes
//! its output once; there is no interactive dispatch loop here, that
//! collaborator lives outside this crate.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use snes_disasm::address::RomMode;
use snes_disasm::annotations::AnnotationLoader;
use snes_disasm::decoder::RomBytes;
use snes_disasm::engine::Engine;
use snes_disasm::request::{Request, RequestProperties, RequestType};
use snes_disasm::sink::{JsonSink, OutputSink, PlainTextSink};

/// Disassemble a range of a 65816 (SNES) ROM image.
#[derive(Parser, Debug)]
#[command(name = "snes-disasm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ROM image to disassemble.
    rom: PathBuf,

    /// ROM-to-address-space mapping.
    #[arg(long, value_enum, default_value = "lorom")]
    mapping: MappingArg,

    /// What to do with the range.
    #[arg(long, value_enum, default_value = "asm")]
    mode: ModeArg,

    /// Starting bank (hex, e.g. `00`).
    #[arg(long, default_value = "00")]
    start_bank: String,
    /// Starting 16-bit address (hex, e.g. `8000`).
    #[arg(long, default_value = "8000")]
    start_addr: String,
    /// Ending bank (hex, exclusive).
    #[arg(long, default_value = "00")]
    end_bank: String,
    /// Ending 16-bit address (hex, exclusive).
    #[arg(long, default_value = "ffff")]
    end_addr: String,

    /// Start with a 16-bit accumulator.
    #[arg(long)]
    accum16: bool,
    /// Start with 16-bit index registers.
    #[arg(long)]
    index16: bool,
    /// Stop an `asm` run at the first `RTS`/`RTL`/`RTI`.
    #[arg(long)]
    stop_at_rts: bool,
    /// Report references to addresses outside the requested range.
    #[arg(long)]
    use_extern_symbols: bool,
    /// `.db` bytes per line for `dcb`/`smart` data runs.
    #[arg(long, default_value_t = 16)]
    bytes_per_line: usize,

    /// Bytes of copier header to skip before seeking to `start_addr`.
    #[arg(long, default_value_t = 0)]
    header_size: usize,

    /// Symbols sidecar file (`addr24 [label]` per line).
    #[arg(long)]
    symbols: Option<PathBuf>,
    /// Comments sidecar file (`addr24 text...` per line).
    #[arg(long)]
    comments: Option<PathBuf>,
    /// Data-range sidecar file (`start_addr24 [end_addr24] [flag [label]]` per line).
    #[arg(long)]
    data: Option<PathBuf>,
    /// Data-bank sidecar file (`start_addr24 end_addr24 data_bank` per line).
    #[arg(long)]
    databanks: Option<PathBuf>,
    /// Load-offset sidecar file (`addr24 offset` per line).
    #[arg(long)]
    offsets: Option<PathBuf>,
    /// Accumulator/index width-reset sidecar (`addr24 tag bytes` per line).
    #[arg(long)]
    accum_widths: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Verbose diagnostics on stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MappingArg {
    Lorom,
    Hirom,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Asm,
    Dcb,
    Ptr,
    PtrLong,
    Smart,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Json,
}

fn parse_hex_arg(name: &str, value: &str) -> Result<u32, String> {
    u32::from_str_radix(value.trim_start_matches("0x").trim_start_matches('$'), 16)
        .map_err(|_| format!("--{name}: {value:?} is not a hex number"))
}

fn run(args: &Args) -> Result<(), String> {
    if args.verbose {
        tracing_subscriber::fmt().with_env_filter("snes_disasm=debug").init();
    }

    let rom_mode = match args.mapping {
        MappingArg::Lorom => RomMode::LoRom,
        MappingArg::Hirom => RomMode::HiRom,
    };
    let mut engine = Engine::new(rom_mode).with_header_size(args.header_size);

    if let Some(path) = &args.symbols {
        AnnotationLoader::load_symbols(engine.map_mut(), path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.comments {
        AnnotationLoader::load_comments(engine.map_mut(), path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.data {
        AnnotationLoader::load_data(engine.map_mut(), path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.databanks {
        AnnotationLoader::load_data_banks(engine.map_mut(), path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.offsets {
        AnnotationLoader::load_offsets(engine.map_mut(), path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.accum_widths {
        AnnotationLoader::load_accum_widths(engine.map_mut(), path).map_err(|e| e.to_string())?;
    }

    let start_bank = parse_hex_arg("start-bank", &args.start_bank)? as u8;
    let start_addr = parse_hex_arg("start-addr", &args.start_addr)? as u16;
    let end_bank = parse_hex_arg("end-bank", &args.end_bank)? as u8;
    let end_addr = parse_hex_arg("end-addr", &args.end_addr)? as u16;

    let mut properties = RequestProperties::new()
        .with_range(start_bank, start_addr, end_bank, end_addr)
        .with_widths(args.accum16, args.index16);
    properties.stop_at_rts = args.stop_at_rts;
    properties.use_extern_symbols = args.use_extern_symbols;

    let request_type = match args.mode {
        ModeArg::Asm => RequestType::Asm,
        ModeArg::Dcb => RequestType::Dcb,
        ModeArg::Ptr => RequestType::Ptr,
        ModeArg::PtrLong => RequestType::PtrLong,
        ModeArg::Smart => RequestType::Smart,
    };
    let request = Request::new(request_type, properties).with_bytes_per_line(args.bytes_per_line);

    let rom_data = fs::read(&args.rom).map_err(|e| format!("{}: {e}", args.rom.display()))?;
    let mut source = RomBytes::new(rom_data);

    let stdout = std::io::stdout();
    let mut text_sink;
    let mut json_sink;
    let sink: &mut dyn OutputSink = match args.format {
        FormatArg::Text => {
            text_sink = PlainTextSink::new(stdout.lock());
            &mut text_sink
        }
        FormatArg::Json => {
            json_sink = JsonSink::new(stdout.lock());
            &mut json_sink
        }
    };

    engine.run(&request, &mut source, sink).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_dollar_prefix() {
        assert_eq!(parse_hex_arg("start-addr", "$8000").unwrap(), 0x8000);
    }

    #[test]
    fn parses_hex_without_prefix() {
        assert_eq!(parse_hex_arg("start-bank", "7e").unwrap(), 0x7e);
    }

    #[test]
    fn rejects_non_hex_value() {
        assert!(parse_hex_arg("start-addr", "not-hex").is_err());
    }
}
