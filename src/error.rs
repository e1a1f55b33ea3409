//! Error type for operations that can genuinely fail.
//!
//! Per spec §7, most abnormal conditions (conflicting annotations,
//! references outside the requested range, pointer targets with no
//! resolvable label) are diagnostics, not errors — they are logged via
//! `tracing` or folded into collected output, never returned as `Err`.
//! What's left here is the small set of conditions that stop a request
//! outright: I/O failure, a ROM too small to satisfy the request, a
//! seek past the end of the image, and the two sidecar fields spec §7.1
//! calls out as fatal to parse.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can abort disassembly or annotation loading.
#[derive(Debug, Error)]
pub enum DisasmError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ROM image is only {actual} bytes, too small for a {required}-byte header")]
    RomTooSmall { actual: usize, required: usize },

    #[error("seek to file index {index} is past end of image ({len} bytes)")]
    SeekPastEnd { index: usize, len: usize },

    #[error("{file}:{line}: malformed pointer-size flag {value:?}")]
    InvalidPointerSize {
        file: PathBuf,
        line: usize,
        value: String,
    },

    #[error("{file}:{line}: malformed load offset {value:?}")]
    InvalidLoadOffset {
        file: PathBuf,
        line: usize,
        value: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DisasmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_too_small_message() {
        let err = DisasmError::RomTooSmall {
            actual: 10,
            required: 512,
        };
        assert_eq!(
            err.to_string(),
            "ROM image is only 10 bytes, too small for a 512-byte header"
        );
    }

    #[test]
    fn seek_past_end_message() {
        let err = DisasmError::SeekPastEnd { index: 100, len: 50 };
        assert_eq!(
            err.to_string(),
            "seek to file index 100 is past end of image (50 bytes)"
        );
    }

    #[test]
    fn invalid_pointer_size_message_includes_location() {
        let err = DisasmError::InvalidPointerSize {
            file: PathBuf::from("ptrs.txt"),
            line: 4,
            value: "maybe".into(),
        };
        assert_eq!(
            err.to_string(),
            "ptrs.txt:4: malformed pointer-size flag \"maybe\""
        );
    }
}
