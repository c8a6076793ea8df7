//! Error types for the paper2md library.
//!
//! A single fatal error type covers everything that makes the whole
//! conversion impossible: an input that cannot be opened, an invalid
//! configuration, or a final output file that cannot be written.
//!
//! Everything smaller deliberately has no type. A single embedded image
//! that fails to decode, a file move that is refused by the filesystem, a
//! relative-path computation that cannot succeed — each of those degrades
//! to a documented fallback and is surfaced only as a `tracing` warning.
//! Callers get either the full result structure or one fatal error; they
//! never have to triage partial failures out of the error channel.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the paper2md library.
///
/// Skip-unit failures (a bad embedded image, a refused file move, a failed
/// vector conversion) are logged and degraded, never propagated here.
#[derive(Debug, Error)]
pub enum Paper2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'\nTry: chmod +r '{}'", .path.display(), .path.display())]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{}'\nFirst bytes: {magic:?}", .path.display())]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf", .path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file or directory.
    #[error("Failed to write output '{}': {source}", .path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
