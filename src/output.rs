//! Output types: what a conversion or extraction run hands back.
//!
//! The contract surface for callers is deliberately small: the generated
//! Markdown text plus the destination directory. The remaining fields are
//! conveniences (where the source ended up, which images were written) that
//! save the caller a directory listing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a full PDF-to-Markdown conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The final Markdown text, with image references rewritten to POSIX
    /// relative paths. Identical to the committed file contents.
    pub markdown: String,

    /// The per-document destination directory (sanitized title or
    /// `untitled`), owning the relocated PDF, images, and Markdown file.
    pub dest_dir: PathBuf,

    /// Where the source PDF lives after organizing. Equal to its original
    /// location when the move was skipped or refused.
    pub source_path: PathBuf,

    /// The committed Markdown file.
    pub markdown_path: PathBuf,

    /// Images extracted during this run, in document order.
    pub images: Vec<ImageRecord>,
}

/// One extracted embedded image.
///
/// Created once per unique image per run and never mutated; the only durable
/// artifact it describes is the file at `saved_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 0-based page index the image was found on.
    pub page_index: usize,

    /// PDF object number of the image XObject within the document.
    pub xref: u32,

    /// Declared pixel width.
    pub width: u32,

    /// Declared pixel height.
    pub height: u32,

    /// Where the canonical raster file was written.
    pub saved_path: PathBuf,

    /// Encoding the image carried inside the PDF (`jpeg`, `raw`, …).
    pub original_format: String,

    /// Canonical encoding it was saved as (`png` by default).
    pub target_format: String,

    /// SHA-256 hex digest of the extracted bytes; the dedup key.
    pub sha256: String,
}

/// Document metadata read from the PDF's Info dictionary.
///
/// Available without converting via [`crate::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
