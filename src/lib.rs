//! # paper2md
//!
//! Convert scholarly PDFs into organized Markdown directories.
//!
//! Each conversion takes a PDF, reads its embedded title, and builds a
//! self-contained directory next to the source's parent directory: the PDF
//! moves in, embedded figures are extracted into an image subdirectory, and
//! a Markdown rendition with relative image links is written alongside.
//!
//! ## Pipeline
//!
//! ```text
//! PDF ──▸ organize (title → directory → relocate)
//!     ──▸ extract  (embedded images, dedupe, vector siblings)
//!     ──▸ render   (page text + image references)
//!     ──▸ rewrite  (absolute → relative image paths)
//!     ──▸ commit   (atomic Markdown write)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use paper2md::{convert, ConversionConfig};
//!
//! # fn main() -> Result<(), paper2md::Paper2MdError> {
//! let config = ConversionConfig::builder()
//!     .image_dir("materials")
//!     .page_chunks(true)
//!     .build()?;
//!
//! let output = convert("papers/incoming/draft.pdf", &config)?;
//! println!("Markdown at {}", output.markdown_path.display());
//! println!("{} images extracted", output.images.len());
//! # Ok(())
//! # }
//! ```
//!
//! Image extraction is also usable on its own, without the organizing
//! conversion, via [`extract_images`].
//!
//! ## Feature flags
//!
//! - `cli` *(default)* — builds the `paper2md` binary (pulls in `clap`,
//!   `anyhow`, `tracing-subscriber`). Disable for library-only use:
//!   `default-features = false`.

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ExtractionConfig, RasterFormat, StrategyPreference,
};
pub use convert::{convert, inspect};
pub use error::Paper2MdError;
pub use output::{ConversionOutput, DocumentMetadata, ImageRecord};
pub use pipeline::extract::extract_images;
