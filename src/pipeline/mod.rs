//! Pipeline stages for PDF organization, extraction, and Markdown rendering.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the text engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! organize ──▶ extract ──▶ vector     (asset pipeline)
//! (title dir)  (images)   (svg siblings)
//!        │
//!        └───▶ markdown ──▶ rewrite   (text pipeline)
//!              (engine)    (relative paths)
//! ```
//!
//! 1. [`organize`] — open and validate the PDF, derive the title directory,
//!    relocate the source, compute the image directory
//! 2. [`extract`]  — pull embedded raster images, size-filter, dedup by
//!    content hash, normalize to the canonical format, persist
//! 3. [`vector`]   — best-effort `.svg` sibling per raster via an ordered
//!    strategy chain with a no-fail inline-embed terminal
//! 4. [`markdown`] — per-page text from the structured-text engine, image
//!    references appended, deterministic tidy pass
//! 5. [`rewrite`]  — textual substitution of absolute image-directory paths
//!    with POSIX relative paths from the Markdown file
//!
//! [`sanitize`] and [`hash`] are the leaf helpers the stages above share.

pub mod extract;
pub mod hash;
pub mod markdown;
pub mod organize;
pub mod rewrite;
pub mod sanitize;
pub mod vector;
