//! Top-level conversion entry points.
//!
//! ## Control flow
//!
//! Organize (title → directory → relocate) ▸ extract embedded images into
//! the organized image directory ▸ render Markdown with image references ▸
//! write the raw text ▸ rewrite image paths relative to the Markdown file ▸
//! commit the rewritten text atomically.
//!
//! The pre-rewrite write mirrors the engine contract: the file on disk
//! briefly holds un-rewritten paths, and only the rewritten text is
//! committed (temp file + rename). Callers must treat the intermediate
//! state as an implementation detail.
//!
//! A conversion is not safe to run concurrently against the *same* source
//! path from two callers — the file move is not atomic with directory
//! creation. Distinct documents are safe to process in parallel.

use crate::config::ConversionConfig;
use crate::error::Paper2MdError;
use crate::output::{ConversionOutput, DocumentMetadata};
use crate::pipeline::{extract, markdown, organize, rewrite};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Convert a PDF to Markdown, organizing it into a title-named directory.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(Paper2MdError)` only for fatal conditions: the input cannot
/// be opened, the configuration is invalid, or an output file cannot be
/// written. Per-image failures, refused moves, and missing titles degrade
/// with warnings and still produce a full result.
pub fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Paper2MdError> {
    let pdf_path = pdf_path.as_ref();
    info!("Starting conversion: {}", pdf_path.display());

    // ── Step 1: Open and organize ────────────────────────────────────────
    let doc = organize::open_document(pdf_path)?;
    let organized = organize::organize(pdf_path, &doc, &config.image_dir)?;
    debug!(
        "Organized into '{}' (source now at '{}')",
        organized.dest_dir.display(),
        organized.source_path.display()
    );

    // ── Step 2: Emit images into the organized image directory ──────────
    let (images, image_dir) = if config.write_images {
        let records =
            extract::extract_images_from_doc(&doc, &organized.image_dir, &config.extraction)?;
        info!("Extracted {} images", records.len());
        // Prefer the resolved form so references in the raw text match what
        // the rewriter computes against.
        let dir = fs::canonicalize(&organized.image_dir).unwrap_or(organized.image_dir.clone());
        (records, dir)
    } else {
        (Vec::new(), organized.image_dir.clone())
    };

    // ── Step 3: Render the Markdown body ────────────────────────────────
    let images_abs: Vec<_> = images
        .iter()
        .cloned()
        .map(|mut r| {
            if let Some(name) = r.saved_path.file_name() {
                r.saved_path = image_dir.join(name);
            }
            r
        })
        .collect();
    let raw_text = markdown::render(&organized.source_path, &images_abs, config.page_chunks);

    // ── Step 4: Verbatim write, then rewrite, then atomic commit ────────
    let md_path = organized.dest_dir.join(&config.md_output_path);
    write_file(&md_path, &raw_text)?;

    let markdown = rewrite::rewrite_image_paths(&raw_text, &image_dir, &md_path);
    commit_file(&md_path, &markdown)?;
    info!("Markdown committed to '{}'", md_path.display());

    Ok(ConversionOutput {
        markdown,
        dest_dir: organized.dest_dir,
        source_path: organized.source_path,
        markdown_path: md_path,
        images: images_abs,
    })
}

/// Extract document metadata without converting content.
pub fn inspect(pdf_path: impl AsRef<Path>) -> Result<DocumentMetadata, Paper2MdError> {
    let doc = organize::open_document(pdf_path.as_ref())?;
    Ok(organize::read_metadata(&doc))
}

fn write_file(path: &Path, contents: &str) -> Result<(), Paper2MdError> {
    fs::write(path, contents).map_err(|e| Paper2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Atomic commit: write to a temp sibling, then rename over the target.
fn commit_file(path: &Path, contents: &str) -> Result<(), Paper2MdError> {
    let tmp_path = path.with_extension("md.tmp");
    write_file(&tmp_path, contents)?;
    fs::rename(&tmp_path, path).map_err(|e| Paper2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
