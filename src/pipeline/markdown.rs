//! Markdown rendering: delegate page text to the structured-text engine and
//! interleave image references, then apply a deterministic tidy pass.
//!
//! ## Why the engine never fails here
//!
//! The fatal surface of a conversion is "the document cannot be opened",
//! and the organizer has already opened it by the time this stage runs. If
//! `pdf_extract` still chokes on a page's content streams, the run degrades
//! to image references with empty body text and a warning — a scholarly PDF
//! with garbled text layers is still worth its figures.
//!
//! Image references are emitted with whatever path the extractor recorded
//! (typically absolute). Relativizing them is the rewriter's job; this
//! stage treats paths as opaque strings.

use crate::output::ImageRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::warn;

/// Render the Markdown body for a document.
///
/// `page_chunks` switches from one continuous stream to per-page `## Page N`
/// sections. Image references are appended to the page they were found on,
/// in record order.
pub fn render(pdf_path: &Path, images: &[ImageRecord], page_chunks: bool) -> String {
    let page_texts = match pdf_extract::extract_text_by_pages(pdf_path) {
        Ok(pages) => pages,
        Err(e) => {
            warn!(
                "Text extraction failed for '{}': {}; continuing with image references only",
                pdf_path.display(),
                e
            );
            Vec::new()
        }
    };

    let last_image_page = images.iter().map(|r| r.page_index + 1).max().unwrap_or(0);
    let page_count = page_texts.len().max(last_image_page);

    let mut parts: Vec<String> = Vec::new();
    for page_index in 0..page_count {
        let text = page_texts.get(page_index).map(String::as_str).unwrap_or("");
        let refs: Vec<String> = images
            .iter()
            .filter(|r| r.page_index == page_index)
            .map(|r| format!("![]({})", r.saved_path.display()))
            .collect();

        if text.trim().is_empty() && refs.is_empty() && !page_chunks {
            continue;
        }

        let mut section = String::new();
        if page_chunks {
            section.push_str(&format!("## Page {}\n\n", page_index + 1));
        }
        if !text.trim().is_empty() {
            section.push_str(text.trim_end());
            section.push('\n');
        }
        for r in &refs {
            section.push('\n');
            section.push_str(r);
            section.push('\n');
        }
        parts.push(section);
    }

    tidy(&parts.join("\n"))
}

// ── Tidy pass ────────────────────────────────────────────────────────────
//
// Deterministic cleanup of engine output: text extractors produce CRLF
// endings, trailing spaces, and runs of blank lines depending on the
// source's content streams. Each rule is a pure `&str → String` function.

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

/// Normalise line endings, trim trailing whitespace per line, collapse
/// excessive blank lines, and end with exactly one newline.
pub fn tidy(input: &str) -> String {
    let s = input.replace("\r\n", "\n").replace('\r', "\n");
    let s = s
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    let s = RE_BLANK_LINES.replace_all(&s, "\n\n\n").to_string();

    let trimmed = s.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}
