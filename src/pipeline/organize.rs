//! Document organization: open and validate the source PDF, derive its
//! title-based destination directory, relocate the source, and compute the
//! image subdirectory.
//!
//! ## Why relocate instead of copy?
//!
//! The destination directory *owns* the document from this point on: the
//! PDF, its extracted images, and the generated Markdown live together and
//! can be archived or shipped as one unit. Copying would leave a stray
//! original behind and double the disk footprint of large scans.
//!
//! Every step past opening the document degrades instead of failing: a
//! missing title falls back to `untitled`, a refused move keeps the
//! original path, and an already-organized document is recognized so the
//! file is never moved onto itself.

use crate::error::Paper2MdError;
use crate::output::DocumentMetadata;
use crate::pipeline::sanitize::sanitize_title;
use lopdf::{Dictionary, Document, Object};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The organized layout for one document.
#[derive(Debug, Clone)]
pub struct OrganizedDocument {
    /// Per-document destination directory, named by the sanitized title.
    pub dest_dir: PathBuf,
    /// Where the source PDF lives now (original path if the move was refused).
    pub source_path: PathBuf,
    /// `dest_dir/<image_dir_name>`; not created here.
    pub image_dir: PathBuf,
    /// The raw title string from the Info dictionary, if any.
    pub title: Option<String>,
}

/// Open a PDF, validating existence, readability, and magic bytes first.
///
/// This is the fatal surface of the whole pipeline: everything that follows
/// a successful open degrades rather than errors.
pub fn open_document(path: &Path) -> Result<Document, Paper2MdError> {
    if !path.exists() {
        return Err(Paper2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Paper2MdError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Paper2MdError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Paper2MdError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    Document::load(path).map_err(|e| Paper2MdError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Organize a document: derive the destination directory, create it, move
/// the PDF into it, and compute the image subdirectory.
///
/// Never fails past this point: a missing title uses the fallback name and
/// a refused move logs a warning and keeps the original path.
pub fn organize(
    pdf_path: &Path,
    doc: &Document,
    image_dir_name: &str,
) -> Result<OrganizedDocument, Paper2MdError> {
    let title = read_title(doc);
    let dir_name = sanitize_title(title.as_deref().unwrap_or(""));
    debug!("Document title {:?} → directory '{}'", title, dir_name);

    let parent = match pdf_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    // Destination is a sibling of the source's parent directory. For a
    // document that was already organized this resolves back to its own
    // directory, which is what makes re-runs idempotent.
    let base = match parent.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => parent.clone(),
    };
    let dest_dir = base.join(&dir_name);

    fs::create_dir_all(&dest_dir).map_err(|e| Paper2MdError::OutputWriteFailed {
        path: dest_dir.clone(),
        source: e,
    })?;

    let source_path = relocate_source(pdf_path, &dest_dir);
    let image_dir = dest_dir.join(image_dir_name);

    Ok(OrganizedDocument {
        dest_dir,
        source_path,
        image_dir,
        title,
    })
}

/// Move the source PDF into the destination directory, unless it is already
/// there or the filesystem refuses. Returns the path to use downstream.
fn relocate_source(pdf_path: &Path, dest_dir: &Path) -> PathBuf {
    let file_name = match pdf_path.file_name() {
        Some(n) => n.to_os_string(),
        None => return pdf_path.to_path_buf(),
    };
    let target = dest_dir.join(&file_name);

    if paths_are_same_file(pdf_path, &target) {
        debug!("Source already organized at {}", target.display());
        return target;
    }

    if target.exists() {
        // Title-collision policy: never overwrite an existing file.
        warn!(
            "Target '{}' already exists; keeping source at '{}'",
            target.display(),
            pdf_path.display()
        );
        return pdf_path.to_path_buf();
    }

    match fs::rename(pdf_path, &target) {
        Ok(()) => {
            info!("Moved '{}' → '{}'", pdf_path.display(), target.display());
            target
        }
        Err(e) => {
            // Cross-device links and permission errors land here. The
            // document is still perfectly usable where it is.
            warn!(
                "Could not move '{}' to '{}': {}; continuing with original path",
                pdf_path.display(),
                target.display(),
                e
            );
            pdf_path.to_path_buf()
        }
    }
}

/// True when both paths resolve to the same file (or the same textual path
/// when one of them does not exist yet).
fn paths_are_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

// ── Metadata ─────────────────────────────────────────────────────────────

/// Read the declared title from the document's Info dictionary.
pub fn read_title(doc: &Document) -> Option<String> {
    info_string(doc, b"Title")
}

/// Read full document metadata without converting anything.
pub fn read_metadata(doc: &Document) -> DocumentMetadata {
    DocumentMetadata {
        title: info_string(doc, b"Title"),
        author: info_string(doc, b"Author"),
        subject: info_string(doc, b"Subject"),
        creator: info_string(doc, b"Creator"),
        producer: info_string(doc, b"Producer"),
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
    }
}

fn info_dict(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Dictionary(d) => Some(d),
            _ => None,
        },
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let value = match info_dict(doc)?.get(key).ok()? {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => return None,
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, otherwise
/// PDFDocEncoding, which agrees with Latin-1 over the printable range.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain_ascii() {
        assert_eq!(decode_pdf_string(b"Hello"), "Hello");
    }

    #[test]
    fn decode_latin1_range() {
        assert_eq!(decode_pdf_string(&[0x4D, 0xFC, 0x6C, 0x6C, 0x65, 0x72]), "Müller");
    }

    #[test]
    fn decode_utf16be_with_bom() {
        // "Zn" in UTF-16BE with BOM
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x5A, 0x00, 0x6E]), "Zn");
    }

    #[test]
    fn decode_utf16be_non_ascii() {
        // "結" U+7D50
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x7D, 0x50]), "結");
    }

    #[test]
    fn open_document_rejects_missing_file() {
        let err = open_document(Path::new("/nonexistent/nope.pdf")).unwrap_err();
        assert!(matches!(err, Paper2MdError::FileNotFound { .. }));
    }

    #[test]
    fn open_document_rejects_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        fs::write(&path, b"PK\x03\x04 definitely a zip").unwrap();
        let err = open_document(&path).unwrap_err();
        assert!(matches!(err, Paper2MdError::NotAPdf { .. }));
    }
}
