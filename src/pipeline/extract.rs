//! Embedded-image extraction: walk a parsed PDF's pages, pull raster image
//! XObjects, normalize them to the canonical encoding, deduplicate by
//! content hash, and persist them.
//!
//! ## Failure model
//!
//! One corrupt or unsupported image never takes down the page or the
//! document: every per-image failure logs a warning and moves on. The only
//! errors this module returns are the ones that make the whole run
//! meaningless — an unopenable document or an unwritable output directory.
//!
//! ## Determinism
//!
//! Pages are visited in document order and each page's `Resources → XObject`
//! entries in dictionary order, so for a fixed parser version the record
//! list and the generated filenames are stable. The filename embeds the
//! page number, the object number, and a hash prefix, which makes two
//! distinct images colliding on a name impossible within one run.

use crate::config::{ExtractionConfig, RasterFormat};
use crate::error::Paper2MdError;
use crate::output::ImageRecord;
use crate::pipeline::hash::content_digest;
use crate::pipeline::organize::open_document;
use crate::pipeline::vector;
use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extract all embedded images from the PDF at `pdf_path` into `output_dir`.
///
/// Returns records in document order, then per-page discovery order.
pub fn extract_images(
    pdf_path: &Path,
    output_dir: &Path,
    cfg: &ExtractionConfig,
) -> Result<Vec<ImageRecord>, Paper2MdError> {
    let doc = open_document(pdf_path)?;
    extract_images_from_doc(&doc, output_dir, cfg)
}

/// Like [`extract_images`], for callers already holding a parsed document.
pub fn extract_images_from_doc(
    doc: &Document,
    output_dir: &Path,
    cfg: &ExtractionConfig,
) -> Result<Vec<ImageRecord>, Paper2MdError> {
    fs::create_dir_all(output_dir).map_err(|e| Paper2MdError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut records: Vec<ImageRecord> = Vec::new();
    let mut saved: Vec<PathBuf> = Vec::new();

    for (page_index, (_page_no, page_id)) in doc.get_pages().into_iter().enumerate() {
        for (id, stream) in page_image_streams(doc, page_id) {
            if let Some(record) =
                extract_one(doc, page_index, id, stream, output_dir, cfg, &mut seen_hashes)
            {
                saved.push(record.saved_path.clone());
                records.push(record);
            }
        }
    }

    debug!(
        "Extracted {} unique images to {}",
        records.len(),
        output_dir.display()
    );

    // Best-effort enhancement: a failing vector chain must never abort the
    // extraction that called it.
    if cfg.vectorize && !saved.is_empty() {
        if cfg.target_format == RasterFormat::Png {
            vector::vectorize_batch(&saved, cfg.strategy);
        } else {
            debug!(
                "Vectorization requires PNG rasters; no .svg siblings for {} output",
                cfg.target_format.ext()
            );
        }
    }

    Ok(records)
}

// ── Page walking ─────────────────────────────────────────────────────────

/// Image XObject streams referenced by a page, in dictionary order.
fn page_image_streams(doc: &Document, page_id: ObjectId) -> Vec<(ObjectId, &Stream)> {
    let mut out = Vec::new();

    let Ok(page) = doc.get_dictionary(page_id) else {
        warn!("Page object {page_id:?} is not a dictionary; skipping page");
        return out;
    };
    let Some(resources) = page.get(b"Resources").ok().map(|o| resolve(doc, o)) else {
        return out;
    };
    let Object::Dictionary(resources) = resources else {
        return out;
    };
    let Some(Object::Dictionary(xobjects)) =
        resources.get(b"XObject").ok().map(|o| resolve(doc, o))
    else {
        return out;
    };

    for (_name, value) in xobjects.iter() {
        let Object::Reference(id) = value else { continue };
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            continue;
        };
        let is_image = matches!(
            stream.dict.get(b"Subtype"),
            Ok(Object::Name(n)) if n == b"Image"
        );
        if is_image {
            out.push((*id, stream));
        }
    }

    out
}

/// Follow one level of indirection, which is all PDF dictionaries use for
/// resources in practice.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

// ── Per-image extraction ─────────────────────────────────────────────────

/// What an image XObject carried, after stream decoding.
enum Payload {
    /// DCTDecode stream: the raw content already is a JPEG file.
    Jpeg(Vec<u8>),
    /// Unfiltered or Flate-compressed raw samples.
    Raw(Vec<u8>),
}

impl Payload {
    fn bytes(&self) -> &[u8] {
        match self {
            Payload::Jpeg(b) | Payload::Raw(b) => b,
        }
    }

    fn format_name(&self) -> &'static str {
        match self {
            Payload::Jpeg(_) => "jpeg",
            Payload::Raw(_) => "raw",
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn extract_one(
    doc: &Document,
    page_index: usize,
    id: ObjectId,
    stream: &Stream,
    output_dir: &Path,
    cfg: &ExtractionConfig,
    seen_hashes: &mut HashSet<String>,
) -> Option<ImageRecord> {
    let xref = id.0;
    let width = dict_u32(doc, &stream.dict, b"Width").unwrap_or(0);
    let height = dict_u32(doc, &stream.dict, b"Height").unwrap_or(0);

    if width < cfg.min_width || height < cfg.min_height {
        debug!(
            "Page {}: image {} is {}x{}, below minimum {}x{}; discarding",
            page_index + 1,
            xref,
            width,
            height,
            cfg.min_width,
            cfg.min_height
        );
        return None;
    }

    let payload = match primary_filter(doc, &stream.dict).as_deref() {
        Some("DCTDecode") => Payload::Jpeg(stream.content.clone()),
        Some(unsupported @ ("JPXDecode" | "CCITTFaxDecode" | "JBIG2Decode")) => {
            warn!(
                "Page {}: image {} uses unsupported filter {}; skipping",
                page_index + 1,
                xref,
                unsupported
            );
            return None;
        }
        _ => match stream.decompressed_content() {
            Ok(data) => Payload::Raw(data),
            Err(e) => {
                warn!(
                    "Page {}: failed to decode stream for image {}: {}; skipping",
                    page_index + 1,
                    xref,
                    e
                );
                return None;
            }
        },
    };

    let sha256 = content_digest(payload.bytes());
    if cfg.dedupe {
        if seen_hashes.contains(&sha256) {
            debug!(
                "Page {}: image {} duplicates {}; skipping",
                page_index + 1,
                xref,
                &sha256[..8]
            );
            return None;
        }
        seen_hashes.insert(sha256.clone());
    }

    let file_name = format!(
        "page{:04}_img{}_{}.{}",
        page_index + 1,
        xref,
        &sha256[..8],
        cfg.target_format.ext()
    );
    let saved_path = output_dir.join(file_name);

    let written = match &payload {
        // Already the target container: write bytes verbatim.
        Payload::Jpeg(bytes) if cfg.target_format == RasterFormat::Jpeg => {
            fs::write(&saved_path, bytes).is_ok()
        }
        Payload::Jpeg(bytes) => {
            match image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg) {
                Ok(img) => persist(normalize_color(img, cfg.target_format), &saved_path, cfg),
                Err(e) => {
                    warn!(
                        "Page {}: JPEG decode failed for image {}: {}; skipping",
                        page_index + 1,
                        xref,
                        e
                    );
                    false
                }
            }
        }
        Payload::Raw(data) => match decode_raw_samples(doc, stream, width, height, data) {
            Some(img) => persist(normalize_color(img, cfg.target_format), &saved_path, cfg),
            None => {
                warn!(
                    "Page {}: could not reconstruct raw image {} ({}x{}); skipping",
                    page_index + 1,
                    xref,
                    width,
                    height
                );
                false
            }
        },
    };

    if !written {
        return None;
    }

    Some(ImageRecord {
        page_index,
        xref,
        width,
        height,
        saved_path,
        original_format: payload.format_name().to_string(),
        target_format: cfg.target_format.ext().to_string(),
        sha256,
    })
}

/// Preserve alpha when present, otherwise collapse to opaque truecolor.
/// JPEG cannot carry alpha, so that target always collapses.
fn normalize_color(img: DynamicImage, target: RasterFormat) -> DynamicImage {
    let has_alpha = img.color().has_alpha();
    if has_alpha && target == RasterFormat::Png {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

fn persist(img: DynamicImage, path: &Path, cfg: &ExtractionConfig) -> bool {
    match img.save_with_format(path, cfg.target_format.image_format()) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to write '{}': {}", path.display(), e);
            false
        }
    }
}

// ── Raw sample decoding ──────────────────────────────────────────────────

/// Rebuild an image from unfiltered PDF samples using the declared
/// ColorSpace and BitsPerComponent. Supports the 8-bit gray and RGB layouts
/// scholarly PDFs actually embed; anything else is skipped by the caller.
fn decode_raw_samples(
    doc: &Document,
    stream: &Stream,
    width: u32,
    height: u32,
    data: &[u8],
) -> Option<DynamicImage> {
    let bpc = dict_u32(doc, &stream.dict, b"BitsPerComponent").unwrap_or(8);
    if bpc != 8 {
        debug!("Unsupported BitsPerComponent {bpc}");
        return None;
    }

    let components = color_components(doc, &stream.dict)?;
    // Declared dimensions come straight from a possibly hostile file.
    let Some(expected) = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(components))
    else {
        debug!("Declared dimensions {}x{} overflow; skipping", width, height);
        return None;
    };
    if data.len() < expected {
        debug!(
            "Sample data too short: {} bytes for {}x{}x{}",
            data.len(),
            width,
            height,
            components
        );
        return None;
    }

    let pixels = data[..expected].to_vec();
    let img = match components {
        1 => image::GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)?,
        3 => image::RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)?,
        _ => return None,
    };

    Some(apply_smask(doc, stream, img, width, height))
}

/// Number of color components, or `None` for spaces we do not reconstruct
/// (Indexed, Separation, CMYK).
fn color_components(doc: &Document, dict: &Dictionary) -> Option<usize> {
    let Some(cs) = dict.get(b"ColorSpace").ok().map(|o| resolve(doc, o)) else {
        // Absent in degenerate files; RGB is the common case.
        return Some(3);
    };

    match cs {
        Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Some(3),
            b"DeviceGray" | b"CalGray" => Some(1),
            other => {
                debug!("Unsupported color space {:?}", String::from_utf8_lossy(other));
                None
            }
        },
        Object::Array(items) => {
            let family = match items.first() {
                Some(Object::Name(n)) => n.as_slice(),
                _ => return None,
            };
            if family != b"ICCBased" {
                debug!(
                    "Unsupported color space family {:?}",
                    String::from_utf8_lossy(family)
                );
                return None;
            }
            // ICCBased: the component count is /N on the profile stream.
            let Some(Object::Stream(profile)) = items.get(1).map(|o| resolve(doc, o)) else {
                return None;
            };
            match dict_u32(doc, &profile.dict, b"N") {
                Some(1) => Some(1),
                Some(3) => Some(3),
                n => {
                    debug!("Unsupported ICCBased component count {n:?}");
                    None
                }
            }
        }
        _ => None,
    }
}

/// Merge an SMask alpha channel into the image when one is declared and its
/// geometry matches; otherwise return the image unchanged.
fn apply_smask(
    doc: &Document,
    stream: &Stream,
    img: DynamicImage,
    width: u32,
    height: u32,
) -> DynamicImage {
    let Some(Object::Reference(smask_id)) = stream.dict.get(b"SMask").ok() else {
        return img;
    };
    let Ok(Object::Stream(smask)) = doc.get_object(*smask_id) else {
        return img;
    };

    let sw = dict_u32(doc, &smask.dict, b"Width").unwrap_or(0);
    let sh = dict_u32(doc, &smask.dict, b"Height").unwrap_or(0);
    if sw != width || sh != height {
        debug!("SMask geometry {}x{} does not match image {}x{}", sw, sh, width, height);
        return img;
    }

    let Ok(alpha) = smask.decompressed_content() else {
        warn!("Could not decode SMask for image; keeping opaque");
        return img;
    };
    let pixel_count = width as usize * height as usize;
    if alpha.len() < pixel_count {
        return img;
    }

    let rgb = img.to_rgb8();
    let mut rgba = Vec::with_capacity(pixel_count * 4);
    for (pixel, a) in rgb.pixels().zip(alpha.iter()) {
        rgba.extend_from_slice(&[pixel[0], pixel[1], pixel[2], *a]);
    }

    match image::RgbaImage::from_raw(width, height, rgba) {
        Some(merged) => DynamicImage::ImageRgba8(merged),
        None => img,
    }
}

// ── Dictionary helpers ───────────────────────────────────────────────────

fn dict_u32(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key).ok().map(|o| resolve(doc, o))? {
        Object::Integer(n) if *n >= 0 => Some(*n as u32),
        _ => None,
    }
}

/// First entry of the Filter chain; `/Filter` may be a Name or an Array.
fn primary_filter(doc: &Document, dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter").ok().map(|o| resolve(doc, o))? {
        Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
        Object::Array(arr) => arr.first().and_then(|f| match f {
            Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
            _ => None,
        }),
        _ => None,
    }
}
