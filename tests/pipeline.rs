//! End-to-end pipeline tests against synthesized PDF fixtures.
//!
//! Fixtures are built with `lopdf` directly: minimal page trees with raw
//! (unfiltered) RGB image XObjects, so no external sample files are needed.
//! Each fixture lives in a subdirectory of a tempdir because the destination
//! directory is created as a sibling of the source's parent.

use lopdf::{dictionary, Document, Object, Stream};
use paper2md::{convert, extract_images, inspect, ConversionConfig, ExtractionConfig, RasterFormat};
use std::fs;
use std::path::{Path, PathBuf};

// ── Fixture builders ─────────────────────────────────────────────────────

/// An unfiltered 8-bit RGB image XObject filled with one color.
fn rgb_image(width: i64, height: i64, pixel: [u8; 3]) -> Stream {
    let mut content = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..width * height {
        content.extend_from_slice(&pixel);
    }
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        content,
    )
}

/// A stream that claims to be a JPEG but carries garbage bytes.
fn broken_jpeg(width: i64, height: i64) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        b"definitely not a jpeg".to_vec(),
    )
}

/// Write a PDF with the given title and one page per inner image list.
fn write_pdf(path: &Path, title: Option<&str>, pages: Vec<Vec<Stream>>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for images in pages {
        let mut xobjects = lopdf::Dictionary::new();
        for (i, img) in images.into_iter().enumerate() {
            let img_id = doc.add_object(img);
            xobjects.set(format!("Im{i}"), Object::Reference(img_id));
        }

        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if let Some(t) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(t),
        });
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    doc.save(path).expect("fixture PDF saves");
}

/// Place a fixture under `<tempdir>/docs/` so the computed destination
/// (a sibling of the parent) stays inside the tempdir.
fn fixture(dir: &Path, name: &str, title: Option<&str>, pages: Vec<Vec<Stream>>) -> PathBuf {
    let docs = dir.join("docs");
    fs::create_dir_all(&docs).unwrap();
    let path = docs.join(name);
    write_pdf(&path, title, pages);
    path
}

fn no_vector_config() -> ConversionConfig {
    ConversionConfig::builder().vectorize(false).build().unwrap()
}

// ── Organizing conversion ────────────────────────────────────────────────

#[test]
fn convert_builds_title_named_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "paper.pdf",
        Some("Surface Reconstruction of ZnO(0001)"),
        vec![vec![rgb_image(4, 4, [200, 10, 10])]],
    );

    let out = convert(&pdf, &no_vector_config()).unwrap();

    let dest = tmp.path().join("Surface_Reconstruction_of_ZnO_0001");
    assert_eq!(out.dest_dir, dest);
    assert!(dest.is_dir());
    assert!(dest.join("paper.pdf").is_file(), "source moved in");
    assert!(!pdf.exists(), "original path vacated");
    assert!(dest.join("output.md").is_file());

    let materials = dest.join("materials");
    assert!(materials.is_dir());
    let count = fs::read_dir(&materials).unwrap().count();
    assert_eq!(count, 1);

    assert!(out.markdown.contains("./materials/page0001_img"));
    assert!(!out.markdown.contains(&materials.display().to_string()));
    assert!(out.markdown.ends_with('\n'));
    assert_eq!(fs::read_to_string(&out.markdown_path).unwrap(), out.markdown);
}

#[test]
fn missing_title_falls_back_to_untitled() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(tmp.path(), "anon.pdf", None, vec![vec![]]);

    let out = convert(&pdf, &no_vector_config()).unwrap();
    assert_eq!(out.dest_dir, tmp.path().join("untitled"));
    assert!(out.dest_dir.join("anon.pdf").is_file());
}

#[test]
fn rerun_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "paper.pdf",
        Some("Stable Title"),
        vec![vec![rgb_image(4, 4, [0, 128, 0])]],
    );

    let first = convert(&pdf, &no_vector_config()).unwrap();
    // Second run starts from the organized location.
    let second = convert(&first.source_path, &no_vector_config()).unwrap();

    assert_eq!(first.dest_dir, second.dest_dir);
    assert_eq!(first.source_path, second.source_path);
    assert!(second.source_path.is_file(), "never moved onto itself");
    assert_eq!(first.images.len(), second.images.len());
}

#[test]
fn title_collision_keeps_source_in_place() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(tmp.path(), "v2.pdf", Some("Same Title"), vec![vec![]]);

    // A previously organized document already occupies the target name.
    let dest = tmp.path().join("Same_Title");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("v2.pdf"), b"an unrelated earlier revision").unwrap();

    let out = convert(&pdf, &no_vector_config()).unwrap();
    assert_eq!(out.source_path, pdf, "refused move keeps the original path");
    assert!(pdf.is_file());
    assert_eq!(
        fs::read(dest.join("v2.pdf")).unwrap(),
        b"an unrelated earlier revision",
        "occupant is never overwritten"
    );
    assert!(dest.join("output.md").is_file(), "conversion still completes");
}

#[test]
fn write_images_false_skips_image_output() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "paper.pdf",
        Some("No Figures Please"),
        vec![vec![rgb_image(4, 4, [1, 2, 3])]],
    );

    let config = ConversionConfig::builder().write_images(false).build().unwrap();
    let out = convert(&pdf, &config).unwrap();

    assert!(out.images.is_empty());
    assert!(!out.dest_dir.join("materials").exists());
    assert!(!out.markdown.contains("!["));
}

#[test]
fn inspect_reads_metadata_without_converting() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "meta.pdf",
        Some("A Metadata Title"),
        vec![vec![], vec![]],
    );

    let meta = inspect(&pdf).unwrap();
    assert_eq!(meta.title.as_deref(), Some("A Metadata Title"));
    assert_eq!(meta.page_count, 2);
    assert!(pdf.is_file(), "inspect never moves the file");
    assert!(!tmp.path().join("A_Metadata_Title").exists());
}

// ── Standalone image extraction ──────────────────────────────────────────

fn extraction(dedupe: bool, vectorize: bool) -> ExtractionConfig {
    ExtractionConfig {
        dedupe,
        vectorize,
        ..ExtractionConfig::default()
    }
}

#[test]
fn dedupe_skips_byte_identical_images() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "dups.pdf",
        None,
        vec![vec![
            rgb_image(4, 4, [9, 9, 9]),
            rgb_image(4, 4, [9, 9, 9]),
        ]],
    );
    let outdir = tmp.path().join("out");

    let records = extract_images(&pdf, &outdir, &extraction(true, false)).unwrap();
    assert_eq!(records.len(), 1);

    let records = extract_images(&pdf, &outdir, &extraction(false, false)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sha256, records[1].sha256);
    assert_ne!(records[0].saved_path, records[1].saved_path);
}

#[test]
fn min_size_filter_discards_small_images() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "tiny.pdf",
        None,
        vec![vec![rgb_image(2, 2, [5, 5, 5]), rgb_image(16, 16, [7, 7, 7])]],
    );
    let outdir = tmp.path().join("out");

    let cfg = ExtractionConfig {
        min_width: 8,
        min_height: 8,
        vectorize: false,
        ..ExtractionConfig::default()
    };
    let records = extract_images(&pdf, &outdir, &cfg).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].width, 16);
}

#[test]
fn corrupt_image_is_skipped_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "mixed.pdf",
        None,
        vec![
            vec![rgb_image(4, 4, [10, 20, 30]), broken_jpeg(8, 8)],
            vec![rgb_image(6, 6, [30, 20, 10])],
        ],
    );
    let outdir = tmp.path().join("out");

    let records = extract_images(&pdf, &outdir, &extraction(true, false)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].page_index, 0);
    assert_eq!(records[1].page_index, 1);
    for r in &records {
        assert!(r.saved_path.is_file());
        assert_eq!(r.sha256.len(), 64);
    }
}

#[test]
fn records_carry_stable_filenames() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "names.pdf",
        None,
        vec![vec![rgb_image(4, 4, [50, 60, 70])]],
    );
    let outdir = tmp.path().join("out");

    let records = extract_images(&pdf, &outdir, &extraction(true, false)).unwrap();
    assert_eq!(records.len(), 1);
    let name = records[0].saved_path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("page0001_img"));
    assert!(name.ends_with(&format!("_{}.png", &records[0].sha256[..8])));
}

#[test]
fn jpeg_target_writes_no_svg_siblings() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "photo.pdf",
        None,
        vec![vec![rgb_image(4, 4, [120, 80, 40])]],
    );
    let outdir = tmp.path().join("out");

    // Vectorization stays enabled but only applies to PNG rasters.
    let cfg = ExtractionConfig {
        target_format: RasterFormat::Jpeg,
        strategy: paper2md::StrategyPreference::Fallback,
        ..ExtractionConfig::default()
    };
    let records = extract_images(&pdf, &outdir, &cfg).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].target_format, "jpeg");
    assert!(records[0].saved_path.is_file());

    let svg_count = fs::read_dir(&outdir)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .is_some_and(|ext| ext == "svg")
        })
        .count();
    assert_eq!(svg_count, 0);
}

#[test]
fn fallback_vector_strategy_writes_svg_siblings() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = fixture(
        tmp.path(),
        "fig.pdf",
        None,
        vec![vec![rgb_image(4, 4, [100, 100, 100])]],
    );
    let outdir = tmp.path().join("out");

    let cfg = ExtractionConfig {
        strategy: paper2md::StrategyPreference::Fallback,
        ..ExtractionConfig::default()
    };
    let records = extract_images(&pdf, &outdir, &cfg).unwrap();
    assert_eq!(records.len(), 1);

    let svg = records[0].saved_path.with_extension("svg");
    assert!(svg.is_file());
    let body = fs::read_to_string(&svg).unwrap();
    assert!(body.contains("data:image/png;base64,"));
}
