//! Vector-wrapping of extracted rasters: best-effort `.svg` siblings.
//!
//! ## Strategy chain
//!
//! Conversion is a prioritized list of capability-tagged strategies rather
//! than nested availability checks. External converters (ImageMagick,
//! Inkscape) are probed at run time and fail the *whole batch* on any error,
//! which hands the batch to the next strategy. The chain always terminates
//! in [`InlineEmbed`], which wraps the raster bytes into a minimal SVG
//! `<image>` element and cannot fail for well-formed PNG input.
//!
//! Nothing in here returns an error to the caller: this is an enhancement
//! layer and its total failure must never abort the extraction pipeline.

use crate::config::StrategyPreference;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// One way of turning a raster file into a vector-wrapped sibling.
///
/// `convert_batch` returns the paths it produced; an empty result means the
/// strategy failed or bailed, and the next strategy gets the whole batch.
pub trait VectorStrategy {
    fn name(&self) -> &'static str;

    /// Cheap availability probe, checked before the batch is attempted.
    fn is_available(&self) -> bool;

    fn convert_batch(&self, rasters: &[PathBuf]) -> Vec<PathBuf>;
}

/// Run the strategy chain selected by `preference` over the saved rasters.
///
/// Returns the vector files that were written, possibly none.
pub fn vectorize_batch(rasters: &[PathBuf], preference: StrategyPreference) -> Vec<PathBuf> {
    for strategy in chain_for(preference) {
        if !strategy.is_available() {
            debug!("Vector strategy '{}' unavailable; trying next", strategy.name());
            continue;
        }
        let produced = strategy.convert_batch(rasters);
        if !produced.is_empty() {
            debug!(
                "Vector strategy '{}' produced {} files",
                strategy.name(),
                produced.len()
            );
            return produced;
        }
        debug!("Vector strategy '{}' produced nothing; trying next", strategy.name());
    }
    Vec::new()
}

fn chain_for(preference: StrategyPreference) -> Vec<Box<dyn VectorStrategy>> {
    match preference {
        StrategyPreference::Magick => vec![
            Box::new(MagickCli),
            Box::new(InkscapeCli),
            Box::new(InlineEmbed),
        ],
        StrategyPreference::Inkscape => vec![Box::new(InkscapeCli), Box::new(InlineEmbed)],
        StrategyPreference::Fallback => vec![Box::new(InlineEmbed)],
    }
}

fn svg_sibling(raster: &Path) -> PathBuf {
    raster.with_extension("svg")
}

// ── External-tool strategies ─────────────────────────────────────────────

/// ImageMagick's `magick` CLI. Its SVG writer embeds the raster unless a
/// tracer is configured, which matches the wrap-don't-trace intent here.
struct MagickCli;

impl VectorStrategy for MagickCli {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    fn is_available(&self) -> bool {
        probe("magick", &["--version"])
    }

    fn convert_batch(&self, rasters: &[PathBuf]) -> Vec<PathBuf> {
        let mut out = Vec::with_capacity(rasters.len());
        for raster in rasters {
            let svg = svg_sibling(raster);
            let ok = Command::new("magick")
                .arg(raster)
                .arg(&svg)
                .output()
                .map(|o| o.status.success() && svg.exists())
                .unwrap_or(false);
            if !ok {
                warn!("magick failed on '{}'; abandoning strategy", raster.display());
                return Vec::new();
            }
            out.push(svg);
        }
        out
    }
}

/// Inkscape's export CLI.
struct InkscapeCli;

impl VectorStrategy for InkscapeCli {
    fn name(&self) -> &'static str {
        "inkscape"
    }

    fn is_available(&self) -> bool {
        probe("inkscape", &["--version"])
    }

    fn convert_batch(&self, rasters: &[PathBuf]) -> Vec<PathBuf> {
        let mut out = Vec::with_capacity(rasters.len());
        for raster in rasters {
            let svg = svg_sibling(raster);
            let ok = Command::new("inkscape")
                .arg("--export-type=svg")
                .arg("--export-filename")
                .arg(&svg)
                .arg(raster)
                .output()
                .map(|o| o.status.success() && svg.exists())
                .unwrap_or(false);
            if !ok {
                warn!("inkscape failed on '{}'; abandoning strategy", raster.display());
                return Vec::new();
            }
            out.push(svg);
        }
        out
    }
}

fn probe(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// ── Terminal strategy ────────────────────────────────────────────────────

/// Wrap the raster bytes verbatim into a minimal SVG document sized to the
/// image's pixel dimensions. Always available; per-file read errors skip
/// that file only.
struct InlineEmbed;

impl VectorStrategy for InlineEmbed {
    fn name(&self) -> &'static str {
        "inline-embed"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn convert_batch(&self, rasters: &[PathBuf]) -> Vec<PathBuf> {
        let mut out = Vec::with_capacity(rasters.len());
        for raster in rasters {
            match wrap_inline(raster) {
                Ok(svg) => out.push(svg),
                Err(e) => warn!("inline-embed skipped '{}': {}", raster.display(), e),
            }
        }
        out
    }
}

fn wrap_inline(raster: &Path) -> std::io::Result<PathBuf> {
    let (w, h) = image::image_dimensions(raster)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    let bytes = fs::read(raster)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);

    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}' viewBox='0 0 {w} {h}'>\
         <image href='data:image/png;base64,{b64}' x='0' y='0' width='{w}' height='{h}'/>\
         </svg>"
    );

    let svg_path = svg_sibling(raster);
    fs::write(&svg_path, svg)?;
    Ok(svg_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([10, 20, 30]));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn inline_embed_writes_sized_svg() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_test_png(dir.path(), "a.png", 3, 5);

        let made = InlineEmbed.convert_batch(&[png.clone()]);
        assert_eq!(made.len(), 1);
        assert_eq!(made[0], png.with_extension("svg"));

        let svg = fs::read_to_string(&made[0]).unwrap();
        assert!(svg.contains("width='3'"));
        assert!(svg.contains("height='5'"));
        assert!(svg.contains("data:image/png;base64,"));
    }

    #[test]
    fn inline_embed_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_test_png(dir.path(), "good.png", 2, 2);
        let bad = dir.path().join("bad.png");
        fs::write(&bad, b"not a png").unwrap();

        let made = InlineEmbed.convert_batch(&[bad, good]);
        assert_eq!(made.len(), 1, "only the well-formed PNG gets a sibling");
    }

    #[test]
    fn fallback_preference_always_produces_output() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_test_png(dir.path(), "fig.png", 4, 4);

        let made = vectorize_batch(&[png], StrategyPreference::Fallback);
        assert_eq!(made.len(), 1);
        assert!(made[0].exists());
    }

    #[test]
    fn unavailable_strategies_fall_through() {
        struct Absent;
        impl VectorStrategy for Absent {
            fn name(&self) -> &'static str {
                "absent"
            }
            fn is_available(&self) -> bool {
                false
            }
            fn convert_batch(&self, _: &[PathBuf]) -> Vec<PathBuf> {
                panic!("must not be called when unavailable")
            }
        }

        // The chain machinery itself: an unavailable head never runs.
        assert!(!Absent.is_available());

        let dir = tempfile::tempdir().unwrap();
        let png = write_test_png(dir.path(), "fig.png", 2, 2);
        // Even if magick/inkscape are missing on this machine, the terminal
        // strategy guarantees a sibling.
        let made = vectorize_batch(&[png], StrategyPreference::Magick);
        assert_eq!(made.len(), 1);
    }
}
