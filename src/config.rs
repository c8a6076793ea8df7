//! Configuration types for PDF-to-Markdown conversion and image extraction.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! The standalone image-extraction entry point has its own, smaller
//! [`ExtractionConfig`] because callers that only want the raster pipeline
//! should not have to reason about Markdown output paths.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest. Nothing in here reads the
//! environment: configuration is explicit and validated when `build()` runs,
//! so a missing unrelated credential can never block the conversion path.

use crate::error::Paper2MdError;
use serde::{Deserialize, Serialize};

/// Configuration for a full PDF-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use paper2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .image_dir("figures")
///     .page_chunks(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// File name of the Markdown output. Default: `"output.md"`.
    ///
    /// This is a *name*, not a path: it is resolved against the computed
    /// destination directory, never against the caller's working directory.
    pub md_output_path: String,

    /// Extract embedded images and emit them next to the Markdown. Default: true.
    ///
    /// When false, no image subdirectory is created and the generated text
    /// carries no image references.
    pub write_images: bool,

    /// Name of the image subdirectory nested under the destination directory.
    /// Default: `"materials"`.
    pub image_dir: String,

    /// Target raster encoding for emitted images. Default: PNG.
    pub image_format: RasterFormat,

    /// Segment the output with a per-page heading instead of one continuous
    /// stream. Default: false.
    pub page_chunks: bool,

    /// Settings for the embedded-image pipeline (size filter, dedup,
    /// vectorization). Ignored when `write_images` is false.
    pub extraction: ExtractionConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            md_output_path: "output.md".to_string(),
            write_images: true,
            image_dir: "materials".to_string(),
            image_format: RasterFormat::Png,
            page_chunks: false,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn md_output_path(mut self, name: impl Into<String>) -> Self {
        self.config.md_output_path = name.into();
        self
    }

    pub fn write_images(mut self, v: bool) -> Self {
        self.config.write_images = v;
        self
    }

    pub fn image_dir(mut self, name: impl Into<String>) -> Self {
        self.config.image_dir = name.into();
        self
    }

    pub fn image_format(mut self, fmt: RasterFormat) -> Self {
        self.config.image_format = fmt;
        self.config.extraction.target_format = fmt;
        self
    }

    pub fn page_chunks(mut self, v: bool) -> Self {
        self.config.page_chunks = v;
        self
    }

    /// Minimum pixel dimensions an embedded image must have to be kept.
    pub fn min_size(mut self, width: u32, height: u32) -> Self {
        self.config.extraction.min_width = width.max(1);
        self.config.extraction.min_height = height.max(1);
        self
    }

    pub fn dedupe(mut self, v: bool) -> Self {
        self.config.extraction.dedupe = v;
        self
    }

    pub fn vectorize(mut self, v: bool) -> Self {
        self.config.extraction.vectorize = v;
        self
    }

    pub fn strategy(mut self, s: StrategyPreference) -> Self {
        self.config.extraction.strategy = s;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Paper2MdError> {
        let c = &self.config;
        if c.md_output_path.is_empty() {
            return Err(Paper2MdError::InvalidConfig(
                "md_output_path must not be empty".into(),
            ));
        }
        if c.md_output_path.contains('/') || c.md_output_path.contains('\\') {
            return Err(Paper2MdError::InvalidConfig(format!(
                "md_output_path must be a file name, not a path: '{}'",
                c.md_output_path
            )));
        }
        if c.image_dir.is_empty() {
            return Err(Paper2MdError::InvalidConfig(
                "image_dir must not be empty".into(),
            ));
        }
        if c.image_dir.contains('/') || c.image_dir.contains('\\') {
            return Err(Paper2MdError::InvalidConfig(format!(
                "image_dir must be a single directory name, not a path: '{}'",
                c.image_dir
            )));
        }
        Ok(self.config)
    }
}

/// Configuration for the standalone image-extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Canonical raster encoding extracted images are normalized to. Default: PNG.
    pub target_format: RasterFormat,

    /// Minimum width in pixels; smaller images are discarded. Default: 1.
    pub min_width: u32,

    /// Minimum height in pixels; smaller images are discarded. Default: 1.
    pub min_height: u32,

    /// Skip images whose content hash was already seen in this run. Default: true.
    pub dedupe: bool,

    /// Produce a vector-wrapped `.svg` sibling for each saved raster. Default: true.
    pub vectorize: bool,

    /// Which vector-conversion strategy to try first. Default: [`StrategyPreference::Magick`].
    pub strategy: StrategyPreference,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            target_format: RasterFormat::Png,
            min_width: 1,
            min_height: 1,
            dedupe: true,
            vectorize: true,
            strategy: StrategyPreference::Magick,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The raster encodings extracted images can be normalized to.
///
/// PNG is the canonical default: lossless, alpha-capable, and what the
/// vector-wrapping stage expects as input. JPEG exists for callers feeding
/// size-sensitive downstream stores; it collapses alpha to opaque truecolor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// Lossless, alpha-preserving. (default)
    #[default]
    Png,
    /// Lossy, opaque; smaller files for photographic figures.
    Jpeg,
}

impl RasterFormat {
    /// File extension used for saved images.
    pub fn ext(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpeg",
        }
    }

    /// The corresponding `image` crate output format.
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            RasterFormat::Png => image::ImageFormat::Png,
            RasterFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl std::str::FromStr for RasterFormat {
    type Err = Paper2MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(RasterFormat::Png),
            "jpg" | "jpeg" => Ok(RasterFormat::Jpeg),
            other => Err(Paper2MdError::InvalidConfig(format!(
                "unsupported image format '{other}' (expected png or jpeg)"
            ))),
        }
    }
}

/// Which head of the vector-conversion chain to try first.
///
/// Every choice ends at the inline-embed terminal strategy, which wraps the
/// raster bytes into a minimal SVG and cannot fail for well-formed PNG input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPreference {
    /// ImageMagick CLI first, then Inkscape, then inline embed. (default)
    #[default]
    Magick,
    /// Inkscape CLI first, then inline embed.
    Inkscape,
    /// Inline embed only.
    Fallback,
}

impl std::str::FromStr for StrategyPreference {
    type Err = Paper2MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "magick" | "imagemagick" => Ok(StrategyPreference::Magick),
            "inkscape" => Ok(StrategyPreference::Inkscape),
            "fallback" | "inline" => Ok(StrategyPreference::Fallback),
            other => Err(Paper2MdError::InvalidConfig(format!(
                "unknown vector strategy '{other}' (expected magick, inkscape, or fallback)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_contract() {
        let c = ConversionConfig::default();
        assert_eq!(c.md_output_path, "output.md");
        assert!(c.write_images);
        assert_eq!(c.image_dir, "materials");
        assert_eq!(c.image_format, RasterFormat::Png);
        assert!(!c.page_chunks);
        assert!(c.extraction.dedupe);
        assert_eq!(c.extraction.min_width, 1);
        assert_eq!(c.extraction.min_height, 1);
    }

    #[test]
    fn builder_rejects_pathlike_md_output() {
        let err = ConversionConfig::builder()
            .md_output_path("out/notes.md")
            .build();
        assert!(matches!(err, Err(Paper2MdError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_empty_image_dir() {
        let err = ConversionConfig::builder().image_dir("").build();
        assert!(matches!(err, Err(Paper2MdError::InvalidConfig(_))));
    }

    #[test]
    fn image_format_propagates_to_extraction() {
        let c = ConversionConfig::builder()
            .image_format(RasterFormat::Jpeg)
            .build()
            .unwrap();
        assert_eq!(c.extraction.target_format, RasterFormat::Jpeg);
    }

    #[test]
    fn raster_format_parses_aliases() {
        assert_eq!("PNG".parse::<RasterFormat>().unwrap(), RasterFormat::Png);
        assert_eq!("jpg".parse::<RasterFormat>().unwrap(), RasterFormat::Jpeg);
        assert!("webp".parse::<RasterFormat>().is_err());
    }

    #[test]
    fn min_size_clamps_to_one() {
        let c = ConversionConfig::builder().min_size(0, 0).build().unwrap();
        assert_eq!(c.extraction.min_width, 1);
        assert_eq!(c.extraction.min_height, 1);
    }
}
