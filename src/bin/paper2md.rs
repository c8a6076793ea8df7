//! CLI binary for paper2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` / `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paper2md::{
    convert, extract_images, inspect, ConversionConfig, ExtractionConfig, RasterFormat,
    StrategyPreference,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Organize a paper into a title-named directory with Markdown + figures
  paper2md convert ~/papers/inbox/2401.12345.pdf

  # Per-page sections, JPEG figures, custom image directory
  paper2md convert --page-chunks --image-format jpeg --image-dir figs paper.pdf

  # Markdown only, leave embedded images alone
  paper2md convert --no-images paper.pdf

  # Pull embedded figures out of a PDF without organizing it
  paper2md extract-images paper.pdf ./figures

  # Same, skipping tiny decorations and the vector siblings
  paper2md extract-images --min-width 64 --min-height 64 --no-vector paper.pdf ./figures

  # Print document metadata
  paper2md inspect paper.pdf

ENVIRONMENT VARIABLES:
  RUST_LOG                Tracing filter (overrides -v/-q)
  PAPER2MD_IMAGE_DIR      Default image subdirectory name
  PAPER2MD_IMAGE_FORMAT   Default raster format (png, jpeg)
  PAPER2MD_STRATEGY       Default vector strategy (magick, inkscape, fallback)

VECTOR SIBLINGS:
  Each extracted PNG gets a best-effort .svg sibling. ImageMagick is tried
  first, then Inkscape, then a built-in embedding that never needs external
  tools. Missing converters are skipped silently; pass --no-vector to skip
  the whole step.
"#;

/// Organize scholarly PDFs into Markdown directories.
#[derive(Parser, Debug)]
#[command(
    name = "paper2md",
    version,
    about = "Organize scholarly PDFs into Markdown directories",
    long_about = "Convert a scholarly PDF into a self-contained directory named after its \
embedded title: the PDF moves in, embedded figures are extracted alongside, and a Markdown \
rendition with relative image links is written next to them.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPER2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAPER2MD_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF into an organized Markdown directory.
    Convert {
        /// Local PDF file path.
        pdf: PathBuf,

        /// Markdown file name inside the destination directory.
        #[arg(long, default_value = "output.md")]
        md_output: String,

        /// Image subdirectory name inside the destination directory.
        #[arg(long, env = "PAPER2MD_IMAGE_DIR", default_value = "materials")]
        image_dir: String,

        /// Raster format for extracted images: png, jpeg.
        #[arg(long, env = "PAPER2MD_IMAGE_FORMAT", default_value = "png")]
        image_format: RasterFormat,

        /// Emit per-page `## Page N` sections instead of one stream.
        #[arg(long)]
        page_chunks: bool,

        /// Skip image extraction entirely.
        #[arg(long)]
        no_images: bool,
    },

    /// Extract embedded images from a PDF into a directory.
    ExtractImages {
        /// Local PDF file path.
        pdf: PathBuf,

        /// Directory to write images into (created if missing).
        outdir: PathBuf,

        /// Raster format: png, jpeg.
        #[arg(long, env = "PAPER2MD_IMAGE_FORMAT", default_value = "png")]
        format: RasterFormat,

        /// Skip images narrower than this many pixels.
        #[arg(long, default_value_t = 1)]
        min_width: u32,

        /// Skip images shorter than this many pixels.
        #[arg(long, default_value_t = 1)]
        min_height: u32,

        /// Keep byte-identical duplicates instead of skipping them.
        #[arg(long)]
        no_dedupe: bool,

        /// Skip the .svg sibling step.
        #[arg(long)]
        no_vector: bool,

        /// Preferred vector strategy: magick, inkscape, fallback.
        #[arg(long, env = "PAPER2MD_STRATEGY", default_value = "magick")]
        strategy: StrategyPreference,

        /// Print the extraction records as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Print PDF metadata, no conversion.
    Inspect {
        /// Local PDF file path.
        pdf: PathBuf,

        /// Print metadata as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Convert {
            pdf,
            md_output,
            image_dir,
            image_format,
            page_chunks,
            no_images,
        } => run_convert(
            &pdf,
            &md_output,
            &image_dir,
            image_format,
            page_chunks,
            no_images,
            cli.quiet,
        ),
        Command::ExtractImages {
            pdf,
            outdir,
            format,
            min_width,
            min_height,
            no_dedupe,
            no_vector,
            strategy,
            json,
        } => {
            let cfg = ExtractionConfig {
                target_format: format,
                min_width,
                min_height,
                dedupe: !no_dedupe,
                vectorize: !no_vector,
                strategy,
            };
            run_extract(&pdf, &outdir, &cfg, json, cli.quiet)
        }
        Command::Inspect { pdf, json } => run_inspect(&pdf, json),
    }
}

fn run_convert(
    pdf: &PathBuf,
    md_output: &str,
    image_dir: &str,
    image_format: RasterFormat,
    page_chunks: bool,
    no_images: bool,
    quiet: bool,
) -> Result<()> {
    let config = ConversionConfig::builder()
        .md_output_path(md_output)
        .image_dir(image_dir)
        .image_format(image_format)
        .page_chunks(page_chunks)
        .write_images(!no_images)
        .build()
        .context("Invalid configuration")?;

    let output = convert(pdf, &config).context("Conversion failed")?;

    if !quiet {
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            pdf.display(),
            bold(&output.dest_dir.display().to_string()),
        );
        eprintln!(
            "   {}  {}",
            dim(&format!("{} images", output.images.len())),
            dim(&output.markdown_path.display().to_string()),
        );
    }
    Ok(())
}

fn run_extract(
    pdf: &PathBuf,
    outdir: &PathBuf,
    cfg: &ExtractionConfig,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let records = extract_images(pdf, outdir, cfg).context("Image extraction failed")?;

    if json {
        let out = serde_json::to_string_pretty(&records).context("Failed to serialize records")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(out.as_bytes())?;
        handle.write_all(b"\n")?;
        return Ok(());
    }

    if !quiet {
        eprintln!(
            "{}  {} images  →  {}",
            green("✔"),
            bold(&records.len().to_string()),
            outdir.display(),
        );
        for r in records.iter().take(5) {
            eprintln!(
                "   {} {}",
                dim(&format!("p{:>3} {:>4}x{:<4}", r.page_index + 1, r.width, r.height)),
                r.saved_path.display(),
            );
        }
        if records.len() > 5 {
            eprintln!("   {}", dim(&format!("… and {} more", records.len() - 5)));
        }
    }
    Ok(())
}

fn run_inspect(pdf: &PathBuf, json: bool) -> Result<()> {
    let meta = inspect(pdf).context("Failed to inspect PDF")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
        );
        return Ok(());
    }

    println!("File:         {}", pdf.display());
    if let Some(ref t) = meta.title {
        println!("Title:        {}", t);
    }
    if let Some(ref a) = meta.author {
        println!("Author:       {}", a);
    }
    if let Some(ref s) = meta.subject {
        println!("Subject:      {}", s);
    }
    println!("Pages:        {}", meta.page_count);
    println!("PDF Version:  {}", meta.pdf_version);
    if let Some(ref p) = meta.producer {
        println!("Producer:     {}", p);
    }
    if let Some(ref c) = meta.creator {
        println!("Creator:      {}", c);
    }
    Ok(())
}
