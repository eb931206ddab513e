//! # extractImagesPDF
//!
//! A Rust library for extracting the unique raster images embedded in a PDF
//! document.
//!
//! ## What this crate does
//!
//! 1. **Validate PDF** — checks that the file forms a structurally valid PDF
//!    document before any output is written.
//! 2. **Extract page images** — enumerates every image XObject referenced by a
//!    page's resources (including images nested inside Form XObjects) and
//!    decodes its raw stream into a displayable raster.
//! 3. **Deduplicate** — each image's raw bytes are hashed with SHA-256; a
//!    run-wide registry guarantees that byte-identical images are written to
//!    disk exactly once, no matter which pages reference them.
//! 4. **Parallelize** — pages are processed concurrently on a fixed-size
//!    worker pool sized to the machine's logical CPU count.
//!
//! Unique images land in the output directory as lossless PNG files named
//! `image_{page}_{index}.png` (both numbers 1-based).
//!
//! ## Quick example
//!
//! ```no_run
//! use extractimagespdf::PdfImageExtractor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = PdfImageExtractor::from_path("report.pdf")?;
//!
//! println!("Pages: {}", extractor.page_count()?);
//!
//! let summary = extractor.extract_images()?;
//! for image in &summary.images {
//!     println!("  {} — {}x{}", image.file_name, image.width, image.height);
//! }
//! println!("{} duplicate(s) skipped", summary.duplicates_skipped);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod decode;
mod extractor;
mod image;
mod registry;

pub use crate::extractor::PdfImageExtractor;
pub use crate::image::{ExtractedImage, ExtractionSummary};
pub use crate::registry::{content_digest, HashRegistry};
// The decode module is intentionally *not* re-exported; stream decoding is an
// internal detail. Callers use PdfImageExtractor for all operations.

/// Output directory used when [`ExtractorConfig::output_directory`] is `None`.
pub const DEFAULT_OUTPUT_DIR: &str = "extracted_images";

// ── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration for [`PdfImageExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Directory that receives the extracted PNG files. Defaults to
    /// [`DEFAULT_OUTPUT_DIR`] when `None`.
    pub output_directory: Option<String>,

    /// When `true`, every regular file already inside the output directory is
    /// removed before extraction starts. Subdirectories are left alone.
    pub clear_output_dir: bool,

    /// If set, an image whose raw stream exceeds this byte count is skipped
    /// and counted as a failure instead of being decoded.
    pub max_image_size: Option<usize>,

    /// When `true`, per-image status lines (saved / duplicate skipped) are
    /// printed to standard output while the run progresses.
    pub verbose: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            output_directory: None,
            clear_output_dir: true,
            max_image_size: None,
            verbose: false,
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A filesystem I/O error occurred (e.g. when reading the document or
    /// clearing the output directory).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The input bytes do not form a structurally valid PDF document.
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// The underlying lopdf parser returned an error.
    #[error("PDF parse error: {0}")]
    ParseError(#[from] lopdf::Error),

    /// A single image could not be decoded or written. This is caught at
    /// image scope during a run and downgraded to a logged skip.
    #[error("failed to process image {index} on page {page}: {reason}")]
    ImageDecode {
        page: u32,
        index: usize,
        reason: String,
    },

    /// The output directory path exists but cannot be used.
    #[error("Cannot use output directory: {0}")]
    OutputDir(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
