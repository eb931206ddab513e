use std::path::{Path, PathBuf};

// ── ExtractedImage ───────────────────────────────────────────────────────────

/// A raster image that was saved to the output directory.
///
/// Returned by [`crate::PdfImageExtractor::extract_images`] as part of the
/// run's [`ExtractionSummary`].
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-based number of the page the image was referenced from.
    pub page_number: u32,

    /// 1-based position of the image among the page's image XObjects, in
    /// enumeration order.
    pub image_index: usize,

    /// File name inside the output directory,
    /// `image_{page_number}_{image_index}.png`.
    pub file_name: String,

    /// Pixel width of the decoded image.
    pub width: u32,

    /// Pixel height of the decoded image.
    pub height: u32,
}

impl ExtractedImage {
    /// Derive the output file name for the image at (`page_number`,
    /// `image_index`). Both numbers are 1-based; the pairing makes the name
    /// unique across the whole run.
    ///
    /// ```
    /// use extractimagespdf::ExtractedImage;
    /// assert_eq!(ExtractedImage::output_file_name(3, 1), "image_3_1.png");
    /// ```
    pub fn output_file_name(page_number: u32, image_index: usize) -> String {
        format!("image_{page_number}_{image_index}.png")
    }

    /// Full path of this image inside `output_dir`.
    pub fn path_in<P: AsRef<Path>>(&self, output_dir: P) -> PathBuf {
        output_dir.as_ref().join(&self.file_name)
    }
}

// ── ExtractionSummary ────────────────────────────────────────────────────────

/// Aggregate result of one extraction run.
///
/// Per-page results are summed after every page worker has finished, so the
/// totals are independent of worker scheduling order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionSummary {
    /// Every image written to disk, ordered by page number and then by
    /// in-page image index.
    pub images: Vec<ExtractedImage>,

    /// Number of pages the document reported.
    pub pages_processed: usize,

    /// Images skipped because a byte-identical image was already saved.
    pub duplicates_skipped: usize,

    /// Images skipped because their stream failed to decode or write.
    pub failures: usize,
}

impl ExtractionSummary {
    /// Number of unique images written to disk.
    pub fn total_saved(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` when at least one image was saved.
    pub fn found_any(&self) -> bool {
        !self.images.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
