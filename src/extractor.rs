use crate::decode;
use crate::image::{ExtractedImage, ExtractionSummary};
use crate::registry::{content_digest, HashRegistry};
use crate::{ExtractError, ExtractorConfig, Result, DEFAULT_OUTPUT_DIR};
use lopdf::{Dictionary, Document, Object, ObjectId};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

// ── PdfImageExtractor ─────────────────────────────────────────────────────────

/// Entry point for extracting the unique raster images of a PDF document.
///
/// The extractor holds the document *path*, not a live parse: the file is
/// opened once at construction for validation, once to count pages, and then
/// once per page worker during extraction. Each worker owns an independent
/// handle, so no parse state crosses worker boundaries — only the
/// [`HashRegistry`] is shared, behind a lock.
///
/// # Creating an extractor
///
/// ```no_run
/// use extractimagespdf::{PdfImageExtractor, ExtractorConfig};
///
/// // With defaults (output to "extracted_images", directory cleared first)
/// let e = PdfImageExtractor::from_path("report.pdf").unwrap();
///
/// // With custom configuration
/// let cfg = ExtractorConfig {
///     output_directory: Some("./out".into()),
///     max_image_size: Some(50 * 1024 * 1024),
///     ..Default::default()
/// };
/// let e = PdfImageExtractor::with_config("report.pdf", cfg).unwrap();
/// ```
pub struct PdfImageExtractor {
    path: PathBuf,
    config: ExtractorConfig,
}

impl PdfImageExtractor {
    // ── Constructors ──────────────────────────────────────────────────────────

    /// Open a PDF from the file system with the default configuration.
    ///
    /// The document is parsed once to confirm it is structurally valid and
    /// then released; an invalid file is rejected here, before anything is
    /// written to the output directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, ExtractorConfig::default())
    }

    /// Open a PDF from the file system with a custom [`ExtractorConfig`].
    pub fn with_config<P: AsRef<Path>>(path: P, config: ExtractorConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = Document::load(&path)?;
        validate_structure(&document)?;

        Ok(Self { path, config })
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Path of the document being processed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a reference to the active [`ExtractorConfig`].
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The directory extracted images are written to.
    pub fn output_directory(&self) -> &str {
        self.config
            .output_directory
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_DIR)
    }

    /// Number of pages in the document.
    ///
    /// Opens the document transiently and closes it again.
    pub fn page_count(&self) -> Result<usize> {
        let document = Document::load(&self.path)?;
        Ok(document.get_pages().len())
    }

    // ── Extraction ────────────────────────────────────────────────────────────

    /// Extract every unique raster image of the document into the output
    /// directory.
    ///
    /// Pages are fanned out across a worker pool sized to the logical CPU
    /// count and the call blocks until all of them finish. Page- and
    /// image-level failures are logged and skipped; they never abort the run.
    /// Duplicate images (byte-identical streams, document-wide) are written
    /// exactly once.
    pub fn extract_images(&self) -> Result<ExtractionSummary> {
        let output_dir = PathBuf::from(self.output_directory());
        prepare_output_directory(&output_dir, self.config.clear_output_dir)?;

        // Task generation: one transient open to learn the page numbers,
        // in increasing order.
        let page_numbers: Vec<u32> = {
            let document = Document::load(&self.path)?;
            document.get_pages().keys().copied().collect()
        };

        self.log(&format!(
            "using {} workers for {} page(s)",
            rayon::current_num_threads(),
            page_numbers.len()
        ));

        let registry = HashRegistry::new();

        // Fan-out / fan-in: results come back in submission order regardless
        // of which worker finished first.
        let outcomes: Vec<PageOutcome> = page_numbers
            .par_iter()
            .map(|&page_number| self.extract_page(page_number, &output_dir, &registry))
            .collect();

        let mut summary = ExtractionSummary {
            pages_processed: page_numbers.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            summary.images.extend(outcome.saved);
            summary.duplicates_skipped += outcome.duplicates;
            summary.failures += outcome.failures;
        }

        Ok(summary)
    }

    // ── Private: per-page worker ──────────────────────────────────────────────

    /// Process one page to completion. Never fails: a page-level error is
    /// logged and reported as an empty outcome so sibling pages continue.
    fn extract_page(
        &self,
        page_number: u32,
        output_dir: &Path,
        registry: &HashRegistry,
    ) -> PageOutcome {
        match self.try_extract_page(page_number, output_dir, registry) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("extractimagespdf: warning: skipping page {page_number}: {e}");
                PageOutcome::default()
            }
        }
    }

    fn try_extract_page(
        &self,
        page_number: u32,
        output_dir: &Path,
        registry: &HashRegistry,
    ) -> Result<PageOutcome> {
        // Each worker re-opens the document from the path and owns the handle
        // for exactly one page task.
        let document = Document::load(&self.path)?;
        let page_id = document
            .get_pages()
            .get(&page_number)
            .copied()
            .ok_or_else(|| ExtractError::InvalidPdf(format!("page {page_number} not found")))?;

        let image_ids = collect_page_images(&document, page_id)?;
        let mut outcome = PageOutcome::default();

        for (position, &image_id) in image_ids.iter().enumerate() {
            let image_index = position + 1;
            match self.save_unique_image(
                &document,
                image_id,
                page_number,
                image_index,
                output_dir,
                registry,
            ) {
                Ok(SaveOutcome::Saved(image)) => {
                    self.log(&format!("saved {}", image.file_name));
                    outcome.saved.push(image);
                }
                Ok(SaveOutcome::Duplicate) => {
                    self.log(&format!(
                        "skipped duplicate image {image_index} on page {page_number}"
                    ));
                    outcome.duplicates += 1;
                }
                Err(e) => {
                    eprintln!("extractimagespdf: warning: {e}");
                    outcome.failures += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Hash, deduplicate, decode, and persist a single image stream.
    fn save_unique_image(
        &self,
        document: &Document,
        image_id: ObjectId,
        page_number: u32,
        image_index: usize,
        output_dir: &Path,
        registry: &HashRegistry,
    ) -> Result<SaveOutcome> {
        let stream = document.get_object(image_id)?.as_stream()?;
        let raw = &stream.content;

        if let Some(max) = self.config.max_image_size {
            if raw.len() > max {
                return Err(ExtractError::ImageDecode {
                    page: page_number,
                    index: image_index,
                    reason: format!("stream of {} bytes exceeds the configured limit", raw.len()),
                });
            }
        }

        // The digest is taken over the raw encoded bytes, so dedup works
        // without decoding the losing copies at all.
        let digest = content_digest(raw);
        if !registry.claim(&digest) {
            return Ok(SaveOutcome::Duplicate);
        }

        let decoded =
            decode::decode_image_stream(document, stream).map_err(|reason| {
                ExtractError::ImageDecode {
                    page: page_number,
                    index: image_index,
                    reason,
                }
            })?;

        let file_name = ExtractedImage::output_file_name(page_number, image_index);
        decoded
            .save(output_dir.join(&file_name))
            .map_err(|e| ExtractError::ImageDecode {
                page: page_number,
                index: image_index,
                reason: format!("write failed: {e}"),
            })?;

        Ok(SaveOutcome::Saved(ExtractedImage {
            page_number,
            image_index,
            file_name,
            width: decoded.width(),
            height: decoded.height(),
        }))
    }

    fn log(&self, message: &str) {
        if self.config.verbose {
            println!("[status] {message}");
        }
    }
}

// ── Per-page outcome ──────────────────────────────────────────────────────────

#[derive(Default)]
struct PageOutcome {
    saved: Vec<ExtractedImage>,
    duplicates: usize,
    failures: usize,
}

enum SaveOutcome {
    Saved(ExtractedImage),
    Duplicate,
}

// ── Structure validation ──────────────────────────────────────────────────────

/// Assert the mandatory elements of a parsed document are present. lopdf has
/// already parsed the cross-reference table and object graph by the time this
/// runs; the checks reject empty or truncated documents early.
fn validate_structure(document: &Document) -> Result<()> {
    document
        .catalog()
        .map_err(|e| ExtractError::InvalidPdf(format!("missing or invalid catalog: {e}")))?;

    if document.get_pages().is_empty() {
        return Err(ExtractError::InvalidPdf("document has no pages".into()));
    }

    if document.trailer.is_empty() {
        return Err(ExtractError::InvalidPdf("missing trailer dictionary".into()));
    }

    Ok(())
}

// ── Output directory preparation ──────────────────────────────────────────────

/// Create `dir` if missing; when `clear` is set, remove every regular file
/// directly inside it. Subdirectories and their contents are not touched.
fn prepare_output_directory(dir: &Path, clear: bool) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ExtractError::OutputDir(format!(
                "'{}' exists and is not a directory",
                dir.display()
            )));
        }
        if clear {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    fs::remove_file(entry.path())?;
                }
            }
        }
    } else {
        fs::create_dir_all(dir)?;
    }

    Ok(())
}

// ── Page image enumeration ────────────────────────────────────────────────────

/// Collect the object ids of every image XObject reachable from a page's
/// resources, in enumeration order. Form XObjects are entered recursively;
/// a visited set breaks reference cycles between forms.
fn collect_page_images(document: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>> {
    let page_dict = document.get_object(page_id)?.as_dict()?;

    let mut images = Vec::new();
    let mut visited_forms = HashSet::new();

    if let Some(resources) = page_resources(document, page_dict) {
        collect_from_resources(document, &resources, &mut visited_forms, &mut images);
    }

    Ok(images)
}

/// Resolve a page's `/Resources` dictionary, following the `/Parent` chain
/// when the entry is inherited from an ancestor pages node.
fn page_resources(document: &Document, page_dict: &Dictionary) -> Option<Dictionary> {
    let mut current = page_dict.clone();

    // page trees are shallow; the bound only guards malformed parent cycles
    for _ in 0..64 {
        if let Ok(value) = current.get(b"Resources") {
            if let Some(resources) = resolve_dict(document, value) {
                return Some(resources);
            }
        }

        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = document.get_object(parent_id).ok()?.as_dict().ok()?.clone();
    }

    None
}

fn collect_from_resources(
    document: &Document,
    resources: &Dictionary,
    visited_forms: &mut HashSet<ObjectId>,
    images: &mut Vec<ObjectId>,
) {
    let xobjects = match resources.get(b"XObject").ok().and_then(|v| resolve_dict(document, v)) {
        Some(dict) => dict,
        None => return,
    };

    for (_name, value) in xobjects.iter() {
        let Ok(object_id) = value.as_reference() else {
            continue;
        };
        let Ok(stream) = document.get_object(object_id).and_then(Object::as_stream) else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(name) if name == b"Image" => images.push(object_id),
            Ok(name) if name == b"Form" => {
                // Images referenced by nested form XObjects count as page
                // images too; forms may reference each other, hence the
                // visited set.
                if visited_forms.insert(object_id) {
                    if let Some(form_resources) = stream
                        .dict
                        .get(b"Resources")
                        .ok()
                        .and_then(|v| resolve_dict(document, v))
                    {
                        collect_from_resources(document, &form_resources, visited_forms, images);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Resolve a value that may be an inline dictionary or a reference to one.
fn resolve_dict(document: &Document, value: &Object) -> Option<Dictionary> {
    if let Ok(id) = value.as_reference() {
        document
            .get_object(id)
            .ok()
            .and_then(|o| o.as_dict().ok().cloned())
    } else {
        value.as_dict().ok().cloned()
    }
}
