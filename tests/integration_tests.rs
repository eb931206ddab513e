// Integration tests for extractImagesPDF.
//
// No checked-in fixtures: test PDFs are constructed in memory with lopdf,
// written to temporary directories, and extracted from there. Images are tiny
// 2x2 grayscale rasters stored without a stream filter, which keeps the
// byte-level content (and therefore the content hashes) fully deterministic.

use extractimagespdf::{ExtractError, ExtractedImage, ExtractorConfig, PdfImageExtractor};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::fs;
use std::path::{Path, PathBuf};

// ── Test PDF construction ─────────────────────────────────────────────────────

/// A 2x2, 8-bit grayscale image XObject with the given four pixel bytes.
fn gray_image(pixels: &[u8]) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(2),
            "Height" => Object::Integer(2),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
        },
        pixels.to_vec(),
    )
}

/// Build a PDF with one page per entry of `page_images`; each entry lists the
/// pixel buffers of the images that page references.
fn build_pdf(page_images: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for images in page_images {
        let mut xobjects = Dictionary::new();
        let mut content = String::from("q");
        for (i, pixels) in images.iter().enumerate() {
            let image_id = doc.add_object(gray_image(pixels));
            let name = format!("Im{}", i + 1);
            content.push_str(&format!(" /{name} Do"));
            xobjects.set(name, Object::Reference(image_id));
        }
        content.push_str(" Q");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "XObject" => Object::Dictionary(xobjects),
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to serialise test PDF");
    buf
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn config_into(output_dir: &Path) -> ExtractorConfig {
    ExtractorConfig {
        output_directory: Some(output_dir.to_string_lossy().into_owned()),
        ..Default::default()
    }
}

fn png_files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── ExtractorConfig ───────────────────────────────────────────────────────────

#[test]
fn default_config_is_permissive() {
    let cfg = ExtractorConfig::default();
    assert!(cfg.output_directory.is_none());
    assert!(cfg.clear_output_dir);
    assert!(cfg.max_image_size.is_none());
    assert!(!cfg.verbose);
}

#[test]
fn custom_config_round_trips() {
    let cfg = ExtractorConfig {
        output_directory: Some("./out".into()),
        clear_output_dir: false,
        max_image_size: Some(1024),
        verbose: true,
    };
    assert_eq!(cfg.output_directory.as_deref(), Some("./out"));
    assert!(!cfg.clear_output_dir);
    assert_eq!(cfg.max_image_size, Some(1024));
    assert!(cfg.verbose);
}

// ── ExtractError display ──────────────────────────────────────────────────────

#[test]
fn error_display_is_non_empty() {
    let errors: &[ExtractError] = &[
        ExtractError::InvalidPdf("test".into()),
        ExtractError::ImageDecode {
            page: 1,
            index: 2,
            reason: "unsupported filter".into(),
        },
        ExtractError::OutputDir("not a directory".into()),
    ];
    for e in errors {
        assert!(!e.to_string().is_empty(), "empty display for {e:?}");
    }
}

// ── Invalid input ─────────────────────────────────────────────────────────────

#[test]
fn rejects_missing_file() {
    assert!(PdfImageExtractor::from_path("/no/such/file.pdf").is_err());
}

#[test]
fn rejects_non_pdf_without_touching_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let garbage = write_file(dir.path(), "garbage.pdf", b"this is not a pdf");
    let output_dir = dir.path().join("out");

    let result = PdfImageExtractor::with_config(&garbage, config_into(&output_dir));

    assert!(result.is_err());
    assert!(!output_dir.exists(), "input error must not create output dir");
}

// ── Extraction behaviour ──────────────────────────────────────────────────────

#[test]
fn reports_no_images_for_image_free_document() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "empty.pdf", &build_pdf(&[vec![], vec![]]));
    let output_dir = dir.path().join("out");

    let extractor = PdfImageExtractor::with_config(&pdf, config_into(&output_dir)).unwrap();
    assert_eq!(extractor.page_count().unwrap(), 2);

    let summary = extractor.extract_images().unwrap();
    assert_eq!(summary.total_saved(), 0);
    assert!(!summary.found_any());
    assert_eq!(summary.pages_processed, 2);
    assert!(png_files_in(&output_dir).is_empty());
}

/// The reference scenario: page 1 carries two distinct images, page 2 repeats
/// one of them byte-for-byte, page 3 is empty. Exactly two files must land on
/// disk no matter how the pages are scheduled across workers.
#[test]
fn deduplicates_identical_images_across_pages() {
    let image_a = vec![0u8, 50, 100, 150];
    let image_b = vec![255u8, 200, 150, 100];

    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(
        dir.path(),
        "three_pages.pdf",
        &build_pdf(&[
            vec![image_a.clone(), image_b.clone()],
            vec![image_a.clone()],
            vec![],
        ]),
    );
    let output_dir = dir.path().join("out");

    let extractor = PdfImageExtractor::with_config(&pdf, config_into(&output_dir)).unwrap();
    let summary = extractor.extract_images().unwrap();

    assert_eq!(summary.total_saved(), 2);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(summary.failures, 0);
    assert_eq!(summary.pages_processed, 3);
    assert_eq!(png_files_in(&output_dir).len(), 2);

    // Which of the two identical copies wins depends on worker scheduling,
    // but every saved name must still derive from its (page, index) pair.
    for image in &summary.images {
        assert_eq!(
            image.file_name,
            ExtractedImage::output_file_name(image.page_number, image.image_index)
        );
    }
}

#[test]
fn duplicate_on_one_page_is_skipped_in_index_order() {
    let image_a = vec![10u8, 20, 30, 40];

    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(
        dir.path(),
        "repeat.pdf",
        &build_pdf(&[vec![image_a.clone(), image_a.clone()]]),
    );
    let output_dir = dir.path().join("out");

    let extractor = PdfImageExtractor::with_config(&pdf, config_into(&output_dir)).unwrap();
    let summary = extractor.extract_images().unwrap();

    // A single worker walks one page in index order, so the first copy wins.
    assert_eq!(summary.total_saved(), 1);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(png_files_in(&output_dir), vec!["image_1_1.png"]);
}

#[test]
fn filenames_derive_from_page_and_index() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(
        dir.path(),
        "two_images.pdf",
        &build_pdf(&[vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]]),
    );
    let output_dir = dir.path().join("out");

    let extractor = PdfImageExtractor::with_config(&pdf, config_into(&output_dir)).unwrap();
    let summary = extractor.extract_images().unwrap();

    assert_eq!(
        png_files_in(&output_dir),
        vec!["image_1_1.png", "image_1_2.png"]
    );
    assert_eq!(summary.images[0].page_number, 1);
    assert_eq!(summary.images[0].image_index, 1);
    assert_eq!((summary.images[0].width, summary.images[0].height), (2, 2));
}

#[test]
fn rerun_produces_byte_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(
        dir.path(),
        "one_image.pdf",
        &build_pdf(&[vec![vec![9, 8, 7, 6]]]),
    );
    let output_dir = dir.path().join("out");

    let extractor = PdfImageExtractor::with_config(&pdf, config_into(&output_dir)).unwrap();
    extractor.extract_images().unwrap();
    let first = fs::read(output_dir.join("image_1_1.png")).unwrap();

    // Second run clears the directory and writes the file again.
    extractor.extract_images().unwrap();
    let second = fs::read(output_dir.join("image_1_1.png")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn clears_preexisting_files_but_not_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(
        dir.path(),
        "one_image.pdf",
        &build_pdf(&[vec![vec![4, 4, 4, 4]]]),
    );

    let output_dir = dir.path().join("out");
    fs::create_dir_all(output_dir.join("nested")).unwrap();
    write_file(&output_dir, "stale.txt", b"left over from another tool");
    write_file(&output_dir.join("nested"), "kept.txt", b"untouched");

    let extractor = PdfImageExtractor::with_config(&pdf, config_into(&output_dir)).unwrap();
    extractor.extract_images().unwrap();

    assert!(!output_dir.join("stale.txt").exists());
    assert!(output_dir.join("nested/kept.txt").exists());
    assert!(output_dir.join("image_1_1.png").exists());
}

#[test]
fn oversized_streams_count_as_failures() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(
        dir.path(),
        "big.pdf",
        &build_pdf(&[vec![vec![1, 1, 1, 1]]]),
    );
    let output_dir = dir.path().join("out");

    let config = ExtractorConfig {
        max_image_size: Some(2),
        ..config_into(&output_dir)
    };
    let extractor = PdfImageExtractor::with_config(&pdf, config).unwrap();
    let summary = extractor.extract_images().unwrap();

    assert_eq!(summary.total_saved(), 0);
    assert_eq!(summary.failures, 1);
    assert!(png_files_in(&output_dir).is_empty());
}

// ── Form XObject recursion ────────────────────────────────────────────────────

#[test]
fn finds_images_nested_in_form_xobjects() {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(gray_image(&[11, 22, 33, 44]));
    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(100),
                Object::Integer(100),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => Object::Reference(image_id) },
            },
        },
        b"q /Im1 Do Q".to_vec(),
    ));

    let content_id = doc.add_object(Stream::new(dictionary! {}, b"q /Fm1 Do Q".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Fm1" => Object::Reference(form_id) },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let pdf = write_file(dir.path(), "form.pdf", &buf);
    let output_dir = dir.path().join("out");

    let extractor = PdfImageExtractor::with_config(&pdf, config_into(&output_dir)).unwrap();
    let summary = extractor.extract_images().unwrap();

    assert_eq!(summary.total_saved(), 1);
    assert_eq!(png_files_in(&output_dir), vec!["image_1_1.png"]);
}
