//! CLI tool for extracting the unique raster images of a PDF document.
//!
//! This binary demonstrates the capabilities of the extractimagespdf crate:
//! it validates the document, fans page extraction out across all CPU cores,
//! and reports what was saved, skipped, or failed.

use extractimagespdf::{ExtractorConfig, PdfImageExtractor, Result};
use std::{env, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let pdf_path = &args[1];
    let output_dir = args.get(2).map(String::as_str);

    match run_extraction(pdf_path, output_dir) {
        Ok(()) => println!("\n✅ Extraction completed!"),
        Err(e) => {
            eprintln!("\n❌ Error: {e}");
            process::exit(1);
        }
    }
}

fn print_usage(program_name: &str) {
    println!("🖼  extractImagesPDF - PDF Image Extraction Tool");
    println!();
    println!("USAGE:");
    println!("    {program_name} <pdf_file> [output_dir]");
    println!();
    println!("ARGUMENTS:");
    println!("    <pdf_file>     Path to the PDF file to process");
    println!("    [output_dir]   Directory to write images to (default: 'extracted_images')");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help     Show this help message");
    println!();
    println!("This tool will:");
    println!("  • Validate the PDF structure");
    println!("  • Extract every embedded raster image, one worker per CPU core");
    println!("  • Skip byte-identical duplicates (SHA-256 content hash)");
    println!("  • Save unique images as PNG files named image_<page>_<n>.png");
}

fn run_extraction(pdf_path: &str, output_dir: Option<&str>) -> Result<()> {
    let config = ExtractorConfig {
        output_directory: output_dir.map(str::to_owned),
        verbose: true,
        ..Default::default()
    };

    println!("🔍 Processing PDF: {pdf_path}");

    let extractor = PdfImageExtractor::with_config(pdf_path, config)?;
    let pages = extractor.page_count()?;
    println!("📁 Output directory: {}", extractor.output_directory());
    println!("📄 {pages} page(s) found");
    println!("{}", "─".repeat(60));

    let summary = extractor.extract_images()?;

    println!("{}", "─".repeat(60));
    if !summary.found_any() {
        println!("ℹ️  No images found in the PDF.");
        return Ok(());
    }

    println!("📊 Summary:");
    println!("   • {} unique image(s) saved", summary.total_saved());
    if summary.duplicates_skipped > 0 {
        println!("   • {} duplicate(s) skipped", summary.duplicates_skipped);
    }
    if summary.failures > 0 {
        println!("   • {} image(s) failed to decode", summary.failures);
    }
    println!("   • Output directory: {}", extractor.output_directory());

    Ok(())
}
