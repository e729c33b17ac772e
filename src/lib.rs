//! # pagecrop
//!
//! Cropped page text extraction for fine-tuning corpora.
//!
//! Downloads PDF documents, crops every page of a configured range to a
//! fixed rectangle (dropping headers, footers and margins), extracts the
//! remaining text and appends one JSON object per page to a JSON Lines file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagecrop::ExtractionConfig;
//!
//! fn main() -> pagecrop::Result<()> {
//!     let config = ExtractionConfig::training_guides();
//!     let summary = pagecrop::extract_to_file(&config)?;
//!     println!("{} records written", summary.total_records());
//!     Ok(())
//! }
//! ```
//!
//! ## Output
//!
//! Each line holds a single-entry object keyed by page number:
//!
//! ```text
//! {"4": "FOUNDATIONS\nCrossFit is ..."}
//! {"5": null}
//! ```
//!
//! `null` marks a page whose crop region contains no text. The file is only
//! ever appended to; running twice doubles its records.

pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;

pub use config::{CropBox, DocumentSource, ExtractionConfig, PageRange};
pub use detect::{detect_format_from_bytes, is_pdf_bytes, PdfFormat};
pub use error::{Error, Result};
pub use extract::PageExtractor;
pub use fetch::{DocumentFetcher, HttpFetcher, MemoryFetcher};
pub use model::PageRecord;
pub use pipeline::{ExtractionObserver, NoopObserver, RunSummary};
pub use render::{append_pages, append_pages_with_offset, JsonlWriter};

/// Run a configuration end to end over HTTP.
///
/// # Example
///
/// ```no_run
/// use pagecrop::{extract_to_file, ExtractionConfig};
///
/// let config = ExtractionConfig::training_guides().with_output_path("corpus.jsonl");
/// extract_to_file(&config).unwrap();
/// ```
pub fn extract_to_file(config: &ExtractionConfig) -> Result<RunSummary> {
    let fetcher = HttpFetcher::from_config(config)?;
    pipeline::run(config, &fetcher, &mut NoopObserver)
}

/// Extract the cropped text of every in-range page of an in-memory PDF.
///
/// # Example
///
/// ```no_run
/// use pagecrop::{extract_pages, CropBox, PageRange};
///
/// let data = std::fs::read("guide.pdf").unwrap();
/// let records = extract_pages(&data, CropBox::new(40.0, 60.0, 540.0, 740.0), PageRange::new(15, 80)).unwrap();
/// println!("{} pages", records.len());
/// ```
pub fn extract_pages(data: &[u8], crop: CropBox, range: PageRange) -> Result<Vec<PageRecord>> {
    PageExtractor::open(data, crop, range)?.collect()
}
