//! Fetch, crop, extract and write every configured document.
//!
//! Documents are processed one after another. Each record is written as soon
//! as its page has been extracted; any failure aborts the run and leaves the
//! lines already appended in place.

use crate::config::{DocumentSource, ExtractionConfig};
use crate::detect::detect_format_from_bytes;
use crate::error::Result;
use crate::extract::PageExtractor;
use crate::fetch::DocumentFetcher;
use crate::model::PageRecord;
use crate::render::append_pages_with_offset;

/// Hooks called while a run progresses.
///
/// All methods have empty default implementations.
pub trait ExtractionObserver {
    /// A document has been opened; `pages` records are expected.
    fn document_start(&mut self, _document: &DocumentSource, _pages: usize) {}

    /// A record has been extracted and is handed to the writer (page
    /// number already offset).
    fn page_extracted(&mut self, _record: &PageRecord) {}

    /// All records of a document have been written.
    fn document_end(&mut self, _document: &DocumentSource, _written: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

/// Records written for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub name: String,
    pub records: usize,
    pub blank_records: usize,
}

/// Outcome of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub documents: Vec<DocumentSummary>,
}

impl RunSummary {
    /// Total records appended by the run.
    pub fn total_records(&self) -> usize {
        self.documents.iter().map(|d| d.records).sum()
    }
}

/// Process every document of `config`, appending to its output path.
pub fn run<F, O>(config: &ExtractionConfig, fetcher: &F, observer: &mut O) -> Result<RunSummary>
where
    F: DocumentFetcher + ?Sized,
    O: ExtractionObserver + ?Sized,
{
    config.validate()?;

    let mut summary = RunSummary::default();
    for document in &config.documents {
        let doc_summary = extract_document(config, document, fetcher, observer)?;
        summary.documents.push(doc_summary);
    }
    Ok(summary)
}

/// Fetch one document and append its in-range pages.
pub fn extract_document<F, O>(
    config: &ExtractionConfig,
    document: &DocumentSource,
    fetcher: &F,
    observer: &mut O,
) -> Result<DocumentSummary>
where
    F: DocumentFetcher + ?Sized,
    O: ExtractionObserver + ?Sized,
{
    log::info!("Start extracting pages from {}", document.url);

    let data = fetcher.fetch(&document.url)?;
    let format = detect_format_from_bytes(&data)?;
    log::debug!("{}: {} ({} bytes)", document.name, format, data.len());

    let extractor = PageExtractor::open(&data, document.crop, document.pages)?;
    // The document stays in memory only for as long as the extractor lives.
    drop(data);
    observer.document_start(document, extractor.in_range_count());

    let offset = document.page_offset;
    let mut blank_records = 0;
    let pages = extractor.inspect(|record| {
        if let Ok(record) = record {
            let record = record.clone().with_offset(offset);
            if record.is_blank() {
                blank_records += 1;
            }
            observer.page_extracted(&record);
        }
    });
    let records = append_pages_with_offset(&config.output_path, pages, offset)?;

    observer.document_end(document, records);
    log::info!("Finished extracting texts from {}", document.url);

    Ok(DocumentSummary {
        name: document.name.clone(),
        records,
        blank_records,
    })
}
