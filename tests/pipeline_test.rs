//! End-to-end runs over in-memory documents.

mod common;

use std::fs;

use common::{build_pdf, numbered_document, text, three_page_document};
use pagecrop::pipeline::{self, ExtractionObserver};
use pagecrop::{
    CropBox, DocumentSource, Error, ExtractionConfig, MemoryFetcher, NoopObserver, PageRange,
    PageRecord,
};
use tempfile::TempDir;

const GUIDE_URL: &str = "mem://guide.pdf";
const SECOND_URL: &str = "mem://second.pdf";

fn body() -> CropBox {
    CropBox::new(50.0, 50.0, 560.0, 300.0)
}

fn config_for(dir: &TempDir, documents: Vec<DocumentSource>) -> ExtractionConfig {
    documents.into_iter().fold(
        ExtractionConfig::new().with_output_path(dir.path().join("data/extracted_text.jsonl")),
        |config, doc| config.with_document(doc),
    )
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ExtractionObserver for Recorder {
    fn document_start(&mut self, document: &DocumentSource, pages: usize) {
        self.events.push(format!("start {} {}", document.name, pages));
    }

    fn page_extracted(&mut self, record: &PageRecord) {
        self.events.push(format!("page {}", record.page_number));
    }

    fn document_end(&mut self, document: &DocumentSource, written: usize) {
        self.events.push(format!("end {} {}", document.name, written));
    }
}

#[test]
fn test_exact_output_bytes() {
    let dir = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new().with_document(GUIDE_URL, three_page_document());
    let config = config_for(
        &dir,
        vec![DocumentSource::new("guide", GUIDE_URL, body(), PageRange::new(1, 2))],
    );

    let summary = pipeline::run(&config, &fetcher, &mut NoopObserver).unwrap();
    assert_eq!(summary.total_records(), 2);

    let content = fs::read_to_string(&config.output_path).unwrap();
    assert_eq!(content, "{\"1\": \"HELLO WORLD\"}\n{\"2\": \"FOO BAR\"}\n");
}

#[test]
fn test_second_document_is_offset() {
    let dir = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new()
        .with_document(GUIDE_URL, numbered_document(3))
        .with_document(SECOND_URL, numbered_document(16));
    let config = config_for(
        &dir,
        vec![
            DocumentSource::new("first", GUIDE_URL, body(), PageRange::new(1, 3)),
            DocumentSource::new("second", SECOND_URL, body(), PageRange::new(15, 16))
                .with_page_offset(223),
        ],
    );

    pipeline::run(&config, &fetcher, &mut NoopObserver).unwrap();

    let content = fs::read_to_string(&config.output_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "{\"1\": \"PAGE 1\"}",
            "{\"2\": \"PAGE 2\"}",
            "{\"3\": \"PAGE 3\"}",
            "{\"238\": \"PAGE 15\"}",
            "{\"239\": \"PAGE 16\"}",
        ]
    );
}

#[test]
fn test_runs_append_to_existing_file() {
    let dir = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new().with_document(GUIDE_URL, three_page_document());
    let config = config_for(
        &dir,
        vec![DocumentSource::new("guide", GUIDE_URL, body(), PageRange::new(1, 2))],
    );

    pipeline::run(&config, &fetcher, &mut NoopObserver).unwrap();
    pipeline::run(&config, &fetcher, &mut NoopObserver).unwrap();

    let content = fs::read_to_string(&config.output_path).unwrap();
    assert_eq!(content.lines().count(), 4);
    assert_eq!(
        content,
        "{\"1\": \"HELLO WORLD\"}\n{\"2\": \"FOO BAR\"}\n".repeat(2)
    );
}

#[test]
fn test_blank_page_written_as_null() {
    let dir = TempDir::new().unwrap();
    let data = build_pdf(vec![
        vec![text(100.0, 700.0, "BODY TEXT")],
        vec![text(100.0, 770.0, "HEADER ONLY")],
    ]);
    let fetcher = MemoryFetcher::new().with_document(GUIDE_URL, data);
    let config = config_for(
        &dir,
        vec![DocumentSource::new("guide", GUIDE_URL, body(), PageRange::new(1, 2))],
    );

    let summary = pipeline::run(&config, &fetcher, &mut NoopObserver).unwrap();
    assert_eq!(summary.documents[0].records, 2);
    assert_eq!(summary.documents[0].blank_records, 1);

    let content = fs::read_to_string(&config.output_path).unwrap();
    assert_eq!(content, "{\"1\": \"BODY TEXT\"}\n{\"2\": null}\n");
}

#[test]
fn test_observer_sees_every_record() {
    let dir = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new().with_document(GUIDE_URL, numbered_document(4));
    let config = config_for(
        &dir,
        vec![DocumentSource::new("guide", GUIDE_URL, body(), PageRange::new(2, 3))
            .with_page_offset(10)],
    );

    let mut recorder = Recorder::default();
    pipeline::run(&config, &fetcher, &mut recorder).unwrap();

    assert_eq!(
        recorder.events,
        vec!["start guide 2", "page 12", "page 13", "end guide 2"]
    );
}

#[test]
fn test_html_body_is_rejected() {
    let dir = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new().with_document(
        GUIDE_URL,
        b"<!DOCTYPE html><html><body>Not Found</body></html>".to_vec(),
    );
    let config = config_for(
        &dir,
        vec![DocumentSource::new("guide", GUIDE_URL, body(), PageRange::new(1, 2))],
    );

    let err = pipeline::run(&config, &fetcher, &mut NoopObserver).unwrap_err();
    assert!(matches!(err, Error::UnknownFormat));
    assert!(!config.output_path.exists());
}

#[test]
fn test_failure_keeps_earlier_records() {
    let dir = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new().with_document(GUIDE_URL, three_page_document());
    let config = config_for(
        &dir,
        vec![
            DocumentSource::new("guide", GUIDE_URL, body(), PageRange::new(1, 2)),
            DocumentSource::new("missing", SECOND_URL, body(), PageRange::new(1, 2)),
        ],
    );

    assert!(pipeline::run(&config, &fetcher, &mut NoopObserver).is_err());

    let content = fs::read_to_string(&config.output_path).unwrap();
    assert_eq!(content, "{\"1\": \"HELLO WORLD\"}\n{\"2\": \"FOO BAR\"}\n");
}

#[test]
fn test_invalid_geometry_fails_before_fetching() {
    let dir = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    let config = config_for(
        &dir,
        vec![DocumentSource::new(
            "broken",
            GUIDE_URL,
            CropBox::new(500.0, 60.0, 100.0, 540.0),
            PageRange::new(1, 2),
        )],
    );

    let err = pipeline::run(&config, &fetcher, &mut NoopObserver).unwrap_err();
    assert!(err.to_string().starts_with("broken:"));
    assert!(!config.output_path.exists());
}
