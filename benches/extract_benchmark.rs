//! Benchmarks for cropped page extraction.
//!
//! Run with: cargo bench
//!
//! Documents are synthesized with lopdf: letter pages with a header, a
//! footer and a body of justified lines, so cropping has work to discard.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use pagecrop::parser::{extract_text, Glyph};
use pagecrop::{CropBox, PageRange, PageRecord};

const BODY_LINES: usize = 40;

fn show(operations: &mut Vec<Operation>, x: f32, y: f32, text: &str) {
    operations.push(Operation::new(
        "Tm",
        vec![
            Object::Integer(1),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(1),
            Object::Real(x),
            Object::Real(y),
        ],
    ));
    operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
}

/// Creates a synthetic PDF with the given number of pages.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for i in 0..page_count {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]),
        ];
        show(&mut operations, 72.0, 760.0, "TRAINING GUIDE | HEADER");
        for line in 0..BODY_LINES {
            let y = 700.0 - line as f32 * 14.0;
            show(
                &mut operations,
                130.0,
                y,
                "Movement is the foundation of fitness and every session builds on it.",
            );
        }
        show(&mut operations, 300.0, 30.0, &format!("{}", i + 1));
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save pdf");
    buf
}

fn crop() -> CropBox {
    CropBox::new(120.0, 60.0, 490.0, 540.0)
}

/// Benchmark PDF format detection.
fn bench_format_detection(c: &mut Criterion) {
    let pdf_data = create_test_pdf(1);
    let html_data = b"<!DOCTYPE html><html><body>Not Found</body></html>";

    c.bench_function("detect_valid_pdf", |b| {
        b.iter(|| pagecrop::detect_format_from_bytes(black_box(&pdf_data)).unwrap());
    });

    c.bench_function("detect_html_page", |b| {
        b.iter(|| pagecrop::is_pdf_bytes(black_box(html_data)));
    });
}

/// Benchmark cropped extraction with varying page counts.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_pages");

    for page_count in [1, 10, 50] {
        let pdf_data = create_test_pdf(page_count);
        let range = PageRange::new(1, page_count as u32);
        group.bench_with_input(
            BenchmarkId::from_parameter(page_count),
            &pdf_data,
            |b, data| {
                b.iter(|| pagecrop::extract_pages(black_box(data), crop(), range).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark line and word assembly over one page worth of glyphs.
fn bench_text_assembly(c: &mut Criterion) {
    let mut glyphs = Vec::new();
    for line in 0..BODY_LINES {
        let top = 80.0 + line as f32 * 14.0;
        for (i, ch) in "Squat, deadlift and press for every athlete".chars().enumerate() {
            let x0 = 130.0 + i as f32 * 5.5;
            glyphs.push(Glyph::new(ch.to_string(), x0, top, x0 + 5.5, top + 10.0));
        }
    }
    // Content streams rarely arrive in reading order.
    glyphs.reverse();

    c.bench_function("extract_text_page", |b| {
        b.iter(|| extract_text(black_box(&glyphs)));
    });
}

/// Benchmark record serialization.
fn bench_serialization(c: &mut Criterion) {
    let record = PageRecord::new(
        238,
        "The Olympic lifts \u{2014} snatch and clean & jerk \u{2014} demand speed.\n".repeat(30),
    );

    c.bench_function("json_line", |b| {
        b.iter(|| pagecrop::render::to_json_line(black_box(&record)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_extraction,
    bench_text_assembly,
    bench_serialization,
);
criterion_main!(benches);
