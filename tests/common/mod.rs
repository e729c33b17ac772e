//! Synthetic PDF fixtures shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// One drawing operation on a page or in a form.
pub enum Item {
    /// `1 0 0 1 x y Tm (text) Tj` with the default font at 12pt.
    Text { x: f32, y: f32, text: String },
    /// `1 0 0 1 x y Tm [ ... ] TJ` with kerning adjustments.
    Kerned {
        x: f32,
        y: f32,
        parts: Vec<Object>,
    },
    /// `q /name Do Q`, drawing a form registered with [`build_pdf_with_forms`].
    Form { name: String },
}

pub fn text(x: f32, y: f32, text: &str) -> Item {
    Item::Text {
        x,
        y,
        text: text.to_string(),
    }
}

pub fn kerned(x: f32, y: f32, parts: Vec<Object>) -> Item {
    Item::Kerned { x, y, parts }
}

pub fn form(name: &str) -> Item {
    Item::Form {
        name: name.to_string(),
    }
}

/// A form XObject resource: `/Matrix` plus the items its content shows.
pub struct FormSpec {
    pub name: String,
    pub matrix: [f32; 6],
    pub items: Vec<Item>,
}

fn encode(items: Vec<Item>) -> Vec<u8> {
    let mut operations = Vec::new();
    for item in items {
        let shown = match item {
            Item::Text { x, y, text } => {
                Some((tm(x, y), Operation::new("Tj", vec![Object::string_literal(text)])))
            }
            Item::Kerned { x, y, parts } => {
                Some((tm(x, y), Operation::new("TJ", vec![Object::Array(parts)])))
            }
            Item::Form { name } => {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                operations.push(Operation::new("Q", vec![]));
                None
            }
        };
        if let Some((matrix, show)) = shown {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ));
            operations.push(Operation::new("Tm", matrix));
            operations.push(show);
            operations.push(Operation::new("ET", vec![]));
        }
    }
    Content { operations }.encode().expect("encode content")
}

/// Build a letter-sized PDF, one `Vec<Item>` per page. Text is shown with
/// Courier at 12pt, one text object per item.
///
/// The MediaBox and font resources live on the page tree root so pages
/// inherit them.
pub fn build_pdf(pages: Vec<Vec<Item>>) -> Vec<u8> {
    build_pdf_with_forms(pages, Vec::new())
}

/// Like [`build_pdf`], with form XObjects added to the shared resources.
/// Each form carries its own `/Resources` with the same font.
pub fn build_pdf_with_forms(pages: Vec<Vec<Item>>, forms: Vec<FormSpec>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Font".to_vec()),
        "Subtype" => Object::Name(b"Type1".to_vec()),
        "BaseFont" => Object::Name(b"Courier".to_vec()),
    });

    let mut xobjects = Dictionary::new();
    for spec in forms {
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => Object::Name(b"XObject".to_vec()),
                "Subtype" => Object::Name(b"Form".to_vec()),
                "BBox" => letter(),
                "Matrix" => Object::Array(spec.matrix.iter().map(|&v| Object::Real(v)).collect()),
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => font_id,
                    },
                },
            },
            encode(spec.items),
        ));
        xobjects.set(spec.name.into_bytes(), form_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
        "XObject" => xobjects,
    });

    let mut kids = Vec::new();
    for items in pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encode(items)));
        let page_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => Object::Name(b"Pages".to_vec()),
        "Kids" => Object::Array(kids),
        "Count" => Object::Integer(count),
        "Resources" => resources_id,
        "MediaBox" => letter(),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save pdf");
    buf
}

fn letter() -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ])
}

fn tm(x: f32, y: f32) -> Vec<Object> {
    vec![
        Object::Integer(1),
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(1),
        Object::Real(x),
        Object::Real(y),
    ]
}

/// The three-page document: "HELLO WORLD" and "FOO BAR" in the body of
/// pages 1 and 2, running headers and footers outside the body, and an
/// unrelated page 3.
pub fn three_page_document() -> Vec<u8> {
    build_pdf(vec![
        vec![
            text(100.0, 770.0, "CHAPTER ONE"),
            text(100.0, 700.0, "HELLO WORLD"),
            text(300.0, 30.0, "1"),
        ],
        vec![
            text(100.0, 770.0, "CHAPTER ONE"),
            text(100.0, 700.0, "FOO BAR"),
            text(300.0, 30.0, "2"),
        ],
        vec![text(100.0, 100.0, "UNRELATED")],
    ])
}

/// `n` pages, each with its number written inside the body.
pub fn numbered_document(n: u32) -> Vec<u8> {
    build_pdf(
        (1..=n)
            .map(|i| vec![text(100.0, 700.0, &format!("PAGE {}", i))])
            .collect(),
    )
}
