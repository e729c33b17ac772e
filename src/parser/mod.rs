//! PDF parsing module.

pub mod backend;
mod layout;
mod text;

pub use backend::{FontMetrics, LopdfBackend, PageBounds, PageId, PdfBackend};
pub use layout::{crop_glyphs, Glyph, GlyphExtractor, Matrix};
pub use text::{cluster_by_top, extract_text, extract_words, Word, X_TOLERANCE, Y_TOLERANCE};
