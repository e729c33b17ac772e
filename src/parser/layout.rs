//! Glyph layout for PDF pages.
//!
//! Interprets a page's content stream and places every shown character on
//! the page, so text can be filtered by position before it is assembled.

use std::collections::HashMap;

use crate::config::CropBox;
use crate::error::Result;

use super::backend::{
    get_number_from_value, ContentOp, FontMetrics, ObjectId, PageBounds, PageId, PdfBackend,
    PdfValue,
};

/// Nesting limit for form XObjects drawn from other forms.
const MAX_FORM_DEPTH: usize = 8;

type FontMap = HashMap<Vec<u8>, FontMetrics>;

/// A single positioned character.
///
/// Coordinates are relative to the top-left corner of the page with y
/// growing downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Decoded text (usually one character, more for ligatures)
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
    /// Effective font size in points
    pub size: f32,
}

impl Glyph {
    /// Create a glyph from its box.
    pub fn new(text: impl Into<String>, x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            bottom,
            size: bottom - top,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// Whether any part of the glyph falls inside `crop`.
    pub fn intersects(&self, crop: &CropBox) -> bool {
        crop.intersects(self.x0, self.top, self.x1, self.bottom)
    }
}

/// Keep the glyphs that overlap the crop rectangle.
pub fn crop_glyphs(glyphs: &[Glyph], crop: &CropBox) -> Vec<Glyph> {
    glyphs
        .iter()
        .filter(|g| g.intersects(crop))
        .cloned()
        .collect()
}

/// Affine transform `[a b c d e f]` as used by PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Length of the transformed vertical unit vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(operands: &[PdfValue]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f32> = operands[..6]
            .iter()
            .map(|v| get_number_from_value(v).unwrap_or(0.0))
            .collect();
        Some(Matrix::new(n[0], n[1], n[2], n[3], n[4], n[5]))
    }
}

/// Text state parameters (`Tf`, `Tc`, `Tw`, `Tz`, `TL`, `Ts`).
#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Places the characters of one page.
pub struct GlyphExtractor<'a, B: PdfBackend> {
    backend: &'a B,
    page: PageId,
    bounds: PageBounds,
    fonts: &'a FontMap,
    ctm: Matrix,
    state: TextState,
    stack: Vec<(Matrix, TextState)>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    glyphs: Vec<Glyph>,
}

impl<'a, B: PdfBackend> GlyphExtractor<'a, B> {
    pub fn new(
        backend: &'a B,
        page: PageId,
        bounds: PageBounds,
        fonts: &'a FontMap,
    ) -> Self {
        Self {
            backend,
            page,
            bounds,
            fonts,
            ctm: Matrix::identity(),
            state: TextState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
            glyphs: Vec::new(),
        }
    }

    /// Decode the page's content stream and return its glyphs in drawing order.
    pub fn extract(mut self) -> Result<Vec<Glyph>> {
        let content = self.backend.page_content(self.page)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let ops = self.backend.decode_content(&content)?;
        let fonts = self.fonts;
        self.run(&ops, self.page, fonts, 0);
        Ok(self.glyphs)
    }

    /// Apply `ops` with the resources of `scope` (the page or a form).
    fn run(&mut self, ops: &[ContentOp], scope: ObjectId, fonts: &FontMap, depth: usize) {
        for op in ops {
            self.apply(op, scope, fonts, depth);
        }
    }

    fn apply(&mut self, op: &ContentOp, scope: ObjectId, fonts: &FontMap, depth: usize) {
        let num = |i: usize| op.operands.get(i).and_then(get_number_from_value);

        match op.operator.as_str() {
            "q" => self.stack.push((self.ctm, self.state.clone())),
            "Q" => {
                if let Some((ctm, state)) = self.stack.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.ctm = m.multiply(&self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::identity();
                self.line_matrix = Matrix::identity();
            }
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.state.font = name.clone();
                }
                if let Some(size) = num(1) {
                    self.state.size = size;
                }
            }
            "Tc" => self.state.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.state.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.state.leading = num(0).unwrap_or(0.0),
            "Ts" => self.state.rise = num(0).unwrap_or(0.0),
            "Td" => self.move_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
            "TD" => {
                let ty = num(1).unwrap_or(0.0);
                self.state.leading = -ty;
                self.move_line(num(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(bytes, scope, fonts);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            PdfValue::Str(bytes) => self.show(bytes, scope, fonts),
                            other => {
                                if let Some(adjust) = get_number_from_value(other) {
                                    let tx = -adjust / 1000.0
                                        * self.state.size
                                        * self.state.horizontal_scale;
                                    self.advance(tx);
                                }
                            }
                        }
                    }
                }
            }
            "'" => {
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(bytes, scope, fonts);
                }
            }
            "\"" => {
                self.state.word_spacing = num(0).unwrap_or(0.0);
                self.state.char_spacing = num(1).unwrap_or(0.0);
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show(bytes, scope, fonts);
                }
            }
            "Do" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.draw_form(name, scope, fonts, depth);
                }
            }
            _ => {}
        }
    }

    /// Draw a form XObject: its content runs under the current graphics
    /// state with `/Matrix` concatenated, and the state is restored after.
    fn draw_form(&mut self, name: &[u8], scope: ObjectId, fonts: &FontMap, depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            log::warn!(
                "Form XObject /{} nested too deeply, skipped",
                String::from_utf8_lossy(name)
            );
            return;
        }
        let Some(form) = self.backend.form_xobject(scope, name) else {
            return;
        };
        let ops = match self.backend.decode_content(&form.content) {
            Ok(ops) => ops,
            Err(e) => {
                log::warn!("Form XObject /{}: {}", String::from_utf8_lossy(name), e);
                return;
            }
        };

        let saved_stack = self.stack.len();
        self.stack.push((self.ctm, self.state.clone()));
        let [a, b, c, d, e, f] = form.matrix;
        self.ctm = Matrix::new(a, b, c, d, e, f).multiply(&self.ctm);

        match &form.fonts {
            Some(own) => self.run(&ops, form.id, own, depth + 1),
            None => self.run(&ops, scope, fonts, depth + 1),
        }

        // Unbalanced q/Q inside the form must not leak out of it.
        self.stack.truncate(saved_stack + 1);
        if let Some((ctm, state)) = self.stack.pop() {
            self.ctm = ctm;
            self.state = state;
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn advance(&mut self, tx: f32) {
        self.text_matrix = Matrix::translation(tx, 0.0).multiply(&self.text_matrix);
    }

    /// Show a string: emit one glyph per decoded character and move the
    /// text matrix past it.
    fn show(&mut self, bytes: &[u8], scope: ObjectId, fonts: &FontMap) {
        let fallback;
        let metrics = match fonts.get(&self.state.font) {
            Some(m) => m,
            None => {
                fallback = FontMetrics::fallback(String::from_utf8_lossy(&self.state.font));
                &fallback
            }
        };

        let text = self.backend.decode_text(scope, &self.state.font, bytes);
        let descent = metrics.descent / 1000.0;
        let codes = metrics.codes(bytes);
        let chars: Vec<char> = text.chars().collect();

        let advances: Vec<f32> = codes
            .iter()
            .map(|&code| {
                let mut tx = metrics.width(code) / 1000.0 * self.state.size
                    + self.state.char_spacing;
                if metrics.bytes_per_code == 1 && code == 32 {
                    tx += self.state.word_spacing;
                }
                tx * self.state.horizontal_scale
            })
            .collect();

        if chars.len() == codes.len() {
            for (ch, tx) in chars.iter().zip(&advances) {
                self.place(ch.to_string(), *tx, descent);
            }
        } else if !chars.is_empty() {
            // Code and character counts disagree (ligatures, multi-byte
            // encodings): spread the total advance evenly.
            let total: f32 = advances.iter().sum();
            let each = total / chars.len() as f32;
            for ch in chars {
                self.place(ch.to_string(), each, descent);
            }
        } else {
            let total: f32 = advances.iter().sum();
            self.advance(total);
        }
    }

    /// Emit one glyph advancing `tx`. The box spans one font size upwards
    /// from `descent` (a fraction of the size) below the baseline.
    fn place(&mut self, text: String, tx: f32, descent: f32) {
        let m = self.text_matrix.multiply(&self.ctm);
        let rise = self.state.rise;
        let (sx, sy) = m.transform(0.0, rise);
        let (ex, _) = m.transform(tx, rise);
        let size = self.state.size * m.vertical_scale();

        let x0 = sx.min(ex) - self.bounds.x0;
        let x1 = sx.max(ex) - self.bounds.x0;
        let low = sy + size * descent;
        let top = self.bounds.y1 - (low + size);
        let bottom = self.bounds.y1 - low;

        self.glyphs.push(Glyph {
            text,
            x0,
            x1,
            top,
            bottom,
            size,
        });
        self.advance(tx);
    }
}
