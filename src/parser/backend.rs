//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from the glyph layout logic.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

/// Object identifier: (object number, generation number).
pub type ObjectId = (u32, u16);

/// Page identifier.
pub type PageId = ObjectId;

/// Page extent in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBounds {
    /// US Letter, used when a page declares no usable MediaBox.
    pub fn letter() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: 612.0,
            y1: 792.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Glyph advance information for one font resource.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// Advance widths in 1/1000 text space units, keyed by character code.
    pub widths: HashMap<u32, f32>,
    /// Width used for codes absent from `widths`.
    pub default_width: f32,
    /// 1 for simple fonts, 2 for composite (Type0) fonts.
    pub bytes_per_code: usize,
    /// Distance of the glyph box bottom from the baseline, in 1/1000 text
    /// space units (negative below the baseline).
    pub descent: f32,
}

impl FontMetrics {
    /// Metrics for a font without width information.
    pub fn fallback(base_font: impl Into<String>) -> Self {
        let base_font = base_font.into();
        let default_width = fallback_width(&base_font);
        Self {
            base_font,
            widths: HashMap::new(),
            default_width,
            bytes_per_code: 1,
            descent: DEFAULT_DESCENT,
        }
    }

    /// Advance of `code` in 1/1000 text space units.
    pub fn width(&self, code: u32) -> f32 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    /// Split a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.bytes_per_code == 2 {
            bytes
                .chunks(2)
                .map(|c| {
                    if c.len() == 2 {
                        u32::from(u16::from_be_bytes([c[0], c[1]]))
                    } else {
                        u32::from(c[0])
                    }
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }
}

/// Descent used when the font descriptor declares none.
pub const DEFAULT_DESCENT: f32 = -200.0;

/// Width assumed for every glyph of a font that carries no metrics.
fn fallback_width(base_font: &str) -> f32 {
    if base_font.to_lowercase().contains("courier") {
        600.0
    } else {
        500.0
    }
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A form XObject referenced by a `Do` operator.
#[derive(Debug, Clone)]
pub struct FormXObject {
    pub id: ObjectId,
    /// Form space to user space transform (`/Matrix`).
    pub matrix: [f32; 6],
    /// Decompressed content stream.
    pub content: Vec<u8>,
    /// Metrics of the form's own font resources; `None` when the form
    /// declares no `/Resources` and uses those of the caller.
    pub fonts: Option<HashMap<Vec<u8>, FontMetrics>>,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, page geometry, font metrics,
/// content stream decoding, and text decoding without exposing any
/// concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's MediaBox, following inheritance up the page tree.
    fn page_bounds(&self, page: PageId) -> Result<PageBounds>;

    /// Return metrics for every font resource of a page, keyed by resource name.
    fn page_fonts(&self, page: PageId) -> Result<HashMap<Vec<u8>, FontMetrics>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Look up `name` in the `/XObject` resources of `scope` (a page or a
    /// form XObject). Returns `None` unless it names a form XObject.
    fn form_xobject(&self, scope: ObjectId, name: &[u8]) -> Option<FormXObject>;

    /// Decode a text byte sequence using the encoding of font `font_name`
    /// in the resources of `scope` (a page or a form XObject).
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, scope: ObjectId, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        // Documents that cannot be decrypted surface as `Error::Encrypted`.
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Follow a reference, returning the object itself otherwise.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        self.doc
            .dereference(obj)
            .map(|(_, resolved)| resolved)
            .unwrap_or(obj)
    }

    /// Look up a page attribute, walking `/Parent` links for inherited keys.
    fn inherited_attribute(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page).ok();
        // Bound the walk in case of a cyclic page tree.
        for _ in 0..64 {
            let dict = current?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }
        None
    }

    fn number_array(&self, obj: &Object) -> Option<Vec<f32>> {
        let array = self.resolve(obj).as_array().ok()?;
        Some(
            array
                .iter()
                .map(|o| self.resolve(o).as_float().unwrap_or(0.0))
                .collect(),
        )
    }

    fn font_metrics(&self, font: &Dictionary) -> FontMetrics {
        let base_font = font
            .get(b"BaseFont")
            .ok()
            .and_then(|o| self.resolve(o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let subtype = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");

        if subtype == b"Type0" {
            return self.composite_font_metrics(font, base_font);
        }

        let mut metrics = FontMetrics::fallback(base_font);
        let descriptor = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| self.resolve(o).as_dict().ok());

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| self.resolve(o).as_i64().ok())
            .unwrap_or(0);
        if let Some(widths) = font.get(b"Widths").ok().and_then(|o| self.number_array(o)) {
            for (i, w) in widths.into_iter().enumerate() {
                metrics.widths.insert((first_char + i as i64) as u32, w);
            }
        }

        if let Some(descriptor) = descriptor {
            if let Some(w) = self.descriptor_number(descriptor, b"MissingWidth") {
                metrics.default_width = w;
            }
            if let Some(d) = self.descriptor_number(descriptor, b"Descent") {
                metrics.descent = d;
            }
        }

        metrics
    }

    fn descriptor_number(&self, descriptor: &Dictionary, key: &[u8]) -> Option<f32> {
        descriptor
            .get(key)
            .ok()
            .and_then(|o| self.resolve(o).as_float().ok())
    }

    /// Type0 fonts take widths from their descendant CIDFont (`/DW`, `/W`).
    fn composite_font_metrics(&self, font: &Dictionary, base_font: String) -> FontMetrics {
        let mut metrics = FontMetrics {
            base_font,
            widths: HashMap::new(),
            default_width: 1000.0,
            bytes_per_code: 2,
            descent: DEFAULT_DESCENT,
        };

        let descendant = font
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| self.resolve(o).as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|o| self.resolve(o).as_dict().ok());

        let Some(descendant) = descendant else {
            return metrics;
        };

        if let Some(d) = descendant
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| self.resolve(o).as_dict().ok())
            .and_then(|fd| self.descriptor_number(fd, b"Descent"))
        {
            metrics.descent = d;
        }

        if let Some(dw) = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| self.resolve(o).as_float().ok())
        {
            metrics.default_width = dw;
        }

        if let Some(w) = descendant
            .get(b"W")
            .ok()
            .and_then(|o| self.resolve(o).as_array().ok())
        {
            self.parse_cid_widths(w, &mut metrics.widths);
        }

        metrics
    }

    /// Parse a `/W` array: `c [w1 w2 ...]` or `c_first c_last w` entries.
    fn parse_cid_widths(&self, w: &[Object], widths: &mut HashMap<u32, f32>) {
        let mut i = 0;
        while i < w.len() {
            let Ok(first) = self.resolve(&w[i]).as_i64() else {
                break;
            };
            let Some(next) = w.get(i + 1).map(|o| self.resolve(o)) else {
                break;
            };
            if let Ok(list) = next.as_array() {
                for (j, width) in list.iter().enumerate() {
                    if let Ok(width) = self.resolve(width).as_float() {
                        widths.insert((first + j as i64) as u32, width);
                    }
                }
                i += 2;
            } else {
                let last = next.as_i64().unwrap_or(first);
                let width = w
                    .get(i + 2)
                    .and_then(|o| self.resolve(o).as_float().ok())
                    .unwrap_or(0.0);
                for cid in first..=last {
                    widths.insert(cid as u32, width);
                }
                i += 3;
            }
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_bounds(&self, page: PageId) -> Result<PageBounds> {
        self.doc
            .get_dictionary(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let bounds = self
            .inherited_attribute(page, b"MediaBox")
            .and_then(|obj| self.number_array(obj))
            .filter(|values| values.len() >= 4)
            .map(|v| PageBounds {
                x0: v[0].min(v[2]),
                y0: v[1].min(v[3]),
                x1: v[0].max(v[2]),
                y1: v[1].max(v[3]),
            })
            .unwrap_or_else(PageBounds::letter);

        Ok(bounds)
    }

    fn page_fonts(&self, page: PageId) -> Result<HashMap<Vec<u8>, FontMetrics>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(lopdf_fonts
            .iter()
            .map(|(name, font_dict)| (name.clone(), self.font_metrics(font_dict)))
            .collect())
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        // A page without /Contents is blank.
        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => Ok(stream_bytes(s)),
                Ok(Object::Array(arr)) => Ok(self.concat_streams(arr)),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn form_xobject(&self, scope: ObjectId, name: &[u8]) -> Option<FormXObject> {
        let xobjects = self
            .scope_resources(scope)?
            .get(b"XObject")
            .ok()
            .and_then(|o| self.resolve(o).as_dict().ok())?;
        let id = xobjects.get(name).ok()?.as_reference().ok()?;
        let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;

        // Image XObjects carry no text.
        if stream.dict.get(b"Subtype").and_then(Object::as_name).ok()? != b"Form" {
            return None;
        }

        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| self.number_array(o))
            .filter(|m| m.len() >= 6)
            .map(|m| [m[0], m[1], m[2], m[3], m[4], m[5]])
            .unwrap_or([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

        let fonts = self.form_resources(stream).map(|resources| {
            self.font_dicts(resources)
                .into_iter()
                .map(|(name, dict)| (name.to_vec(), self.font_metrics(dict)))
                .collect()
        });

        Some(FormXObject {
            id,
            matrix,
            content: stream_bytes(stream),
            fonts,
        })
    }

    fn decode_text(&self, scope: ObjectId, font_name: &[u8], bytes: &[u8]) -> String {
        let font = match self.doc.get_object(scope) {
            Ok(Object::Stream(stream)) => self.form_resources(stream).and_then(|resources| {
                self.font_dicts(resources)
                    .into_iter()
                    .find(|(name, _)| *name == font_name)
                    .map(|(_, dict)| dict)
            }),
            _ => self
                .doc
                .get_page_fonts(scope)
                .ok()
                .and_then(|fonts| fonts.get(font_name).copied()),
        };

        if let Some(font_dict) = font {
            if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}

impl LopdfBackend {
    fn concat_streams(&self, arr: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in arr {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    content.extend_from_slice(&stream_bytes(s));
                    content.push(b' ');
                }
            }
        }
        content
    }

    /// Resources in effect for a page (inherited) or a form XObject.
    fn scope_resources(&self, scope: ObjectId) -> Option<&Dictionary> {
        match self.doc.get_object(scope).ok()? {
            Object::Stream(stream) => self.form_resources(stream),
            _ => self
                .inherited_attribute(scope, b"Resources")
                .and_then(|o| o.as_dict().ok()),
        }
    }

    fn form_resources<'a>(&'a self, stream: &'a Stream) -> Option<&'a Dictionary> {
        stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| self.resolve(o).as_dict().ok())
    }

    /// Font dictionaries of a resource dictionary, keyed by resource name.
    fn font_dicts<'a>(&'a self, resources: &'a Dictionary) -> Vec<(&'a [u8], &'a Dictionary)> {
        resources
            .get(b"Font")
            .ok()
            .and_then(|o| self.resolve(o).as_dict().ok())
            .map(|fonts| {
                fonts
                    .iter()
                    .filter_map(|(name, o)| {
                        self.resolve(o)
                            .as_dict()
                            .ok()
                            .map(|dict| (name.as_slice(), dict))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Decompressed stream data, or the raw bytes when no filter applies.
fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}
