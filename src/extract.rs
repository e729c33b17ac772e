//! Page-at-a-time cropped text extraction.
//!
//! [`PageExtractor`] walks a document's pages in order and yields one
//! [`PageRecord`] per page inside the configured range. Each page's layout
//! (fonts and positioned glyphs) is loaded into a [`LayoutCache`], cropped,
//! turned into text and released before the record is handed out, so memory
//! stays bounded by a single page no matter how long the document is.
//!
//! # Example
//!
//! ```no_run
//! use pagecrop::{CropBox, PageExtractor, PageRange};
//!
//! fn main() -> pagecrop::Result<()> {
//!     let data = std::fs::read("guide.pdf")?;
//!     let crop = CropBox::new(120.0, 60.0, 490.0, 540.0);
//!     for record in PageExtractor::open(&data, crop, PageRange::new(4, 249))? {
//!         let record = record?;
//!         println!("{}: {:?}", record.page_number, record.text);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::{btree_map, HashMap};

use crate::config::{CropBox, PageRange};
use crate::error::Result;
use crate::model::PageRecord;
use crate::parser::{
    crop_glyphs, extract_text, FontMetrics, Glyph, GlyphExtractor, LopdfBackend, PageBounds,
    PageId, PdfBackend,
};

/// Layout state of the page currently being processed.
#[derive(Debug)]
pub struct LayoutCache {
    pub page_number: u32,
    pub bounds: PageBounds,
    pub fonts: HashMap<Vec<u8>, FontMetrics>,
    pub glyphs: Vec<Glyph>,
}

/// Lazy, single-pass iterator over the in-range pages of one document.
///
/// The extractor owns the opened document; iterating it again requires
/// opening the document again.
pub struct PageExtractor<B: PdfBackend = LopdfBackend> {
    backend: B,
    crop: CropBox,
    range: PageRange,
    pages: btree_map::IntoIter<u32, PageId>,
    cache: Option<LayoutCache>,
    released: usize,
}

impl PageExtractor<LopdfBackend> {
    /// Open a PDF held in memory.
    pub fn open(data: &[u8], crop: CropBox, range: PageRange) -> Result<Self> {
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self::new(backend, crop, range))
    }
}

impl<B: PdfBackend> PageExtractor<B> {
    /// Create an extractor over an already opened document.
    pub fn new(backend: B, crop: CropBox, range: PageRange) -> Self {
        let pages = backend.pages().into_iter();
        Self {
            backend,
            crop,
            range,
            pages,
            cache: None,
            released: 0,
        }
    }

    /// The crop rectangle applied to every page.
    pub fn crop(&self) -> CropBox {
        self.crop
    }

    /// Number of pages of the document that fall inside the range.
    pub fn in_range_count(&self) -> usize {
        self.backend
            .pages()
            .keys()
            .filter(|&&n| self.range.contains(n))
            .count()
    }

    /// Number of page layouts currently held in memory.
    pub fn cached_pages(&self) -> usize {
        usize::from(self.cache.is_some())
    }

    /// Number of page layouts released so far.
    pub fn released_pages(&self) -> usize {
        self.released
    }

    /// Drop the current page's layout.
    pub fn flush_cache(&mut self) {
        if let Some(cache) = self.cache.take() {
            log::trace!(
                "Released layout of page {} ({} glyphs)",
                cache.page_number,
                cache.glyphs.len()
            );
            self.released += 1;
        }
    }

    fn load_page(&mut self, page_number: u32, page_id: PageId) -> Result<&LayoutCache> {
        let bounds = self.backend.page_bounds(page_id)?;
        let fonts = self.backend.page_fonts(page_id)?;
        let glyphs = GlyphExtractor::new(&self.backend, page_id, bounds, &fonts).extract()?;

        Ok(&*self.cache.insert(LayoutCache {
            page_number,
            bounds,
            fonts,
            glyphs,
        }))
    }

    fn extract_page(&mut self, page_number: u32, page_id: PageId) -> Result<PageRecord> {
        let crop = self.crop;
        let layout = self.load_page(page_number, page_id)?;
        let cropped = crop_glyphs(&layout.glyphs, &crop);
        let text = extract_text(&cropped);

        match &text {
            Some(t) => log::debug!("Page {}: {} chars", page_number, t.chars().count()),
            None => log::warn!("Page {}: no text inside crop box", page_number),
        }

        Ok(PageRecord { page_number, text })
    }
}

impl<B: PdfBackend> Iterator for PageExtractor<B> {
    type Item = Result<PageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (page_number, page_id) = self.pages.next()?;
            if page_number > self.range.end {
                // Pages are ordered, nothing left in range.
                self.pages = btree_map::BTreeMap::new().into_iter();
                return None;
            }
            if !self.range.contains(page_number) {
                continue;
            }

            let record = self.extract_page(page_number, page_id);
            self.flush_cache();
            return Some(record);
        }
    }
}
