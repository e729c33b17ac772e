//! Extraction configuration.
//!
//! Every parameter of a run lives in an [`ExtractionConfig`] that is built
//! once and handed to [`crate::pipeline::run`]. Each source document carries
//! its own crop geometry, page range and output offset.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Level 1 training guide.
pub const LEVEL1_GUIDE_URL: &str =
    "http://library.crossfit.com/free/pdf/CFJ_English_Level1_TrainingGuide.pdf";

/// Level 2 training guide.
pub const LEVEL2_GUIDE_URL: &str =
    "https://library.crossfit.com/free/pdf/CFJ_English_L2_TrainingGuide.pdf";

/// Offset applied to Level 2 page numbers so they continue after Level 1.
pub const LEVEL2_PAGE_OFFSET: u32 = 223;

/// Default output location, relative to the crate root.
pub const DEFAULT_OUTPUT_FILE: &str = "data/extracted_text.jsonl";

/// Rectangle of a page from which text is kept.
///
/// Coordinates use the top-left corner of the page as origin with y growing
/// downwards: `left`/`right` are x positions, `top`/`bottom` are distances
/// from the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl CropBox {
    /// Create a crop box from `(x0, top, x1, bottom)`.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a crop box from margin measurements.
    pub fn from_margins(
        header_height: f32,
        footer_height: f32,
        left_margin: f32,
        right_margin: f32,
    ) -> Self {
        Self::new(left_margin, header_height, right_margin, footer_height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Check that the rectangle is finite and not inverted.
    pub fn validate(&self) -> Result<()> {
        let values = [self.left, self.top, self.right, self.bottom];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidCropBox(format!(
                "non-finite coordinate in {:?}",
                self
            )));
        }
        if self.width() < 0.0 || self.height() < 0.0 {
            return Err(Error::InvalidCropBox(format!(
                "({}, {}, {}, {}) is inverted",
                self.left, self.top, self.right, self.bottom
            )));
        }
        Ok(())
    }

    /// Whether a box `(x0, top, x1, bottom)` overlaps this crop box.
    pub fn intersects(&self, x0: f32, top: f32, x1: f32, bottom: f32) -> bool {
        x0 < self.right && x1 > self.left && top < self.bottom && bottom > self.top
    }
}

/// Inclusive, 1-based range of page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Create a range covering `start..=end`.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check if a page number is within the range.
    pub fn contains(&self, page: u32) -> bool {
        page >= self.start && page <= self.end
    }

    /// Number of pages the range spans.
    pub fn len(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.start == 0 {
            return Err(Error::InvalidPageRange(
                "page numbers start at 1".to_string(),
            ));
        }
        if self.start > self.end {
            return Err(Error::InvalidPageRange(format!(
                "{} > {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One document to download and extract.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSource {
    /// Short name used in logs and progress output.
    pub name: String,
    pub url: String,
    pub crop: CropBox,
    pub pages: PageRange,
    /// Added to every page number before the record is written.
    pub page_offset: u32,
}

impl DocumentSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        crop: CropBox,
        pages: PageRange,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            crop,
            pages,
            page_offset: 0,
        }
    }

    /// Set the page-number offset.
    pub fn with_page_offset(mut self, offset: u32) -> Self {
        self.page_offset = offset;
        self
    }

    /// The Level 1 training guide: pages 4-249, text column between x=120
    /// and x=490, header and footer bands removed.
    pub fn level1_guide() -> Self {
        Self::new(
            "level1",
            LEVEL1_GUIDE_URL,
            CropBox::from_margins(60.0, 540.0, 120.0, 490.0),
            PageRange::new(4, 249),
        )
    }

    /// The Level 2 training guide: pages 15-80 on a wider, taller column,
    /// numbered after the Level 1 pages.
    pub fn level2_guide() -> Self {
        Self::new(
            "level2",
            LEVEL2_GUIDE_URL,
            CropBox::from_margins(60.0, 740.0, 40.0, 540.0),
            PageRange::new(15, 80),
        )
        .with_page_offset(LEVEL2_PAGE_OFFSET)
    }

    pub fn validate(&self) -> Result<()> {
        self.crop.validate()?;
        self.pages.validate()?;
        Ok(())
    }
}

/// Complete configuration for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Documents processed in order.
    pub documents: Vec<DocumentSource>,

    /// JSON Lines file records are appended to.
    pub output_path: PathBuf,

    /// Total time allowed for one download.
    pub fetch_timeout: Duration,

    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            output_path: default_output_path(),
            fetch_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl ExtractionConfig {
    /// Create an empty configuration with default timeouts and output path.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed two-guide configuration.
    pub fn training_guides() -> Self {
        Self::new()
            .with_document(DocumentSource::level1_guide())
            .with_document(DocumentSource::level2_guide())
    }

    /// Append a document to process.
    pub fn with_document(mut self, document: DocumentSource) -> Self {
        self.documents.push(document);
        self
    }

    /// Set the output file.
    pub fn with_output_path(mut self, path: impl AsRef<Path>) -> Self {
        self.output_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the download timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Validate every document's geometry and range.
    pub fn validate(&self) -> Result<()> {
        for doc in &self.documents {
            doc.validate()
                .map_err(|e| Error::Other(format!("{}: {}", doc.name, e)))?;
        }
        Ok(())
    }
}

/// `data/extracted_text.jsonl` under the crate root.
///
/// The root is fixed at compile time, so an installed binary keeps writing
/// into the source tree it was built from; use
/// [`ExtractionConfig::with_output_path`] to write elsewhere.
pub fn default_output_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_OUTPUT_FILE)
}
