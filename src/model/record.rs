//! Extracted page records.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Text extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Page number (1-indexed, offset applied once written)
    pub page_number: u32,

    /// Text found inside the crop rectangle, `None` when the region is blank
    pub text: Option<String>,
}

impl PageRecord {
    /// Create a record with text.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: Some(text.into()),
        }
    }

    /// Create a record for a page whose crop region holds no text.
    pub fn blank(page_number: u32) -> Self {
        Self {
            page_number,
            text: None,
        }
    }

    /// Shift the page number into another numbering space.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.page_number += offset;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_none()
    }
}

/// Serialized as a single-entry object: `{"<page_number>": text}`.
impl Serialize for PageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.page_number.to_string(), &self.text)?;
        map.end()
    }
}
