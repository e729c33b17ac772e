//! JSON Lines output for page records.
//!
//! Each record becomes one line holding a single-entry object,
//! `{"<page>": "<text>"}`, or `{"<page>": null}` for blank crop regions.
//! Lines use `": "` between key and value and escape every non-ASCII
//! character as `\uXXXX`, the layout Python's `json.dump` produces with its
//! default settings, so corpora written by either tool can be mixed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::error::Result;
use crate::model::PageRecord;

/// JSON formatter matching Python's default `json.dump` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Encode a value with [`AsciiFormatter`].
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
    value.serialize(&mut ser)?;
    // The formatter only ever emits ASCII.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Encode one record as a line, including the trailing newline.
pub fn to_json_line(record: &PageRecord) -> Result<String> {
    let mut line = to_json_string(record)?;
    line.push('\n');
    Ok(line)
}

/// Append-only JSON Lines writer.
///
/// The file is opened in append mode and created if missing; existing lines
/// are never touched. Each record is written with a single `write_all`, so
/// an aborted run leaves only whole lines behind. The handle is closed when
/// the writer is dropped.
pub struct JsonlWriter {
    file: File,
    path: PathBuf,
    written: usize,
}

impl JsonlWriter {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn append<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written through this writer.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Append one record.
    pub fn write_record(&mut self, record: &PageRecord) -> Result<()> {
        let line = to_json_line(record)?;
        self.file.write_all(line.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, returning the number of records written.
    pub fn finish(mut self) -> Result<usize> {
        self.file.flush()?;
        Ok(self.written)
    }
}

/// Append every record to `path`.
pub fn append_pages<P, I>(path: P, pages: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Result<PageRecord>>,
{
    append_pages_with_offset(path, pages, 0)
}

/// Append every record to `path`, adding `offset` to its page number first.
pub fn append_pages_with_offset<P, I>(path: P, pages: I, offset: u32) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Result<PageRecord>>,
{
    let path = path.as_ref();
    log::info!("Start writing to {}", path.display());

    let mut writer = JsonlWriter::append(path)?;
    for record in pages {
        writer.write_record(&record?.with_offset(offset))?;
    }
    let written = writer.finish()?;

    log::info!("Finished writing to {}", path.display());
    Ok(written)
}
