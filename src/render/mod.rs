//! Output rendering for extracted records.

mod jsonl;

pub use jsonl::{
    append_pages, append_pages_with_offset, to_json_line, to_json_string, AsciiFormatter,
    JsonlWriter,
};
