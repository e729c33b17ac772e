//! Record types produced by extraction and consumed by the writer.

mod record;

pub use record::PageRecord;
