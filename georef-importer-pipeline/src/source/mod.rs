//! Source adapters for the importer pipeline.
//!
//! Each adapter exposes the same narrow interface: produce the next raw
//! record, or end-of-stream.

mod delimited;
mod index_scan;
mod json_file;

pub use delimited::{DelimitedFileSource, DEFAULT_DELIMITER};
pub use index_scan::IndexScanSource;
pub use json_file::JsonFileSource;

use async_trait::async_trait;

use crate::errors::PipelineError;
use georef_importer_shared::RawRecord;

/// A pull-based producer of raw records.
///
/// The driver pulls one record at a time; each record is fully processed
/// before the next is pulled.
#[async_trait]
pub trait RecordSource: Send {
    /// Produce the next raw record, or `None` at end-of-stream.
    async fn next_record(&mut self) -> Result<Option<RawRecord>, PipelineError>;
}
