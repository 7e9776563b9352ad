//! File source for delimited text tables.

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::PipelineError;
use crate::source::RecordSource;
use georef_importer_shared::RawRecord;

/// The delimiter used by the directory cross-reference exports.
pub const DEFAULT_DELIMITER: u8 = b'|';

/// Reads a delimited text file one row at a time.
///
/// Rows have no header line and may vary in field count; field-count
/// validation belongs to the transformer.
pub struct DelimitedFileSource {
    reader: csv::Reader<File>,
}

impl DelimitedFileSource {
    /// Open the file with the given single-byte delimiter.
    pub fn open(path: impl AsRef<Path>, delimiter: u8) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| PipelineError::source(format!("opening {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), delimiter = %(delimiter as char), "Opened delimited source file");

        Ok(Self { reader })
    }
}

#[async_trait]
impl RecordSource for DelimitedFileSource {
    async fn next_record(&mut self) -> Result<Option<RawRecord>, PipelineError> {
        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Ok(Some(RawRecord::Row(
                record.iter().map(str::to_string).collect(),
            ))),
            Ok(false) => Ok(None),
            Err(e) => Err(PipelineError::source(format!("reading row: {}", e))),
        }
    }
}
