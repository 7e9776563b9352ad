//! File source for a single JSON feature-collection document.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::PipelineError;
use crate::source::RecordSource;
use georef_importer_shared::RawRecord;

/// Reads one JSON document from a file and yields it as a single record.
///
/// The file is read and parsed eagerly at open; a malformed file is a fatal
/// open error, not a record-level fault.
pub struct JsonFileSource {
    document: Option<Value>,
}

impl JsonFileSource {
    /// Open and parse the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| PipelineError::source(format!("reading {}: {}", path.display(), e)))?;
        let document: Value = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::source(format!("parsing {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded JSON source file");

        Ok(Self {
            document: Some(document),
        })
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn next_record(&mut self) -> Result<Option<RawRecord>, PipelineError> {
        Ok(self.document.take().map(RawRecord::Json))
    }
}
