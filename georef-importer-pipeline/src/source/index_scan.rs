//! Source that scans an existing search index.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::PipelineError;
use crate::source::RecordSource;
use georef_importer_repository::SearchEngineClient;
use georef_importer_shared::RawRecord;

/// Scans an existing index page by page, yielding one hit per pull.
///
/// Pages are fetched transparently through the repository client; each hit is
/// the full engine hit, carrying its `_source`.
pub struct IndexScanSource {
    client: Arc<dyn SearchEngineClient>,
    index: String,
    batch_size: usize,
    buffer: VecDeque<serde_json::Value>,
    cursor: Option<String>,
    exhausted: bool,
}

impl IndexScanSource {
    /// Create a scan over `index` with the given page size.
    pub fn new(client: Arc<dyn SearchEngineClient>, index: impl Into<String>, batch_size: usize) -> Self {
        Self {
            client,
            index: index.into(),
            batch_size,
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }

    async fn fill_buffer(&mut self) -> Result<(), PipelineError> {
        while self.buffer.is_empty() && !self.exhausted {
            let page = self
                .client
                .scan(&self.index, self.cursor.as_deref(), self.batch_size)
                .await?;

            debug!(
                index = %self.index,
                hits = page.hits.len(),
                "Fetched scan page"
            );

            if page.hits.is_empty() || page.cursor.is_none() {
                self.exhausted = true;
            }
            self.buffer.extend(page.hits);
            self.cursor = page.cursor;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSource for IndexScanSource {
    async fn next_record(&mut self) -> Result<Option<RawRecord>, PipelineError> {
        self.fill_buffer().await?;
        Ok(self.buffer.pop_front().map(RawRecord::Json))
    }
}
