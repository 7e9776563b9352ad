//! Loader module for the importer pipeline.
//!
//! Accumulates output documents and submits them to the destination index in
//! bounded batches.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use georef_importer_repository::SearchEngineClient;
use georef_importer_shared::OutputDocument;

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents to accumulate before flushing.
    pub batch_size: usize,
    /// How long one bulk submission may block.
    pub timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Loader that submits documents to the destination in batches.
///
/// The pending buffer is owned exclusively by the loader and mutated only by
/// the driver's single logical thread of control. Batches are never partially
/// retried: a submission either reaches the engine or the whole batch is
/// tallied as rejected.
pub struct SearchLoader {
    client: Arc<dyn SearchEngineClient>,
    config: LoaderConfig,
    pending: Vec<OutputDocument>,
    accepted: usize,
    rejected: usize,
    submissions: usize,
}

impl SearchLoader {
    /// Create a new loader with default configuration.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchEngineClient>, config: LoaderConfig) -> Self {
        let batch_size = config.batch_size;
        Self {
            client,
            config,
            pending: Vec::with_capacity(batch_size),
            accepted: 0,
            rejected: 0,
            submissions: 0,
        }
    }

    /// Accept documents, flushing whenever the batch threshold is reached.
    pub async fn load(&mut self, documents: Vec<OutputDocument>) {
        for document in documents {
            self.pending.push(document);
            if self.pending.len() >= self.config.batch_size {
                self.flush().await;
            }
        }
    }

    /// Submit all pending documents as one batch.
    ///
    /// A failed submission is logged and tallied against the whole batch; it
    /// is not retried.
    pub async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let batch: Vec<OutputDocument> = self.pending.drain(..).collect();
        let count = batch.len();
        self.submissions += 1;

        debug!(count = count, "Flushing batch to the search index");

        match self.client.bulk_index(&batch, self.config.timeout).await {
            Ok(summary) => {
                self.accepted += summary.accepted;
                self.rejected += summary.rejected;
                for item in &summary.errors {
                    error!(
                        id = item.id.as_deref().unwrap_or("<assigned>"),
                        reason = %item.reason,
                        "Document rejected by the search index"
                    );
                }
            }
            Err(e) => {
                error!(count = count, error = %e, "Bulk submission failed");
                self.rejected += count;
            }
        }
    }

    /// Documents accepted by the destination so far.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Documents rejected so far, including whole failed batches.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Bulk submissions issued so far.
    pub fn submissions(&self) -> usize {
        self.submissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use georef_importer_repository::{BulkItemError, BulkSummary, ScanPage, SearchError};
    use georef_importer_shared::DocumentType;

    /// Mock client recording the size of every bulk submission.
    struct MockClient {
        batch_sizes: Mutex<Vec<usize>>,
        reject_first_of_each_batch: bool,
        fail_transport: bool,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
                reject_first_of_each_batch: false,
                fail_transport: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                reject_first_of_each_batch: true,
                ..Self::new()
            }
        }

        fn failing() -> Self {
            Self {
                fail_transport: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl SearchEngineClient for MockClient {
        async fn health_check(&self) -> Result<bool, SearchError> {
            Ok(true)
        }

        async fn index_exists(&self, _doc_type: DocumentType) -> Result<bool, SearchError> {
            Ok(true)
        }

        async fn create_index(&self, _doc_type: DocumentType) -> Result<(), SearchError> {
            Ok(())
        }

        async fn drop_index(&self, _doc_type: DocumentType) -> Result<bool, SearchError> {
            Ok(true)
        }

        async fn put_mapping(&self, _doc_type: DocumentType) -> Result<(), SearchError> {
            Ok(())
        }

        async fn get_document(
            &self,
            _doc_type: DocumentType,
            _id: &str,
        ) -> Result<Option<Value>, SearchError> {
            Ok(None)
        }

        async fn bulk_index(
            &self,
            documents: &[OutputDocument],
            _timeout: Duration,
        ) -> Result<BulkSummary, SearchError> {
            if self.fail_transport {
                return Err(SearchError::bulk("timed out"));
            }

            self.batch_sizes.lock().unwrap().push(documents.len());

            if self.reject_first_of_each_batch {
                Ok(BulkSummary {
                    accepted: documents.len() - 1,
                    rejected: 1,
                    errors: vec![BulkItemError {
                        id: documents[0].id.clone(),
                        reason: "mapper_parsing_exception".to_string(),
                    }],
                })
            } else {
                Ok(BulkSummary {
                    accepted: documents.len(),
                    rejected: 0,
                    errors: vec![],
                })
            }
        }

        async fn scan(
            &self,
            _index: &str,
            _cursor: Option<&str>,
            _size: usize,
        ) -> Result<ScanPage, SearchError> {
            Ok(ScanPage {
                hits: vec![],
                cursor: None,
            })
        }
    }

    fn docs(count: usize) -> Vec<OutputDocument> {
        (0..count)
            .map(|i| {
                OutputDocument::new(
                    DocumentType::Regions,
                    format!("R{}", i),
                    json!({ "code": i.to_string() }),
                )
            })
            .collect()
    }

    fn loader_with_batch(client: Arc<MockClient>, batch_size: usize) -> SearchLoader {
        SearchLoader::with_config(
            client,
            LoaderConfig {
                batch_size,
                timeout: Duration::from_secs(30),
            },
        )
    }

    #[tokio::test]
    async fn test_submission_count_is_ceil_of_n_over_b() {
        let client = Arc::new(MockClient::new());
        let mut loader = loader_with_batch(client.clone(), 2);

        loader.load(docs(5)).await;
        loader.flush().await;

        // ceil(5/2) = 3 submissions, the last partial.
        assert_eq!(loader.submissions(), 3);
        assert_eq!(*client.batch_sizes.lock().unwrap(), vec![2, 2, 1]);
        assert_eq!(loader.accepted(), 5);
        assert_eq!(loader.rejected(), 0);
    }

    #[tokio::test]
    async fn test_exact_multiple_leaves_nothing_to_drain() {
        let client = Arc::new(MockClient::new());
        let mut loader = loader_with_batch(client.clone(), 2);

        loader.load(docs(4)).await;
        loader.flush().await;

        assert_eq!(loader.submissions(), 2);
        assert_eq!(loader.accepted(), 4);
    }

    #[tokio::test]
    async fn test_flush_on_empty_buffer_is_a_no_op() {
        let client = Arc::new(MockClient::new());
        let mut loader = loader_with_batch(client.clone(), 2);

        loader.flush().await;

        assert_eq!(loader.submissions(), 0);
        assert!(client.batch_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_rejections_are_tallied_per_document() {
        let client = Arc::new(MockClient::rejecting());
        let mut loader = loader_with_batch(client, 3);

        loader.load(docs(3)).await;
        loader.flush().await;

        assert_eq!(loader.accepted(), 2);
        assert_eq!(loader.rejected(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_tallies_whole_batch_without_retry() {
        let client = Arc::new(MockClient::failing());
        let mut loader = loader_with_batch(client.clone(), 2);

        loader.load(docs(2)).await;
        loader.flush().await;

        assert_eq!(loader.accepted(), 0);
        assert_eq!(loader.rejected(), 2);
        // The transport never saw a successful call, and none was retried.
        assert!(client.batch_sizes.lock().unwrap().is_empty());
    }
}
