//! Orchestrator module for the importer pipeline.
//!
//! Drives the Source-Processor-Loader flow through its lifecycle:
//! initialize the destination, stream records, drain the loader, report.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::errors::PipelineError;
use crate::loader::SearchLoader;
use crate::processor::RecordProcessor;
use crate::source::RecordSource;
use georef_importer_repository::{SearchEngineClient, SearchError};
use georef_importer_shared::DocumentType;

/// The requested import operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Delete and recreate the target type's index before streaming.
    /// Data-destructive; intended for first load.
    Init,
    /// Replace only the mapping definition before streaming.
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Init => f.write_str("init"),
            Operation::Update => f.write_str("update"),
        }
    }
}

/// Final tally of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Raw records pulled from the source.
    pub processed: usize,
    /// Output documents produced by the transformer.
    pub emitted: usize,
    /// Records or features dropped by a fail-closed enrichment policy.
    pub skipped: usize,
    /// Records whose processing failed and was isolated.
    pub failed: usize,
    /// Documents the destination did not accept.
    pub rejected: usize,
}

impl ImportReport {
    /// Whether any record-level failure occurred during the run.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.rejected > 0
    }
}

/// Coordinates one import run for a single document type.
///
/// The run is single-threaded and pull-based: each raw record is fully
/// processed and pushed before the next is pulled, so the loader can never
/// be outrun.
pub struct Orchestrator {
    client: Arc<dyn SearchEngineClient>,
    processor: RecordProcessor,
    loader: SearchLoader,
    doc_type: DocumentType,
    operation: Operation,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        client: Arc<dyn SearchEngineClient>,
        processor: RecordProcessor,
        loader: SearchLoader,
        doc_type: DocumentType,
        operation: Operation,
    ) -> Self {
        Self {
            client,
            processor,
            loader,
            doc_type,
            operation,
        }
    }

    /// Run the import until the source is exhausted.
    ///
    /// Configuration faults (unreachable destination, index bootstrap
    /// failures) abort the run; record-level faults are isolated, logged
    /// with their context, and tallied in the report.
    pub async fn run(
        &mut self,
        source: &mut dyn RecordSource,
    ) -> Result<ImportReport, PipelineError> {
        info!(
            doc_type = %self.doc_type,
            operation = %self.operation,
            "Starting import"
        );

        self.init().await?;

        let mut report = self.stream(source).await?;

        // Drain whatever the last partial batch holds.
        self.loader.flush().await;

        report.rejected = self.loader.rejected();

        info!(
            doc_type = %self.doc_type,
            processed = report.processed,
            emitted = report.emitted,
            accepted = self.loader.accepted(),
            skipped = report.skipped,
            failed = report.failed,
            rejected = report.rejected,
            "Import finished"
        );

        Ok(report)
    }

    /// Verify the destination and prepare the target type's schema.
    ///
    /// Ensuring the indices is idempotent: re-running against an already
    /// initialized destination is a no-op.
    async fn init(&self) -> Result<(), PipelineError> {
        let healthy = self.client.health_check().await?;
        if !healthy {
            return Err(SearchError::connection("destination is not reachable").into());
        }

        for doc_type in DocumentType::ALL {
            if !self.client.index_exists(doc_type).await? {
                debug!(doc_type = %doc_type, "Index absent, creating it");
                self.client.create_index(doc_type).await?;
            }
        }

        match self.operation {
            Operation::Init => {
                if self.client.drop_index(self.doc_type).await? {
                    debug!(doc_type = %self.doc_type, "Dropped index for reinitialization");
                } else {
                    info!(
                        doc_type = %self.doc_type,
                        "No index to drop for this document type"
                    );
                }
                self.client.create_index(self.doc_type).await?;
            }
            Operation::Update => {
                self.client.put_mapping(self.doc_type).await?;
                debug!(doc_type = %self.doc_type, "Mapping definition replaced");
            }
        }

        Ok(())
    }

    /// The pull-transform-push loop.
    async fn stream(&mut self, source: &mut dyn RecordSource) -> Result<ImportReport, PipelineError> {
        let mut report = ImportReport::default();

        while let Some(record) = source.next_record().await? {
            report.processed += 1;

            match self.processor.process(self.doc_type, &record).await {
                Ok(outcome) => {
                    report.emitted += outcome.documents.len();
                    report.skipped += outcome.skipped;
                    self.loader.load(outcome.documents).await;
                }
                Err(e) => {
                    error!(
                        doc_type = %self.doc_type,
                        record = report.processed,
                        error = %e,
                        "Record processing failed, continuing"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::loader::LoaderConfig;
    use crate::processor::IndexLookup;
    use georef_importer_repository::{BulkSummary, ScanPage};
    use georef_importer_shared::{OutputDocument, RawRecord};

    /// In-memory source backed by a fixed record list.
    struct VecSource {
        records: std::vec::IntoIter<RawRecord>,
    }

    impl VecSource {
        fn new(records: Vec<RawRecord>) -> Self {
            Self {
                records: records.into_iter(),
            }
        }
    }

    #[async_trait]
    impl RecordSource for VecSource {
        async fn next_record(&mut self) -> Result<Option<RawRecord>, PipelineError> {
            Ok(self.records.next())
        }
    }

    /// Mock destination recording schema operations and submitted batches.
    struct MockDestination {
        healthy: bool,
        existing: Mutex<HashSet<DocumentType>>,
        created: Mutex<Vec<DocumentType>>,
        dropped: Mutex<Vec<DocumentType>>,
        mappings_put: Mutex<Vec<DocumentType>>,
        batches: Mutex<Vec<Vec<OutputDocument>>>,
        reference: HashMap<(DocumentType, String), Value>,
    }

    impl MockDestination {
        fn new() -> Self {
            Self {
                healthy: true,
                existing: Mutex::new(HashSet::new()),
                created: Mutex::new(Vec::new()),
                dropped: Mutex::new(Vec::new()),
                mappings_put: Mutex::new(Vec::new()),
                batches: Mutex::new(Vec::new()),
                reference: HashMap::new(),
            }
        }

        fn unhealthy() -> Self {
            Self {
                healthy: false,
                ..Self::new()
            }
        }

        fn initialized() -> Self {
            let destination = Self::new();
            destination
                .existing
                .lock()
                .unwrap()
                .extend(DocumentType::ALL);
            destination
        }

        fn with_reference(mut self, doc_type: DocumentType, id: &str, source: Value) -> Self {
            self.reference.insert((doc_type, id.to_string()), source);
            self
        }
    }

    #[async_trait]
    impl SearchEngineClient for MockDestination {
        async fn health_check(&self) -> Result<bool, SearchError> {
            Ok(self.healthy)
        }

        async fn index_exists(&self, doc_type: DocumentType) -> Result<bool, SearchError> {
            Ok(self.existing.lock().unwrap().contains(&doc_type))
        }

        async fn create_index(&self, doc_type: DocumentType) -> Result<(), SearchError> {
            self.existing.lock().unwrap().insert(doc_type);
            self.created.lock().unwrap().push(doc_type);
            Ok(())
        }

        async fn drop_index(&self, doc_type: DocumentType) -> Result<bool, SearchError> {
            self.dropped.lock().unwrap().push(doc_type);
            Ok(self.existing.lock().unwrap().remove(&doc_type))
        }

        async fn put_mapping(&self, doc_type: DocumentType) -> Result<(), SearchError> {
            self.mappings_put.lock().unwrap().push(doc_type);
            Ok(())
        }

        async fn get_document(
            &self,
            doc_type: DocumentType,
            id: &str,
        ) -> Result<Option<Value>, SearchError> {
            Ok(self.reference.get(&(doc_type, id.to_string())).cloned())
        }

        async fn bulk_index(
            &self,
            documents: &[OutputDocument],
            _timeout: Duration,
        ) -> Result<BulkSummary, SearchError> {
            self.batches.lock().unwrap().push(documents.to_vec());
            Ok(BulkSummary {
                accepted: documents.len(),
                rejected: 0,
                errors: vec![],
            })
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

    fn orchestrator(
        client: Arc<MockDestination>,
        doc_type: DocumentType,
        operation: Operation,
    ) -> Orchestrator {
        let lookup = Arc::new(IndexLookup::new(client.clone()));
        let processor = RecordProcessor::new(lookup);
        let loader = SearchLoader::with_config(
            client.clone(),
            LoaderConfig {
                batch_size: 100,
                timeout: Duration::from_secs(30),
            },
        );
        Orchestrator::new(client, processor, loader, doc_type, operation)
    }

    #[tokio::test]
    async fn test_region_feature_end_to_end() {
        let client = Arc::new(MockDestination::initialized());
        let mut driver = orchestrator(client.clone(), DocumentType::Regions, Operation::Init);
        let mut source = VecSource::new(vec![RawRecord::Json(json!({
            "features": [ { "properties": { "code": "11" } } ]
        }))]);

        let report = driver.run(&mut source).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.emitted, 1);
        assert_eq!(report.failed, 0);
        assert!(!report.has_failures());

        // One document, one batch.
        let batches = client.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].id.as_deref(), Some("R11"));
        assert_eq!(batches[0][0].doc_type, DocumentType::Regions);
    }

    #[tokio::test]
    async fn test_directory_row_end_to_end() {
        let client = Arc::new(MockDestination::initialized());
        let mut driver = orchestrator(client.clone(), DocumentType::CommunesPj, Operation::Init);
        let mut source = VecSource::new(vec![RawRecord::Row(
            ["PJ001", "75001", "75101", "Paris 1er", "1"]
                .map(String::from)
                .to_vec(),
        )]);

        let report = driver.run(&mut source).await.unwrap();

        assert_eq!(report.emitted, 1);

        let batches = client.batches.lock().unwrap();
        let doc = &batches[0][0];
        assert_eq!(doc.id.as_deref(), Some("75001"));
        assert_eq!(doc.doc_type, DocumentType::CommunesPj);
        assert_eq!(doc.body["principale"], json!(true));
        assert_eq!(doc.body["code_localite_pj"], "PJ001");
    }

    #[tokio::test]
    async fn test_communes_run_counts_enrichment_skips() {
        let client = Arc::new(
            MockDestination::initialized().with_reference(
                DocumentType::CommunesPj,
                "75001",
                json!({ "code_localite_pj": "PJ001" }),
            ),
        );
        let mut driver = orchestrator(client.clone(), DocumentType::Communes, Operation::Init);
        let mut source = VecSource::new(vec![RawRecord::Json(json!({
            "features": [
                { "properties": { "code": "75001" } },
                { "properties": { "code": "99999" } }
            ]
        }))]);

        let report = driver.run(&mut source).await.unwrap();

        assert_eq!(report.emitted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_bootstrap_creates_missing_indices_once() {
        let client = Arc::new(MockDestination::new());
        let mut driver = orchestrator(client.clone(), DocumentType::Regions, Operation::Update);
        let mut source = VecSource::new(vec![]);

        driver.run(&mut source).await.unwrap();

        // All five types bootstrapped.
        assert_eq!(client.created.lock().unwrap().len(), DocumentType::ALL.len());

        // A second run finds them and creates nothing more.
        let mut driver = orchestrator(client.clone(), DocumentType::Regions, Operation::Update);
        let mut source = VecSource::new(vec![]);
        driver.run(&mut source).await.unwrap();

        assert_eq!(client.created.lock().unwrap().len(), DocumentType::ALL.len());
    }

    #[tokio::test]
    async fn test_init_operation_drops_and_recreates_target_index() {
        let client = Arc::new(MockDestination::initialized());
        let mut driver = orchestrator(client.clone(), DocumentType::Communes, Operation::Init);
        let mut source = VecSource::new(vec![]);

        driver.run(&mut source).await.unwrap();

        assert_eq!(*client.dropped.lock().unwrap(), vec![DocumentType::Communes]);
        assert_eq!(*client.created.lock().unwrap(), vec![DocumentType::Communes]);
    }

    #[tokio::test]
    async fn test_update_operation_replaces_only_the_mapping() {
        let client = Arc::new(MockDestination::initialized());
        let mut driver = orchestrator(client.clone(), DocumentType::Communes, Operation::Update);
        let mut source = VecSource::new(vec![]);

        driver.run(&mut source).await.unwrap();

        assert!(client.dropped.lock().unwrap().is_empty());
        assert_eq!(
            *client.mappings_put.lock().unwrap(),
            vec![DocumentType::Communes]
        );
    }

    #[tokio::test]
    async fn test_unreachable_destination_is_fatal() {
        let client = Arc::new(MockDestination::unhealthy());
        let mut driver = orchestrator(client, DocumentType::Regions, Operation::Init);
        let mut source = VecSource::new(vec![]);

        let result = driver.run(&mut source).await;
        assert!(matches!(
            result,
            Err(PipelineError::SearchError(SearchError::ConnectionError(_)))
        ));
    }

    #[tokio::test]
    async fn test_malformed_record_is_isolated() {
        let client = Arc::new(MockDestination::initialized());
        let mut driver = orchestrator(client.clone(), DocumentType::Regions, Operation::Init);
        // A delimited row in a regions run is malformed; the next record
        // still goes through.
        let mut source = VecSource::new(vec![
            RawRecord::Row(vec!["not".to_string(), "a".to_string(), "feature".to_string()]),
            RawRecord::Json(json!({ "features": [ { "properties": { "code": "24" } } ] })),
        ]);

        let report = driver.run(&mut source).await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.emitted, 1);
        assert!(report.has_failures());

        let batches = client.batches.lock().unwrap();
        assert_eq!(batches[0][0].id.as_deref(), Some("R24"));
    }
}
