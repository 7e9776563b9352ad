//! Dependency initialization and wiring for the importer.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::Settings;
use crate::ImportError;
use georef_importer_pipeline::{
    loader::{LoaderConfig, SearchLoader},
    orchestrator::{Operation, Orchestrator},
    processor::{IndexLookup, RecordProcessor},
    source::{DelimitedFileSource, IndexScanSource, JsonFileSource, RecordSource, DEFAULT_DELIMITER},
};
use georef_importer_repository::{IndexConfig, OpenSearchClient, SearchEngineClient};
use georef_importer_shared::DocumentType;

/// Container for all initialized dependencies.
pub struct Dependencies {
    client: Arc<dyn SearchEngineClient>,
    settings: Settings,
}

impl Dependencies {
    /// Initialize the destination client from the given settings.
    pub fn new(settings: Settings) -> Result<Self, ImportError> {
        let index_config = IndexConfig::new(&settings.index_prefix)
            .with_topology(settings.shards, settings.replicas);

        let client = OpenSearchClient::new(&settings.opensearch_url, index_config)
            .map_err(|e| ImportError::config(format!("creating search client: {}", e)))?;

        info!(
            url = %settings.opensearch_url,
            prefix = %settings.index_prefix,
            "Initialized dependencies"
        );

        Ok(Self {
            client: Arc::new(client),
            settings,
        })
    }

    /// Build the record source for a document type.
    ///
    /// File-backed types require a source file; the query-log type scans the
    /// configured source index instead.
    pub fn source_for(
        &self,
        doc_type: DocumentType,
        source_file: Option<&Path>,
    ) -> Result<Box<dyn RecordSource>, ImportError> {
        let source: Box<dyn RecordSource> = match doc_type {
            DocumentType::Communes | DocumentType::Regions | DocumentType::Departements => {
                Box::new(JsonFileSource::open(self.required_file(doc_type, source_file)?)?)
            }
            DocumentType::CommunesPj => Box::new(DelimitedFileSource::open(
                self.required_file(doc_type, source_file)?,
                DEFAULT_DELIMITER,
            )?),
            DocumentType::Requetes => Box::new(IndexScanSource::new(
                self.client.clone(),
                self.settings.scan_index.clone(),
                self.settings.scan_batch_size,
            )),
        };
        Ok(source)
    }

    /// Build the orchestrator for one run.
    pub fn orchestrator(&self, doc_type: DocumentType, operation: Operation) -> Orchestrator {
        let lookup = Arc::new(IndexLookup::new(self.client.clone()));
        let processor = RecordProcessor::new(lookup);
        let loader = SearchLoader::with_config(
            self.client.clone(),
            LoaderConfig {
                batch_size: self.settings.bulk_size,
                timeout: Duration::from_secs(self.settings.bulk_timeout_secs),
            },
        );
        Orchestrator::new(self.client.clone(), processor, loader, doc_type, operation)
    }

    fn required_file<'a>(
        &self,
        doc_type: DocumentType,
        source_file: Option<&'a Path>,
    ) -> Result<&'a Path, ImportError> {
        source_file.ok_or_else(|| {
            ImportError::config(format!(
                "--source-file is required for document type {}",
                doc_type
            ))
        })
    }
}
