//! Processor module: transforms raw records into output documents.
//!
//! Dispatch is a strategy table: one handler per document type, registered in
//! a map keyed by the type tag, so adding a document type requires no change
//! to the dispatch logic.

mod handlers;
mod lookup;

pub use handlers::{
    CommunesHandler, CommunesPjHandler, PrefixedFeatureHandler, RequetesHandler,
};
pub use lookup::{EnrichmentLookup, IndexLookup};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::PipelineError;
use georef_importer_shared::{DocumentType, OutputDocument, RawRecord};

/// The result of transforming one raw record.
#[derive(Debug, Default)]
pub struct HandlerOutcome {
    /// Documents to submit, in input order.
    pub documents: Vec<OutputDocument>,
    /// Records or features skipped by an enrichment fail-closed policy.
    pub skipped: usize,
}

impl HandlerOutcome {
    /// An outcome carrying exactly one document.
    pub fn single(document: OutputDocument) -> Self {
        Self {
            documents: vec![document],
            skipped: 0,
        }
    }
}

/// Transform logic for one document type.
///
/// Handlers are pure apart from the enrichment lookup: the same record and
/// lookup state always produce the same outcome.
#[async_trait]
pub trait DocumentHandler: Send + Sync {
    /// The document type this handler is registered under.
    fn document_type(&self) -> DocumentType;

    /// Transform one raw record into zero or more output documents.
    async fn handle(
        &self,
        record: &RawRecord,
        lookup: &dyn EnrichmentLookup,
    ) -> Result<HandlerOutcome, PipelineError>;
}

/// Dispatches raw records to the handler registered for their type.
pub struct RecordProcessor {
    handlers: HashMap<DocumentType, Box<dyn DocumentHandler>>,
    lookup: Arc<dyn EnrichmentLookup>,
}

impl RecordProcessor {
    /// Create a processor with all known handlers registered.
    pub fn new(lookup: Arc<dyn EnrichmentLookup>) -> Self {
        let mut processor = Self {
            handlers: HashMap::new(),
            lookup,
        };
        processor.register(Box::new(CommunesPjHandler));
        processor.register(Box::new(CommunesHandler));
        processor.register(Box::new(PrefixedFeatureHandler::regions()));
        processor.register(Box::new(PrefixedFeatureHandler::departements()));
        processor.register(Box::new(RequetesHandler));
        processor
    }

    /// Register a handler, replacing any existing one for the same type.
    pub fn register(&mut self, handler: Box<dyn DocumentHandler>) {
        self.handlers.insert(handler.document_type(), handler);
    }

    /// Transform one raw record of the given type.
    pub async fn process(
        &self,
        doc_type: DocumentType,
        record: &RawRecord,
    ) -> Result<HandlerOutcome, PipelineError> {
        let handler = self
            .handlers
            .get(&doc_type)
            .ok_or(PipelineError::UnknownDocumentType(doc_type))?;
        handler.handle(record, self.lookup.as_ref()).await
    }
}
