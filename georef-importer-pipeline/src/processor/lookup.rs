//! Enrichment lookup seam.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use georef_importer_repository::{SearchEngineClient, SearchError};
use georef_importer_shared::DocumentType;

/// Point lookup against a reference collection, used synchronously within
/// the transform step.
///
/// "Not found" is `Ok(None)`, a valid and expected outcome; only transport
/// failures surface as errors. Handlers apply their own degrade policy to
/// both cases.
#[async_trait]
pub trait EnrichmentLookup: Send + Sync {
    /// Look up one document by its natural key.
    async fn lookup(
        &self,
        doc_type: DocumentType,
        id: &str,
    ) -> Result<Option<Value>, SearchError>;
}

/// Production lookup backed by the destination index itself.
pub struct IndexLookup {
    client: Arc<dyn SearchEngineClient>,
}

impl IndexLookup {
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnrichmentLookup for IndexLookup {
    async fn lookup(
        &self,
        doc_type: DocumentType,
        id: &str,
    ) -> Result<Option<Value>, SearchError> {
        self.client.get_document(doc_type, id).await
    }
}
