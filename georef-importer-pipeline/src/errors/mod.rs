//! Error types for the georef importer pipeline.

use thiserror::Error;

use georef_importer_repository::SearchError;
use georef_importer_shared::DocumentType;

/// Errors that can occur in the importer pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error producing raw records from a source.
    #[error("Source error: {0}")]
    SourceError(String),

    /// A record is missing fields the transformer requires.
    ///
    /// Aborts processing of that record only; the driver isolates it and
    /// continues.
    #[error("Malformed {doc_type} record: {reason}")]
    MalformedRecord {
        doc_type: DocumentType,
        reason: String,
    },

    /// No handler is registered for the requested document type.
    #[error("No handler registered for document type: {0}")]
    UnknownDocumentType(DocumentType),

    /// Error from the search engine.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),
}

impl PipelineError {
    /// Create a source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a malformed-record error.
    pub fn malformed(doc_type: DocumentType, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            doc_type,
            reason: reason.into(),
        }
    }
}
